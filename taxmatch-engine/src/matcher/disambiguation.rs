//! Choosing between top-scoring candidates
//!
//! Rules are tried in order:
//! 1. every top candidate resolves to one accepted taxon
//! 2. exactly one accepted record, the rest plain synonyms
//! 3. synonyms whose accepted taxon is the parent or child of the one other candidate
//! 4. exactly one accepted record, the rest misapplied
//! 5. the accepted taxa share an ancestor within the configured parent steps
//! 6. otherwise an unresolved homonym

use crate::error::MatchResult;
use crate::matcher::scoring::Scored;
use crate::matcher::synonyms::{resolve_accepted, Resolution};
use crate::matcher::ClassificationMatcher;
use crate::model::Classifier;
use crate::trace::{Trace, TraceLevel};
use std::sync::Arc;
use taxmatch_common::{Issue, IssueSet};
use tracing::debug;

/// A top candidate with its synonym resolution
#[derive(Debug, Clone)]
pub struct Ranked {
    pub scored: Scored,
    pub resolution: Resolution,
}

impl Ranked {
    fn accepted_id(&self) -> &str {
        self.resolution.accepted.id()
    }
}

/// Result of assessing one query state
#[derive(Debug, Clone)]
pub enum Outcome {
    /// No candidate reached the possible threshold
    NoMatch,
    Resolved {
        matched: Scored,
        accepted: Arc<dyn Classifier>,
        issues: IssueSet,
    },
    /// Incompatible top candidates; kingdoms are offered as hints
    Unresolved { kingdoms: Vec<String> },
    /// The best candidate's accepted links loop
    Looped { issues: IssueSet },
}

impl Outcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Outcome::Resolved { .. })
    }

    fn label(&self) -> &'static str {
        match self {
            Outcome::NoMatch => "noMatch",
            Outcome::Resolved { .. } => "resolved",
            Outcome::Unresolved { .. } => "unresolved",
            Outcome::Looped { .. } => "looped",
        }
    }
}

fn resolved(ranked: &Ranked, extra: Option<Issue>) -> Outcome {
    let mut issues = ranked.resolution.issues.clone();
    if let Some(issue) = extra {
        issues.insert(issue);
    }
    Outcome::Resolved {
        matched: ranked.scored.clone(),
        accepted: ranked.resolution.accepted.clone(),
        issues,
    }
}

/// Top candidates other than `chosen`
fn others<'a>(top: &'a [Ranked], chosen: &'a Ranked) -> impl Iterator<Item = &'a Ranked> + 'a {
    top.iter()
        .filter(move |r| r.scored.candidate.id() != chosen.scored.candidate.id())
}

fn parent_or_child(a: &dyn Classifier, b: &dyn Classifier) -> bool {
    a.parent_id() == Some(b.id()) || b.parent_id() == Some(a.id())
}

impl ClassificationMatcher {
    pub(crate) fn disambiguate(
        &self,
        scored: &[Scored],
        mut trace: Option<&mut Trace>,
    ) -> MatchResult<Outcome> {
        let Some(best) = scored.first() else {
            return Ok(Outcome::NoMatch);
        };
        let cutoff = best.posterior() - self.settings.tie_margin;

        let mut top = Vec::new();
        for candidate in scored.iter().filter(|s| s.posterior() >= cutoff) {
            let resolution = resolve_accepted(
                self.searcher.as_ref(),
                &candidate.candidate,
                self.settings.max_synonym_depth,
            )?;
            top.push(Ranked {
                scored: candidate.clone(),
                resolution,
            });
        }

        if top[0].resolution.looped {
            return Ok(Outcome::Looped {
                issues: top[0].resolution.issues.clone(),
            });
        }
        top.retain(|r| !r.resolution.looped);

        let outcome = self.apply_rules(&top)?;
        debug!(
            top = top.len(),
            best = best.posterior(),
            outcome = outcome.label(),
            "Disambiguated"
        );
        if let Some(t) = trace.as_deref_mut() {
            t.push(TraceLevel::Info, "disambiguation");
            t.add(TraceLevel::Info, "top", top.len());
            t.add(TraceLevel::Info, "outcome", outcome.label());
            t.pop();
        }
        Ok(outcome)
    }

    fn apply_rules(&self, top: &[Ranked]) -> MatchResult<Outcome> {
        let first = &top[0];

        // 1. one accepted taxon
        if top.iter().all(|r| r.accepted_id() == first.accepted_id()) {
            let distinct = top
                .iter()
                .any(|r| r.scored.candidate.id() != first.scored.candidate.id());
            return Ok(resolved(first, distinct.then_some(Issue::MultipleMatches)));
        }

        let accepted: Vec<&Ranked> = top
            .iter()
            .filter(|r| r.scored.candidate.status().is_accepted())
            .collect();

        // 2. accepted name shadowed by synonyms of other taxa
        if let [single] = accepted.as_slice() {
            if others(top, single).all(|r| r.scored.candidate.status().is_synonym()) {
                return Ok(resolved(single, Some(Issue::AcceptedAndSynonym)));
            }
        }

        // 3. synonym pointing at the parent or child of the other candidate
        let non_synonyms: Vec<&Ranked> = top
            .iter()
            .filter(|r| !r.scored.candidate.status().is_synonym())
            .collect();
        if let [single] = non_synonyms.as_slice() {
            let related = others(top, single).all(|r| {
                parent_or_child(r.resolution.accepted.as_ref(), single.resolution.accepted.as_ref())
            });
            if related {
                return Ok(resolved(single, Some(Issue::ParentChildSynonym)));
            }
        }

        // 4. accepted name shadowed by misapplications
        if let [single] = accepted.as_slice() {
            if others(top, single).all(|r| r.scored.candidate.status().is_misapplied()) {
                return Ok(resolved(single, Some(Issue::MisappliedName)));
            }
        }

        // 5. shared accepted ancestor
        if let Some(ancestor) = self.shared_ancestor(top)? {
            let mut issues = first.resolution.issues.clone();
            issues.insert(Issue::MultipleMatches);
            return Ok(Outcome::Resolved {
                matched: first.scored.clone(),
                accepted: ancestor,
                issues,
            });
        }

        // 6. homonym
        let kingdom = self.terms.kingdom;
        let mut kingdoms = Vec::new();
        for r in top {
            let value = r
                .resolution
                .accepted
                .value(kingdom)
                .or_else(|| r.scored.candidate.value(kingdom));
            if let Some(k) = value {
                if !kingdoms.iter().any(|existing: &String| existing == k) {
                    kingdoms.push(k.to_string());
                }
            }
        }
        Ok(Outcome::Unresolved { kingdoms })
    }

    /// Nearest record within `ancestor_search_depth` parent steps of every
    /// accepted taxon (the accepted taxa themselves included)
    fn shared_ancestor(&self, top: &[Ranked]) -> MatchResult<Option<Arc<dyn Classifier>>> {
        let mut lineages: Vec<Vec<Arc<dyn Classifier>>> = Vec::with_capacity(top.len());
        for ranked in top {
            let mut lineage = vec![ranked.resolution.accepted.clone()];
            for _ in 0..self.settings.ancestor_search_depth {
                let Some(parent_id) = lineage.last().and_then(|c| c.parent_id().map(str::to_string)) else {
                    break;
                };
                match self.searcher.get(&parent_id)? {
                    Some(parent) => lineage.push(parent),
                    None => break,
                }
            }
            lineages.push(lineage);
        }

        let Some((first, rest)) = lineages.split_first() else {
            return Ok(None);
        };
        let shared = first.iter().find(|candidate| {
            candidate.status().is_accepted()
                && rest
                    .iter()
                    .all(|lineage| lineage.iter().any(|c| c.id() == candidate.id()))
        });
        Ok(shared.cloned())
    }
}
