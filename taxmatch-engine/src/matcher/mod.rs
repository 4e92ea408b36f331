//! Classification matcher
//!
//! Orchestrates a match: analysis, the identifier shortcut, candidate
//! retrieval and scoring, relaxation, disambiguation, synonym resolution,
//! the genus-level fallback and fidelity. "No match" and "unresolved homonym"
//! are ordinary invalid [`Match`] results; only malformed input and
//! collaborator failures are errors.

pub mod disambiguation;
pub mod fidelity;
pub mod relaxation;
pub mod scoring;
pub mod synonyms;

pub use disambiguation::{Outcome, Ranked};
pub use fidelity::fidelity;
pub use relaxation::Assessment;
pub use scoring::Scored;
pub use synonyms::{resolve_accepted, Resolution};

use crate::config::MatcherSettings;
use crate::error::{MatchResult, SchemaError};
use crate::inference::Inferencer;
use crate::model::{Classification, Classifier, Match};
use crate::network::{CompiledNetwork, Schema, TaxonTerms};
use crate::parameters::ParameterBuilder;
use crate::services::{looks_like_identifier, taxon_soundex, Analyser, ParameterAnalyser, Searcher};
use crate::trace::{Trace, TraceLevel};
use std::sync::Arc;
use taxmatch_common::config::BuilderConfig;
use taxmatch_common::{Issue, IssueSet};
use tracing::debug;

/// Matches queries against a searchable corpus
///
/// Shareable across threads: all state is read-only apart from the
/// candidates' parameter caches, which fill once.
pub struct ClassificationMatcher {
    network: Arc<CompiledNetwork>,
    terms: TaxonTerms,
    inferencer: Inferencer,
    builder: ParameterBuilder,
    searcher: Arc<dyn Searcher>,
    analyser: Arc<dyn Analyser>,
    settings: MatcherSettings,
}

impl ClassificationMatcher {
    pub fn new(
        network: Arc<CompiledNetwork>,
        searcher: Arc<dyn Searcher>,
        analyser: Arc<dyn Analyser>,
        statistics: Arc<dyn ParameterAnalyser>,
        settings: MatcherSettings,
        builder_config: &BuilderConfig,
    ) -> Result<Self, SchemaError> {
        let terms = TaxonTerms::resolve(network.schema())?;
        Ok(Self {
            inferencer: Inferencer::new(network.clone()),
            builder: ParameterBuilder::new(network.clone(), statistics, builder_config),
            network,
            terms,
            searcher,
            analyser,
            settings,
        })
    }

    pub fn schema(&self) -> &Schema {
        self.network.schema()
    }

    pub fn terms(&self) -> &TaxonTerms {
        &self.terms
    }

    pub fn settings(&self) -> &MatcherSettings {
        &self.settings
    }

    /// Match one query
    ///
    /// Errors only for input the analyser rejects (such as a bare rank
    /// marker) or for search and inference failures.
    pub fn find_match(&self, query: Classification) -> MatchResult<Match> {
        let mut trace = self.settings.trace_level.map(Trace::new);
        let analysed = self.analyser.analyse(query)?;

        if let Some(t) = trace.as_mut() {
            t.push(TraceLevel::Summary, "match");
            if let Some(name) = analysed.get(self.terms.scientific_name) {
                t.add(TraceLevel::Summary, "name", name);
            }
        }

        let mut result = match self.match_identifier(&analysed, trace.as_mut())? {
            Some(found) => found,
            None => self.match_name(analysed, trace.as_mut())?,
        };
        self.analyser.after_match(&mut result);

        debug!(
            matched = result.matched().map(|m| m.id()).unwrap_or_default(),
            probability = result.probability(),
            fidelity = result.fidelity(),
            issues = result.issues().len(),
            "Match complete"
        );
        if let Some(t) = trace.as_mut() {
            t.add(TraceLevel::Summary, "valid", result.is_valid());
            if let Some(matched) = result.matched() {
                t.add(TraceLevel::Summary, "matched", matched.id());
            }
            t.add(TraceLevel::Summary, "probability", result.probability());
            t.add(TraceLevel::Summary, "fidelity", result.fidelity());
            t.add_with(TraceLevel::Summary, "issues", || {
                result
                    .issues()
                    .iter()
                    .map(|i| i.as_str())
                    .collect::<Vec<_>>()
            });
            t.pop();
        }
        Ok(result.with_trace(trace))
    }

    /// Direct lookup when the query carries an identifier
    ///
    /// Returns `None` when the query should go through name matching instead.
    fn match_identifier(
        &self,
        query: &Classification,
        trace: Option<&mut Trace>,
    ) -> MatchResult<Option<Match>> {
        let name = query.get(self.terms.scientific_name);
        let name_is_identifier = name.is_some_and(looks_like_identifier);
        let id = match (query.get(self.terms.taxon_id), name) {
            (Some(id), _) => id.trim(),
            (None, Some(name)) if name_is_identifier => name.trim(),
            _ => return Ok(None),
        };

        let Some(found) = self.searcher.get(id)? else {
            debug!(id, "Identifier not in index");
            if name.is_some() && !name_is_identifier {
                return Ok(None);
            }
            let mut issues = query.issues().clone();
            issues.insert(Issue::NoMatch);
            return Ok(Some(Match::invalid(query.clone(), issues)));
        };

        let resolution = resolve_accepted(
            self.searcher.as_ref(),
            &found,
            self.settings.max_synonym_depth,
        )?;
        if let Some(t) = trace {
            t.push(TraceLevel::Summary, "identifier");
            t.add(TraceLevel::Summary, "id", found.id());
            t.add(TraceLevel::Summary, "accepted", resolution.accepted.id());
            t.pop();
        }

        let mut issues = query.issues().clone();
        issues.merge(&resolution.issues);
        if resolution.looped {
            return Ok(Some(Match::invalid(query.clone(), issues)));
        }
        Ok(Some(Match::valid(
            found,
            resolution.accepted,
            1.0,
            1.0,
            issues,
            query.clone(),
        )))
    }

    fn match_name(&self, analysed: Classification, mut trace: Option<&mut Trace>) -> MatchResult<Match> {
        let schema = self.schema();
        let original = analysed.normalize(schema);
        let mut assessment = self.relax(original.clone(), trace.as_deref_mut())?;

        let mut higher_order = false;
        if matches!(assessment.outcome, Outcome::NoMatch) {
            if let Some(genus_query) = self.genus_query(&assessment.query) {
                if let Some(t) = trace.as_deref_mut() {
                    t.push(TraceLevel::Info, "higherOrder");
                }
                let attempt = self.relax(genus_query, trace.as_deref_mut())?;
                if let Some(t) = trace.as_deref_mut() {
                    t.add(TraceLevel::Info, "resolved", attempt.outcome.is_resolved());
                    t.pop();
                }
                if attempt.outcome.is_resolved() {
                    assessment = attempt;
                    higher_order = true;
                }
            }
        }

        let Assessment {
            mut query, outcome, ..
        } = assessment;
        match outcome {
            Outcome::Resolved {
                matched,
                accepted,
                issues: resolution_issues,
            } => {
                if higher_order {
                    query.add_issue(Issue::HigherOrderMatch);
                }
                if self.misspelled(&query, matched.candidate.as_ref()) {
                    query.add_issue(Issue::MisspelledScientificName);
                }
                let mut issues = query.issues().clone();
                issues.merge(&resolution_issues);
                let fidelity = fidelity(schema, &original, &query, matched.candidate.as_ref());
                Ok(Match::valid(
                    matched.candidate.clone(),
                    accepted,
                    matched.posterior(),
                    fidelity,
                    issues,
                    query,
                ))
            }
            Outcome::Unresolved { kingdoms } => {
                for kingdom in &kingdoms {
                    query.add_hint(self.terms.kingdom, kingdom);
                }
                Ok(Match::invalid(
                    query.clone(),
                    with_issue(query.issues(), Issue::UnresolvedHomonym),
                ))
            }
            Outcome::Looped { issues: loop_issues } => {
                let mut issues = with_issue(query.issues(), Issue::SynonymLoop);
                issues.merge(&loop_issues);
                Ok(Match::invalid(query, issues))
            }
            Outcome::NoMatch => Ok(Match::invalid(
                query.clone(),
                with_issue(query.issues(), Issue::NoMatch),
            )),
        }
    }

    /// The query restated at genus level, when it names something below genus
    fn genus_query(&self, query: &Classification) -> Option<Classification> {
        let terms = &self.terms;
        let genus = query.get(terms.genus)?.to_string();
        if query.get(terms.scientific_name) == Some(genus.as_str()) {
            return None;
        }
        let mut restated = query.clone();
        restated.set(terms.scientific_name, &genus);
        restated.set(terms.soundex_scientific_name, &taxon_soundex(&genus));
        for dropped in [
            terms.specific_epithet,
            terms.infraspecific_epithet,
            terms.scientific_name_authorship,
            terms.taxon_rank,
        ] {
            restated.remove(dropped);
        }
        debug!(genus = %genus, "Retrying at genus level");
        Some(restated)
    }

    fn misspelled(&self, query: &Classification, matched: &dyn Classifier) -> bool {
        let name = self.terms.scientific_name;
        match (query.get(name), matched.value(name)) {
            (Some(wanted), Some(found)) => wanted != found,
            _ => false,
        }
    }
}

fn with_issue(issues: &IssueSet, issue: Issue) -> IssueSet {
    let mut issues = issues.clone();
    issues.insert(issue);
    issues
}
