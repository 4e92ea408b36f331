//! Synonym to accepted resolution

use crate::error::SearchError;
use crate::model::Classifier;
use crate::services::Searcher;
use std::sync::Arc;
use taxmatch_common::{Issue, IssueSet};
use tracing::warn;

/// Where a candidate's accepted links lead
#[derive(Debug, Clone)]
pub struct Resolution {
    pub accepted: Arc<dyn Classifier>,
    /// Status flags of the matched record plus link anomalies
    pub issues: IssueSet,
    /// Links revisit a record or exceed the depth limit
    pub looped: bool,
}

/// Follow accepted links from `candidate` until an accepted record
///
/// A dangling link keeps the last record reached as its own accepted record.
/// Synonyms and misapplied names with no link at all count as dangling.
pub fn resolve_accepted(
    searcher: &dyn Searcher,
    candidate: &Arc<dyn Classifier>,
    max_depth: usize,
) -> Result<Resolution, SearchError> {
    let mut issues = IssueSet::new();
    if let Some(issue) = candidate.status().issue() {
        issues.insert(issue);
    }

    let mut current = candidate.clone();
    let mut visited = vec![candidate.id().to_string()];

    for _ in 0..max_depth {
        if current.status().is_accepted() {
            return Ok(Resolution {
                accepted: current,
                issues,
                looped: false,
            });
        }
        let Some(next_id) = current.accepted_id().map(str::to_string) else {
            let status = current.status();
            if status.is_synonym() || status.is_misapplied() {
                warn!(candidate = %current.id(), "Synonym without an accepted record");
                issues.insert(Issue::AcceptedNotFound);
            }
            return Ok(Resolution {
                accepted: current,
                issues,
                looped: false,
            });
        };
        if visited.contains(&next_id) {
            warn!(candidate = %candidate.id(), at = %next_id, "Synonym loop");
            issues.insert(Issue::SynonymLoop);
            return Ok(Resolution {
                accepted: current,
                issues,
                looped: true,
            });
        }
        match searcher.get(&next_id)? {
            Some(next) => {
                visited.push(next_id);
                current = next;
            }
            None => {
                warn!(candidate = %current.id(), accepted = %next_id, "Accepted record not found");
                issues.insert(Issue::AcceptedNotFound);
                return Ok(Resolution {
                    accepted: current,
                    issues,
                    looped: false,
                });
            }
        }
    }

    if current.status().is_accepted() {
        return Ok(Resolution {
            accepted: current,
            issues,
            looped: false,
        });
    }
    warn!(candidate = %candidate.id(), depth = max_depth, "Synonym chain exceeds depth limit");
    issues.insert(Issue::SynonymLoop);
    Ok(Resolution {
        accepted: current,
        issues,
        looped: true,
    })
}
