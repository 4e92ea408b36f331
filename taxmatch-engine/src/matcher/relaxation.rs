//! Query relaxation
//!
//! A query that does not resolve confidently is retried with optional
//! fields removed, one at a time, in the configured order. A removal is kept
//! only when it improves the best posterior or newly resolves the match, and
//! never when it turns a resolved match into an unresolved one.

use crate::error::MatchResult;
use crate::matcher::disambiguation::Outcome;
use crate::matcher::scoring::Scored;
use crate::matcher::ClassificationMatcher;
use crate::model::Classification;
use crate::trace::{Trace, TraceLevel};
use tracing::debug;

/// Smallest posterior gain that justifies dropping a field
const IMPROVEMENT_EPSILON: f64 = 1e-9;

/// One query state with its scored candidates and outcome
#[derive(Debug, Clone)]
pub struct Assessment {
    pub query: Classification,
    pub scored: Vec<Scored>,
    pub outcome: Outcome,
}

impl Assessment {
    pub fn best(&self) -> f64 {
        self.scored.first().map(Scored::posterior).unwrap_or(0.0)
    }
}

impl ClassificationMatcher {
    pub(crate) fn assess(
        &self,
        query: Classification,
        mut trace: Option<&mut Trace>,
    ) -> MatchResult<Assessment> {
        let scored = self.score(&query, trace.as_deref_mut())?;
        let outcome = self.disambiguate(&scored, trace)?;
        Ok(Assessment {
            query,
            scored,
            outcome,
        })
    }

    fn acceptable(&self, assessment: &Assessment) -> bool {
        assessment.outcome.is_resolved() && assessment.best() >= self.settings.acceptance_threshold
    }

    /// Assess `query`, then drop relaxable fields until the match is acceptable
    pub(crate) fn relax(
        &self,
        query: Classification,
        mut trace: Option<&mut Trace>,
    ) -> MatchResult<Assessment> {
        let schema = self.network.schema();
        let mut current = self.assess(query, trace.as_deref_mut())?;

        for &field in &self.settings.relaxation_order {
            if self.acceptable(&current) {
                break;
            }
            if !current.query.has(field) {
                continue;
            }
            let observable = schema.observable(field);

            let mut relaxed = current.query.clone();
            relaxed.remove(field);
            if let Some(issue) = observable.relaxation_issue {
                relaxed.add_issue(issue);
            }

            if let Some(t) = trace.as_deref_mut() {
                t.push(TraceLevel::Info, "relaxation");
                t.add(TraceLevel::Info, "removed", observable.name.as_str());
            }
            let attempt = self.assess(relaxed, trace.as_deref_mut())?;

            let loses_resolution = current.outcome.is_resolved() && !attempt.outcome.is_resolved();
            let improves = attempt.best() > current.best() + IMPROVEMENT_EPSILON;
            let newly_resolves = attempt.outcome.is_resolved() && !current.outcome.is_resolved();
            let keep = !loses_resolution && (improves || newly_resolves);

            if let Some(t) = trace.as_deref_mut() {
                t.add(TraceLevel::Info, "best", attempt.best());
                t.add(TraceLevel::Info, "kept", keep);
                t.pop();
            }
            debug!(
                field = %observable.name,
                before = current.best(),
                after = attempt.best(),
                keep,
                "Relaxation step"
            );
            if keep {
                current = attempt;
            }
        }
        Ok(current)
    }
}
