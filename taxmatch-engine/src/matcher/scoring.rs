//! Candidate retrieval and scoring

use crate::error::{InferenceError, MatchResult};
use crate::inference::{Evidence, Inference};
use crate::matcher::ClassificationMatcher;
use crate::model::{Classification, Classifier};
use crate::parameters::Parameters;
use crate::trace::{Trace, TraceLevel};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

/// A retained candidate and its posterior
#[derive(Debug, Clone)]
pub struct Scored {
    pub candidate: Arc<dyn Classifier>,
    pub evidence: Evidence,
    pub inference: Inference,
}

impl Scored {
    pub fn posterior(&self) -> f64 {
        self.inference.posterior
    }
}

impl ClassificationMatcher {
    /// Cached parameters for a candidate, loading or building them on first use
    pub(crate) fn parameters(&self, candidate: &dyn Classifier) -> Result<Arc<Parameters>, InferenceError> {
        candidate
            .parameter_cache()
            .get_or_try_init(|| {
                let compiled = self.network.get(candidate.signature())?;
                let parameters = match candidate.stored_parameters() {
                    Some(vector) => Parameters::load(compiled, vector.to_vec())?,
                    None => self.builder.build(candidate)?.parameters,
                };
                Ok::<_, InferenceError>(Arc::new(parameters))
            })
            .cloned()
    }

    /// Search, then score every candidate; keeps those at or above the
    /// possible threshold, best first
    pub(crate) fn score(
        &self,
        query: &Classification,
        mut trace: Option<&mut Trace>,
    ) -> MatchResult<Vec<Scored>> {
        let schema = self.network.schema();
        let candidates = self.searcher.search(query)?;

        let mut scored = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let evidence = Evidence::compute(schema, query, candidate.as_ref());
            let parameters = self.parameters(candidate.as_ref())?;

            if let Some(t) = trace.as_deref_mut() {
                t.push(TraceLevel::Summary, "candidate");
                t.add(TraceLevel::Summary, "id", candidate.id());
            }
            let inference = self
                .inferencer
                .probability(&evidence, &parameters, trace.as_deref_mut())?;
            if let Some(t) = trace.as_deref_mut() {
                t.pop();
            }

            debug!(
                candidate = %candidate.id(),
                posterior = inference.posterior,
                known = evidence.known(),
                "Scored candidate"
            );
            if inference.posterior >= self.settings.possible_threshold {
                scored.push(Scored {
                    candidate,
                    evidence,
                    inference,
                });
            }
        }

        scored.sort_by(|a, b| {
            b.posterior()
                .partial_cmp(&a.posterior())
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.candidate.id().cmp(b.candidate.id()))
        });
        Ok(scored)
    }
}
