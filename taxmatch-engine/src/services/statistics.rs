//! Corpus statistics consumed by the parameter builder

use crate::model::Classifier;
use crate::network::ObservableId;

/// An event about a corpus record, relative to a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The record is (or is not) the candidate
    Hypothesis { positive: bool },
    /// The record's value equals (or differs from) the candidate's value
    Value {
        observable: ObservableId,
        positive: bool,
    },
    /// The record populates the observable
    Present { observable: ObservableId },
}

/// Answers prior and conditional probabilities from a training corpus
///
/// `None` means the corpus cannot support the estimate; the builder then
/// falls back to its configured default.
pub trait ParameterAnalyser: Send + Sync {
    fn compute_prior(&self, candidate: &dyn Classifier) -> Option<f64>;

    /// p(event | all of `given`)
    fn compute_conditional(
        &self,
        candidate: &dyn Classifier,
        event: Observation,
        given: &[Observation],
    ) -> Option<f64>;
}
