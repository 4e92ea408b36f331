//! Candidate-side record access

use crate::network::{ObservableId, Signature};
use crate::parameters::Parameters;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;
use taxmatch_common::TaxonomicStatus;

/// An indexed candidate record
///
/// Values are already normalised with the schema's normalisers. The
/// parameter cache is filled on first match and shared read-only afterwards.
pub trait Classifier: Send + Sync + fmt::Debug {
    fn id(&self) -> &str;

    /// Normalised values; the first is the base value
    fn values(&self, observable: ObservableId) -> &[String];

    fn status(&self) -> TaxonomicStatus;

    /// Accepted record for synonyms and misapplications
    fn accepted_id(&self) -> Option<&str>;

    /// Parent taxon in the reference classification
    fn parent_id(&self) -> Option<&str>;

    fn signature(&self) -> Signature;

    fn parameter_cache(&self) -> &OnceCell<Arc<Parameters>>;

    /// Persisted vector, when the index was loaded with one
    fn stored_parameters(&self) -> Option<&[f64]> {
        None
    }

    /// Name as written in the source corpus
    fn display_name(&self) -> Option<&str> {
        None
    }

    fn value(&self, observable: ObservableId) -> Option<&str> {
        self.values(observable).first().map(String::as_str)
    }

    fn has(&self, observable: ObservableId) -> bool {
        !self.values(observable).is_empty()
    }
}
