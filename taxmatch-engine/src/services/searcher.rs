//! Candidate retrieval

use crate::error::SearchError;
use crate::model::{Classification, Classifier};
use std::sync::Arc;

/// Read-only candidate index; must tolerate concurrent queries
pub trait Searcher: Send + Sync {
    /// Candidates for a normalised query; may be empty
    fn search(&self, query: &Classification) -> Result<Vec<Arc<dyn Classifier>>, SearchError>;

    /// Exact record lookup by identifier
    fn get(&self, id: &str) -> Result<Option<Arc<dyn Classifier>>, SearchError>;
}
