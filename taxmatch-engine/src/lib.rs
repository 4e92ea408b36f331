//! taxmatch-engine library interface
//!
//! Bayesian taxon name matching: an observable network compiled per
//! signature, per-candidate parameter tables, the inferencer, and the
//! classification matcher that scores, relaxes and disambiguates queries.

pub mod config;
pub mod error;
pub mod inference;
pub mod matcher;
pub mod model;
pub mod network;
pub mod parameters;
pub mod services;
pub mod trace;

pub use crate::config::MatcherSettings;
pub use crate::error::{
    BuildError, InferenceError, MatchError, MatchInputError, MatchResult, SchemaError, SearchError,
};
pub use crate::matcher::ClassificationMatcher;
pub use crate::model::{Classification, Classifier, Match, MatchSummary};
pub use crate::trace::{Trace, TraceLevel, TraceNode};
