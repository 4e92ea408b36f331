//! Error types for taxmatch-engine
//!
//! Only structurally invalid input and infrastructure failure are errors.
//! "No confident match" and "unresolved homonym" are ordinary outcomes and are
//! returned as an invalid `Match` with issues.

use thiserror::Error;

/// Malformed network definition
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Duplicate observable: {0}")]
    DuplicateObservable(String),

    #[error("Observable {child} depends on unknown observable {parent}")]
    UnknownParent { child: String, parent: String },

    #[error("Observable {0} declares more than one conditioning parent")]
    MultipleParents(String),

    #[error("Dependency cycle through observable {0}")]
    Cycle(String),

    #[error("Schema has no hypothesis observable")]
    MissingHypothesis,

    #[error("Hypothesis observable {0} cannot depend on another observable")]
    HypothesisWithParent(String),

    #[error("Too many optional observables: {count} (limit {limit})")]
    TooManyOptional { count: usize, limit: usize },

    #[error("Unknown observable: {0}")]
    UnknownObservable(String),
}

/// Corpus could not support a parameter; degraded to the configured default
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuildError {
    #[error("Insufficient corpus for {slot} of candidate {candidate}")]
    InsufficientCorpus { candidate: String, slot: String },

    #[error("No prior available for candidate {0}")]
    MissingPrior(String),
}

/// Arithmetic precondition violated; indicates a schema/index mismatch
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InferenceError {
    #[error("Signature {0} has not been compiled")]
    SignatureNotFound(String),

    #[error("Parameter vector for signature {signature} has length {actual}, expected {expected}")]
    ParameterLength {
        signature: String,
        expected: usize,
        actual: usize,
    },

    #[error("Parameters compiled for signature {parameters} used with signature {signature}")]
    SignatureMismatch {
        signature: String,
        parameters: String,
    },

    #[error("Parameter {position} for signature {signature} is {value}, outside (0, 1)")]
    InvalidProbability {
        signature: String,
        position: usize,
        value: f64,
    },

    #[error("Evidence mass is zero for signature {0}")]
    DegenerateEvidence(String),
}

/// Query cannot be matched as supplied
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MatchInputError {
    #[error("Name is a bare rank marker: {0}")]
    BareRankMarker(String),

    #[error("Query has no scientific name or identifier")]
    EmptyName,

    #[error("Unparseable name: {0}")]
    Unparseable(String),
}

/// Failure propagated from the search collaborator
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Index unavailable: {0}")]
    Unavailable(String),

    #[error("Index I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt index record {id}: {reason}")]
    CorruptRecord { id: String, reason: String },
}

/// Umbrella error returned by the matcher
#[derive(Debug, Error)]
pub enum MatchError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Input(#[from] MatchInputError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("Common error: {0}")]
    Common(#[from] taxmatch_common::Error),
}

/// Result type for matcher operations
pub type MatchResult<T> = Result<T, MatchError>;
