//! Query, candidate and result types

pub mod classification;
pub mod classifier;
pub mod match_result;

pub use classification::{Classification, ClassificationView};
pub use classifier::Classifier;
pub use match_result::{Match, MatchSummary};
