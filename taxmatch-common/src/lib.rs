//! # taxmatch Common Library
//!
//! Shared code for the taxon name matching workspace:
//! - Error type and result alias
//! - TOML configuration (logging, index, matcher, builder sections)
//! - Configuration file resolution and logging initialisation
//! - Closed vocabularies: issues, ranks, taxonomic status, nomenclatural codes

pub mod config;
pub mod error;
pub mod issues;
pub mod rank;
pub mod vocab;

pub use error::{Error, Result};
pub use issues::{Issue, IssueSet};
pub use rank::Rank;
pub use vocab::{NomenclaturalCode, TaxonomicStatus};
