//! Collaborators consumed by the matcher and builder, with reference implementations
//!
//! - [`Searcher`]: candidate retrieval
//! - [`Analyser`]: query preparation and post-match annotation
//! - [`ParameterAnalyser`]: corpus statistics for the parameter builder
//!
//! [`MemoryIndex`] implements `Searcher` and `ParameterAnalyser` over a JSON
//! corpus; [`NameAnalyser`] implements `Analyser`.

pub mod analyser;
pub mod memory_index;
pub mod searcher;
pub mod soundex;
pub mod statistics;

pub use analyser::{looks_like_identifier, parse_name, Analyser, NameAnalyser, ParsedName};
pub use memory_index::{FieldValue, MemoryIndex, TaxonEntry, TaxonRecord};
pub use searcher::Searcher;
pub use soundex::taxon_soundex;
pub use statistics::{Observation, ParameterAnalyser};
