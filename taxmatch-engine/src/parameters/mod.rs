//! Probability tables: layout, persistence and the offline builder

pub mod builder;
pub mod store;
pub mod table;

pub use builder::{BuildReport, BuiltParameters, ParameterBuilder};
pub use store::{ParameterStore, StoredParameters};
pub use table::{NodeParameters, Parameters};
