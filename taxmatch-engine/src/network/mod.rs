//! Observable network: schema, signatures and the compiled signature table

pub mod compiler;
pub mod schema;
pub mod signature;
pub mod taxonomy;

pub use compiler::{CompiledNetwork, CompiledSignature, Edge, Node, Slot};
pub use schema::{
    Multiplicity, Normalizer, Observable, ObservableDef, ObservableId, ObservableType, Schema,
    SchemaBuilder, MAX_OPTIONAL,
};
pub use signature::Signature;
pub use taxonomy::{taxonomic_schema, TaxonTerms};
