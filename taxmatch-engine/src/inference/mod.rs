//! Evidence and posterior evaluation

pub mod evidence;
pub mod inferencer;

pub use evidence::{Evidence, EvidenceValue};
pub use inferencer::{Inference, Inferencer};
