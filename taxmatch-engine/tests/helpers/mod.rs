//! Test Helper Utilities
//!
//! Shared fixtures for testing taxmatch-engine

#![allow(dead_code)]

pub mod corpus;
pub mod log_capture;

pub use corpus::{
    ambiguous_corpus, build_matcher, build_matcher_with, build_matcher_with_store, query,
    reference_corpus,
};
pub use log_capture::LogCapture;
