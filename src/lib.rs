//! ideaforge: Batch concept exploration and report synthesis.
//!
//! This library explores every (audience segment, opportunity theme) pattern
//! of a catalog against a document corpus, scores the generated concepts, and
//! synthesizes per-segment and overview reports from the results.

// Core modules
pub mod catalog;
pub mod cli;
pub mod corpus;
pub mod error;
pub mod llm;
pub mod model;
pub mod pipeline;
pub mod prompts;
pub mod scoring;
pub mod store;

// Re-export commonly used error types
pub use error::{CoordinatorError, CorpusError, EngineError, LlmError, StoreError, SynthesisError};
