//! Error types for ideaforge operations.
//!
//! Defines error types for all major subsystems:
//! - Batch coordination (conflicts, fatal setup conditions)
//! - LLM API interactions
//! - Persistent store access
//! - Corpus loading
//! - Report synthesis
//!
//! Per-unit failures (one pattern, one scope) are deliberately *not* errors
//! at this level: they are recorded on the batch or report row and never
//! abort the run that produced them.

use thiserror::Error;

/// Errors that can occur during batch coordination.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// A start/delete operation was rejected because a batch is running.
    /// Surfaced synchronously to the caller; never logged as a failure.
    #[error("An exploration batch is already running")]
    Conflict,

    /// No work units exist (empty catalog or empty corpus).
    #[error("Fatal setup error: {0}")]
    FatalSetup(String),

    /// The referenced batch does not exist.
    #[error("Batch '{0}' not found")]
    BatchNotFound(uuid::Uuid),

    /// The batch is not in a state that allows the requested transition.
    #[error("Batch is '{status}', expected 'running'")]
    InvalidState { status: String },

    /// Persistent store failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API base URL: IDEAFORGE_API_BASE environment variable not set")]
    MissingApiBase,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("LLM returned an empty response")]
    EmptyResponse,

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),
}

/// Errors that can occur during persistent store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(#[from] sqlx::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// Errors that can occur while loading the document corpus.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Corpus directory '{0}' does not exist")]
    MissingDirectory(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur during the execution engine's own bookkeeping.
///
/// Pattern-level generation failures are recorded on the batch row instead;
/// only failures of the bookkeeping itself surface here.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors that can occur during report synthesis bookkeeping.
///
/// A scope exhausting every retry budget marks only that scope's report
/// `failed`; it does not surface here.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinator_error_display() {
        let err = CoordinatorError::Conflict;
        assert!(err.to_string().contains("already running"));

        let err = CoordinatorError::FatalSetup("empty catalog".to_string());
        assert!(err.to_string().contains("empty catalog"));

        let err = CoordinatorError::InvalidState {
            status: "completed".to_string(),
        };
        assert!(err.to_string().contains("completed"));
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::ApiError {
            code: 429,
            message: "rate limited".to_string(),
        };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("rate limited"));

        let err = LlmError::ParseError("bad json".to_string());
        assert!(err.to_string().contains("bad json"));
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::NotFound("batch xyz".to_string());
        assert!(err.to_string().contains("batch xyz"));
    }
}
