//! Error types for the tutor workspace.
//!
//! This module defines a unified error enum covering every failure category
//! of the course assistant. Conditions that are a normal part of answering a
//! question (an unknown course name, a search with no hits) are *not* errors
//! and never appear here; they are modelled as ordinary values by the crates
//! that produce them.

use thiserror::Error;

/// Unified error type for the tutor workspace.
///
/// All fallible functions return `Result<T, AppError>`.
/// Errors are represented and propagated, never panicked on.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The language model call failed or produced an unusable tool-call payload.
    /// Fatal to the current turn.
    #[error("Generation error: {0}")]
    Generation(String),

    /// The vector index or embedding backend is unreachable or corrupted.
    /// Fatal to the current turn.
    #[error("Search backend error: {0}")]
    SearchBackend(String),

    /// A document could not be turned into a course during ingestion.
    /// The document is skipped; ingestion of the remaining documents proceeds.
    #[error("Ingest error: {0}")]
    Ingest(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error aborts the whole query turn.
    ///
    /// Ingest and configuration failures happen outside a turn and are
    /// reported separately.
    pub fn is_turn_fatal(&self) -> bool {
        matches!(self, AppError::Generation(_) | AppError::SearchBackend(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
