//! Error types for the askdesk retrieval service.
//!
//! This module defines a unified error enum that covers all failure
//! categories in the service: configuration, I/O, ingestion, index,
//! embedding, and generation errors.

use thiserror::Error;

/// Unified error type for the askdesk retrieval service.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// We never panic — errors must be represented and propagated. Access
/// denials are deliberately NOT an error variant: they are ordinary
/// answers with zero sources, produced by the query engine.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document ingestion errors (a whole-batch failure; single bad
    /// files are logged and skipped instead)
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// Vector index storage and query errors
    #[error("Index error: {0}")]
    Index(String),

    /// Embedding provider errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Answer generation (LLM) errors, including deadline overruns
    #[error("Generation error: {0}")]
    Generation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
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
