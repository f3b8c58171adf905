//! Error types for docpilot.
//!
//! This module defines a unified error enum covering every failure category
//! in the pipeline: configuration, I/O, retrieval, generation, web search,
//! and the supporting knowledge/LLM plumbing.

use thiserror::Error;

/// Unified error type for docpilot.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// Errors are represented and propagated, never panicked on.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (fail fast, before the pipeline runs)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Embedding capability or vector index unreachable.
    /// Fatal for the turn: no local-context answer can be produced.
    #[error("Retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    /// Text-generation capability failed after the bounded retry.
    /// Fatal for the turn.
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// Web-search capability failed. Recoverable: the web-augmentation
    /// branch falls back to local-only generation instead of surfacing this.
    #[error("Web search failed: {0}")]
    WebSearchFailed(String),

    /// LLM provider transport errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Corpus index and ingestion errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

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
