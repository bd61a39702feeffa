//! Error types for span evaluation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom error.
pub type Result<T> = std::result::Result<T, SpanEvalError>;

/// Errors that can occur while scoring or driving an evaluation.
///
/// Degenerate inputs (no gold spans, empty candidate text, text without any
/// sentence) are never errors; the metrics return their fallback values.
#[derive(Error, Debug)]
pub enum SpanEvalError {
    /// Error reading or writing files.
    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error during serialization/deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The dataset path does not exist.
    #[error("Dataset not found at '{0}'")]
    DatasetNotFound(PathBuf),

    /// The dataset file parsed but its contents are unusable.
    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The embedding provider failed while embedding a batch.
    #[error("Embedding provider error: {0}")]
    Embedding(String),

    /// The embedding provider could not be initialized.
    #[error("Failed to load embedding model: {0}")]
    ModelLoad(String),

    /// Two vectors that must share a dimension do not.
    #[error("Embedding dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// The provider returned a different number of vectors than it was given texts.
    #[error("Embedding provider returned {found} vectors for {expected} inputs")]
    EmbeddingCount { expected: usize, found: usize },
}

impl SpanEvalError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for SpanEvalError {
    fn from(err: serde_json::Error) -> Self {
        SpanEvalError::Serialization(err.to_string())
    }
}
