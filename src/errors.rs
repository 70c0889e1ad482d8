//! Error types for stylerag
//!
//! Collaborator failures (embedding backend, vector index) are recovered
//! inside the retrieval engine; these variants only surface from
//! construction-time setup and corpus access.

use thiserror::Error;

/// Main error type for the retrieval system
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Corpus store errors
    #[error("Corpus read failed: {0}")]
    CorpusError(String),

    /// Embedding backend errors
    #[error("Embedding failed: {0}")]
    EmbeddingError(String),

    /// Vector index errors
    #[error("Vector index error: {0}")]
    VectorIndexError(String),

    /// Embedding model produced vectors of the wrong size
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic errors with context
    #[error("Retrieval error: {0}")]
    Generic(String),
}

/// Result type alias for retrieval operations
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Convert anyhow errors to RetrievalError
impl From<anyhow::Error> for RetrievalError {
    fn from(err: anyhow::Error) -> Self {
        RetrievalError::Generic(format!("{:#}", err))
    }
}
