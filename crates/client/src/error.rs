//! Top-level error type for the Midras client.

use midras_embedding::EmbeddingError;
use midras_vector_index::IndexError;
use thiserror::Error;

/// Errors raised by [`crate::Midras`] operations.
#[derive(Debug, Error)]
pub enum MidrasError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Embedder returned no embedding for the query")]
    EmptyEmbedding,
}

impl MidrasError {
    /// Returns `true` if the error is potentially transient and the operation could be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Embedding(e) => e.is_retryable(),
            Self::Index(e) => e.is_retryable(),
            Self::Runtime(_) | Self::EmptyEmbedding => false,
        }
    }

    /// Returns `true` for errors caused by the caller's input.
    pub fn is_validation(&self) -> bool {
        match self {
            Self::Embedding(e) => e.is_validation(),
            Self::Index(e) => matches!(e, IndexError::Validation(_)),
            Self::Runtime(_) | Self::EmptyEmbedding => false,
        }
    }
}
