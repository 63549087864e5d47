//! Embedding-specific error types.

use midras_core::ValidationError;
use thiserror::Error;

/// Errors raised by embedders.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server error ({status}): {body}")]
    Server { status: u16, body: String },

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Expected {expected} embeddings, got {got}")]
    CountMismatch { expected: usize, got: usize },

    #[error("Model load failed: {0}")]
    ModelLoad(String),

    #[error("Tokenization error: {0}")]
    Tokenization(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl EmbeddingError {
    /// Returns `true` if the error is potentially transient and the operation could be retried.
    ///
    /// Nothing in this crate retries; the flag is for callers. `501 Not Implemented` and
    /// `505 HTTP Version Not Supported` are permanent and never retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Server { status, .. } => !matches!(status, 501 | 505),
            _ => false,
        }
    }

    /// Returns `true` for errors caused by the caller's input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<image::ImageError> for EmbeddingError {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err.to_string())
    }
}
