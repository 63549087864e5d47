//! HTTP-facing error type.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use midras_embedding::EmbeddingError;
use thiserror::Error;

/// Errors returned by request handlers and the server loop.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error("Invalid multipart body: {0}")]
    Multipart(String),

    #[error("Missing multipart field: {0}")]
    MissingField(&'static str),

    #[error("No page rasterizer configured; PDF embedding is unavailable")]
    NoRasterizer,

    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Embedding(e) => match e {
                EmbeddingError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                EmbeddingError::Image(_) | EmbeddingError::Pdf(_) => StatusCode::BAD_REQUEST,
                EmbeddingError::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Multipart(_) | Self::MissingField(_) => StatusCode::BAD_REQUEST,
            Self::NoRasterizer => StatusCode::NOT_IMPLEMENTED,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns `true` if the error is potentially transient and the operation could be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Embedding(e) => e.is_retryable(),
            Self::Io(_) => true,
            _ => false,
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for ServerError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        Self::Multipart(err.body_text())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %message, "request rejected");
        }
        (status, message).into_response()
    }
}
