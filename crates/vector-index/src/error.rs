//! Error types for vector index operations.

use midras_core::ValidationError;
use thiserror::Error;

/// Errors specific to vector index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Index not found: {0}")]
    NotFound(String),

    #[error("Index already exists: {0}")]
    AlreadyExists(String),

    #[error("Vector dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Backend error: {0}")]
    Backend(String),
}

impl IndexError {
    /// Returns `true` if the error is potentially transient and the operation could be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(feature = "qdrant")]
impl From<qdrant_client::QdrantError> for IndexError {
    /// Missing and duplicate collections keep their kind; qdrant's message is kept as-is.
    fn from(err: qdrant_client::QdrantError) -> Self {
        use qdrant_client::QdrantError;
        use tonic::Code;

        match err {
            QdrantError::ResponseError { status } => match status.code() {
                Code::NotFound => Self::NotFound(status.message().to_owned()),
                Code::AlreadyExists => Self::AlreadyExists(status.message().to_owned()),
                _ => Self::Backend(status.to_string()),
            },
            other => Self::Backend(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // === Display Tests ===

    #[test]
    fn not_found_displays_name() {
        let err = IndexError::NotFound("docs".into());
        assert_eq!(err.to_string(), "Index not found: docs");
    }

    #[test]
    fn already_exists_displays_name() {
        let err = IndexError::AlreadyExists("docs".into());
        assert_eq!(err.to_string(), "Index already exists: docs");
    }

    #[test]
    fn dimension_mismatch_displays_sizes() {
        let err = IndexError::DimensionMismatch {
            expected: 128,
            got: 3,
        };
        assert_eq!(
            err.to_string(),
            "Vector dimension mismatch: expected 128, got 3"
        );
    }

    #[test]
    fn validation_wraps_core_error() {
        let err = IndexError::from(ValidationError::InvalidLimit);
        assert_eq!(
            err.to_string(),
            "Invalid input: Result limit must be greater than zero"
        );
    }

    // === Retryable Tests ===

    #[test]
    fn backend_error_is_retryable() {
        assert!(IndexError::Backend("timeout".into()).is_retryable());
    }

    #[test]
    fn not_found_is_not_retryable() {
        let err = IndexError::NotFound("id".into());
        assert!(!err.is_retryable());
        assert!(err.is_not_found());
    }

    #[test]
    fn validation_is_not_retryable() {
        assert!(!IndexError::from(ValidationError::InvalidLimit).is_retryable());
    }

    // === Qdrant Conversion Tests ===

    #[cfg(feature = "qdrant")]
    fn response_error(status: tonic::Status) -> IndexError {
        IndexError::from(qdrant_client::QdrantError::ResponseError { status })
    }

    #[cfg(feature = "qdrant")]
    #[test]
    fn missing_collection_is_not_found() {
        let err = response_error(tonic::Status::not_found("Collection `docs` doesn't exist!"));
        assert!(err.is_not_found());
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "Index not found: Collection `docs` doesn't exist!");
    }

    #[cfg(feature = "qdrant")]
    #[test]
    fn duplicate_collection_is_already_exists() {
        let err = response_error(tonic::Status::already_exists(
            "Collection `docs` already exists!",
        ));
        assert!(matches!(err, IndexError::AlreadyExists(ref m) if m.contains("docs")));
        assert!(!err.is_retryable());
    }

    #[cfg(feature = "qdrant")]
    #[test]
    fn unavailable_stays_retryable_backend_error() {
        let err = response_error(tonic::Status::unavailable("connection refused"));
        assert!(matches!(err, IndexError::Backend(ref m) if m.contains("connection refused")));
        assert!(err.is_retryable());
    }
}
