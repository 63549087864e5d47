//! Validation errors raised at the contract boundary, before any backend is called.

use thiserror::Error;

use crate::types::Mode;

/// Input rejected by the client before it reaches an embedder or index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyBatch(&'static str),

    #[error("Empty input at position {0}")]
    EmptyInput(usize),

    #[error("Result limit must be greater than zero")]
    InvalidLimit,

    #[error("Batch size must be greater than zero")]
    InvalidBatchSize,

    #[error("Mode '{0}' is not supported by this backend")]
    UnsupportedMode(Mode),
}

/// Fails unless `items` is non-empty.
pub fn require_non_empty<T>(items: &[T], what: &'static str) -> Result<(), ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::EmptyBatch(what));
    }
    Ok(())
}

/// Fails on an empty batch or on any empty string inside it.
pub fn require_texts<S: AsRef<str>>(texts: &[S], what: &'static str) -> Result<(), ValidationError> {
    require_non_empty(texts, what)?;
    match texts.iter().position(|t| t.as_ref().is_empty()) {
        Some(pos) => Err(ValidationError::EmptyInput(pos)),
        None => Ok(()),
    }
}

/// Fails when a result limit is zero.
pub fn require_limit(k: usize) -> Result<(), ValidationError> {
    if k == 0 {
        return Err(ValidationError::InvalidLimit);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // === Display Tests ===

    #[test]
    fn empty_batch_displays_subject() {
        let err = ValidationError::EmptyBatch("queries");
        assert_eq!(err.to_string(), "queries must not be empty");
    }

    #[test]
    fn empty_input_displays_position() {
        assert_eq!(
            ValidationError::EmptyInput(2).to_string(),
            "Empty input at position 2"
        );
    }

    #[test]
    fn unsupported_mode_displays_mode() {
        let err = ValidationError::UnsupportedMode(Mode::Local);
        assert_eq!(err.to_string(), "Mode 'local' is not supported by this backend");
    }

    // === Helpers ===

    #[test]
    fn require_non_empty_rejects_empty_slice() {
        let empty: [u8; 0] = [];
        assert_eq!(
            require_non_empty(&empty, "images"),
            Err(ValidationError::EmptyBatch("images"))
        );
        assert!(require_non_empty(&[1], "images").is_ok());
    }

    #[test]
    fn require_texts_rejects_blank_entry() {
        assert_eq!(
            require_texts(&["a", "", "c"], "queries"),
            Err(ValidationError::EmptyInput(1))
        );
        assert!(require_texts(&["a", "b"], "queries").is_ok());
    }

    #[test]
    fn require_limit_rejects_zero() {
        assert_eq!(require_limit(0), Err(ValidationError::InvalidLimit));
        assert!(require_limit(1).is_ok());
    }
}
