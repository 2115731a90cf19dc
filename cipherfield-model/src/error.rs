//! Typed-field error types.

use cipherfield_codec::CodecError;
use thiserror::Error;

/// Result type for typed-field operations.
pub type FieldResult<T> = Result<T, FieldError>;

/// Errors that can occur while converting typed values to and from their
/// stored form.
#[derive(Debug, Error)]
pub enum FieldError {
    /// Raised before any cipher work when a bounded value is too long.
    #[error("value longer than max allowed: {actual} > {max}")]
    PlaintextTooLong { actual: usize, max: usize },

    #[error("value type {actual} does not match field type {expected}")]
    KindMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("invalid date value: {0:?}")]
    InvalidDate(String),

    #[error("invalid numeric value: {0:?}")]
    InvalidNumber(String),

    #[error("stored text is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}
