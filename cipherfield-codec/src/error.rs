//! Codec error types.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding stored values.
///
/// Construction-time failures (`UnknownCipher`, `UnknownMode`,
/// `InvalidKeyLength`) abort initialization; the rest are per-value read
/// failures and leave other values untouched.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unknown cipher: {0}")]
    UnknownCipher(String),

    #[error("unknown cipher mode: {0}")]
    UnknownMode(String),

    #[error("invalid key length for {cipher}: {actual} bytes")]
    InvalidKeyLength { cipher: &'static str, actual: usize },

    #[error("malformed value tag: {0}")]
    MalformedTag(String),

    #[error("payload is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("payload length {len} does not fit the {block_size}-byte block size")]
    PayloadLength { len: usize, block_size: usize },

    #[error("IV length mismatch: expected {expected}, got {actual}")]
    InvalidIvLength { expected: usize, actual: usize },

    #[error("no terminator byte in decrypted data (tampered or wrong key)")]
    MissingTerminator,
}
