//! Error types for Lockbox Core.

use thiserror::Error;

/// Core errors that can occur while handling records and hashes.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid hash: {0}")]
    InvalidHash(String),

    #[error("record hash mismatch: expected {expected}, got {actual}")]
    RecordHashMismatch { expected: String, actual: String },

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

impl From<hex::FromHexError> for CoreError {
    fn from(e: hex::FromHexError) -> Self {
        CoreError::InvalidHash(e.to_string())
    }
}
