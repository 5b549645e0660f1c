//! Error types for the envelope and sharing protocol.
//!
//! Every cryptographic failure is fail-closed: callers get one of these
//! variants and never a partially decrypted value. Messages never contain
//! key material.

use lockbox_core::CoreError;
use thiserror::Error;

/// Errors that can occur during envelope and sharing operations.
#[derive(Debug, Error)]
pub enum PermsError {
    /// No usable key: the key pair is not loaded, the caller holds no
    /// wrapped key for the resource, or the record lacks its wrapped key.
    #[error("key unavailable: {0}")]
    KeyUnavailable(String),

    /// The recipient public key is malformed.
    #[error("encapsulation failed: {0}")]
    Encapsulation(String),

    /// KEM decapsulation failed, or the recovered secret did not unwrap
    /// the symmetric key.
    #[error("decapsulation mismatch")]
    DecapsulationMismatch,

    /// AEAD authentication failed: the ciphertext or nonce was altered.
    #[error("authentication tag verification failed")]
    AuthTagVerification,

    /// The record decrypted, but its recomputed hash differs from the
    /// stored one.
    #[error("record integrity mismatch: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    /// Plaintext or wire codec failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The AEAD refused to encrypt.
    #[error("encryption error: {0}")]
    Encryption(String),
}

impl PermsError {
    /// Whether this error indicates altered or corrupted data, as opposed
    /// to missing keys or malformed input.
    pub fn is_tamper(&self) -> bool {
        matches!(
            self,
            PermsError::DecapsulationMismatch
                | PermsError::AuthTagVerification
                | PermsError::IntegrityMismatch { .. }
        )
    }
}

impl From<CoreError> for PermsError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::RecordHashMismatch { expected, actual } => {
                PermsError::IntegrityMismatch { expected, actual }
            }
            CoreError::InvalidHash(msg)
            | CoreError::EncodingError(msg)
            | CoreError::DecodingError(msg) => PermsError::Serialization(msg),
        }
    }
}

impl From<hex::FromHexError> for PermsError {
    fn from(e: hex::FromHexError) -> Self {
        PermsError::Serialization(format!("invalid hex: {}", e))
    }
}

/// Result type for envelope and sharing operations.
pub type Result<T> = std::result::Result<T, PermsError>;
