//! Error types for the Lockbox facade.

use lockbox_core::CoreError;
use lockbox_perms::PermsError;
use lockbox_remote::RemoteError;
use lockbox_store::StoreError;
use thiserror::Error;

/// Errors that can occur during Lockbox operations.
#[derive(Debug, Error)]
pub enum LockboxError {
    /// Key handling, encryption or decryption failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] PermsError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Directory, share or integrity service error.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Record hashing or encoding error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Record not found.
    #[error("record not found: {0}")]
    RecordNotFound(String),

    /// Record is soft-deleted.
    #[error("record is deleted: {0}")]
    RecordDeleted(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A worker task panicked or was cancelled.
    #[error("task failed: {0}")]
    Task(String),
}

impl LockboxError {
    /// The underlying crypto error, looking through remote errors.
    pub fn crypto(&self) -> Option<&PermsError> {
        match self {
            LockboxError::Crypto(e) => Some(e),
            LockboxError::Remote(RemoteError::Perms(e)) => Some(e),
            _ => None,
        }
    }

    /// Whether this error indicates altered or corrupted data.
    pub fn is_tamper(&self) -> bool {
        self.crypto().map(PermsError::is_tamper).unwrap_or(false)
    }
}

/// Result type for Lockbox operations.
pub type Result<T> = std::result::Result<T, LockboxError>;
