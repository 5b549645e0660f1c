//! Error types for the store module.

use lockbox_core::CoreError;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage backend failed.
    #[error("backend error: {0}")]
    Backend(String),

    /// Record not found.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Stored data could not be interpreted.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// A single legacy record failed to migrate. Collected into the job,
    /// never fatal for the run.
    #[error("migration of {record_id} failed: {message}")]
    MigrationItem { record_id: String, message: String },

    /// Another migration run holds the coordinator.
    #[error("a migration is already running")]
    MigrationInProgress,

    /// A lock guarding in-memory state was poisoned.
    #[error("lock poisoned: {0}")]
    Poisoned(&'static str),
}

impl From<CoreError> for StoreError {
    fn from(e: CoreError) -> Self {
        StoreError::InvalidData(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
