//! Error types for the remote collaborators.

use thiserror::Error;

/// Errors that can occur talking to the directory, share or integrity
/// services.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The directory has no such user.
    #[error("identity not found: {0}")]
    IdentityNotFound(String),

    /// The service rejected or failed the request.
    #[error("service error: {0}")]
    Service(String),

    /// A message failed validation.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Key handling failed while preparing a share.
    #[error(transparent)]
    Perms(#[from] lockbox_perms::PermsError),

    /// A blocking crypto task panicked or was cancelled.
    #[error("task failed: {0}")]
    Task(String),
}

/// Result type for remote operations.
pub type Result<T> = std::result::Result<T, RemoteError>;
