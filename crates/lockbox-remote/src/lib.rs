//! # Lockbox Remote
//!
//! Collaborators for the Lockbox server: public-key discovery, share
//! invites and the server-side integrity root.
//!
//! ## Overview
//!
//! The core never performs network I/O itself. It talks to the server
//! through the [`Directory`], [`ShareService`] and [`IntegrityService`]
//! traits, which applications implement over HTTP. Every failure surfaces
//! as a typed [`RemoteError`] and nothing is retried.
//!
//! ## Workflows
//!
//! 1. **Share**: lookup → re-wrap key for recipient → deliver invite
//! 2. **Integrity check**: local Merkle root vs. reported root and leaf count
//!
//! ## Wire Format
//!
//! Messages are camelCase JSON with hex byte fields. See [`messages`].

pub mod error;
pub mod messages;
pub mod protocol;
pub mod transport;

pub use error::{RemoteError, Result};
pub use messages::{IdentityRecord, IntegrityRootReport, ShareInvite};
pub use protocol::{check_integrity, share_with, IntegrityReport, ShareOutcome};
pub use transport::{memory::MemoryServer, Directory, IntegrityService, ShareService};
