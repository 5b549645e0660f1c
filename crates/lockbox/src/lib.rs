//! # Lockbox
//!
//! Client-side envelope encryption and key sharing.
//!
//! ## Overview
//!
//! Every record is encrypted on the client before it is stored:
//!
//! - **Envelopes**: a record is serialized, hashed and sealed with a fresh
//!   ChaCha20-Poly1305 key, which is wrapped for its owner with a hybrid
//!   X25519 + ML-KEM-768 encapsulation
//! - **Sharing**: the resource key is re-wrapped for each recipient whose
//!   public key the directory returns
//! - **Integrity**: a Merkle root over the record hashes is compared with
//!   the one the server reports
//! - **Migration**: the plaintext backlog is encrypted and stored, with
//!   progress published as it goes
//!
//! ## Key Concepts
//!
//! - **Session**: the unlocked key pair, passed into every call
//! - **Grant**: a resource key wrapped for one recipient plus permissions
//! - **Tombstone**: a soft-deleted record, kept for integrity comparisons
//!
//! ## Usage
//!
//! ```rust,no_run
//! use lockbox::{Lockbox, LockboxConfig, Session};
//! use lockbox::core::{NoteRecord, Record, RecordId};
//! use lockbox::remote::MemoryServer;
//! use lockbox::store::MemoryStore;
//!
//! async fn example() {
//!     let session = Session::generate("ada");
//!     let lockbox = Lockbox::new(MemoryStore::new(), MemoryServer::new(), LockboxConfig::default());
//!
//!     let note = Record::Note(NoteRecord {
//!         title: "Draft".into(),
//!         content: "...".into(),
//!         folder_id: None,
//!     });
//!     lockbox
//!         .save(&session, RecordId::new("note-1"), note)
//!         .await
//!         .unwrap();
//!
//!     let loaded = lockbox.load(&session, &RecordId::new("note-1")).await.unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - [`core`] - Records, hashes, integrity tree
//! - [`perms`] - Keys, envelopes, grants
//! - [`store`] - Storage and migration
//! - [`remote`] - Directory, share and integrity services

mod batch;
pub mod error;
pub mod kernel;
pub mod session;

pub use error::{LockboxError, Result};
pub use kernel::{Lockbox, LockboxConfig};
pub use session::Session;

// Re-export component crates
pub use lockbox_core as core;
pub use lockbox_perms as perms;
pub use lockbox_remote as remote;
pub use lockbox_store as store;

// Re-export commonly used types
pub use lockbox_core::{IntegrityRoot, LeafPolicy, Record, RecordId, RecordKind, ResourceId};
pub use lockbox_perms::{EnvelopeRecord, HybridKeyPair, HybridPublicKey, Permission, ShareGrant, WrappedKey};
pub use lockbox_remote::{IntegrityReport, ShareOutcome};
pub use lockbox_store::{MigrationJob, MigrationStatus};
