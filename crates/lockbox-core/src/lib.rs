//! # Lockbox Core
//!
//! Pure primitives for Lockbox: record kinds, canonical record hashes and
//! the integrity tree.
//!
//! This crate contains no I/O and no key material. It is pure computation
//! over plaintext records and their hashes.
//!
//! ## Key Types
//!
//! - [`Record`] - A plaintext record (task, note, course, file key)
//! - [`Sha256Hash`] - Record hashes and integrity tree nodes
//! - [`IntegrityRoot`] - Merkle root over a record set
//! - [`RecordId`] / [`ResourceId`] - Opaque identifiers from storage
//!
//! ## Canonicalization
//!
//! Record hashes are computed over a fixed field concatenation. See the
//! [`canonical`] module.

pub mod canonical;
pub mod crypto;
pub mod error;
pub mod merkle;
pub mod record;
pub mod types;

pub use canonical::{canonical_fields, payload_bytes, record_from_payload, record_hash, verify_record_hash};
pub use crypto::{fingerprint, Sha256Hash};
pub use error::CoreError;
pub use merkle::{compute_root, verify, IntegrityLeaf, IntegrityRoot, LeafPolicy};
pub use record::{
    CourseRecord, FileKeyRecord, NoteRecord, Priority, Record, RecordKind, TaskRecord, TaskStatus,
};
pub use types::{RecordId, ResourceId};
