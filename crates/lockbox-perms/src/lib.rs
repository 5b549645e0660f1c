//! # Lockbox Permissions
//!
//! Envelope encryption and key sharing.
//!
//! ## Encryption Model
//!
//! Records use a two-layer key model:
//!
//! 1. **Symmetric key**: a ChaCha20-Poly1305 key that encrypts one record,
//!    or every record of a shared resource such as a folder.
//! 2. **Wrapped keys**: the symmetric key is wrapped for each holder with a
//!    hybrid X25519 + ML-KEM-768 encapsulation.
//!
//! This allows:
//! - Adding recipients without re-encrypting content
//! - Revocation by dropping a grant (the resource key is not rotated)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use lockbox_perms::{codec, share, HybridKeyPair, Permission};
//! use lockbox_core::{NoteRecord, Record, ResourceId};
//!
//! let owner = HybridKeyPair::generate();
//! let note = Record::Note(NoteRecord {
//!     title: "Draft".into(),
//!     content: "...".into(),
//!     folder_id: None,
//! });
//!
//! let envelope = codec::encode(owner.public_key(), &note).unwrap();
//! let decoded = codec::decode(owner.secret_key(), &envelope).unwrap();
//! assert_eq!(decoded, note);
//!
//! let friend = HybridKeyPair::generate();
//! let grant = share::grant_access(
//!     ResourceId::new("note-1"),
//!     owner.secret_key(),
//!     &envelope.wrapped_key().unwrap(),
//!     friend.public_key(),
//!     [Permission::Read].into_iter().collect(),
//! )
//! .unwrap();
//! ```

pub mod codec;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod grant;
pub mod kem;
pub mod keyshare;
pub mod share;
pub mod state;

pub use crypto::{Nonce, SymmetricKey};
pub use envelope::{EnvelopeRecord, StoredEnvelope};
pub use error::{PermsError, Result};
pub use grant::{parse_permissions, Permission, ShareGrant};
pub use kem::{
    decapsulate, encapsulate, EncapsulationOutput, HybridKeyPair, HybridPublicKey,
    HybridSecretKey, SharedSecret,
};
pub use keyshare::{unwrap_key, wrap_key, WrappedKey};
pub use state::GrantRegistry;
