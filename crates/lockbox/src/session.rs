//! The signed-in user's key material.
//!
//! A [`Session`] is created once the key pair is unlocked and is passed
//! explicitly into every [`crate::Lockbox`] call. Worker tasks share the
//! key pair through an `Arc` for the duration of a batch.

use std::fmt;
use std::sync::Arc;

use lockbox_perms::{HybridKeyPair, HybridPublicKey};
use lockbox_remote::IdentityRecord;

use crate::error::Result;

#[derive(Clone)]
pub struct Session {
    username: String,
    keys: Arc<HybridKeyPair>,
}

impl Session {
    pub fn new(username: impl Into<String>, keys: HybridKeyPair) -> Self {
        Self {
            username: username.into(),
            keys: Arc::new(keys),
        }
    }

    /// Register a new user with a freshly generated key pair.
    pub fn generate(username: impl Into<String>) -> Self {
        Self::new(username, HybridKeyPair::generate())
    }

    /// Unlock a session from serialized key halves.
    pub fn from_key_bytes(
        username: impl Into<String>,
        public_key: &[u8],
        secret_key: &[u8],
    ) -> Result<Self> {
        Ok(Self::new(
            username,
            HybridKeyPair::from_parts(public_key, secret_key)?,
        ))
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn public_key(&self) -> &HybridPublicKey {
        self.keys.public_key()
    }

    /// SHA-256 hex fingerprint of the public key.
    pub fn fingerprint(&self) -> String {
        self.keys.public_key().fingerprint()
    }

    /// The entry to publish in the directory.
    pub fn identity(&self) -> IdentityRecord {
        IdentityRecord::new(self.username.clone(), self.keys.public_key())
    }

    pub(crate) fn keys(&self) -> Arc<HybridKeyPair> {
        Arc::clone(&self.keys)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("public_key", self.keys.public_key())
            .finish_non_exhaustive()
    }
}
