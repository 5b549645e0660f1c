//! Key wrapping via the hybrid KEM.
//!
//! A symmetric key is wrapped for a recipient by encapsulating a fresh
//! shared secret against their public key and using that secret as a
//! one-time ChaCha20-Poly1305 key over the symmetric key bytes.

use serde::{Deserialize, Serialize};

use crate::crypto::{Nonce, SymmetricKey, KEY_LEN, NONCE_LEN, TAG_LEN};
use crate::error::{PermsError, Result};
use crate::kem::{self, HybridPublicKey, HybridSecretKey, ENCAPSULATED_KEY_LEN};

/// Length of a wrapped symmetric key: nonce, key ciphertext and tag.
pub const WRAPPED_SYMMETRIC_KEY_LEN: usize = NONCE_LEN + KEY_LEN + TAG_LEN;

/// A symmetric key wrapped for one recipient.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedKey {
    /// Ephemeral X25519 public key followed by the ML-KEM ciphertext.
    pub encapsulated_key: Vec<u8>,

    /// Wrap nonce followed by the AEAD ciphertext of the symmetric key.
    pub wrapped_symmetric_key: Vec<u8>,
}

impl WrappedKey {
    /// Wrap `key` for `recipient`.
    pub fn wrap(recipient: &HybridPublicKey, key: &SymmetricKey) -> Result<Self> {
        let encapsulation = kem::encapsulate(recipient)?;
        let wrapping_key = encapsulation.shared_secret.wrapping_key();

        let (nonce, ciphertext) = wrapping_key.encrypt(key.as_bytes())?;

        let mut wrapped_symmetric_key = Vec::with_capacity(WRAPPED_SYMMETRIC_KEY_LEN);
        wrapped_symmetric_key.extend_from_slice(nonce.as_bytes());
        wrapped_symmetric_key.extend_from_slice(&ciphertext);

        Ok(Self {
            encapsulated_key: encapsulation.encapsulated_key,
            wrapped_symmetric_key,
        })
    }

    /// Recover the symmetric key with the recipient's secret key.
    ///
    /// Every failure, including an inner AEAD failure after a successful
    /// decapsulation, is reported as [`PermsError::DecapsulationMismatch`].
    pub fn unwrap(&self, secret: &HybridSecretKey) -> Result<SymmetricKey> {
        unwrap_key(secret, &self.encapsulated_key, &self.wrapped_symmetric_key)
    }

    /// Concatenate into the single byte string carried by share invites.
    pub fn to_invite_bytes(&self) -> Vec<u8> {
        let mut out =
            Vec::with_capacity(self.encapsulated_key.len() + self.wrapped_symmetric_key.len());
        out.extend_from_slice(&self.encapsulated_key);
        out.extend_from_slice(&self.wrapped_symmetric_key);
        out
    }

    /// Split a share-invite byte string back into its parts.
    pub fn from_invite_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != ENCAPSULATED_KEY_LEN + WRAPPED_SYMMETRIC_KEY_LEN {
            return Err(PermsError::Serialization(format!(
                "invalid wrapped key length: expected {}, got {}",
                ENCAPSULATED_KEY_LEN + WRAPPED_SYMMETRIC_KEY_LEN,
                bytes.len()
            )));
        }
        let (encapsulated, wrapped) = bytes.split_at(ENCAPSULATED_KEY_LEN);
        Ok(Self {
            encapsulated_key: encapsulated.to_vec(),
            wrapped_symmetric_key: wrapped.to_vec(),
        })
    }
}

impl std::fmt::Debug for WrappedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WrappedKey")
            .field("encapsulated_key_len", &self.encapsulated_key.len())
            .field("wrapped_symmetric_key_len", &self.wrapped_symmetric_key.len())
            .finish()
    }
}

/// Wrap `key` for `recipient`.
pub fn wrap_key(recipient: &HybridPublicKey, key: &SymmetricKey) -> Result<WrappedKey> {
    WrappedKey::wrap(recipient, key)
}

/// Unwrap a symmetric key from its two wire parts.
pub fn unwrap_key(
    secret: &HybridSecretKey,
    encapsulated_key: &[u8],
    wrapped_symmetric_key: &[u8],
) -> Result<SymmetricKey> {
    if wrapped_symmetric_key.len() != WRAPPED_SYMMETRIC_KEY_LEN {
        return Err(PermsError::DecapsulationMismatch);
    }

    let shared = kem::decapsulate(secret, encapsulated_key)?;
    let (nonce_bytes, ciphertext) = wrapped_symmetric_key.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes).map_err(|_| PermsError::DecapsulationMismatch)?;

    let key_bytes = zeroize::Zeroizing::new(
        shared
            .wrapping_key()
            .decrypt(&nonce, ciphertext)
            .map_err(|_| PermsError::DecapsulationMismatch)?,
    );

    SymmetricKey::from_slice(&key_bytes).ok_or(PermsError::DecapsulationMismatch)
}
