//! Symmetric cipher.
//!
//! ChaCha20-Poly1305 with a fresh random 96-bit nonce per encryption.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{PermsError, Result};

/// Length of a symmetric key in bytes.
pub const KEY_LEN: usize = 32;
/// Length of an AEAD nonce in bytes.
pub const NONCE_LEN: usize = 12;
/// Length of the Poly1305 authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// A 256-bit symmetric key for ChaCha20-Poly1305.
///
/// Generated fresh per record, or once per shared resource. Zeroized on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_LEN]);

impl SymmetricKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, which must be exactly [`KEY_LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; KEY_LEN] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Encrypt `plaintext` under a freshly generated nonce.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<(Nonce, Vec<u8>)> {
        let nonce = Nonce::generate();
        let ciphertext = self
            .cipher()
            .encrypt(chacha20poly1305::Nonce::from_slice(&nonce.0), plaintext)
            .map_err(|e| PermsError::Encryption(e.to_string()))?;
        Ok((nonce, ciphertext))
    }

    /// Decrypt and authenticate `ciphertext`.
    pub fn decrypt(&self, nonce: &Nonce, ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.cipher()
            .decrypt(chacha20poly1305::Nonce::from_slice(&nonce.0), ciphertext)
            .map_err(|_| PermsError::AuthTagVerification)
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(&self.0.into())
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

/// A 96-bit nonce for ChaCha20-Poly1305.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nonce(pub [u8; NONCE_LEN]);

impl Nonce {
    /// Generate a new random nonce.
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; NONCE_LEN]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, which must be exactly [`NONCE_LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; NONCE_LEN] = bytes.try_into().map_err(|_| {
            PermsError::Serialization(format!(
                "invalid nonce length: expected {}, got {}",
                NONCE_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let key = SymmetricKey::generate();
        let plaintext = b"hello, world!";

        let (nonce, ciphertext) = key.encrypt(plaintext).unwrap();
        assert_ne!(ciphertext, plaintext);
        assert_eq!(ciphertext.len(), plaintext.len() + TAG_LEN);

        let decrypted = key.decrypt(&nonce, &ciphertext).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_fresh_nonce_per_call() {
        let key = SymmetricKey::generate();
        let (n1, c1) = key.encrypt(b"same").unwrap();
        let (n2, c2) = key.encrypt(b"same").unwrap();

        assert_ne!(n1, n2);
        assert_ne!(c1, c2);
    }

    #[test]
    fn test_decrypt_wrong_key_fails() {
        let key1 = SymmetricKey::generate();
        let key2 = SymmetricKey::generate();

        let (nonce, ciphertext) = key1.encrypt(b"secret").unwrap();

        assert!(matches!(
            key2.decrypt(&nonce, &ciphertext),
            Err(PermsError::AuthTagVerification)
        ));
    }

    #[test]
    fn test_bit_flip_fails_closed() {
        let key = SymmetricKey::generate();
        let (nonce, mut ciphertext) = key.encrypt(b"secret").unwrap();
        ciphertext[0] ^= 0x01;

        assert!(matches!(
            key.decrypt(&nonce, &ciphertext),
            Err(PermsError::AuthTagVerification)
        ));
    }

    #[test]
    fn test_debug_hides_key() {
        let key = SymmetricKey::from_bytes([0xAB; KEY_LEN]);
        assert_eq!(format!("{:?}", key), "SymmetricKey(..)");
    }

    #[test]
    fn test_nonce_from_slice_length() {
        assert!(Nonce::from_slice(&[0u8; NONCE_LEN]).is_ok());
        assert!(Nonce::from_slice(&[0u8; 8]).is_err());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn roundtrip_any_payload(plaintext in prop::collection::vec(any::<u8>(), 0..4096)) {
                let key = SymmetricKey::generate();
                let (nonce, ciphertext) = key.encrypt(&plaintext).unwrap();
                prop_assert_eq!(ciphertext.len(), plaintext.len() + TAG_LEN);
                prop_assert_eq!(key.decrypt(&nonce, &ciphertext).unwrap(), plaintext);
            }

            #[test]
            fn any_single_bit_flip_fails(
                plaintext in prop::collection::vec(any::<u8>(), 1..256),
                bit in any::<prop::sample::Index>(),
            ) {
                let key = SymmetricKey::generate();
                let (nonce, mut ciphertext) = key.encrypt(&plaintext).unwrap();
                let bit = bit.index(ciphertext.len() * 8);
                ciphertext[bit / 8] ^= 1 << (bit % 8);
                prop_assert!(matches!(
                    key.decrypt(&nonce, &ciphertext),
                    Err(PermsError::AuthTagVerification)
                ));
            }
        }
    }
}
