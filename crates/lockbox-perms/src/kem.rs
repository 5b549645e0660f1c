//! Hybrid key encapsulation: X25519 combined with ML-KEM-768.
//!
//! An attacker must break both the elliptic-curve and the lattice component
//! to recover a shared secret.
//!
//! Byte layouts:
//!
//! ```text
//! public key        = x25519_public (32)  || ml_kem_encapsulation_key (1184)
//! secret key        = x25519_secret (32)  || ml_kem_decapsulation_key (2400)
//! encapsulated key  = ephemeral_x25519 (32) || ml_kem_ciphertext (1088)
//! ```
//!
//! The shared secret is a Blake3 derive-key over both component secrets,
//! the encapsulated key and the recipient's X25519 public key.
//!
//! ML-KEM uses implicit rejection: decapsulating an altered ciphertext does
//! not fail, it yields an unrelated secret. Callers detect that through the
//! AEAD that the secret keys.

use ml_kem::kem::{Decapsulate, Encapsulate};
use ml_kem::{Ciphertext, EncodedSizeUser, KemCore, MlKem768};
use rand::rngs::OsRng;
use std::fmt;
use x25519_dalek::{EphemeralSecret, PublicKey as X25519Public, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::SymmetricKey;
use crate::error::{PermsError, Result};

type EncapsulationKey = <MlKem768 as KemCore>::EncapsulationKey;
type DecapsulationKey = <MlKem768 as KemCore>::DecapsulationKey;

pub const X25519_LEN: usize = 32;
pub const ML_KEM_PUBLIC_LEN: usize = 1184;
pub const ML_KEM_SECRET_LEN: usize = 2400;
pub const ML_KEM_CIPHERTEXT_LEN: usize = 1088;

/// Length of a serialized hybrid public key.
pub const PUBLIC_KEY_LEN: usize = X25519_LEN + ML_KEM_PUBLIC_LEN;
/// Length of a serialized hybrid secret key.
pub const SECRET_KEY_LEN: usize = X25519_LEN + ML_KEM_SECRET_LEN;
/// Length of an encapsulated key.
pub const ENCAPSULATED_KEY_LEN: usize = X25519_LEN + ML_KEM_CIPHERTEXT_LEN;

const COMBINER_CONTEXT: &str = "lockbox 2026-01 hybrid-kem x25519+ml-kem-768 shared secret";

/// A recipient's hybrid public key.
#[derive(Clone, PartialEq, Eq)]
pub struct HybridPublicKey {
    x25519: X25519Public,
    ml_kem: Vec<u8>,
}

impl HybridPublicKey {
    /// Parse a serialized public key.
    ///
    /// Returns [`PermsError::Encapsulation`] for a wrong length, an all-zero
    /// X25519 component, or an ML-KEM component whose coefficients are not
    /// reduced mod q.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PUBLIC_KEY_LEN {
            return Err(PermsError::Encapsulation(format!(
                "invalid public key length: expected {}, got {}",
                PUBLIC_KEY_LEN,
                bytes.len()
            )));
        }

        let (x_part, kem_part) = bytes.split_at(X25519_LEN);
        let mut x_bytes = [0u8; X25519_LEN];
        x_bytes.copy_from_slice(x_part);
        if x_bytes == [0u8; X25519_LEN] {
            return Err(PermsError::Encapsulation("zero x25519 public key".into()));
        }

        let ek = EncapsulationKey::from_bytes(
            &kem_part
                .try_into()
                .map_err(|_| PermsError::Encapsulation("ml-kem encapsulation key".into()))?,
        );
        // Decoding reduces mod q, so an out-of-range key does not re-encode to itself.
        if ek.as_bytes().as_slice() != kem_part {
            return Err(PermsError::Encapsulation(
                "ml-kem encapsulation key out of range".into(),
            ));
        }

        Ok(Self {
            x25519: X25519Public::from(x_bytes),
            ml_kem: kem_part.to_vec(),
        })
    }

    /// Parse a hex-encoded public key, as published by the directory.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)
            .map_err(|e| PermsError::Encapsulation(format!("invalid public key hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Serialize to bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PUBLIC_KEY_LEN);
        out.extend_from_slice(self.x25519.as_bytes());
        out.extend_from_slice(&self.ml_kem);
        out
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// SHA-256 fingerprint of the serialized key, hex.
    pub fn fingerprint(&self) -> String {
        lockbox_core::fingerprint(&self.to_bytes())
    }

    fn encapsulation_key(&self) -> Result<EncapsulationKey> {
        Ok(EncapsulationKey::from_bytes(
            &self
                .ml_kem
                .as_slice()
                .try_into()
                .map_err(|_| PermsError::Encapsulation("ml-kem encapsulation key".into()))?,
        ))
    }
}

impl fmt::Debug for HybridPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HybridPublicKey({})", &self.fingerprint()[..16])
    }
}

/// The owner's hybrid secret key. Never leaves the owning process.
pub struct HybridSecretKey {
    x25519: StaticSecret,
    ml_kem: DecapsulationKey,
}

impl HybridSecretKey {
    /// Parse a serialized secret key.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SECRET_KEY_LEN {
            return Err(PermsError::KeyUnavailable(format!(
                "invalid secret key length: expected {}, got {}",
                SECRET_KEY_LEN,
                bytes.len()
            )));
        }

        let (x_part, kem_part) = bytes.split_at(X25519_LEN);
        let mut x_bytes = Zeroizing::new([0u8; X25519_LEN]);
        x_bytes.copy_from_slice(x_part);

        let ml_kem = DecapsulationKey::from_bytes(
            &kem_part
                .try_into()
                .map_err(|_| PermsError::KeyUnavailable("ml-kem decapsulation key".into()))?,
        );

        Ok(Self {
            x25519: StaticSecret::from(*x_bytes),
            ml_kem,
        })
    }

    /// Serialize to bytes. The buffer is zeroized when dropped.
    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        let mut out = Zeroizing::new(Vec::with_capacity(SECRET_KEY_LEN));
        out.extend_from_slice(&self.x25519.to_bytes());
        out.extend_from_slice(self.ml_kem.as_bytes().as_slice());
        out
    }

    fn x25519_public(&self) -> X25519Public {
        X25519Public::from(&self.x25519)
    }
}

impl fmt::Debug for HybridSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HybridSecretKey(..)")
    }
}

/// A user's key pair, created once at registration.
pub struct HybridKeyPair {
    public: HybridPublicKey,
    secret: HybridSecretKey,
}

impl HybridKeyPair {
    /// Generate a fresh key pair.
    pub fn generate() -> Self {
        let mut rng = OsRng;
        let x_secret = StaticSecret::random_from_rng(&mut rng);
        let (dk, ek) = MlKem768::generate(&mut rng);

        let public = HybridPublicKey {
            x25519: X25519Public::from(&x_secret),
            ml_kem: ek.as_bytes().to_vec(),
        };
        let secret = HybridSecretKey {
            x25519: x_secret,
            ml_kem: dk,
        };

        Self { public, secret }
    }

    /// Rebuild a key pair from its serialized halves.
    ///
    /// The X25519 half of `public` must match the secret key.
    pub fn from_parts(public_bytes: &[u8], secret_bytes: &[u8]) -> Result<Self> {
        let public = HybridPublicKey::from_bytes(public_bytes)?;
        let secret = HybridSecretKey::from_bytes(secret_bytes)?;
        if secret.x25519_public() != public.x25519 {
            return Err(PermsError::KeyUnavailable(
                "public key does not match secret key".into(),
            ));
        }
        Ok(Self { public, secret })
    }

    pub fn public_key(&self) -> &HybridPublicKey {
        &self.public
    }

    pub fn secret_key(&self) -> &HybridSecretKey {
        &self.secret
    }
}

impl fmt::Debug for HybridKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HybridKeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

/// A 32-byte KEM shared secret. Transient, zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; 32]);

impl SharedSecret {
    /// Use the secret as a one-time AEAD key.
    pub fn wrapping_key(&self) -> SymmetricKey {
        SymmetricKey::from_bytes(self.0)
    }
}

/// Output of [`encapsulate`].
pub struct EncapsulationOutput {
    pub encapsulated_key: Vec<u8>,
    pub shared_secret: SharedSecret,
}

/// Encapsulate a fresh shared secret against `recipient`.
pub fn encapsulate(recipient: &HybridPublicKey) -> Result<EncapsulationOutput> {
    let mut rng = OsRng;

    let ephemeral = EphemeralSecret::random_from_rng(&mut rng);
    let ephemeral_public = X25519Public::from(&ephemeral);
    let x_shared = ephemeral.diffie_hellman(&recipient.x25519);
    if !x_shared.was_contributory() {
        return Err(PermsError::Encapsulation(
            "low-order x25519 public key".into(),
        ));
    }

    let ek = recipient.encapsulation_key()?;
    let (ciphertext, kem_shared) = ek
        .encapsulate(&mut rng)
        .map_err(|_| PermsError::Encapsulation("ml-kem encapsulation".into()))?;

    let mut encapsulated_key = Vec::with_capacity(ENCAPSULATED_KEY_LEN);
    encapsulated_key.extend_from_slice(ephemeral_public.as_bytes());
    encapsulated_key.extend_from_slice(ciphertext.as_slice());

    let shared_secret = combine(
        x_shared.as_bytes(),
        kem_shared.as_slice(),
        &encapsulated_key,
        recipient.x25519.as_bytes(),
    );

    Ok(EncapsulationOutput {
        encapsulated_key,
        shared_secret,
    })
}

/// Recover the shared secret from an encapsulated key.
///
/// A wrong-length input yields [`PermsError::DecapsulationMismatch`]. An
/// altered input of the right length yields an unrelated secret.
pub fn decapsulate(secret: &HybridSecretKey, encapsulated_key: &[u8]) -> Result<SharedSecret> {
    if encapsulated_key.len() != ENCAPSULATED_KEY_LEN {
        return Err(PermsError::DecapsulationMismatch);
    }

    let (x_part, kem_part) = encapsulated_key.split_at(X25519_LEN);
    let mut ephemeral_bytes = [0u8; X25519_LEN];
    ephemeral_bytes.copy_from_slice(x_part);

    let x_shared = secret
        .x25519
        .diffie_hellman(&X25519Public::from(ephemeral_bytes));

    let ciphertext: Ciphertext<MlKem768> = kem_part
        .try_into()
        .map_err(|_| PermsError::DecapsulationMismatch)?;
    let kem_shared = secret
        .ml_kem
        .decapsulate(&ciphertext)
        .map_err(|_| PermsError::DecapsulationMismatch)?;

    Ok(combine(
        x_shared.as_bytes(),
        kem_shared.as_slice(),
        encapsulated_key,
        secret.x25519_public().as_bytes(),
    ))
}

fn combine(
    x_shared: &[u8],
    kem_shared: &[u8],
    encapsulated_key: &[u8],
    recipient_x25519: &[u8],
) -> SharedSecret {
    let mut hasher = blake3::Hasher::new_derive_key(COMBINER_CONTEXT);
    hasher.update(x_shared);
    hasher.update(kem_shared);
    hasher.update(encapsulated_key);
    hasher.update(recipient_x25519);
    SharedSecret(*hasher.finalize().as_bytes())
}
