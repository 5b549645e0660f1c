//! Record codec: plaintext records to envelopes and back.
//!
//! Encoding:
//!
//! 1. Take a symmetric key (fresh per record, or a shared resource key).
//! 2. Serialize the record to its canonical payload bytes.
//! 3. Encrypt under the key with a fresh nonce.
//! 4. Wrap the key for the owner's public key.
//! 5. Hash the canonical field concatenation.
//!
//! Decoding reverses this and then recomputes the record hash. A mismatch
//! is reported even when AEAD authentication succeeded.

use lockbox_core::{payload_bytes, record_from_payload, record_hash, verify_record_hash, Record};

use crate::crypto::SymmetricKey;
use crate::envelope::{EnvelopeRecord, StoredEnvelope};
use crate::error::Result;
use crate::kem::{HybridPublicKey, HybridSecretKey};
use crate::keyshare::WrappedKey;

/// Encrypt `record` under a fresh symmetric key wrapped for `owner`.
pub fn encode(owner: &HybridPublicKey, record: &Record) -> Result<EnvelopeRecord> {
    let key = SymmetricKey::generate();
    encode_with_key(owner, &key, record)
}

/// Encrypt `record` under an existing resource key, wrapping it for `owner`.
pub fn encode_with_key(
    owner: &HybridPublicKey,
    key: &SymmetricKey,
    record: &Record,
) -> Result<EnvelopeRecord> {
    let plaintext = zeroize::Zeroizing::new(payload_bytes(record)?);
    let (nonce, ciphertext) = key.encrypt(&plaintext)?;
    let wrapped = WrappedKey::wrap(owner, key)?;

    Ok(EnvelopeRecord {
        ciphertext,
        nonce,
        encapsulated_key: Some(wrapped.encapsulated_key),
        wrapped_symmetric_key: Some(wrapped.wrapped_symmetric_key),
        record_hash: record_hash(record).to_hex(),
    })
}

/// Decrypt an envelope with the owner's secret key and check its hash.
pub fn decode(secret: &HybridSecretKey, envelope: &EnvelopeRecord) -> Result<Record> {
    let key = envelope.wrapped_key()?.unwrap(secret)?;
    decode_with_key(&key, envelope)
}

/// Decrypt an envelope with an already unwrapped resource key.
pub fn decode_with_key(key: &SymmetricKey, envelope: &EnvelopeRecord) -> Result<Record> {
    let plaintext = zeroize::Zeroizing::new(key.decrypt(&envelope.nonce, &envelope.ciphertext)?);
    let record = record_from_payload(&plaintext)?;
    verify_record_hash(&record, &envelope.record_hash)?;
    Ok(record)
}

/// Decode a record straight from its storage wire shape.
pub fn decode_stored(secret: &HybridSecretKey, stored: &StoredEnvelope) -> Result<Record> {
    decode(secret, &EnvelopeRecord::from_stored(stored)?)
}

/// Decode a batch. One outcome per envelope, in input order.
pub fn decode_many(secret: &HybridSecretKey, envelopes: &[EnvelopeRecord]) -> Vec<Result<Record>> {
    envelopes.iter().map(|e| decode(secret, e)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PermsError;
    use crate::kem::HybridKeyPair;
    use lockbox_core::{NoteRecord, Priority, TaskRecord, TaskStatus};

    fn task() -> Record {
        Record::Task(TaskRecord {
            title: "Test".into(),
            description: "D".into(),
            notes: "N".into(),
            priority: Priority::High,
            status: TaskStatus::Todo,
            due_date: None,
        })
    }

    #[test]
    fn test_roundtrip() {
        let owner = HybridKeyPair::generate();
        let envelope = encode(owner.public_key(), &task()).unwrap();

        assert_eq!(
            envelope.record_hash,
            "d202d2337c56e342e09684a6ee643085e5915d562478293cbd36226d24dc0960"
        );
        assert_eq!(decode(owner.secret_key(), &envelope).unwrap(), task());
    }

    #[test]
    fn test_wire_roundtrip() {
        let owner = HybridKeyPair::generate();
        let stored = encode(owner.public_key(), &task()).unwrap().to_stored();
        let json = stored.to_json().unwrap();

        let parsed = StoredEnvelope::from_json(&json).unwrap();
        assert_eq!(decode_stored(owner.secret_key(), &parsed).unwrap(), task());
    }

    #[test]
    fn test_fresh_key_per_record() {
        let owner = HybridKeyPair::generate();
        let a = encode(owner.public_key(), &task()).unwrap();
        let b = encode(owner.public_key(), &task()).unwrap();

        assert_ne!(a.ciphertext, b.ciphertext);
        assert_ne!(a.wrapped_symmetric_key, b.wrapped_symmetric_key);
        assert_eq!(a.record_hash, b.record_hash);
    }

    #[test]
    fn test_ciphertext_bit_flip() {
        let owner = HybridKeyPair::generate();
        let mut envelope = encode(owner.public_key(), &task()).unwrap();
        envelope.ciphertext[3] ^= 0x01;

        assert!(matches!(
            decode(owner.secret_key(), &envelope),
            Err(PermsError::AuthTagVerification)
        ));
    }

    #[test]
    fn test_nonce_bit_flip() {
        let owner = HybridKeyPair::generate();
        let mut envelope = encode(owner.public_key(), &task()).unwrap();
        envelope.nonce.0[0] ^= 0x01;

        assert!(matches!(
            decode(owner.secret_key(), &envelope),
            Err(PermsError::AuthTagVerification)
        ));
    }

    #[test]
    fn test_encapsulated_key_bit_flip() {
        let owner = HybridKeyPair::generate();
        let mut envelope = encode(owner.public_key(), &task()).unwrap();
        if let Some(ek) = envelope.encapsulated_key.as_mut() {
            ek[100] ^= 0x01;
        }

        assert!(matches!(
            decode(owner.secret_key(), &envelope),
            Err(PermsError::DecapsulationMismatch)
        ));
    }

    #[test]
    fn test_record_hash_tamper() {
        let owner = HybridKeyPair::generate();
        let mut envelope = encode(owner.public_key(), &task()).unwrap();
        envelope.record_hash = lockbox_core::Sha256Hash::hash(b"other").to_hex();

        assert!(matches!(
            decode(owner.secret_key(), &envelope),
            Err(PermsError::IntegrityMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_wrapped_key() {
        let owner = HybridKeyPair::generate();
        let mut envelope = encode(owner.public_key(), &task()).unwrap();
        envelope.wrapped_symmetric_key = None;

        assert!(matches!(
            decode(owner.secret_key(), &envelope),
            Err(PermsError::KeyUnavailable(_))
        ));
    }

    #[test]
    fn test_wrong_owner() {
        let owner = HybridKeyPair::generate();
        let other = HybridKeyPair::generate();
        let envelope = encode(owner.public_key(), &task()).unwrap();

        assert!(matches!(
            decode(other.secret_key(), &envelope),
            Err(PermsError::DecapsulationMismatch)
        ));
    }

    #[test]
    fn test_shared_resource_key() {
        let owner = HybridKeyPair::generate();
        let folder_key = SymmetricKey::generate();
        let note = Record::Note(NoteRecord {
            title: "Lecture 4".into(),
            content: "eigenvalues".into(),
            folder_id: Some("folder-1".into()),
        });

        let envelope = encode_with_key(owner.public_key(), &folder_key, &note).unwrap();
        assert_eq!(decode_with_key(&folder_key, &envelope).unwrap(), note);
        assert_eq!(envelope.wrapped_key().unwrap().unwrap(owner.secret_key()).unwrap(), folder_key);
    }

    #[test]
    fn test_decode_many_isolates_failures() {
        let owner = HybridKeyPair::generate();
        let mut envelopes: Vec<_> = (0..4)
            .map(|_| encode(owner.public_key(), &task()).unwrap())
            .collect();
        envelopes[2].ciphertext[0] ^= 0xff;

        let results = decode_many(owner.secret_key(), &envelopes);
        assert_eq!(results.len(), 4);
        assert!(results[0].is_ok());
        assert!(results[1].is_ok());
        assert!(matches!(results[2], Err(PermsError::AuthTagVerification)));
        assert!(results[3].is_ok());
    }

    #[test]
    fn test_x25519_high_bit_flip() {
        // X25519 masks bit 255 of the u-coordinate, so the DH output is unchanged.
        let owner = HybridKeyPair::generate();
        let mut envelope = encode(owner.public_key(), &task()).unwrap();
        if let Some(ek) = envelope.encapsulated_key.as_mut() {
            ek[31] ^= 0x80;
        }

        assert!(matches!(
            decode(owner.secret_key(), &envelope),
            Err(PermsError::DecapsulationMismatch)
        ));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn any_encapsulated_key_bit_flip_fails(bit in any::<prop::sample::Index>()) {
                let owner = HybridKeyPair::generate();
                let mut envelope = encode(owner.public_key(), &task()).unwrap();
                let ek = envelope.encapsulated_key.as_mut().unwrap();
                let bit = bit.index(ek.len() * 8);
                ek[bit / 8] ^= 1 << (bit % 8);

                prop_assert!(matches!(
                    decode(owner.secret_key(), &envelope),
                    Err(PermsError::DecapsulationMismatch)
                ));
            }

            #[test]
            fn any_wrapped_key_bit_flip_fails(bit in any::<prop::sample::Index>()) {
                let owner = HybridKeyPair::generate();
                let mut envelope = encode(owner.public_key(), &task()).unwrap();
                let wrapped = envelope.wrapped_symmetric_key.as_mut().unwrap();
                let bit = bit.index(wrapped.len() * 8);
                wrapped[bit / 8] ^= 1 << (bit % 8);

                prop_assert!(matches!(
                    decode(owner.secret_key(), &envelope),
                    Err(PermsError::DecapsulationMismatch)
                ));
            }
        }
    }
}
