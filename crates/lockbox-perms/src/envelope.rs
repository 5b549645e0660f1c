//! Encrypted record envelopes and their storage wire format.
//!
//! An [`EnvelopeRecord`] is the in-memory form. A [`StoredEnvelope`] is the
//! JSON shape the storage service holds:
//!
//! ```text
//! encryptedData         = hex(nonce) ":" hex(ciphertext)
//! encapsulatedKey       = hex(encapsulated key)
//! encryptedSymmetricKey = hex(wrap nonce) hex(wrapped key ciphertext)
//! recordHash            = hex(SHA-256 of canonical fields)
//! ```
//!
//! Conversion in both directions is bit-exact.

use serde::{Deserialize, Serialize};

use crate::crypto::Nonce;
use crate::error::{PermsError, Result};
use crate::keyshare::WrappedKey;

/// Separator between nonce and ciphertext in `encryptedData`.
pub const DATA_SEPARATOR: char = ':';

/// An encrypted record.
///
/// `encapsulated_key` and `wrapped_symmetric_key` are present together or
/// not at all. A record missing either can never be decrypted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeRecord {
    pub ciphertext: Vec<u8>,
    pub nonce: Nonce,
    pub encapsulated_key: Option<Vec<u8>>,
    pub wrapped_symmetric_key: Option<Vec<u8>>,
    /// Lowercase hex SHA-256 of the canonical plaintext fields.
    pub record_hash: String,
}

impl EnvelopeRecord {
    /// The wrapped key, if both halves are present.
    pub fn wrapped_key(&self) -> Result<WrappedKey> {
        match (&self.encapsulated_key, &self.wrapped_symmetric_key) {
            (Some(encapsulated), Some(wrapped))
                if !encapsulated.is_empty() && !wrapped.is_empty() =>
            {
                Ok(WrappedKey {
                    encapsulated_key: encapsulated.clone(),
                    wrapped_symmetric_key: wrapped.clone(),
                })
            }
            _ => Err(PermsError::KeyUnavailable(
                "record has no wrapped symmetric key".into(),
            )),
        }
    }

    /// Convert to the storage wire shape.
    pub fn to_stored(&self) -> StoredEnvelope {
        StoredEnvelope {
            encrypted_data: format!(
                "{}{}{}",
                hex::encode(self.nonce.as_bytes()),
                DATA_SEPARATOR,
                hex::encode(&self.ciphertext)
            ),
            encapsulated_key: self.encapsulated_key.as_ref().map(hex::encode),
            encrypted_symmetric_key: self.wrapped_symmetric_key.as_ref().map(hex::encode),
            record_hash: self.record_hash.clone(),
        }
    }

    /// Parse from the storage wire shape.
    ///
    /// Missing key fields are kept as `None`; decoding reports them.
    pub fn from_stored(stored: &StoredEnvelope) -> Result<Self> {
        let (nonce_hex, ciphertext_hex) = stored
            .encrypted_data
            .split_once(DATA_SEPARATOR)
            .ok_or_else(|| {
                PermsError::Serialization("encryptedData is missing the ':' separator".into())
            })?;

        let nonce = Nonce::from_slice(&hex::decode(nonce_hex)?)?;
        let ciphertext = hex::decode(ciphertext_hex)?;

        let encapsulated_key = stored
            .encapsulated_key
            .as_deref()
            .map(hex::decode)
            .transpose()?;
        let wrapped_symmetric_key = stored
            .encrypted_symmetric_key
            .as_deref()
            .map(hex::decode)
            .transpose()?;

        Ok(Self {
            ciphertext,
            nonce,
            encapsulated_key,
            wrapped_symmetric_key,
            record_hash: stored.record_hash.clone(),
        })
    }
}

/// Storage wire shape of an encrypted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEnvelope {
    pub encrypted_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encapsulated_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_symmetric_key: Option<String>,
    pub record_hash: String,
}

impl StoredEnvelope {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| PermsError::Serialization(e.to_string()))
    }

    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| PermsError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EnvelopeRecord {
        EnvelopeRecord {
            ciphertext: vec![0xde, 0xad, 0xbe, 0xef],
            nonce: Nonce::from_bytes([0x01; 12]),
            encapsulated_key: Some(vec![0x02; 4]),
            wrapped_symmetric_key: Some(vec![0x03, 0x04]),
            record_hash: "ab".repeat(32),
        }
    }

    #[test]
    fn test_stored_format() {
        let stored = sample().to_stored();
        assert_eq!(stored.encrypted_data, "010101010101010101010101:deadbeef");
        assert_eq!(stored.encapsulated_key.as_deref(), Some("02020202"));
        assert_eq!(stored.encrypted_symmetric_key.as_deref(), Some("0304"));
    }

    #[test]
    fn test_stored_roundtrip_is_exact() {
        let record = sample();
        let stored = record.to_stored();
        assert_eq!(EnvelopeRecord::from_stored(&stored).unwrap(), record);

        let json = stored.to_json().unwrap();
        assert!(json.contains("\"encryptedData\""));
        assert!(json.contains("\"encryptedSymmetricKey\""));
        assert_eq!(StoredEnvelope::from_json(&json).unwrap(), stored);
    }

    #[test]
    fn test_missing_separator() {
        let mut stored = sample().to_stored();
        stored.encrypted_data = "0101deadbeef".into();
        assert!(matches!(
            EnvelopeRecord::from_stored(&stored),
            Err(PermsError::Serialization(_))
        ));
    }

    #[test]
    fn test_bad_nonce_length() {
        let mut stored = sample().to_stored();
        stored.encrypted_data = "0101:deadbeef".into();
        assert!(EnvelopeRecord::from_stored(&stored).is_err());
    }

    #[test]
    fn test_missing_key_material_is_reported() {
        let mut stored = sample().to_stored();
        stored.encapsulated_key = None;

        let record = EnvelopeRecord::from_stored(&stored).unwrap();
        assert!(matches!(
            record.wrapped_key(),
            Err(PermsError::KeyUnavailable(_))
        ));

        let json = r#"{"encryptedData":"010101010101010101010101:00","recordHash":"00"}"#;
        let stored = StoredEnvelope::from_json(json).unwrap();
        let record = EnvelopeRecord::from_stored(&stored).unwrap();
        assert!(record.wrapped_key().is_err());
    }
}
