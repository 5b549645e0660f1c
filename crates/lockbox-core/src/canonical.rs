//! Canonical forms of a record.
//!
//! Two canonical forms exist:
//!
//! - The **field concatenation**: a fixed, per-kind field order joined by
//!   `|`, with absent optional fields rendered as the empty string. Its
//!   SHA-256 is the record hash. For tasks the order is
//!   `title|description|notes|priority|status|dueDate`.
//! - The **payload bytes**: the JSON encoding of the tagged record. Struct
//!   field order is fixed by declaration, so the same record always encodes
//!   to the same bytes.
//!
//! The record hash must stay stable across releases: the server compares
//! integrity roots built from it.

use crate::crypto::Sha256Hash;
use crate::error::CoreError;
use crate::record::Record;

/// Delimiter between canonical fields.
pub const FIELD_DELIMITER: char = '|';

/// Build the canonical field concatenation for a record.
pub fn canonical_fields(record: &Record) -> String {
    let fields: Vec<String> = match record {
        Record::Task(t) => vec![
            t.title.clone(),
            t.description.clone(),
            t.notes.clone(),
            t.priority.as_str().to_string(),
            t.status.as_str().to_string(),
            t.due_date.clone().unwrap_or_default(),
        ],
        Record::Note(n) => vec![
            n.title.clone(),
            n.content.clone(),
            n.folder_id.clone().unwrap_or_default(),
        ],
        Record::Course(c) => vec![
            c.name.clone(),
            c.code.clone(),
            c.term.clone(),
            c.grade.clone().unwrap_or_default(),
            c.credits.to_string(),
        ],
        Record::FileKey(f) => vec![
            f.file_name.clone(),
            f.mime_type.clone(),
            f.size_bytes.to_string(),
            f.folder_id.clone().unwrap_or_default(),
        ],
    };

    fields.join(&FIELD_DELIMITER.to_string())
}

/// Compute the record hash over the canonical field concatenation.
pub fn record_hash(record: &Record) -> Sha256Hash {
    Sha256Hash::hash(canonical_fields(record).as_bytes())
}

/// Check a stored hex record hash against the hash recomputed from `record`.
pub fn verify_record_hash(record: &Record, expected_hex: &str) -> Result<(), CoreError> {
    let actual = record_hash(record).to_hex();
    if actual.eq_ignore_ascii_case(expected_hex) {
        Ok(())
    } else {
        Err(CoreError::RecordHashMismatch {
            expected: expected_hex.to_string(),
            actual,
        })
    }
}

/// Encode a record to its canonical payload bytes.
pub fn payload_bytes(record: &Record) -> Result<Vec<u8>, CoreError> {
    serde_json::to_vec(record).map_err(|e| CoreError::EncodingError(e.to_string()))
}

/// Decode a record from payload bytes.
pub fn record_from_payload(bytes: &[u8]) -> Result<Record, CoreError> {
    serde_json::from_slice(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
}
