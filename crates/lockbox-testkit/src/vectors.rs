//! Golden test vectors for record hashes and integrity roots.
//!
//! The server recomputes both from its own copy of the record hashes, so
//! every client must produce exactly these values.

use serde::Serialize;

use lockbox_core::{
    compute_root, payload_bytes, record_hash, CoreError, CourseRecord, FileKeyRecord, NoteRecord,
    Priority, Record, Sha256Hash, TaskRecord, TaskStatus,
};

/// A record-hash vector.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub record: Record,
    /// Expected canonical field concatenation.
    pub expected_fields: &'static str,
    /// Expected record hash (hex).
    pub expected_hash: &'static str,
}

/// A Merkle root vector over the record hashes of the first `leaves`
/// vectors, in order.
#[derive(Debug, Clone, Copy)]
pub struct RootVector {
    pub leaves: usize,
    pub expected_root: &'static str,
}

/// Get all record-hash vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "minimal task without due date",
            record: Record::Task(TaskRecord {
                title: "Test".into(),
                description: "D".into(),
                notes: "N".into(),
                priority: Priority::High,
                status: TaskStatus::Todo,
                due_date: None,
            }),
            expected_fields: "Test|D|N|high|todo|",
            expected_hash: "d202d2337c56e342e09684a6ee643085e5915d562478293cbd36226d24dc0960",
        },
        GoldenVector {
            name: "note with empty content and no folder",
            record: Record::Note(NoteRecord {
                title: "Draft".into(),
                content: String::new(),
                folder_id: None,
            }),
            expected_fields: "Draft||",
            expected_hash: "5251f2bf66a2666e720b3a5ff938fef8cd0fdfba7883b0a4a99c4f29e8ef1dc8",
        },
        GoldenVector {
            name: "graded course",
            record: Record::Course(CourseRecord {
                name: "Cryptography".into(),
                code: "CS 255".into(),
                term: "Fall 2026".into(),
                grade: Some("A".into()),
                credits: 4,
            }),
            expected_fields: "Cryptography|CS 255|Fall 2026|A|4",
            expected_hash: "0d50372e5b2c73c28b05d4ea57dd8ebccebdecf9669267c6f0b8998b4419f920",
        },
        GoldenVector {
            name: "task in progress with due date",
            record: Record::Task(TaskRecord {
                title: "Exam prep".into(),
                description: "Chapters 1-4".into(),
                notes: "bring calculator".into(),
                priority: Priority::Medium,
                status: TaskStatus::InProgress,
                due_date: Some("2026-05-01".into()),
            }),
            expected_fields: "Exam prep|Chapters 1-4|bring calculator|medium|in_progress|2026-05-01",
            expected_hash: "c09ed885e5b666f6f2bc684238614af5c488433716ddf838564dc37abafe1a55",
        },
        GoldenVector {
            name: "note inside a folder",
            record: Record::Note(NoteRecord {
                title: "Lecture notes".into(),
                content: "Merkle trees".into(),
                folder_id: Some("folder-7".into()),
            }),
            expected_fields: "Lecture notes|Merkle trees|folder-7",
            expected_hash: "ab68fa48776e5304c140c2145ab24a7df6c385342dc6327032f3d1e59060288a",
        },
        GoldenVector {
            name: "file key descriptor",
            record: Record::FileKey(FileKeyRecord {
                file_name: "report.pdf".into(),
                mime_type: "application/pdf".into(),
                size_bytes: 482133,
                folder_id: Some("folder-7".into()),
            }),
            expected_fields: "report.pdf|application/pdf|482133|folder-7",
            expected_hash: "6beb006270598412476bc9cd3aba5c517989dee35d693ca0b32c89fff5242057",
        },
    ]
}

/// Get all integrity-root vectors.
pub fn root_vectors() -> Vec<RootVector> {
    vec![
        RootVector {
            leaves: 0,
            expected_root: "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
        },
        RootVector {
            leaves: 1,
            expected_root: "37c08f9f78218871117fc11484f89ae9064e6e59c8da057dd8e8b1f1be87959a",
        },
        RootVector {
            leaves: 2,
            expected_root: "313b21ad844297ca5799db87c61fe07cc136f97627154fcdaae5a5d6e440eebe",
        },
        // Odd level: the last node is paired with itself.
        RootVector {
            leaves: 3,
            expected_root: "08d8c23dc25315956e7f067bfc127675abd52270733389fc9f5516b37814206d",
        },
    ]
}

/// Compute the root a [`RootVector`] describes.
pub fn root_for(vector: &RootVector) -> Sha256Hash {
    let hashes: Vec<_> = all_vectors()
        .iter()
        .take(vector.leaves)
        .map(|v| record_hash(&v.record))
        .collect();
    compute_root(&hashes)
}

/// A vector as shipped to other clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedVector {
    #[serde(flatten)]
    pub vector: GoldenVector,
    /// Hex of the JSON payload bytes that get encrypted.
    pub payload_hex: String,
}

/// Export all record-hash vectors as pretty JSON.
pub fn export_json() -> Result<String, CoreError> {
    let exported = all_vectors()
        .into_iter()
        .map(|vector| {
            let payload_hex = hex::encode(payload_bytes(&vector.record)?);
            Ok(ExportedVector {
                vector,
                payload_hex,
            })
        })
        .collect::<Result<Vec<_>, CoreError>>()?;
    serde_json::to_string_pretty(&exported).map_err(|e| CoreError::EncodingError(e.to_string()))
}

/// Check every vector. Returns `(name, matches, computed hex)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    let records = all_vectors().into_iter().map(|v| {
        let hex = record_hash(&v.record).to_hex();
        (v.name.to_string(), hex == v.expected_hash, hex)
    });
    let roots = root_vectors().into_iter().map(|v| {
        let hex = root_for(&v).to_hex();
        (format!("root over {} leaves", v.leaves), hex == v.expected_root, hex)
    });
    records.chain(roots).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockbox_core::canonical_fields;

    #[test]
    fn test_all_vectors_match() {
        for (name, matches, hex) in verify_all_vectors() {
            assert!(matches, "vector '{}' computed {}", name, hex);
        }
    }

    #[test]
    fn test_canonical_fields_match() {
        for vector in all_vectors() {
            assert_eq!(
                canonical_fields(&vector.record),
                vector.expected_fields,
                "vector '{}'",
                vector.name
            );
        }
    }

    #[test]
    fn test_export_json() {
        let json = export_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let first = &parsed[0];
        assert_eq!(first["expectedHash"], all_vectors()[0].expected_hash);
        assert_eq!(first["record"]["kind"], "task");
        assert!(first["payloadHex"].as_str().unwrap().starts_with("7b"));
    }

    #[test]
    fn test_hash_is_plain_sha256_of_fields() {
        for vector in all_vectors() {
            assert_eq!(
                record_hash(&vector.record),
                Sha256Hash::hash(vector.expected_fields.as_bytes())
            );
        }
    }
}
