//! Proptest generators for property-based testing.

use proptest::prelude::*;

use lockbox_core::{
    CourseRecord, FileKeyRecord, IntegrityLeaf, NoteRecord, Priority, Record, RecordId,
    Sha256Hash, TaskRecord, TaskStatus,
};

/// Free text, including the field delimiter and non-ASCII characters.
pub fn text(max_len: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            4 => proptest::char::range('a', 'z'),
            1 => Just('|'),
            1 => Just(' '),
            1 => Just('é'),
            1 => Just('🔒'),
        ],
        0..=max_len,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

/// Generate an optional identifier-like string.
pub fn folder_id() -> impl Strategy<Value = Option<String>> {
    proptest::option::of("folder-[0-9]{1,4}".prop_map(String::from))
}

/// Generate an ISO date.
pub fn due_date() -> impl Strategy<Value = Option<String>> {
    proptest::option::of(
        (2020u32..=2030, 1u32..=12, 1u32..=28)
            .prop_map(|(y, m, d)| format!("{:04}-{:02}-{:02}", y, m, d)),
    )
}

pub fn priority() -> impl Strategy<Value = Priority> {
    prop_oneof![Just(Priority::Low), Just(Priority::Medium), Just(Priority::High)]
}

pub fn task_status() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![
        Just(TaskStatus::Todo),
        Just(TaskStatus::InProgress),
        Just(TaskStatus::Done),
    ]
}

pub fn task() -> impl Strategy<Value = Record> {
    (text(40), text(200), text(200), priority(), task_status(), due_date()).prop_map(
        |(title, description, notes, priority, status, due_date)| {
            Record::Task(TaskRecord {
                title,
                description,
                notes,
                priority,
                status,
                due_date,
            })
        },
    )
}

pub fn note() -> impl Strategy<Value = Record> {
    (text(40), text(500), folder_id()).prop_map(|(title, content, folder_id)| {
        Record::Note(NoteRecord {
            title,
            content,
            folder_id,
        })
    })
}

pub fn course() -> impl Strategy<Value = Record> {
    (
        text(40),
        "[A-Z]{2,4} [0-9]{3}",
        text(20),
        proptest::option::of("[A-F][+-]?"),
        0u32..=10,
    )
        .prop_map(|(name, code, term, grade, credits)| {
            Record::Course(CourseRecord {
                name,
                code,
                term,
                grade,
                credits,
            })
        })
}

pub fn file_key() -> impl Strategy<Value = Record> {
    (text(40), "[a-z]{2,11}/[a-z0-9.+-]{1,20}", any::<u64>(), folder_id()).prop_map(
        |(file_name, mime_type, size_bytes, folder_id)| {
            Record::FileKey(FileKeyRecord {
                file_name,
                mime_type,
                size_bytes,
                folder_id,
            })
        },
    )
}

/// Generate a record of any kind.
pub fn record() -> impl Strategy<Value = Record> {
    prop_oneof![task(), note(), course(), file_key()]
}

/// Generate a random Sha256Hash.
pub fn sha256_hash() -> impl Strategy<Value = Sha256Hash> {
    any::<[u8; 32]>().prop_map(Sha256Hash::from_bytes)
}

/// Parameters for a set of stored records.
#[derive(Debug, Clone)]
pub struct LeafSetParams {
    /// `(seq, hash, tombstoned)`, seqs distinct.
    pub entries: Vec<(u64, Sha256Hash, bool)>,
}

impl Arbitrary for LeafSetParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        prop::collection::btree_map(1u64..=10_000, (sha256_hash(), prop::bool::weighted(0.2)), 0..40)
            .prop_map(|map| LeafSetParams {
                entries: map
                    .into_iter()
                    .map(|(seq, (hash, tombstoned))| (seq, hash, tombstoned))
                    .collect(),
            })
            .boxed()
    }
}

/// Build integrity leaves from parameters, in `seq` order.
pub fn leaves_from_params(params: &LeafSetParams) -> Vec<IntegrityLeaf> {
    params
        .entries
        .iter()
        .map(|(seq, hash, tombstoned)| {
            let leaf = IntegrityLeaf::new(*seq, RecordId::new(format!("r{}", seq)), *hash);
            if *tombstoned {
                leaf.tombstoned()
            } else {
                leaf
            }
        })
        .collect()
}
