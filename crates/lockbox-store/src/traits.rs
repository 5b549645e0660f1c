//! Storage collaborator traits.
//!
//! The core never talks to a database or a server directly. Encrypted
//! records go through [`RecordStore`], and the still-plaintext backlog from
//! before encryption was enabled is read through [`LegacySource`].

use async_trait::async_trait;
use lockbox_core::{IntegrityLeaf, Record, RecordId, RecordKind, Sha256Hash};
use lockbox_perms::StoredEnvelope;

use crate::error::{Result, StoreError};

/// An encrypted record as held by storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub record_id: RecordId,
    pub kind: RecordKind,
    /// Creation order, assigned by the store on first persist.
    pub seq: u64,
    pub envelope: StoredEnvelope,
    /// Soft-deleted.
    pub tombstoned: bool,
}

impl StoredRecord {
    /// This record's contribution to the integrity tree.
    pub fn integrity_leaf(&self) -> Result<IntegrityLeaf> {
        let hash = Sha256Hash::from_hex(&self.envelope.record_hash).map_err(|e| {
            StoreError::InvalidData(format!("record hash of {}: {}", self.record_id, e))
        })?;
        let leaf = IntegrityLeaf::new(self.seq, self.record_id.clone(), hash);
        Ok(if self.tombstoned { leaf.tombstoned() } else { leaf })
    }
}

/// A plaintext record awaiting migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyRecord {
    pub record_id: RecordId,
    pub record: Record,
}

impl LegacyRecord {
    pub fn new(record_id: impl Into<RecordId>, record: Record) -> Self {
        Self {
            record_id: record_id.into(),
            record,
        }
    }
}

/// Persistence for encrypted records.
///
/// Implementations must be safe to share across tasks. Failures are
/// reported, never retried by the caller.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert or replace a record's envelope.
    ///
    /// Replacing keeps the original `seq` and clears the tombstone.
    /// Returns the record's `seq`.
    async fn persist(
        &self,
        record_id: &RecordId,
        kind: RecordKind,
        envelope: &StoredEnvelope,
    ) -> Result<u64>;

    /// Load a record by ID.
    async fn load(&self, record_id: &RecordId) -> Result<Option<StoredRecord>>;

    /// All records, tombstoned ones included, ordered by `seq`.
    async fn list(&self) -> Result<Vec<StoredRecord>>;

    /// Soft-delete a record. Returns false if it does not exist.
    async fn tombstone(&self, record_id: &RecordId) -> Result<bool>;
}

/// The unmigrated plaintext backlog.
#[async_trait]
pub trait LegacySource: Send + Sync {
    /// Records that still need migrating. Re-scanning after a partial run
    /// returns only what is left.
    async fn pending(&self) -> Result<Vec<LegacyRecord>>;

    /// Remove a record from the backlog once its encrypted form is stored.
    async fn mark_migrated(&self, record_id: &RecordId) -> Result<()>;
}

/// Collect integrity leaves for every stored record.
pub async fn integrity_leaves<S: RecordStore + ?Sized>(store: &S) -> Result<Vec<IntegrityLeaf>> {
    store
        .list()
        .await?
        .iter()
        .map(StoredRecord::integrity_leaf)
        .collect()
}
