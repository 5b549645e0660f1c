//! In-memory implementations of the storage traits.
//!
//! These back tests and offline use. Nothing is persisted. Thread-safe via
//! RwLock.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use lockbox_core::{RecordId, RecordKind};
use lockbox_perms::StoredEnvelope;

use crate::error::{Result, StoreError};
use crate::traits::{LegacyRecord, LegacySource, RecordStore, StoredRecord};

/// In-memory record store.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    records: HashMap<RecordId, StoredRecord>,
    /// seq -> record_id, for ordered listing.
    order: BTreeMap<u64, RecordId>,
    next_seq: u64,
    /// Record IDs whose persist is rejected, for failure tests.
    rejected: BTreeSet<RecordId>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                next_seq: 1,
                ..Default::default()
            }),
        }
    }

    /// Make every future `persist` of `record_id` fail with a backend error.
    pub fn reject(&self, record_id: impl Into<RecordId>) -> Result<()> {
        self.write()?.rejected.insert(record_id.into());
        Ok(())
    }

    /// Number of stored records, tombstoned ones included.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.records.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner.read().map_err(|_| StoreError::Poisoned("memory store"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner.write().map_err(|_| StoreError::Poisoned("memory store"))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn persist(
        &self,
        record_id: &RecordId,
        kind: RecordKind,
        envelope: &StoredEnvelope,
    ) -> Result<u64> {
        let mut inner = self.write()?;

        if inner.rejected.contains(record_id) {
            return Err(StoreError::Backend(format!("write rejected for {}", record_id)));
        }

        if let Some(existing) = inner.records.get_mut(record_id) {
            existing.kind = kind;
            existing.envelope = envelope.clone();
            existing.tombstoned = false;
            return Ok(existing.seq);
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.order.insert(seq, record_id.clone());
        inner.records.insert(
            record_id.clone(),
            StoredRecord {
                record_id: record_id.clone(),
                kind,
                seq,
                envelope: envelope.clone(),
                tombstoned: false,
            },
        );

        Ok(seq)
    }

    async fn load(&self, record_id: &RecordId) -> Result<Option<StoredRecord>> {
        Ok(self.read()?.records.get(record_id).cloned())
    }

    async fn list(&self) -> Result<Vec<StoredRecord>> {
        let inner = self.read()?;
        Ok(inner
            .order
            .values()
            .filter_map(|id| inner.records.get(id).cloned())
            .collect())
    }

    async fn tombstone(&self, record_id: &RecordId) -> Result<bool> {
        let mut inner = self.write()?;
        match inner.records.get_mut(record_id) {
            Some(record) => {
                record.tombstoned = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// In-memory legacy backlog.
#[derive(Default)]
pub struct MemoryLegacySource {
    pending: RwLock<BTreeMap<RecordId, LegacyRecord>>,
}

impl MemoryLegacySource {
    pub fn new(records: impl IntoIterator<Item = LegacyRecord>) -> Self {
        Self {
            pending: RwLock::new(
                records
                    .into_iter()
                    .map(|r| (r.record_id.clone(), r))
                    .collect(),
            ),
        }
    }

    pub fn remaining(&self) -> Result<usize> {
        Ok(self
            .pending
            .read()
            .map_err(|_| StoreError::Poisoned("legacy source"))?
            .len())
    }
}

#[async_trait]
impl LegacySource for MemoryLegacySource {
    async fn pending(&self) -> Result<Vec<LegacyRecord>> {
        Ok(self
            .pending
            .read()
            .map_err(|_| StoreError::Poisoned("legacy source"))?
            .values()
            .cloned()
            .collect())
    }

    async fn mark_migrated(&self, record_id: &RecordId) -> Result<()> {
        self.pending
            .write()
            .map_err(|_| StoreError::Poisoned("legacy source"))?
            .remove(record_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockbox_core::Sha256Hash;

    fn envelope(tag: &str) -> StoredEnvelope {
        StoredEnvelope {
            encrypted_data: format!("{}:00", "00".repeat(12)),
            encapsulated_key: Some("aa".into()),
            encrypted_symmetric_key: Some("bb".into()),
            record_hash: Sha256Hash::hash(tag.as_bytes()).to_hex(),
        }
    }

    #[tokio::test]
    async fn test_persist_assigns_increasing_seq() {
        let store = MemoryStore::new();
        let a = store
            .persist(&RecordId::new("a"), RecordKind::Task, &envelope("a"))
            .await
            .unwrap();
        let b = store
            .persist(&RecordId::new("b"), RecordKind::Note, &envelope("b"))
            .await
            .unwrap();
        assert_eq!((a, b), (1, 2));

        let listed: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.record_id)
            .collect();
        assert_eq!(listed, vec![RecordId::new("a"), RecordId::new("b")]);
    }

    #[tokio::test]
    async fn test_replace_keeps_seq() {
        let store = MemoryStore::new();
        let id = RecordId::new("a");
        store.persist(&id, RecordKind::Task, &envelope("v1")).await.unwrap();
        store.tombstone(&id).await.unwrap();

        let seq = store.persist(&id, RecordKind::Task, &envelope("v2")).await.unwrap();
        assert_eq!(seq, 1);

        let loaded = store.load(&id).await.unwrap().unwrap();
        assert_eq!(loaded.envelope, envelope("v2"));
        assert!(!loaded.tombstoned);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_tombstone() {
        let store = MemoryStore::new();
        let id = RecordId::new("a");
        store.persist(&id, RecordKind::Task, &envelope("a")).await.unwrap();

        assert!(store.tombstone(&id).await.unwrap());
        assert!(!store.tombstone(&RecordId::new("missing")).await.unwrap());

        let leaf = store.load(&id).await.unwrap().unwrap().integrity_leaf().unwrap();
        assert!(leaf.tombstoned);
        assert_eq!(leaf.hash, Sha256Hash::hash(b"a"));
    }

    #[tokio::test]
    async fn test_reject() {
        let store = MemoryStore::new();
        store.reject("bad").unwrap();

        let result = store
            .persist(&RecordId::new("bad"), RecordKind::Task, &envelope("x"))
            .await;
        assert!(matches!(result, Err(StoreError::Backend(_))));
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_bad_record_hash_is_invalid_data() {
        let store = MemoryStore::new();
        let mut env = envelope("a");
        env.record_hash = "zz".into();
        store.persist(&RecordId::new("a"), RecordKind::Task, &env).await.unwrap();

        let record = store.load(&RecordId::new("a")).await.unwrap().unwrap();
        assert!(matches!(record.integrity_leaf(), Err(StoreError::InvalidData(_))));
    }
}
