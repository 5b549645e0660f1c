//! Migration of the plaintext backlog into encrypted records.
//!
//! A run moves through `Idle -> Running -> Completed`. Each legacy record
//! is encrypted with a caller-supplied function and persisted. A failure
//! is counted and described in the job, and the run continues. Progress
//! snapshots are published on a watch channel after every item.
//!
//! Re-running over a [`LegacySource`] is idempotent: migrated records leave
//! the backlog, and persisting the same record again replaces it in place.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{info, warn};

use lockbox_core::{Record, RecordId};
use lockbox_perms::{EnvelopeRecord, HybridPublicKey, PermsError};

use crate::error::{Result, StoreError};
use crate::traits::{LegacyRecord, LegacySource, RecordStore};

/// Phase of a migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStatus {
    #[default]
    Idle,
    Running,
    Completed,
}

/// Progress and outcome of one migration run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MigrationJob {
    pub total: usize,
    pub migrated: usize,
    pub failed: usize,
    /// One human-readable message per failed record.
    pub errors: Vec<String>,
    pub status: MigrationStatus,
}

impl MigrationJob {
    /// Whether the run finished with no failures.
    pub fn success(&self) -> bool {
        self.status == MigrationStatus::Completed && self.failed == 0
    }

    /// Items not yet finished.
    pub fn remaining(&self) -> usize {
        self.total - self.migrated - self.failed
    }
}

/// Migration configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Records encrypted and persisted at once.
    pub concurrency: usize,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

/// The function used to encrypt each legacy record.
pub type EncryptFn =
    dyn Fn(&HybridPublicKey, &Record) -> std::result::Result<EnvelopeRecord, PermsError>
        + Send
        + Sync;

/// Runs migrations against one record store.
pub struct MigrationCoordinator<S: RecordStore + 'static> {
    store: Arc<S>,
    config: MigrationConfig,
    progress: watch::Sender<MigrationJob>,
    running: Mutex<()>,
}

impl<S: RecordStore + 'static> MigrationCoordinator<S> {
    pub fn new(store: Arc<S>, config: MigrationConfig) -> Self {
        let (progress, _) = watch::channel(MigrationJob::default());
        Self {
            store,
            config,
            progress,
            running: Mutex::new(()),
        }
    }

    /// Subscribe to progress snapshots.
    pub fn subscribe(&self) -> watch::Receiver<MigrationJob> {
        self.progress.subscribe()
    }

    /// The latest progress snapshot.
    pub fn current(&self) -> MigrationJob {
        self.progress.borrow().clone()
    }

    /// Migrate `legacy` records for `owner`.
    ///
    /// Returns [`StoreError::MigrationInProgress`] if another run is active.
    /// Item failures never abort the run.
    pub async fn migrate_all(
        &self,
        owner: &HybridPublicKey,
        legacy: Vec<LegacyRecord>,
        encrypt: Arc<EncryptFn>,
    ) -> Result<MigrationJob> {
        self.run(owner, legacy, encrypt, None::<Arc<NoSource>>).await
    }

    /// Migrate everything still pending in `source`, removing each record
    /// from the backlog once it is stored.
    pub async fn migrate_pending<L: LegacySource + 'static>(
        &self,
        owner: &HybridPublicKey,
        source: Arc<L>,
        encrypt: Arc<EncryptFn>,
    ) -> Result<MigrationJob> {
        let legacy = source.pending().await?;
        self.run(owner, legacy, encrypt, Some(source)).await
    }

    async fn run<L: LegacySource + 'static>(
        &self,
        owner: &HybridPublicKey,
        legacy: Vec<LegacyRecord>,
        encrypt: Arc<EncryptFn>,
        source: Option<Arc<L>>,
    ) -> Result<MigrationJob> {
        let _guard = self
            .running
            .try_lock()
            .map_err(|_| StoreError::MigrationInProgress)?;

        let mut job = MigrationJob {
            total: legacy.len(),
            status: MigrationStatus::Running,
            ..Default::default()
        };
        self.progress.send_replace(job.clone());
        info!(total = job.total, concurrency = self.config.concurrency, "migration started");

        let permits = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for item in legacy {
            let permits = permits.clone();
            let store = self.store.clone();
            let encrypt = encrypt.clone();
            let owner = owner.clone();
            let source = source.clone();

            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;
                let record_id = item.record_id.clone();
                let outcome = migrate_one(store.as_ref(), &owner, item, encrypt).await;
                if outcome.is_ok() {
                    if let Some(source) = source {
                        if let Err(e) = source.mark_migrated(&record_id).await {
                            warn!(record_id = %record_id, error = %e, "failed to clear backlog entry");
                        }
                    }
                }
                (record_id, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(()))) => job.migrated += 1,
                Ok((record_id, Err(e))) => {
                    warn!(record_id = %record_id, error = %e, "record migration failed");
                    job.failed += 1;
                    job.errors.push(e.to_string());
                }
                Err(join_error) => {
                    warn!(error = %join_error, "migration task aborted");
                    job.failed += 1;
                    job.errors.push(format!("migration task aborted: {}", join_error));
                }
            }
            self.progress.send_replace(job.clone());
        }

        job.status = MigrationStatus::Completed;
        self.progress.send_replace(job.clone());
        info!(
            migrated = job.migrated,
            failed = job.failed,
            "migration completed"
        );

        Ok(job)
    }
}

async fn migrate_one<S: RecordStore + ?Sized>(
    store: &S,
    owner: &HybridPublicKey,
    item: LegacyRecord,
    encrypt: Arc<EncryptFn>,
) -> Result<()> {
    let record_id = item.record_id;
    let kind = item.record.kind();
    let owner = owner.clone();
    let record = item.record;

    let envelope = tokio::task::spawn_blocking(move || encrypt(&owner, &record))
        .await
        .map_err(|e| item_error(&record_id, e))?
        .map_err(|e| item_error(&record_id, e))?;

    store
        .persist(&record_id, kind, &envelope.to_stored())
        .await
        .map_err(|e| item_error(&record_id, e))?;

    Ok(())
}

fn item_error(record_id: &RecordId, e: impl std::fmt::Display) -> StoreError {
    StoreError::MigrationItem {
        record_id: record_id.to_string(),
        message: e.to_string(),
    }
}

/// Placeholder source for runs over an explicit record list.
struct NoSource;

#[async_trait::async_trait]
impl LegacySource for NoSource {
    async fn pending(&self) -> Result<Vec<LegacyRecord>> {
        Ok(Vec::new())
    }

    async fn mark_migrated(&self, _record_id: &RecordId) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryLegacySource, MemoryStore};
    use lockbox_core::{Priority, TaskRecord, TaskStatus};
    use lockbox_perms::{codec, HybridKeyPair};

    fn legacy(n: usize) -> Vec<LegacyRecord> {
        (1..=n)
            .map(|i| {
                LegacyRecord::new(
                    format!("task-{}", i),
                    Record::Task(TaskRecord {
                        title: format!("Task {}", i),
                        description: String::new(),
                        notes: String::new(),
                        priority: Priority::Medium,
                        status: TaskStatus::Todo,
                        due_date: None,
                    }),
                )
            })
            .collect()
    }

    fn encode_fn() -> Arc<EncryptFn> {
        Arc::new(codec::encode)
    }

    /// Fails for every record whose title ends in a multiple of three.
    fn flaky_encode_fn() -> Arc<EncryptFn> {
        Arc::new(|owner: &HybridPublicKey, record: &Record| {
            if let Record::Task(t) = record {
                let n: usize = t.title.trim_start_matches("Task ").parse().unwrap_or(0);
                if n % 3 == 0 {
                    return Err(PermsError::Encryption(format!("refused {}", t.title)));
                }
            }
            codec::encode(owner, record)
        })
    }

    #[tokio::test]
    async fn test_all_succeed() {
        let owner = HybridKeyPair::generate();
        let store = Arc::new(MemoryStore::new());
        let coordinator = MigrationCoordinator::new(store.clone(), MigrationConfig::default());

        let job = coordinator
            .migrate_all(owner.public_key(), legacy(4), encode_fn())
            .await
            .unwrap();

        assert!(job.success());
        assert_eq!(job.migrated, 4);
        assert_eq!(store.len().unwrap(), 4);
        assert_eq!(coordinator.current().status, MigrationStatus::Completed);
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let owner = HybridKeyPair::generate();
        let store = Arc::new(MemoryStore::new());
        let coordinator = MigrationCoordinator::new(store.clone(), MigrationConfig::default());

        let job = coordinator
            .migrate_all(owner.public_key(), legacy(10), flaky_encode_fn())
            .await
            .unwrap();

        assert_eq!(job.status, MigrationStatus::Completed);
        assert_eq!(job.total, 10);
        assert_eq!(job.migrated, 7);
        assert_eq!(job.failed, 3);
        assert_eq!(job.errors.len(), 3);
        assert!(!job.success());
        assert_eq!(store.len().unwrap(), 7);
        assert!(job.errors.iter().any(|e| e.contains("task-6")));
    }

    #[tokio::test]
    async fn test_store_failures_are_collected() {
        let owner = HybridKeyPair::generate();
        let store = Arc::new(MemoryStore::new());
        store.reject("task-2").unwrap();
        let coordinator = MigrationCoordinator::new(store.clone(), MigrationConfig { concurrency: 3 });

        let job = coordinator
            .migrate_all(owner.public_key(), legacy(5), encode_fn())
            .await
            .unwrap();

        assert_eq!(job.migrated, 4);
        assert_eq!(job.failed, 1);
        assert!(job.errors[0].contains("task-2"));
    }

    #[tokio::test]
    async fn test_progress_is_published() {
        let owner = HybridKeyPair::generate();
        let store = Arc::new(MemoryStore::new());
        let coordinator = MigrationCoordinator::new(store, MigrationConfig::default());
        let rx = coordinator.subscribe();
        assert_eq!(rx.borrow().status, MigrationStatus::Idle);

        coordinator
            .migrate_all(owner.public_key(), legacy(3), encode_fn())
            .await
            .unwrap();

        let last = rx.borrow().clone();
        assert_eq!(last.status, MigrationStatus::Completed);
        assert_eq!(last.migrated, 3);
        assert_eq!(last.remaining(), 0);
    }

    #[tokio::test]
    async fn test_rescan_is_idempotent() {
        let owner = HybridKeyPair::generate();
        let store = Arc::new(MemoryStore::new());
        let source = Arc::new(MemoryLegacySource::new(legacy(10)));
        let coordinator = MigrationCoordinator::new(store.clone(), MigrationConfig::default());

        let first = coordinator
            .migrate_pending(owner.public_key(), source.clone(), flaky_encode_fn())
            .await
            .unwrap();
        assert_eq!(first.migrated, 7);
        assert_eq!(source.remaining().unwrap(), 3);

        let second = coordinator
            .migrate_pending(owner.public_key(), source.clone(), encode_fn())
            .await
            .unwrap();
        assert_eq!(second.total, 3);
        assert!(second.success());
        assert_eq!(source.remaining().unwrap(), 0);
        assert_eq!(store.len().unwrap(), 10);
    }

    #[tokio::test]
    async fn test_migrated_records_decode() {
        let owner = HybridKeyPair::generate();
        let store = Arc::new(MemoryStore::new());
        let coordinator = MigrationCoordinator::new(store.clone(), MigrationConfig::default());
        let items = legacy(2);

        coordinator
            .migrate_all(owner.public_key(), items.clone(), encode_fn())
            .await
            .unwrap();

        for item in items {
            let stored = store.load(&item.record_id).await.unwrap().unwrap();
            let decoded = codec::decode_stored(owner.secret_key(), &stored.envelope).unwrap();
            assert_eq!(decoded, item.record);
        }
    }
}
