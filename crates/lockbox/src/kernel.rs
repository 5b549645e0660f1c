//! The Lockbox facade: one API over encryption, storage, sharing,
//! integrity checks and migration.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, RwLock};
use tracing::{debug, info};

use lockbox_core::{IntegrityRoot, LeafPolicy, Record, RecordId, ResourceId};
use lockbox_perms::{
    codec, share, EnvelopeRecord, GrantRegistry, HybridPublicKey, Permission, PermsError,
    ShareGrant, SymmetricKey, WrappedKey,
};
use lockbox_remote::{
    check_integrity, share_with, Directory, IntegrityReport, IntegrityService, ShareOutcome,
    ShareService,
};
use lockbox_store::{
    integrity_leaves, EncryptFn, LegacySource, MigrationConfig, MigrationCoordinator,
    MigrationJob, RecordStore,
};

use crate::batch;
use crate::error::{LockboxError, Result};
use crate::session::Session;

/// Configuration for Lockbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LockboxConfig {
    /// Records decrypted at once by batch decodes.
    pub decode_concurrency: usize,
    /// Recipients wrapped for at once by batch grants.
    pub share_concurrency: usize,
    /// Which records contribute integrity leaves.
    pub leaf_policy: LeafPolicy,
    /// Migration configuration.
    pub migration: MigrationConfig,
}

impl Default for LockboxConfig {
    fn default() -> Self {
        Self {
            decode_concurrency: 8,
            share_concurrency: 4,
            leaf_policy: LeafPolicy::default(),
            migration: MigrationConfig::default(),
        }
    }
}

impl LockboxConfig {
    /// Load from JSON. Missing fields take their defaults.
    pub fn from_json(s: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(s).map_err(|e| LockboxError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.decode_concurrency == 0 {
            return Err(LockboxError::Config("decode_concurrency must be at least 1".into()));
        }
        if self.share_concurrency == 0 {
            return Err(LockboxError::Config("share_concurrency must be at least 1".into()));
        }
        if self.migration.concurrency == 0 {
            return Err(LockboxError::Config(
                "migration.concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// The main Lockbox struct.
///
/// Provides a unified API for:
/// - Encrypting, storing and decrypting records
/// - Granting access to shared resources
/// - Checking the record set against the server's integrity root
/// - Migrating the plaintext backlog
///
/// Holds no key material. Every operation that needs keys takes a
/// [`Session`].
pub struct Lockbox<S: RecordStore + 'static, R> {
    store: Arc<S>,
    remote: Arc<R>,
    config: LockboxConfig,
    grants: RwLock<GrantRegistry>,
    migration: MigrationCoordinator<S>,
}

impl<S, R> Lockbox<S, R>
where
    S: RecordStore + 'static,
    R: Directory + ShareService + IntegrityService + 'static,
{
    /// Create a new Lockbox instance.
    pub fn new(store: S, remote: R, config: LockboxConfig) -> Self {
        let store = Arc::new(store);
        let migration = MigrationCoordinator::new(store.clone(), config.migration.clone());
        Self {
            store,
            remote: Arc::new(remote),
            config,
            grants: RwLock::new(GrantRegistry::new()),
            migration,
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the remote services reference.
    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn config(&self) -> &LockboxConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Records
    // ─────────────────────────────────────────────────────────────────────────

    /// Encrypt a record for the session owner under a fresh key.
    pub async fn encode(&self, session: &Session, record: Record) -> Result<EnvelopeRecord> {
        let keys = session.keys();
        batch::blocking(move || Ok(codec::encode(keys.public_key(), &record)?)).await
    }

    /// Encrypt a record under an existing resource key.
    pub async fn encode_with_key(
        &self,
        session: &Session,
        key: SymmetricKey,
        record: Record,
    ) -> Result<EnvelopeRecord> {
        let keys = session.keys();
        batch::blocking(move || Ok(codec::encode_with_key(keys.public_key(), &key, &record)?))
            .await
    }

    /// Decrypt a record and check its hash.
    pub async fn decode(&self, session: &Session, envelope: EnvelopeRecord) -> Result<Record> {
        let keys = session.keys();
        batch::blocking(move || Ok(codec::decode(keys.secret_key(), &envelope)?)).await
    }

    /// Decrypt many records with bounded parallelism.
    ///
    /// One outcome per envelope, in input order.
    pub async fn decode_many(
        &self,
        session: &Session,
        envelopes: Vec<EnvelopeRecord>,
    ) -> Vec<Result<Record>> {
        let total = envelopes.len();
        let jobs: Vec<_> = envelopes
            .into_iter()
            .map(|envelope| {
                let keys = session.keys();
                move || -> Result<Record> { Ok(codec::decode(keys.secret_key(), &envelope)?) }
            })
            .collect();

        let results = batch::run_blocking(self.config.decode_concurrency, jobs).await;
        let failed = results.iter().filter(|r| r.is_err()).count();
        debug!(total, failed, "batch decode finished");
        results
    }

    /// Encrypt and persist a record. Returns its sequence number.
    pub async fn save(&self, session: &Session, record_id: RecordId, record: Record) -> Result<u64> {
        let kind = record.kind();
        let envelope = self.encode(session, record).await?;
        let seq = self
            .store
            .persist(&record_id, kind, &envelope.to_stored())
            .await?;
        debug!(record_id = %record_id, seq, "record saved");
        Ok(seq)
    }

    /// Load and decrypt a stored record.
    pub async fn load(&self, session: &Session, record_id: &RecordId) -> Result<Record> {
        let stored = self
            .store
            .load(record_id)
            .await?
            .ok_or_else(|| LockboxError::RecordNotFound(record_id.to_string()))?;
        if stored.tombstoned {
            return Err(LockboxError::RecordDeleted(record_id.to_string()));
        }
        self.decode(session, EnvelopeRecord::from_stored(&stored.envelope)?)
            .await
    }

    /// Load and decrypt every live record, in `seq` order.
    pub async fn load_all(&self, session: &Session) -> Result<Vec<(RecordId, Result<Record>)>> {
        let live: Vec<_> = self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|r| !r.tombstoned)
            .collect();

        let mut slots: Vec<(RecordId, Option<Result<Record>>)> = Vec::with_capacity(live.len());
        let mut envelopes = Vec::with_capacity(live.len());
        for stored in live {
            match EnvelopeRecord::from_stored(&stored.envelope) {
                Ok(envelope) => {
                    envelopes.push(envelope);
                    slots.push((stored.record_id, None));
                }
                Err(e) => slots.push((stored.record_id, Some(Err(e.into())))),
            }
        }

        let mut decoded = self.decode_many(session, envelopes).await.into_iter();
        let out = slots
            .into_iter()
            .map(|(record_id, slot)| {
                let outcome = slot.or_else(|| decoded.next()).unwrap_or_else(|| {
                    Err(LockboxError::Task("missing decode result".into()))
                });
                (record_id, outcome)
            })
            .collect();
        Ok(out)
    }

    /// Soft-delete a record.
    pub async fn delete(&self, record_id: &RecordId) -> Result<()> {
        if self.store.tombstone(record_id).await? {
            Ok(())
        } else {
            Err(LockboxError::RecordNotFound(record_id.to_string()))
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sharing
    // ─────────────────────────────────────────────────────────────────────────

    /// Grant `recipient` access to a resource whose key the session owner
    /// holds as `existing`.
    pub async fn grant_access(
        &self,
        session: &Session,
        resource_id: ResourceId,
        existing: WrappedKey,
        recipient: HybridPublicKey,
        permissions: BTreeSet<Permission>,
    ) -> Result<ShareGrant> {
        let keys = session.keys();
        let grant = batch::blocking(move || {
            Ok(share::grant_access(
                resource_id,
                keys.secret_key(),
                &existing,
                &recipient,
                permissions,
            )?)
        })
        .await?;

        self.grants.write().await.insert(grant.clone());
        Ok(grant)
    }

    /// Grant several recipients access to one resource.
    ///
    /// The resource key is unwrapped once. One outcome per recipient, in
    /// input order; an unusable recipient key fails only its own entry.
    pub async fn grant_many(
        &self,
        session: &Session,
        resource_id: ResourceId,
        existing: WrappedKey,
        recipients: Vec<HybridPublicKey>,
        permissions: BTreeSet<Permission>,
    ) -> Result<Vec<Result<ShareGrant>>> {
        let keys = session.keys();
        let key = batch::blocking(move || {
            existing.unwrap(keys.secret_key()).map_err(|e| {
                LockboxError::Crypto(PermsError::KeyUnavailable(format!(
                    "cannot open resource key: {}",
                    e
                )))
            })
        })
        .await?;
        let key = Arc::new(key);

        let jobs: Vec<_> = recipients
            .into_iter()
            .map(|recipient| {
                let key = key.clone();
                let resource_id = resource_id.clone();
                let permissions = permissions.clone();
                move || -> Result<ShareGrant> {
                    Ok(share::grant_with_key(
                        resource_id,
                        &key,
                        &recipient,
                        permissions,
                    )?)
                }
            })
            .collect();

        let results = batch::run_blocking(self.config.share_concurrency, jobs).await;

        let mut registry = self.grants.write().await;
        for grant in results.iter().flatten() {
            registry.insert(grant.clone());
        }
        info!(
            resource_id = %resource_id,
            granted = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "batch grant finished"
        );

        Ok(results)
    }

    /// Discover a recipient by email or username, grant them access and
    /// deliver the invite.
    pub async fn share_with(
        &self,
        session: &Session,
        resource_id: ResourceId,
        existing: WrappedKey,
        recipient_identifier: &str,
        permissions: BTreeSet<Permission>,
    ) -> Result<ShareOutcome> {
        let outcome = share_with(
            self.remote.as_ref(),
            self.remote.as_ref(),
            session.keys(),
            resource_id,
            existing,
            recipient_identifier,
            permissions,
        )
        .await?;

        self.grants.write().await.insert(outcome.grant.clone());
        info!(
            resource_id = %outcome.grant.resource_id,
            recipient = %outcome.recipient_username,
            "resource shared"
        );
        Ok(outcome)
    }

    /// Recipient side: recover a resource key from a received grant.
    pub async fn open_grant(&self, session: &Session, grant: ShareGrant) -> Result<SymmetricKey> {
        let keys = session.keys();
        batch::blocking(move || Ok(share::open_grant(keys.secret_key(), &grant)?)).await
    }

    /// Forget the grant for `(resource_id, fingerprint)`.
    ///
    /// The resource key is not rotated.
    pub async fn revoke(&self, resource_id: &ResourceId, fingerprint: &str) -> Option<ShareGrant> {
        self.grants.write().await.revoke(resource_id, fingerprint)
    }

    /// Whether the holder of `fingerprint` has `permission` on a resource.
    pub async fn can(
        &self,
        resource_id: &ResourceId,
        fingerprint: &str,
        permission: Permission,
    ) -> bool {
        self.grants
            .read()
            .await
            .can(resource_id, fingerprint, permission)
    }

    /// Grants issued for a resource.
    pub async fn grants_for(&self, resource_id: &ResourceId) -> Vec<ShareGrant> {
        self.grants
            .read()
            .await
            .grants_for(resource_id)
            .into_iter()
            .cloned()
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Integrity
    // ─────────────────────────────────────────────────────────────────────────

    /// Integrity root over the stored records.
    pub async fn integrity_root(&self) -> Result<IntegrityRoot> {
        let leaves = integrity_leaves(self.store.as_ref()).await?;
        Ok(IntegrityRoot::compute(&leaves, self.config.leaf_policy, now_millis()))
    }

    /// Compare the stored records with the server's integrity root.
    pub async fn verify_integrity(&self) -> Result<IntegrityReport> {
        let leaves = integrity_leaves(self.store.as_ref()).await?;
        Ok(check_integrity(
            self.remote.as_ref(),
            &leaves,
            self.config.leaf_policy,
            now_millis(),
        )
        .await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Migration
    // ─────────────────────────────────────────────────────────────────────────

    /// Encrypt and store everything pending in `source`.
    pub async fn migrate<L: LegacySource + 'static>(
        &self,
        session: &Session,
        source: Arc<L>,
    ) -> Result<MigrationJob> {
        let encrypt: Arc<EncryptFn> = Arc::new(codec::encode);
        Ok(self
            .migration
            .migrate_pending(session.public_key(), source, encrypt)
            .await?)
    }

    /// Subscribe to migration progress.
    pub fn migration_progress(&self) -> watch::Receiver<MigrationJob> {
        self.migration.subscribe()
    }
}

/// Current time in Unix milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
