//! # Lockbox Store
//!
//! Storage abstraction for encrypted records, plus migration of the
//! plaintext backlog into them.
//!
//! ## Key Types
//!
//! - [`RecordStore`] - Async persistence for encrypted records
//! - [`LegacySource`] - The still-unmigrated plaintext backlog
//! - [`MemoryStore`] / [`MemoryLegacySource`] - In-memory implementations
//! - [`MigrationCoordinator`] - Encrypts and persists the backlog
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lockbox_perms::{codec, HybridKeyPair};
//! use lockbox_store::{MemoryLegacySource, MemoryStore, MigrationConfig, MigrationCoordinator};
//!
//! async fn example(backlog: MemoryLegacySource) {
//!     let owner = HybridKeyPair::generate();
//!     let store = Arc::new(MemoryStore::new());
//!     let coordinator = MigrationCoordinator::new(store, MigrationConfig::default());
//!
//!     let job = coordinator
//!         .migrate_pending(owner.public_key(), Arc::new(backlog), Arc::new(codec::encode))
//!         .await
//!         .unwrap();
//!     println!("migrated {} of {}", job.migrated, job.total);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Replace in place**: persisting an existing record keeps its `seq`
//! - **Soft deletes**: tombstoned records stay listed for integrity checks
//! - **No retries**: backend failures are returned as-is

pub mod error;
pub mod memory;
pub mod migration;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::{MemoryLegacySource, MemoryStore};
pub use migration::{
    EncryptFn, MigrationConfig, MigrationCoordinator, MigrationJob, MigrationStatus,
};
pub use traits::{integrity_leaves, LegacyRecord, LegacySource, RecordStore, StoredRecord};
