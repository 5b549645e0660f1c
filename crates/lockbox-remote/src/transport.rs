//! Service collaborator traits.
//!
//! The core reaches the Lockbox server through three narrow traits. HTTP
//! clients implement them in the application; the [`memory`] module
//! provides an in-process server for tests.

use async_trait::async_trait;

use crate::error::Result;
use crate::messages::{IdentityRecord, IntegrityRootReport, ShareInvite};

/// Public-key discovery.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Look a user up by email or username.
    ///
    /// Returns [`crate::RemoteError::IdentityNotFound`] for unknown users.
    async fn lookup(&self, email_or_username: &str) -> Result<IdentityRecord>;
}

/// Delivery of share invites.
#[async_trait]
pub trait ShareService: Send + Sync {
    async fn invite(&self, invite: &ShareInvite) -> Result<()>;
}

/// The server's view of the record set.
#[async_trait]
pub trait IntegrityService: Send + Sync {
    async fn root(&self) -> Result<IntegrityRootReport>;
}

/// An in-memory server for testing.
pub mod memory {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use lockbox_core::Sha256Hash;
    use lockbox_perms::HybridPublicKey;

    use crate::error::RemoteError;

    #[derive(Default)]
    struct ServerState {
        /// username -> identity
        identities: HashMap<String, IdentityRecord>,
        /// email -> username
        emails: HashMap<String, String>,
        invites: Vec<ShareInvite>,
        /// Recipients whose invites are refused.
        refused: HashSet<String>,
        integrity: Option<IntegrityRootReport>,
    }

    /// Directory, share and integrity services backed by shared memory.
    #[derive(Clone, Default)]
    pub struct MemoryServer {
        state: Arc<RwLock<ServerState>>,
    }

    impl MemoryServer {
        pub fn new() -> Self {
            Self::default()
        }

        /// Publish a user's public key.
        pub async fn register(
            &self,
            username: &str,
            email: Option<&str>,
            public_key: &HybridPublicKey,
        ) {
            let mut state = self.state.write().await;
            state
                .identities
                .insert(username.to_string(), IdentityRecord::new(username, public_key));
            if let Some(email) = email {
                state
                    .emails
                    .insert(email.to_ascii_lowercase(), username.to_string());
            }
        }

        /// Publish a raw identity, valid or not.
        pub async fn register_raw(&self, identity: IdentityRecord) {
            self.state
                .write()
                .await
                .identities
                .insert(identity.username.clone(), identity);
        }

        /// Refuse every future invite addressed to `recipient_identifier`.
        pub async fn refuse_invites_for(&self, recipient_identifier: &str) {
            self.state
                .write()
                .await
                .refused
                .insert(recipient_identifier.to_string());
        }

        /// Set the integrity root the server reports.
        pub async fn set_integrity_root(&self, root: &Sha256Hash, leaf_count: usize) {
            self.state.write().await.integrity = Some(IntegrityRootReport::new(root, leaf_count));
        }

        /// Invites received so far, in arrival order.
        pub async fn invites(&self) -> Vec<ShareInvite> {
            self.state.read().await.invites.clone()
        }

        /// Invites addressed to one recipient.
        pub async fn invites_for(&self, recipient_identifier: &str) -> Vec<ShareInvite> {
            self.state
                .read()
                .await
                .invites
                .iter()
                .filter(|i| i.recipient_identifier == recipient_identifier)
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl Directory for MemoryServer {
        async fn lookup(&self, email_or_username: &str) -> Result<IdentityRecord> {
            let state = self.state.read().await;
            let username = state
                .emails
                .get(&email_or_username.to_ascii_lowercase())
                .map(String::as_str)
                .unwrap_or(email_or_username);

            state
                .identities
                .get(username)
                .cloned()
                .ok_or_else(|| RemoteError::IdentityNotFound(email_or_username.to_string()))
        }
    }

    #[async_trait]
    impl ShareService for MemoryServer {
        async fn invite(&self, invite: &ShareInvite) -> Result<()> {
            invite.validate()?;

            let mut state = self.state.write().await;
            if state.refused.contains(&invite.recipient_identifier) {
                return Err(RemoteError::Service(format!(
                    "invite to {} refused",
                    invite.recipient_identifier
                )));
            }
            state.invites.push(invite.clone());
            Ok(())
        }
    }

    #[async_trait]
    impl IntegrityService for MemoryServer {
        async fn root(&self) -> Result<IntegrityRootReport> {
            self.state
                .read()
                .await
                .integrity
                .clone()
                .ok_or_else(|| RemoteError::Service("no integrity root published".into()))
        }
    }
}
