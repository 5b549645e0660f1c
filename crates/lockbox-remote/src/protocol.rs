//! Workflows that span the core and the services.
//!
//! - **Share**: discover the recipient's public key, re-wrap the resource
//!   key for it, deliver the invite.
//! - **Integrity check**: recompute the local root and compare it with the
//!   server's root and leaf count.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use lockbox_core::{IntegrityLeaf, IntegrityRoot, LeafPolicy, ResourceId, Sha256Hash};
use lockbox_perms::{share, HybridKeyPair, Permission, ShareGrant, WrappedKey};

use crate::error::{RemoteError, Result};
use crate::messages::ShareInvite;
use crate::transport::{Directory, IntegrityService, ShareService};

/// Result of a completed share.
#[derive(Debug, Clone)]
pub struct ShareOutcome {
    /// Canonical username of the recipient, as the directory reports it.
    pub recipient_username: String,
    pub grant: ShareGrant,
}

/// Share a resource with `recipient_identifier`.
///
/// The caller's own wrapped copy of the resource key is unwrapped and
/// re-wrapped for the recipient on a blocking thread. Nothing is retried.
pub async fn share_with<D, S>(
    directory: &D,
    shares: &S,
    keys: Arc<HybridKeyPair>,
    resource_id: ResourceId,
    existing: WrappedKey,
    recipient_identifier: &str,
    permissions: BTreeSet<Permission>,
) -> Result<ShareOutcome>
where
    D: Directory + ?Sized,
    S: ShareService + ?Sized,
{
    let identity = directory.lookup(recipient_identifier).await?;
    let recipient_key = identity.public_key()?;
    debug!(
        resource_id = %resource_id,
        recipient = %identity.username,
        "recipient key discovered"
    );

    let grant = tokio::task::spawn_blocking(move || {
        share::grant_access(
            resource_id,
            keys.secret_key(),
            &existing,
            &recipient_key,
            permissions,
        )
    })
    .await
    .map_err(|e| RemoteError::Task(e.to_string()))??;

    let invite = ShareInvite::from_grant(&grant, recipient_identifier);
    shares.invite(&invite).await?;
    debug!(resource_id = %grant.resource_id, recipient = %identity.username, "invite delivered");

    Ok(ShareOutcome {
        recipient_username: identity.username,
        grant,
    })
}

/// Comparison of the local integrity root with the server's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityReport {
    pub local: IntegrityRoot,
    pub server_root: Sha256Hash,
    pub server_leaf_count: usize,
}

impl IntegrityReport {
    pub fn root_matches(&self) -> bool {
        self.local.root == self.server_root
    }

    pub fn count_matches(&self) -> bool {
        self.local.leaf_count == self.server_leaf_count
    }

    /// Both the root and the leaf count agree.
    pub fn is_consistent(&self) -> bool {
        self.root_matches() && self.count_matches()
    }
}

/// Fetch the server root and compare it with one computed from `leaves`.
pub async fn check_integrity<I: IntegrityService + ?Sized>(
    service: &I,
    leaves: &[IntegrityLeaf],
    policy: LeafPolicy,
    now: i64,
) -> Result<IntegrityReport> {
    let reported = service.root().await?;
    let report = IntegrityReport {
        local: IntegrityRoot::compute(leaves, policy, now),
        server_root: reported.root()?,
        server_leaf_count: reported.leaf_count,
    };

    if !report.is_consistent() {
        warn!(
            local_root = %report.local.root,
            server_root = %report.server_root,
            local_leaves = report.local.leaf_count,
            server_leaves = report.server_leaf_count,
            "integrity root mismatch"
        );
    }

    Ok(report)
}
