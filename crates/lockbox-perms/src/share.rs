//! Share negotiation: re-wrapping a resource key for a new recipient.
//!
//! Sharing never touches resource ciphertext. The owner unwraps the
//! resource key with their own wrapped copy, wraps it again for the
//! recipient and emits a [`ShareGrant`].

use std::collections::BTreeSet;

use lockbox_core::ResourceId;

use crate::crypto::SymmetricKey;
use crate::error::{PermsError, Result};
use crate::grant::{Permission, ShareGrant};
use crate::kem::{HybridPublicKey, HybridSecretKey};
use crate::keyshare::WrappedKey;

/// Grant `recipient` access to a resource whose key the caller holds
/// wrapped under their own public key.
///
/// Returns [`PermsError::KeyUnavailable`] if the caller's wrapped key does
/// not open, and [`PermsError::Encapsulation`] if wrapping for the
/// recipient fails.
pub fn grant_access(
    resource_id: ResourceId,
    own_secret: &HybridSecretKey,
    existing: &WrappedKey,
    recipient: &HybridPublicKey,
    permissions: BTreeSet<Permission>,
) -> Result<ShareGrant> {
    let key = existing.unwrap(own_secret).map_err(|e| {
        PermsError::KeyUnavailable(format!("cannot open key for {}: {}", resource_id, e))
    })?;
    grant_with_key(resource_id, &key, recipient, permissions)
}

/// Grant `recipient` access using a resource key already in memory.
pub fn grant_with_key(
    resource_id: ResourceId,
    key: &SymmetricKey,
    recipient: &HybridPublicKey,
    permissions: BTreeSet<Permission>,
) -> Result<ShareGrant> {
    let wrapped_key = WrappedKey::wrap(recipient, key)?;
    Ok(ShareGrant {
        resource_id,
        recipient_fingerprint: recipient.fingerprint(),
        wrapped_key,
        permissions,
    })
}

/// Recipient side: recover the resource key from a grant.
pub fn open_grant(own_secret: &HybridSecretKey, grant: &ShareGrant) -> Result<SymmetricKey> {
    grant.wrapped_key.unwrap(own_secret)
}
