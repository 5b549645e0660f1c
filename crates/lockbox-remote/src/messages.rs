//! Wire messages exchanged with the Lockbox services.
//!
//! All messages are camelCase JSON with byte fields hex-encoded.

use serde::{Deserialize, Serialize};

use lockbox_core::{ResourceId, Sha256Hash};
use lockbox_perms::{parse_permissions, HybridPublicKey, Permission, ShareGrant, WrappedKey};

use crate::error::{RemoteError, Result};

/// Message size limits.
pub mod limits {
    /// Max length of an email or username.
    pub const MAX_IDENTIFIER_LEN: usize = 254;
    /// Max entries in ShareInvite.permissions.
    pub const MAX_PERMISSIONS: usize = 4;
}

/// Directory entry: `GET /identity/{emailOrUsername}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRecord {
    pub username: String,
    /// Hex-encoded hybrid public key.
    pub public_key: String,
}

impl IdentityRecord {
    pub fn new(username: impl Into<String>, public_key: &HybridPublicKey) -> Self {
        Self {
            username: username.into(),
            public_key: public_key.to_hex(),
        }
    }

    /// Parse the published public key.
    pub fn public_key(&self) -> Result<HybridPublicKey> {
        Ok(HybridPublicKey::from_hex(&self.public_key)?)
    }
}

/// Share request: `POST /share/invite`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareInvite {
    pub resource_id: ResourceId,
    pub recipient_identifier: String,
    /// Hex of the encapsulated key followed by the wrapped symmetric key.
    pub wrapped_key: String,
    pub permissions: Vec<String>,
}

impl ShareInvite {
    /// Build the invite that delivers `grant` to `recipient_identifier`.
    pub fn from_grant(grant: &ShareGrant, recipient_identifier: impl Into<String>) -> Self {
        Self {
            resource_id: grant.resource_id.clone(),
            recipient_identifier: recipient_identifier.into(),
            wrapped_key: hex::encode(grant.wrapped_key.to_invite_bytes()),
            permissions: grant.permission_names(),
        }
    }

    /// Recipient side: rebuild the grant from a received invite.
    pub fn to_grant(&self, recipient_fingerprint: impl Into<String>) -> Result<ShareGrant> {
        Ok(ShareGrant {
            resource_id: self.resource_id.clone(),
            recipient_fingerprint: recipient_fingerprint.into(),
            wrapped_key: self.wrapped_key()?,
            permissions: self.parsed_permissions()?,
        })
    }

    pub fn wrapped_key(&self) -> Result<WrappedKey> {
        let bytes = hex::decode(&self.wrapped_key)
            .map_err(|e| RemoteError::InvalidMessage(format!("wrappedKey: {}", e)))?;
        Ok(WrappedKey::from_invite_bytes(&bytes)?)
    }

    pub fn parsed_permissions(&self) -> Result<std::collections::BTreeSet<Permission>> {
        Ok(parse_permissions(&self.permissions)?)
    }

    /// Check the invite against the message limits.
    pub fn validate(&self) -> Result<()> {
        if self.recipient_identifier.is_empty()
            || self.recipient_identifier.len() > limits::MAX_IDENTIFIER_LEN
        {
            return Err(RemoteError::InvalidMessage(
                "recipientIdentifier length out of range".into(),
            ));
        }
        if self.permissions.is_empty() || self.permissions.len() > limits::MAX_PERMISSIONS {
            return Err(RemoteError::InvalidMessage(format!(
                "expected 1..={} permissions, got {}",
                limits::MAX_PERMISSIONS,
                self.permissions.len()
            )));
        }
        self.parsed_permissions()?;
        self.wrapped_key()?;
        Ok(())
    }
}

/// Server-side integrity summary: `GET /integrity/root`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityRootReport {
    /// Hex Merkle root.
    pub merkle_root: String,
    pub leaf_count: usize,
}

impl IntegrityRootReport {
    pub fn new(root: &Sha256Hash, leaf_count: usize) -> Self {
        Self {
            merkle_root: root.to_hex(),
            leaf_count,
        }
    }

    pub fn root(&self) -> Result<Sha256Hash> {
        Sha256Hash::from_hex(&self.merkle_root)
            .map_err(|e| RemoteError::InvalidMessage(format!("merkleRoot: {}", e)))
    }
}
