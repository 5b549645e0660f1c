//! Grant registry.
//!
//! Tracks the grants issued for each resource. There is at most one grant
//! per (resource, recipient) pair; issuing again replaces the previous one.
//! Revocation removes the grant but does not rotate the resource key.

use std::collections::{BTreeMap, HashMap};

use lockbox_core::ResourceId;

use crate::error::{PermsError, Result};
use crate::grant::{Permission, ShareGrant};

/// Grants indexed by resource, then by recipient fingerprint.
#[derive(Debug, Default, Clone)]
pub struct GrantRegistry {
    by_resource: HashMap<ResourceId, BTreeMap<String, ShareGrant>>,
}

impl GrantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a grant, returning the one it replaced.
    pub fn insert(&mut self, grant: ShareGrant) -> Option<ShareGrant> {
        self.by_resource
            .entry(grant.resource_id.clone())
            .or_default()
            .insert(grant.recipient_fingerprint.clone(), grant)
    }

    /// Remove the grant for `(resource_id, fingerprint)`.
    pub fn revoke(&mut self, resource_id: &ResourceId, fingerprint: &str) -> Option<ShareGrant> {
        let holders = self.by_resource.get_mut(resource_id)?;
        let removed = holders.remove(fingerprint);
        if holders.is_empty() {
            self.by_resource.remove(resource_id);
        }
        removed
    }

    pub fn get(&self, resource_id: &ResourceId, fingerprint: &str) -> Option<&ShareGrant> {
        self.by_resource.get(resource_id)?.get(fingerprint)
    }

    /// All grants for a resource, ordered by fingerprint.
    pub fn grants_for(&self, resource_id: &ResourceId) -> Vec<&ShareGrant> {
        self.by_resource
            .get(resource_id)
            .map(|holders| holders.values().collect())
            .unwrap_or_default()
    }

    /// Check whether `fingerprint` may perform `permission` on `resource_id`.
    pub fn can(&self, resource_id: &ResourceId, fingerprint: &str, permission: Permission) -> bool {
        self.get(resource_id, fingerprint)
            .map(|g| g.allows(permission))
            .unwrap_or(false)
    }

    /// Total number of grants.
    pub fn len(&self) -> usize {
        self.by_resource.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_resource.is_empty()
    }

    /// Serialize every grant to CBOR, for local caching.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut grants: Vec<&ShareGrant> = self
            .by_resource
            .values()
            .flat_map(|holders| holders.values())
            .collect();
        grants.sort_by(|a, b| {
            a.resource_id
                .cmp(&b.resource_id)
                .then_with(|| a.recipient_fingerprint.cmp(&b.recipient_fingerprint))
        });

        let mut buf = Vec::new();
        ciborium::into_writer(&grants, &mut buf)
            .map_err(|e| PermsError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Rebuild a registry from [`GrantRegistry::to_bytes`] output.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let grants: Vec<ShareGrant> =
            ciborium::from_reader(bytes).map_err(|e| PermsError::Serialization(e.to_string()))?;

        let mut registry = Self::new();
        for grant in grants {
            registry.insert(grant);
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyshare::WrappedKey;

    fn grant(resource: &str, fingerprint: &str, permissions: &[Permission]) -> ShareGrant {
        ShareGrant {
            resource_id: ResourceId::new(resource),
            recipient_fingerprint: fingerprint.to_string(),
            wrapped_key: WrappedKey {
                encapsulated_key: vec![0; 4],
                wrapped_symmetric_key: vec![1; 4],
            },
            permissions: permissions.iter().copied().collect(),
        }
    }

    #[test]
    fn test_one_grant_per_pair() {
        let mut registry = GrantRegistry::new();
        assert!(registry.insert(grant("f1", "alice", &[Permission::Read])).is_none());

        let replaced = registry.insert(grant("f1", "alice", &[Permission::Write]));
        assert!(replaced.is_some());
        assert_eq!(registry.len(), 1);
        assert!(registry.can(&ResourceId::new("f1"), "alice", Permission::Write));
        assert!(!registry.can(&ResourceId::new("f1"), "alice", Permission::Read));
    }

    #[test]
    fn test_revoke_removes_exactly_one() {
        let mut registry = GrantRegistry::new();
        registry.insert(grant("f1", "alice", &[Permission::Read]));
        registry.insert(grant("f1", "bob", &[Permission::Read]));
        registry.insert(grant("f2", "alice", &[Permission::Read]));

        let removed = registry.revoke(&ResourceId::new("f1"), "alice");
        assert!(removed.is_some());
        assert_eq!(registry.len(), 2);
        assert!(registry.get(&ResourceId::new("f1"), "alice").is_none());
        assert!(registry.get(&ResourceId::new("f1"), "bob").is_some());
        assert!(registry.get(&ResourceId::new("f2"), "alice").is_some());

        assert!(registry.revoke(&ResourceId::new("f1"), "alice").is_none());
    }

    #[test]
    fn test_grants_for_resource() {
        let mut registry = GrantRegistry::new();
        registry.insert(grant("f1", "carol", &[Permission::Read]));
        registry.insert(grant("f1", "alice", &[Permission::Admin]));

        let holders: Vec<_> = registry
            .grants_for(&ResourceId::new("f1"))
            .iter()
            .map(|g| g.recipient_fingerprint.as_str())
            .collect();
        assert_eq!(holders, vec!["alice", "carol"]);
        assert!(registry.grants_for(&ResourceId::new("missing")).is_empty());
    }

    #[test]
    fn test_empty_after_last_revoke() {
        let mut registry = GrantRegistry::new();
        registry.insert(grant("f1", "alice", &[Permission::Read]));
        registry.revoke(&ResourceId::new("f1"), "alice");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_bytes_roundtrip() {
        let mut registry = GrantRegistry::new();
        registry.insert(grant("f1", "alice", &[Permission::Read]));
        registry.insert(grant("f2", "bob", &[Permission::Share, Permission::Write]));

        let restored = GrantRegistry::from_bytes(&registry.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.len(), 2);
        assert!(restored.can(&ResourceId::new("f2"), "bob", Permission::Share));
    }
}
