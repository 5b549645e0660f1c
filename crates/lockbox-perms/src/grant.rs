//! Share grants.
//!
//! A grant gives one recipient access to one resource by carrying the
//! resource key wrapped for that recipient's public key.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use lockbox_core::ResourceId;

use crate::error::{PermsError, Result};
use crate::keyshare::WrappedKey;

/// An action a grant permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
    Share,
    /// Implies every other permission.
    Admin,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::Write => "write",
            Permission::Share => "share",
            Permission::Admin => "admin",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = PermsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "read" => Ok(Permission::Read),
            "write" => Ok(Permission::Write),
            "share" => Ok(Permission::Share),
            "admin" => Ok(Permission::Admin),
            other => Err(PermsError::Serialization(format!(
                "unknown permission: {}",
                other
            ))),
        }
    }
}

/// Access to one resource for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareGrant {
    pub resource_id: ResourceId,

    /// SHA-256 hex of the recipient's public key bytes.
    pub recipient_fingerprint: String,

    /// The resource key, wrapped for the recipient.
    pub wrapped_key: WrappedKey,

    pub permissions: BTreeSet<Permission>,
}

impl ShareGrant {
    /// Check whether this grant permits `permission`.
    pub fn allows(&self, permission: Permission) -> bool {
        self.permissions.contains(&Permission::Admin) || self.permissions.contains(&permission)
    }

    /// Permission names, sorted, as sent on the wire.
    pub fn permission_names(&self) -> Vec<String> {
        self.permissions.iter().map(|p| p.as_str().to_string()).collect()
    }

    /// Serialize to CBOR bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| PermsError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| PermsError::Serialization(e.to_string()))
    }
}

/// Parse wire permission names.
pub fn parse_permissions<I, S>(names: I) -> Result<BTreeSet<Permission>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names.into_iter().map(|s| s.as_ref().parse()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(permissions: &[Permission]) -> ShareGrant {
        ShareGrant {
            resource_id: ResourceId::new("folder-1"),
            recipient_fingerprint: "ab".repeat(32),
            wrapped_key: WrappedKey {
                encapsulated_key: vec![1, 2, 3],
                wrapped_symmetric_key: vec![4, 5, 6],
            },
            permissions: permissions.iter().copied().collect(),
        }
    }

    #[test]
    fn test_allows() {
        let read_only = grant(&[Permission::Read]);
        assert!(read_only.allows(Permission::Read));
        assert!(!read_only.allows(Permission::Write));

        let admin = grant(&[Permission::Admin]);
        assert!(admin.allows(Permission::Read));
        assert!(admin.allows(Permission::Share));
    }

    #[test]
    fn test_permission_names() {
        let g = grant(&[Permission::Write, Permission::Read]);
        assert_eq!(g.permission_names(), vec!["read", "write"]);
    }

    #[test]
    fn test_parse_permissions() {
        let parsed = parse_permissions(["read", "share"]).unwrap();
        assert!(parsed.contains(&Permission::Read));
        assert!(parsed.contains(&Permission::Share));

        assert!(parse_permissions(["read", "destroy"]).is_err());
    }

    #[test]
    fn test_permission_json_names() {
        let json = serde_json::to_string(&Permission::Admin).unwrap();
        assert_eq!(json, "\"admin\"");
    }

    #[test]
    fn test_cbor_roundtrip() {
        let g = grant(&[Permission::Read, Permission::Write]);
        let bytes = g.to_bytes().unwrap();
        assert_eq!(ShareGrant::from_bytes(&bytes).unwrap(), g);
        assert!(ShareGrant::from_bytes(&[0xff, 0x00]).is_err());
    }
}
