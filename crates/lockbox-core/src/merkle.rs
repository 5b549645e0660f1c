//! Integrity tree: a Merkle root over per-record hashes.
//!
//! The root summarizes the full record set so that tampering with, or
//! omitting, any record changes it. Construction:
//!
//! 1. Empty input: the root is `SHA-256("")`.
//! 2. Level zero is `SHA-256(leaf)` for every leaf hash, in leaf order.
//! 3. While more than one node remains: if the level has odd length the
//!    last node is duplicated, then adjacent nodes are paired left to right
//!    and `SHA-256(left || right)` forms the next level.
//!
//! Leaf order is ascending `(seq, record_id)`, so recomputation over the
//! same set is deterministic regardless of the order leaves were collected.

use serde::{Deserialize, Serialize};

use crate::crypto::Sha256Hash;
use crate::types::RecordId;

/// Whether tombstoned (soft-deleted) records contribute leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafPolicy {
    /// Only live records are leaves.
    #[default]
    ExcludeTombstoned,
    /// Every record, deleted or not, is a leaf.
    IncludeTombstoned,
}

/// A single record's contribution to the integrity tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityLeaf {
    /// Stable ordering key (record creation order).
    pub seq: u64,
    /// Record identifier, used to break ties in `seq`.
    pub record_id: RecordId,
    /// The record hash.
    pub hash: Sha256Hash,
    /// Whether the record is soft-deleted.
    pub tombstoned: bool,
}

impl IntegrityLeaf {
    pub fn new(seq: u64, record_id: impl Into<RecordId>, hash: Sha256Hash) -> Self {
        Self {
            seq,
            record_id: record_id.into(),
            hash,
            tombstoned: false,
        }
    }

    pub fn tombstoned(mut self) -> Self {
        self.tombstoned = true;
        self
    }
}

/// A computed integrity root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityRoot {
    pub root: Sha256Hash,
    pub leaf_count: usize,
    /// When the root was computed (Unix ms).
    pub computed_at: i64,
}

impl IntegrityRoot {
    /// Compute the root over `leaves` under the given policy.
    pub fn compute(leaves: &[IntegrityLeaf], policy: LeafPolicy, now: i64) -> Self {
        let hashes = ordered_leaf_hashes(leaves, policy);
        Self {
            root: compute_root(&hashes),
            leaf_count: hashes.len(),
            computed_at: now,
        }
    }
}

/// Select and order leaf hashes.
pub fn ordered_leaf_hashes(leaves: &[IntegrityLeaf], policy: LeafPolicy) -> Vec<Sha256Hash> {
    let mut selected: Vec<&IntegrityLeaf> = leaves
        .iter()
        .filter(|leaf| policy == LeafPolicy::IncludeTombstoned || !leaf.tombstoned)
        .collect();

    selected.sort_by(|a, b| a.seq.cmp(&b.seq).then_with(|| a.record_id.cmp(&b.record_id)));
    selected.into_iter().map(|leaf| leaf.hash).collect()
}

/// Compute the Merkle root of an ordered list of leaf hashes.
pub fn compute_root(leaf_hashes: &[Sha256Hash]) -> Sha256Hash {
    if leaf_hashes.is_empty() {
        return Sha256Hash::empty();
    }

    let mut level: Vec<Sha256Hash> = leaf_hashes
        .iter()
        .map(|h| Sha256Hash::hash(h.as_bytes()))
        .collect();

    while level.len() > 1 {
        if level.len() % 2 == 1 {
            let last = level[level.len() - 1];
            level.push(last);
        }

        level = level
            .chunks_exact(2)
            .map(|pair| Sha256Hash::hash_pair(&pair[0], &pair[1]))
            .collect();
    }

    level[0]
}

/// Recompute the root over `leaf_hashes` and compare with `reported_root`.
pub fn verify(reported_root: &Sha256Hash, leaf_hashes: &[Sha256Hash]) -> bool {
    compute_root(leaf_hashes) == *reported_root
}
