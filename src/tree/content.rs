//! Content Tree
//!
//! Merkle tree with batched updates, per-index proofs and shard support.
//! Batching only fixes the order changes are applied in; every batch update
//! ends in one full rebuild.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::hash::{hash_item, CodecError, Hash};
use crate::tree::merkle::{MerkleTree, PairOrdering};
use crate::tree::proof::{self, MerkleProof};

/// Largest accepted batch size.
pub const MAX_BATCH_SIZE: usize = 256;

/// Default batch size.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Default number of shards.
pub const DEFAULT_SHARD_COUNT: usize = 4;

/// Content tree configuration.
///
/// Batch size and shard count do not affect tree shape or root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Changes applied per group in `update_with_batch`.
    pub batch_size: usize,
    /// Partitions used by `create_shards`.
    pub shard_count: usize,
    /// Sibling pairing rule.
    pub pairing: PairOrdering,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            shard_count: DEFAULT_SHARD_COUNT,
            pairing: PairOrdering::Positional,
        }
    }
}

impl TreeConfig {
    /// Clamp into the accepted ranges.
    pub fn normalized(self) -> Self {
        Self {
            batch_size: self.batch_size.clamp(1, MAX_BATCH_SIZE),
            shard_count: self.shard_count.max(1),
            pairing: self.pairing,
        }
    }
}

/// One pending overwrite.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchChange<T> {
    /// Leaf index to overwrite.
    pub index: usize,
    /// Replacement item.
    pub value: T,
}

impl<T> BatchChange<T> {
    /// Create a change.
    pub fn new(index: usize, value: T) -> Self {
        Self { index, value }
    }
}

/// Merkle tree with batch updates, proofs and sharding.
#[derive(Clone, Debug)]
pub struct ContentTree<T> {
    tree: MerkleTree<T>,
    config: TreeConfig,
}

impl<T: Serialize> ContentTree<T> {
    /// Build with the default configuration.
    pub fn new(data: Vec<T>) -> Result<Self, CodecError> {
        Self::with_config(data, TreeConfig::default())
    }

    /// Build with an explicit configuration.
    pub fn with_config(data: Vec<T>, config: TreeConfig) -> Result<Self, CodecError> {
        let config = config.normalized();
        let tree = MerkleTree::build_with(data, config.pairing)?;
        Ok(Self { tree, config })
    }

    /// Apply changes in groups of `batch_size`, then rebuild once.
    ///
    /// Each group is applied in ascending index order; equal indices keep
    /// their input order, so the later change wins. Indices outside the
    /// current data are skipped. Every new value is hashed before any is
    /// written, so an encoding error leaves the tree untouched.
    pub fn update_with_batch(&mut self, changes: Vec<BatchChange<T>>) -> Result<Hash, CodecError> {
        let batch_size = self.config.batch_size;
        let len = self.tree.len();
        let total = changes.len();
        let mut staged: Vec<BatchChange<T>> = Vec::with_capacity(total);

        let mut pending = changes.into_iter().peekable();
        while pending.peek().is_some() {
            let mut group: Vec<BatchChange<T>> = pending.by_ref().take(batch_size).collect();
            group.sort_by_key(|change| change.index);

            for change in group.into_iter().filter(|change| change.index < len) {
                hash_item(&change.value)?;
                staged.push(change);
            }
        }

        let applied = staged.len();
        let data = self.tree.data_mut();
        for change in staged {
            if let Some(slot) = data.get_mut(change.index) {
                *slot = change.value;
            }
        }

        self.tree.rebuild()?;
        debug!(
            "Batch update: {} changes, {} applied, {} out of range",
            total,
            applied,
            total - applied
        );
        Ok(self.tree.root())
    }
}

impl<T> ContentTree<T> {
    /// Root hash.
    pub fn root(&self) -> Hash {
        self.tree.root()
    }

    /// Inclusion proof for a leaf. None if index is out of bounds.
    pub fn create_proof(&self, index: usize) -> Option<MerkleProof> {
        self.tree.proof(index)
    }

    /// Verify that `item` is included under this tree's current root,
    /// using this tree's pairing rule.
    pub fn verify<U: Serialize + ?Sized>(&self, item: &U, proof: &MerkleProof) -> bool {
        proof::verify_proof(item, proof, &self.root(), self.config.pairing)
    }

    /// Underlying Merkle tree.
    pub fn tree(&self) -> &MerkleTree<T> {
        &self.tree
    }

    /// Items in leaf order.
    pub fn data(&self) -> &[T] {
        self.tree.data()
    }

    /// Active configuration.
    pub fn config(&self) -> TreeConfig {
        self.config
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Whether the tree has no leaves.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}
