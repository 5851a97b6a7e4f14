//! Shard-Parallel Roots
//!
//! Splits a content tree into contiguous shards, builds one sub-tree per
//! shard on the rayon pool, and combines shard roots into one commitment.
//! Combination is order-sensitive: roots must be passed in the order
//! `create_shards` returned them.

use rayon::prelude::*;
use serde::Serialize;

use crate::core::hash::{CodecError, Hash};
use crate::tree::content::ContentTree;
use crate::tree::merkle::{compute_root, MerkleTree, PairOrdering};

impl<T: Serialize + Sync> ContentTree<T> {
    /// Roots of each non-empty shard, in data order.
    ///
    /// Shards hold `ceil(len / shard_count)` items; trailing shards that
    /// would be empty are omitted, so fewer than `shard_count` roots may
    /// come back.
    pub fn create_shards(&self) -> Result<Vec<Hash>, CodecError> {
        shard_roots(self.data(), self.config().shard_count, self.config().pairing)
    }
}

impl<T> ContentTree<T> {
    /// Combine shard roots with this tree's pairing rule.
    ///
    /// The rule matches the one `create_shards` built each shard with, so a
    /// single shard combines to the tree root under either ordering.
    pub fn combine_shard_roots(&self, shard_roots: &[Hash]) -> Result<Hash, CodecError> {
        combine_shards(shard_roots, self.config().pairing)
    }
}

/// Compute shard roots over a slice of items.
pub fn shard_roots<T: Serialize + Sync>(
    items: &[T],
    shard_count: usize,
    ordering: PairOrdering,
) -> Result<Vec<Hash>, CodecError> {
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let shard_size = items.len().div_ceil(shard_count.max(1));

    items
        .par_chunks(shard_size)
        .map(|shard| compute_root(shard, ordering))
        .collect()
}

/// Combine shard roots with an explicit pairing rule.
///
/// No roots gives `Hash::EMPTY`; one root is returned as-is; more are
/// hashed as items into a fresh tree.
pub fn combine_shards(shard_roots: &[Hash], ordering: PairOrdering) -> Result<Hash, CodecError> {
    match shard_roots {
        [] => Ok(Hash::EMPTY),
        [single] => Ok(*single),
        many => Ok(MerkleTree::build_with(many.to_vec(), ordering)?.root()),
    }
}
