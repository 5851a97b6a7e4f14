//! Merkle Tree
//!
//! Binary Keccak-256 Merkle tree over an ordered sequence of items.
//! Every layer is kept so proofs can be extracted without rehashing.
//!
//! Odd-length layers carry their last hash forward unchanged; it is paired
//! at whichever higher layer first gives it a partner.

use serde::{Deserialize, Serialize};

use crate::core::hash::{hash_item, hash_pair, CodecError, Hash};

/// Rule for combining two sibling hashes into their parent.
///
/// A tree and every proof it issues use the same rule. Mixing rules between
/// construction and verification makes valid proofs fail.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairOrdering {
    /// Parent = H(left || right) by tree position. Commits to leaf order.
    #[default]
    Positional,
    /// Parent = H(min || max) by hash value. Swapping two siblings keeps
    /// the same parent.
    Sorted,
}

impl PairOrdering {
    /// Combine a node with its sibling.
    ///
    /// `left` and `right` are tree positions; `Sorted` ignores them.
    #[inline]
    pub fn combine(self, left: &Hash, right: &Hash) -> Hash {
        match self {
            PairOrdering::Positional => hash_pair(left, right),
            PairOrdering::Sorted => {
                if left <= right {
                    hash_pair(left, right)
                } else {
                    hash_pair(right, left)
                }
            }
        }
    }
}

/// Binary Merkle tree.
///
/// `layers[0]` holds one hash per item; each following layer has
/// `ceil(prev / 2)` entries; the last layer holds the root.
#[derive(Clone, Debug)]
pub struct MerkleTree<T> {
    data: Vec<T>,
    layers: Vec<Vec<Hash>>,
    ordering: PairOrdering,
}

impl<T: Serialize> MerkleTree<T> {
    /// Build a tree with positional pairing.
    pub fn build(data: Vec<T>) -> Result<Self, CodecError> {
        Self::build_with(data, PairOrdering::Positional)
    }

    /// Build a tree with an explicit pairing rule.
    pub fn build_with(data: Vec<T>, ordering: PairOrdering) -> Result<Self, CodecError> {
        let mut tree = Self {
            data,
            layers: Vec::new(),
            ordering,
        };
        tree.rebuild()?;
        Ok(tree)
    }

    /// Recompute every layer from the items.
    ///
    /// There is no single-leaf update path; any change to `data` goes
    /// through a full rebuild.
    pub(crate) fn rebuild(&mut self) -> Result<(), CodecError> {
        let leaves = hash_leaves(&self.data)?;
        self.layers = build_layers(leaves, self.ordering);
        Ok(())
    }

    /// Mutable access to the items. Caller must `rebuild` afterwards.
    pub(crate) fn data_mut(&mut self) -> &mut Vec<T> {
        &mut self.data
    }
}

impl<T> MerkleTree<T> {
    /// Root hash, or `Hash::EMPTY` for an empty tree.
    pub fn root(&self) -> Hash {
        self.layers
            .last()
            .and_then(|layer| layer.first())
            .copied()
            .unwrap_or(Hash::EMPTY)
    }

    /// All hash layers, leaves first.
    pub fn layers(&self) -> &[Vec<Hash>] {
        &self.layers
    }

    /// Number of layers (0 for an empty tree, 1 for a single item).
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Items in leaf order.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Item at a leaf index.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.data.get(index)
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the tree has no leaves.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Pairing rule used by this tree.
    pub fn ordering(&self) -> PairOrdering {
        self.ordering
    }

    /// Consume the tree, returning its items.
    pub fn into_data(self) -> Vec<T> {
        self.data
    }
}

/// Hash each item into a leaf.
pub fn hash_leaves<T: Serialize>(items: &[T]) -> Result<Vec<Hash>, CodecError> {
    items.iter().map(hash_item).collect()
}

/// Build all layers above a set of leaf hashes.
///
/// Returns no layers for no leaves.
pub fn build_layers(leaves: Vec<Hash>, ordering: PairOrdering) -> Vec<Vec<Hash>> {
    if leaves.is_empty() {
        return Vec::new();
    }

    let mut layers = vec![leaves];

    while let Some(current) = layers.last().filter(|layer| layer.len() > 1) {
        let mut next = Vec::with_capacity((current.len() + 1) / 2);
        for chunk in current.chunks(2) {
            match chunk {
                [left, right] => next.push(ordering.combine(left, right)),
                [odd] => next.push(*odd),
                _ => unreachable!("chunks(2) yields one or two elements"),
            }
        }
        layers.push(next);
    }

    layers
}

/// Root over items without keeping the tree.
pub fn compute_root<T: Serialize>(items: &[T], ordering: PairOrdering) -> Result<Hash, CodecError> {
    let layers = build_layers(hash_leaves(items)?, ordering);
    Ok(layers
        .last()
        .and_then(|layer| layer.first())
        .copied()
        .unwrap_or(Hash::EMPTY))
}
