//! Merkle Inclusion Proofs
//!
//! A proof is the sibling path from one leaf to the root. Layers where the
//! node was carried forward without a partner contribute no step, so a proof
//! can be shorter than the tree depth.
//!
//! The path shape is fully determined by the leaf index and the leaf count,
//! so verification rejects any proof whose steps do not match that shape.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::hash::{hash_item, Hash};
use crate::tree::merkle::{MerkleTree, PairOrdering};

/// Which side of the running node a sibling sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Sibling is the left operand.
    Left,
    /// Sibling is the right operand.
    Right,
}

/// One sibling on the path to the root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    /// Sibling hash.
    pub sibling: Hash,
    /// Position of the sibling relative to the running node.
    pub side: Side,
}

/// Merkle inclusion proof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Index of the leaf this proof is for.
    pub leaf_index: usize,
    /// Number of leaves in the tree that issued the proof.
    pub leaf_count: usize,
    /// Pairing rule of the tree that issued the proof.
    pub ordering: PairOrdering,
    /// Siblings from leaf to root.
    pub steps: Vec<ProofStep>,
}

impl MerkleProof {
    /// Sibling hashes in leaf-to-root order.
    pub fn siblings(&self) -> impl Iterator<Item = &Hash> {
        self.steps.iter().map(|step| &step.sibling)
    }

    /// Number of siblings.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the proof has no siblings (single-leaf tree).
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether the steps match the path of `leaf_index` in a tree of
    /// `leaf_count` leaves: one step per paired layer, on the side the
    /// index implies.
    pub fn is_well_formed(&self) -> bool {
        if self.leaf_index >= self.leaf_count {
            return false;
        }

        let mut steps = self.steps.iter();
        let mut index = self.leaf_index;
        let mut width = self.leaf_count;

        while width > 1 {
            let expected = if index % 2 == 1 {
                Some(Side::Left)
            } else if index + 1 < width {
                Some(Side::Right)
            } else {
                None
            };

            if let Some(side) = expected {
                match steps.next() {
                    Some(step) if step.side == side => {}
                    _ => return false,
                }
            }

            index /= 2;
            width = width.div_ceil(2);
        }

        steps.next().is_none()
    }

    /// Fold the path starting from a leaf hash, returning the implied root.
    pub fn compute_root(&self, leaf_hash: Hash) -> Hash {
        self.steps.iter().fold(leaf_hash, |running, step| match step.side {
            Side::Left => self.ordering.combine(&step.sibling, &running),
            Side::Right => self.ordering.combine(&running, &step.sibling),
        })
    }
}

impl<T> MerkleTree<T> {
    /// Extract the inclusion proof for a leaf.
    ///
    /// Returns None if index is out of bounds.
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        if index >= self.len() {
            return None;
        }

        let mut steps = Vec::with_capacity(self.depth());
        let mut current = index;

        // Root layer has no sibling.
        for layer in &self.layers()[..self.depth().saturating_sub(1)] {
            let (sibling_index, side) = if current % 2 == 0 {
                (current + 1, Side::Right)
            } else {
                (current - 1, Side::Left)
            };

            if let Some(sibling) = layer.get(sibling_index) {
                steps.push(ProofStep {
                    sibling: *sibling,
                    side,
                });
            }

            current /= 2;
        }

        Some(MerkleProof {
            leaf_index: index,
            leaf_count: self.len(),
            ordering: self.ordering(),
            steps,
        })
    }
}

/// Verify that `item` is included under `root` in a tree paired with
/// `ordering`.
///
/// The proof must have been issued under the same ordering and its steps
/// must match the path of its leaf index. An item that cannot be encoded
/// never verifies.
pub fn verify_proof<T: Serialize + ?Sized>(
    item: &T,
    proof: &MerkleProof,
    root: &Hash,
    ordering: PairOrdering,
) -> bool {
    match hash_item(item) {
        Ok(leaf) => verify_proof_with_hash(&leaf, proof, root, ordering),
        Err(e) => {
            debug!("Proof item could not be encoded: {}", e);
            false
        }
    }
}

/// Verify a proof from a pre-hashed leaf.
///
/// Leaves and interior nodes share one hash domain, so this cannot tell a
/// leaf hash from an interior node hash: a truncated path with a matching
/// `leaf_count` verifies an interior node. Callers outside the crate go
/// through `verify_proof`, which hashes the item itself.
pub(crate) fn verify_proof_with_hash(
    leaf_hash: &Hash,
    proof: &MerkleProof,
    root: &Hash,
    ordering: PairOrdering,
) -> bool {
    if proof.ordering != ordering {
        debug!("Proof ordering {:?} does not match {:?}", proof.ordering, ordering);
        return false;
    }
    if !proof.is_well_formed() {
        debug!("Proof path does not match leaf {} of {}", proof.leaf_index, proof.leaf_count);
        return false;
    }
    proof.compute_root(*leaf_hash) == *root
}
