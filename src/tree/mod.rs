//! Content-Addressed Merkle Trees
//!
//! ## Module Structure
//!
//! - `merkle`: Tree construction, layers, pairing rule
//! - `proof`: Inclusion proofs and stateless verification
//! - `content`: Batched updates on top of the tree
//! - `shard`: Shard-parallel roots and their combination

pub mod merkle;
pub mod proof;
pub mod content;
pub mod shard;

// Re-export key types
pub use merkle::{MerkleTree, PairOrdering, compute_root};
pub use proof::{MerkleProof, ProofStep, Side, verify_proof};
pub use content::{ContentTree, TreeConfig, BatchChange, MAX_BATCH_SIZE};
pub use shard::{combine_shards, shard_roots};
