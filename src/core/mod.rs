//! Core hashing primitives.
//!
//! Everything that commits to state goes through this module, so the byte
//! encoding and digest choice live in exactly one place.

pub mod canonical;
pub mod hash;

// Re-export core types
pub use canonical::{to_canonical_bytes, to_canonical_string};
pub use hash::{hash_item, hash_pair, keccak256, CodecError, FieldHasher, Hash};
