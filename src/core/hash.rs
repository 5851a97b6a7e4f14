//! Hashing for State Integrity
//!
//! Provides the 256-bit digest type and the Keccak-256 primitives used by the
//! Merkle trees and the integrity monitor:
//! - `hash_item`: canonical encoding + Keccak-256 of any serializable value
//! - `hash_pair`: Keccak-256 of two child hashes in explicit (left, right) order
//! - `FieldHasher`: length-prefixed field hashing for fixed-shape records

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use thiserror::Error;

use super::canonical::to_canonical_bytes;

/// Errors produced while encoding or parsing hashed values.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Value could not be serialized to its canonical form.
    #[error("canonical serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    /// Hash string is not valid hex.
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    /// Hash string decoded to the wrong number of bytes.
    #[error("invalid hash length: expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// 256-bit Keccak digest.
///
/// Serializes as a lowercase hex string, so hashes embed directly in any
/// outer JSON protocol. Ordering is byte-wise, which matches the
/// lexicographic order of the hex form.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// Keccak-256 of the empty byte string.
    ///
    /// Root of an empty tree and of an empty shard combination.
    pub const EMPTY: Hash = Hash([
        0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c,
        0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03, 0xc0,
        0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b,
        0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85, 0xa4, 0x70,
    ]);

    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex encoding (no `0x` prefix).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex, accepting an optional `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, CodecError> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(trimmed)?;
        let array: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CodecError::InvalidLength(bytes.len()))?;
        Ok(Self(array))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({}..)", hex::encode(&self.0[..6]))
    }
}

impl FromStr for Hash {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Keccak-256 of raw bytes.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    Hash(hasher.finalize().into())
}

/// Hash an arbitrary value through its canonical encoding.
///
/// Equal logical values hash equally across processes: object keys are
/// sorted and the encoding carries no whitespace.
pub fn hash_item<T: Serialize + ?Sized>(item: &T) -> Result<Hash, CodecError> {
    let bytes = to_canonical_bytes(item)?;
    Ok(keccak256(&bytes))
}

/// Hash two child hashes, `left` first.
///
/// The order is taken as given. Callers that want value ordering sort the
/// operands first (see `tree::PairOrdering`).
pub fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(left.0);
    hasher.update(right.0);
    Hash(hasher.finalize().into())
}

/// Deterministic hasher for fixed-shape records.
///
/// Strings are length-prefixed so adjacent fields cannot run together.
/// Order of updates is part of the hash.
pub struct FieldHasher {
    hasher: Keccak256,
}

impl FieldHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Keccak256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for move replay hashes.
    pub fn for_move() -> Self {
        Self::new(b"GAME_INTEGRITY_MOVE_V1")
    }

    /// Update with a length-prefixed UTF-8 string.
    #[inline]
    pub fn update_str(&mut self, value: &str) {
        self.update_u64(value.len() as u64);
        self.hasher.update(value.as_bytes());
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> Hash {
        Hash(self.hasher.finalize().into())
    }
}

// =============================================================================
// TESTS
// =============================================================================
