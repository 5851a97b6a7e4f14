//! Game State Snapshots
//!
//! The sync service hands the integrity layer a JSON-shaped snapshot: a
//! monotonic `version`, an optional owning `playerAddress`, and free-form
//! business fields. The snapshot commits to its fields through a Merkle tree
//! with one leaf per field, ordered by key.
//!
//! Volatile fields are left out of the commitment:
//! - keys starting with `_` (client-private data)
//! - `merkleRoot` (the commitment itself)
//! - `merkleProof` (proof material attached for transport)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::hash::{CodecError, Hash};
use crate::tree::merkle::MerkleTree;
use crate::tree::proof::MerkleProof;

/// Prefix marking a field as private to the client.
pub const PRIVATE_FIELD_PREFIX: char = '_';

/// Field carrying the published state root.
pub const ROOT_FIELD: &str = "merkleRoot";

/// Field carrying attached proof material.
pub const PROOF_FIELD: &str = "merkleProof";

/// Key of the version leaf.
pub const VERSION_KEY: &str = "version";

/// Key of the owning-player leaf.
pub const PLAYER_KEY: &str = "playerAddress";

/// Whether a business field is excluded from hashing.
pub fn is_volatile_field(key: &str) -> bool {
    key.starts_with(PRIVATE_FIELD_PREFIX) || key == ROOT_FIELD || key == PROOF_FIELD
}

/// One committed field. Serialized as `{"key":..,"value":..}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldEntry {
    /// Field name.
    pub key: String,
    /// Field value.
    pub value: Value,
}

/// Snapshot of a synchronized game session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Monotonic state version.
    pub version: u64,

    /// Player the state belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_address: Option<String>,

    /// Business fields, including any volatile ones.
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl GameState {
    /// Create an empty snapshot at a version.
    pub fn new(version: u64) -> Self {
        Self {
            version,
            player_address: None,
            fields: BTreeMap::new(),
        }
    }

    /// Set the owning player.
    pub fn with_player(mut self, address: impl Into<String>) -> Self {
        self.player_address = Some(address.into());
        self
    }

    /// Set a business field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Insert or replace a business field.
    pub fn set_field(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Committed fields, ordered by key.
    ///
    /// `version` and `playerAddress` are always taken from the typed
    /// members; business fields with those names are ignored.
    pub fn canonical_fields(&self) -> Vec<FieldEntry> {
        let mut entries: BTreeMap<&str, Value> = self
            .fields
            .iter()
            .filter(|(key, _)| !is_volatile_field(key))
            .filter(|(key, _)| key.as_str() != VERSION_KEY && key.as_str() != PLAYER_KEY)
            .map(|(key, value)| (key.as_str(), value.clone()))
            .collect();

        entries.insert(VERSION_KEY, Value::from(self.version));
        if let Some(address) = &self.player_address {
            entries.insert(PLAYER_KEY, Value::from(address.clone()));
        }

        entries
            .into_iter()
            .map(|(key, value)| FieldEntry { key: key.to_string(), value })
            .collect()
    }

    /// Merkle tree over the committed fields.
    pub fn state_tree(&self) -> Result<MerkleTree<FieldEntry>, CodecError> {
        MerkleTree::build(self.canonical_fields())
    }

    /// Root committing to the current fields.
    pub fn compute_root(&self) -> Result<Hash, CodecError> {
        Ok(self.state_tree()?.root())
    }

    /// Attach the current root as `merkleRoot`.
    ///
    /// The root field is volatile, so sealing does not change the root.
    pub fn seal(&mut self) -> Result<Hash, CodecError> {
        let root = self.compute_root()?;
        self.fields.insert(ROOT_FIELD.to_string(), Value::from(root.to_hex()));
        Ok(root)
    }

    /// Published root, if a parseable `merkleRoot` field is present.
    pub fn published_root(&self) -> Option<Hash> {
        self.fields
            .get(ROOT_FIELD)
            .and_then(Value::as_str)
            .and_then(|s| Hash::from_hex(s).ok())
    }

    /// Committed entry and inclusion proof for one field.
    ///
    /// Returns None for volatile or absent fields.
    pub fn field_proof(&self, key: &str) -> Result<Option<(FieldEntry, MerkleProof)>, CodecError> {
        let tree = self.state_tree()?;
        let found = tree
            .data()
            .iter()
            .position(|entry| entry.key == key)
            .and_then(|index| Some((tree.get(index)?.clone(), tree.proof(index)?)));
        Ok(found)
    }
}
