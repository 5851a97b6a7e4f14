//! Move Descriptors
//!
//! A move as submitted by a client. The replay hash covers exactly the
//! identifying fields; attached proof material is not part of it.

use serde::{Deserialize, Serialize};

use crate::core::hash::{FieldHasher, Hash};

/// A player move awaiting verification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    /// Submitting player.
    pub player_address: String,
    /// Card the move acts on.
    pub card_id: String,
    /// Kind of move (play, attack, discard, ...).
    pub move_type: String,
    /// Client timestamp (Unix milliseconds).
    pub timestamp: u64,
    /// Per-move unique value.
    pub nonce: u64,
    /// Opaque proof handed to the external verifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<String>,
}

impl Move {
    /// Create a move without proof material.
    pub fn new(
        player_address: impl Into<String>,
        card_id: impl Into<String>,
        move_type: impl Into<String>,
        timestamp: u64,
        nonce: u64,
    ) -> Self {
        Self {
            player_address: player_address.into(),
            card_id: card_id.into(),
            move_type: move_type.into(),
            timestamp,
            nonce,
            proof: None,
        }
    }

    /// Attach proof material.
    pub fn with_proof(mut self, proof: impl Into<String>) -> Self {
        self.proof = Some(proof.into());
        self
    }

    /// Hash identifying this move for replay detection.
    pub fn replay_hash(&self) -> Hash {
        let mut hasher = FieldHasher::for_move();
        hasher.update_str(&self.player_address);
        hasher.update_str(&self.card_id);
        hasher.update_str(&self.move_type);
        hasher.update_u64(self.timestamp);
        hasher.update_u64(self.nonce);
        hasher.finalize()
    }
}
