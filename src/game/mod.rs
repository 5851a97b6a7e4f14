//! Game Data Module
//!
//! The two payloads the integrity layer checks: versioned state snapshots
//! and player moves.
//!
//! ## Module Structure
//!
//! - `snapshot`: Versioned game state and its field commitment
//! - `moves`: Player moves and their replay hash

pub mod snapshot;
pub mod moves;

// Re-export key types
pub use snapshot::{FieldEntry, GameState, is_volatile_field};
pub use moves::Move;
