//! # Game Integrity
//!
//! State-integrity layer for synchronized game sessions: content-addressed
//! commitments over game state, and a runtime monitor that flags tampered
//! state, replayed moves and moves the external verifier rejects.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     GAME INTEGRITY                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic hashing                     │
//! │  ├── canonical.rs- Sorted-key compact JSON encoding          │
//! │  └── hash.rs     - Keccak-256 items, pairs, move fields      │
//! │                                                              │
//! │  tree/           - Commitments (deterministic)               │
//! │  ├── merkle.rs   - Layered Merkle tree                       │
//! │  ├── proof.rs    - Inclusion proofs                          │
//! │  ├── content.rs  - Batched updates over a Merkle tree        │
//! │  └── shard.rs    - Parallel shard roots                      │
//! │                                                              │
//! │  game/           - Checked payloads                          │
//! │  ├── snapshot.rs - Versioned state and its field root        │
//! │  └── moves.rs    - Player moves and replay hashes            │
//! │                                                              │
//! │  security/       - Runtime checks (non-deterministic)        │
//! │  ├── monitor.rs  - Tamper, replay, invalid-move checks       │
//! │  ├── event.rs    - Security events                           │
//! │  ├── listener.rs - Event fan-out                             │
//! │  └── verifier.rs - External move verifier                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `tree/` modules produce **identical hashes** for
//! identical data on any platform:
//! - Object keys are sorted before hashing, never insertion-ordered
//! - No floating-point formatting beyond what serde_json emits
//! - No system time dependencies
//!
//! Sharded roots are built in parallel but combined in shard order, so the
//! thread count never affects the result.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod security;
pub mod tree;

// Re-export commonly used types
pub use crate::core::hash::{hash_item, hash_pair, keccak256, CodecError, Hash};
pub use game::{GameState, Move};
pub use security::{
    IntegrityMonitor, MonitorConfig, MoveVerifier, SecurityEvent, SecurityEventKind, Severity,
};
pub use tree::{verify_proof, ContentTree, MerkleProof, MerkleTree, PairOrdering, TreeConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
