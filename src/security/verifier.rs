//! Move Verification Interface
//!
//! The proof system itself is external. The monitor only needs an async
//! yes/no answer per move, with an optional reason for rejections.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::moves::Move;

/// Answer from the external verifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveVerdict {
    /// Whether the move is valid.
    pub is_valid: bool,
    /// Why the move was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl MoveVerdict {
    /// Valid move.
    pub fn accept() -> Self {
        Self { is_valid: true, reason: None }
    }

    /// Invalid move with a reason.
    pub fn reject(reason: impl Into<String>) -> Self {
        Self { is_valid: false, reason: Some(reason.into()) }
    }
}

/// Errors during move verification.
#[derive(Debug, Error)]
pub enum VerifierError {
    /// Proof material is missing or malformed.
    #[error("invalid proof format")]
    InvalidProofFormat,
    /// Verifier backend could not be reached.
    #[error("verifier connection failed: {0}")]
    ConnectionFailed(String),
    /// Verifier did not answer in time.
    #[error("verifier timed out after {0} ms")]
    Timeout(u128),
}

/// External move verifier.
///
/// Implementations connect to whatever proof system backs the session.
#[async_trait]
pub trait MoveVerifier: Send + Sync {
    /// Verify one move.
    async fn verify(&self, mv: &Move) -> Result<MoveVerdict, VerifierError>;
}

/// Stub verifier for testing (accepts any move with non-empty proof).
///
/// Replace with a real proof-system client when available.
#[derive(Clone, Copy, Debug, Default)]
pub struct StubMoveVerifier;

#[async_trait]
impl MoveVerifier for StubMoveVerifier {
    async fn verify(&self, mv: &Move) -> Result<MoveVerdict, VerifierError> {
        match mv.proof.as_deref() {
            None => Ok(MoveVerdict::reject("missing proof")),
            Some("") => Err(VerifierError::InvalidProofFormat),
            Some(_) => Ok(MoveVerdict::accept()),
        }
    }
}
