//! Security Module
//!
//! Runtime integrity checks and the event pipeline behind them.
//!
//! ## Module Structure
//!
//! - `monitor`: Tamper, replay and invalid-move checks
//! - `event`: Security events and severities
//! - `listener`: Synchronous event fan-out
//! - `sink`: Alerts and auto-report endpoint
//! - `verifier`: External move verifier interface
//! - `replay`: Bounded set of accepted move hashes
//! - `rate_limit`: Per-player move rate limiting
//! - `config`: Monitor settings

pub mod config;
pub mod event;
pub mod listener;
pub mod monitor;
pub mod rate_limit;
pub mod replay;
pub mod sink;
pub mod verifier;

pub use config::{MonitorConfig, DEFAULT_SUSPICION_THRESHOLD};
pub use event::{SecurityEvent, SecurityEventKind, Severity};
pub use listener::{ListenerError, ListenerId, SecurityListener};
pub use monitor::{IntegrityMonitor, MonitorStats, SharedMonitor};
pub use sink::{EventSink, SinkError, TracingSink};
pub use verifier::{MoveVerdict, MoveVerifier, StubMoveVerifier, VerifierError};
