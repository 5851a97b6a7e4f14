//! Security Events
//!
//! Every failed check is reported as data: a recorded event with a kind,
//! a severity and free-form details. Events are immutable once recorded,
//! apart from the `resolved` flag.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of security finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityEventKind {
    /// State does not match its committed hash.
    StateTampering,
    /// External verifier rejected a move.
    InvalidMove,
    /// A previously accepted move was resubmitted.
    ReplayAttack,
    /// Player exceeded the move rate.
    RateLimitExceeded,
    /// Player acted on state it does not own.
    UnauthorizedAccess,
    /// Player accumulated too many findings.
    SuspiciousActivity,
}

impl SecurityEventKind {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StateTampering => "STATE_TAMPERING",
            Self::InvalidMove => "INVALID_MOVE",
            Self::ReplayAttack => "REPLAY_ATTACK",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::UnauthorizedAccess => "UNAUTHORIZED_ACCESS",
            Self::SuspiciousActivity => "SUSPICIOUS_ACTIVITY",
        }
    }
}

impl fmt::Display for SecurityEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event severity, ordered from least to most severe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational.
    Low,
    /// Worth watching.
    Medium,
    /// Raise a user-visible alert.
    High,
    /// Alert and, with auto-report on, report immediately.
    Critical,
}

impl Severity {
    /// Whether events at this severity raise an alert.
    pub fn is_alerting(self) -> bool {
        self >= Severity::High
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// A recorded security finding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityEvent {
    /// Unique event id.
    pub id: Uuid,
    /// Kind of finding.
    pub kind: SecurityEventKind,
    /// When the finding was made.
    pub timestamp: DateTime<Utc>,
    /// Severity.
    pub severity: Severity,
    /// Player the finding is attributed to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_address: Option<String>,
    /// Diagnostic details.
    pub details: String,
    /// Whether the finding has been handled.
    pub resolved: bool,
}

impl SecurityEvent {
    /// Create an unresolved event stamped now.
    pub fn new(kind: SecurityEventKind, severity: Severity, details: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            timestamp: Utc::now(),
            severity,
            player_address: None,
            details: details.into(),
            resolved: false,
        }
    }

    /// Attribute the event to a player.
    pub fn with_player(mut self, address: impl Into<String>) -> Self {
        self.player_address = Some(address.into());
        self
    }

    /// Attribute the event to a player, if known.
    pub fn with_optional_player(mut self, address: Option<&str>) -> Self {
        self.player_address = address.map(str::to_string);
        self
    }

    /// Override the timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
