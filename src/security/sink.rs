//! Alert and Report Sinks
//!
//! Outward side of the monitor: user-visible alerts for high and critical
//! events, and the reporting endpoint used by auto-report.

use thiserror::Error;
use tracing::{error, warn};

use crate::security::event::{SecurityEvent, Severity};

/// Reporting endpoint failure.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Endpoint could not be reached.
    #[error("report endpoint unavailable: {0}")]
    Unavailable(String),
    /// Endpoint refused the report.
    #[error("report rejected: {0}")]
    Rejected(String),
}

/// Destination for alerts and reports.
pub trait EventSink: Send + Sync {
    /// Show a user-visible alert.
    fn alert(&self, event: &SecurityEvent);

    /// Send the event to the reporting endpoint.
    fn report(&self, event: &SecurityEvent) -> Result<(), SinkError>;
}

/// Sink that writes alerts and reports to the tracing log.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn alert(&self, event: &SecurityEvent) {
        let player = event.player_address.as_deref().unwrap_or("-");
        match event.severity {
            Severity::Critical => error!(
                "SECURITY ALERT [{}] {} player={} {}",
                event.severity, event.kind, player, event.details
            ),
            _ => warn!(
                "Security alert [{}] {} player={} {}",
                event.severity, event.kind, player, event.details
            ),
        }
    }

    fn report(&self, event: &SecurityEvent) -> Result<(), SinkError> {
        warn!("Reported {} event {} ({})", event.kind, event.id, event.details);
        Ok(())
    }
}
