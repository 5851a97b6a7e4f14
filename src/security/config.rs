//! Monitor Configuration

use std::str::FromStr;
use std::time::Duration;

/// Events per player before they are flagged as suspicious.
pub const DEFAULT_SUSPICION_THRESHOLD: u32 = 3;

/// Integrity monitor configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct MonitorConfig {
    /// Recorded events per player that trigger `SUSPICIOUS_ACTIVITY`.
    pub suspicion_threshold: u32,
    /// Report critical events immediately and mark them resolved.
    pub auto_report: bool,
    /// Move hashes remembered for replay detection (oldest evicted first).
    pub replay_capacity: usize,
    /// Events kept in the log (oldest dropped first). 0 keeps everything.
    pub max_events: usize,
    /// Upper bound on one external verifier call. None waits forever.
    pub verifier_timeout: Option<Duration>,
    /// Sliding window for move rate limiting.
    pub rate_limit_window: Duration,
    /// Moves allowed per player per window. 0 (the default) disables rate
    /// limiting, so `verify_move` rejects only replays and verifier
    /// rejections.
    pub rate_limit_max_moves: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            suspicion_threshold: DEFAULT_SUSPICION_THRESHOLD,
            auto_report: false,
            replay_capacity: 100_000,
            max_events: 10_000,
            verifier_timeout: Some(Duration::from_secs(10)),
            rate_limit_window: Duration::from_secs(1),
            rate_limit_max_moves: 0,
        }
    }
}

impl MonitorConfig {
    /// Create config from environment variables.
    ///
    /// Unset or unparseable variables keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            suspicion_threshold: env_parse("INTEGRITY_SUSPICION_THRESHOLD")
                .unwrap_or(defaults.suspicion_threshold),
            auto_report: std::env::var("INTEGRITY_AUTO_REPORT")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.auto_report),
            replay_capacity: env_parse("INTEGRITY_REPLAY_CAPACITY")
                .unwrap_or(defaults.replay_capacity),
            max_events: env_parse("INTEGRITY_MAX_EVENTS").unwrap_or(defaults.max_events),
            verifier_timeout: match env_parse::<u64>("INTEGRITY_VERIFIER_TIMEOUT_MS") {
                Some(0) => None,
                Some(ms) => Some(Duration::from_millis(ms)),
                None => defaults.verifier_timeout,
            },
            rate_limit_window: env_parse("INTEGRITY_RATE_WINDOW_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.rate_limit_window),
            rate_limit_max_moves: env_parse("INTEGRITY_RATE_MAX_MOVES")
                .unwrap_or(defaults.rate_limit_max_moves),
        }
    }

    /// Whether move rate limiting is active.
    pub fn rate_limiting_enabled(&self) -> bool {
        self.rate_limit_max_moves > 0
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
