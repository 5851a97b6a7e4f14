//! Integrity Monitor
//!
//! Runs tamper, replay and invalid-move checks for one game session and
//! records what it finds. Every check answers with a boolean; failures are
//! recorded as `SecurityEvent`s and fanned out to listeners, leaving the
//! disposition (block the move, kick the player, page an operator) to the
//! caller.
//!
//! The monitor is a plain owned value. Methods take `&mut self`, so a single
//! owner gets exclusive access for free; share it across tasks through
//! `SharedMonitor`, which serializes whole operations (including the
//! verifier await in `verify_move`).

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::core::hash::Hash;
use crate::game::moves::Move;
use crate::game::snapshot::GameState;
use crate::security::config::MonitorConfig;
use crate::security::event::{SecurityEvent, SecurityEventKind, Severity};
use crate::security::listener::{ListenerId, ListenerRegistry, SecurityListener};
use crate::security::rate_limit::RateLimiter;
use crate::security::replay::ReplayGuard;
use crate::security::sink::{EventSink, TracingSink};
use crate::security::verifier::{MoveVerdict, MoveVerifier, VerifierError};

/// Monitor shared between tasks.
pub type SharedMonitor = Arc<Mutex<IntegrityMonitor>>;

/// Snapshot of monitor counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MonitorStats {
    /// Events currently in the log.
    pub total_events: usize,
    /// Events in the log that are not resolved.
    pub unresolved_events: usize,
    /// Logged events per kind.
    pub events_by_kind: BTreeMap<SecurityEventKind, usize>,
    /// Versions with a stored state hash.
    pub tracked_versions: usize,
    /// Accepted move hashes currently guarded.
    pub guarded_moves: usize,
    /// Players flagged for suspicious activity.
    pub flagged_players: usize,
}

/// State-integrity monitor for one session.
pub struct IntegrityMonitor {
    config: MonitorConfig,
    /// First-seen state hash per version.
    state_hash_by_version: BTreeMap<u64, Hash>,
    replay_guard: ReplayGuard,
    rate_limiter: RateLimiter,
    /// Recorded events per player.
    suspicion_count: HashMap<String, u32>,
    /// Players already reported as suspicious this session.
    flagged_players: HashSet<String>,
    events: VecDeque<SecurityEvent>,
    listeners: ListenerRegistry,
    verifier: Arc<dyn MoveVerifier>,
    sink: Box<dyn EventSink>,
}

impl IntegrityMonitor {
    /// Create a monitor that alerts through the tracing log.
    pub fn new(config: MonitorConfig, verifier: Arc<dyn MoveVerifier>) -> Self {
        Self {
            replay_guard: ReplayGuard::new(config.replay_capacity),
            rate_limiter: RateLimiter::new(config.rate_limit_window, config.rate_limit_max_moves),
            config,
            state_hash_by_version: BTreeMap::new(),
            suspicion_count: HashMap::new(),
            flagged_players: HashSet::new(),
            events: VecDeque::new(),
            listeners: ListenerRegistry::new(),
            verifier,
            sink: Box::new(TracingSink),
        }
    }

    /// Replace the alert/report sink.
    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Wrap for sharing between tasks.
    pub fn into_shared(self) -> SharedMonitor {
        Arc::new(Mutex::new(self))
    }

    // =========================================================================
    // CHECKS
    // =========================================================================

    /// Check a state snapshot for tampering. Returns true if tampering was found.
    ///
    /// With `expected_root`, the state's committed fields must hash to it.
    /// Without, the first hash seen for a version is trusted and later
    /// snapshots at that version must match it.
    pub fn detect_tampering(&mut self, state: &GameState, expected_root: Option<&Hash>) -> bool {
        let player = state.player_address.as_deref();

        let current = match state.compute_root() {
            Ok(root) => root,
            Err(e) => {
                error!("State v{} could not be hashed: {}", state.version, e);
                self.record_event(
                    SecurityEvent::new(
                        SecurityEventKind::StateTampering,
                        Severity::High,
                        format!("state v{} could not be hashed: {}", state.version, e),
                    )
                    .with_optional_player(player),
                );
                return true;
            }
        };

        if let Some(expected) = expected_root {
            if current == *expected {
                return false;
            }
            self.record_event(
                SecurityEvent::new(
                    SecurityEventKind::StateTampering,
                    Severity::High,
                    format!(
                        "state v{} root mismatch: expected {}, computed {}",
                        state.version, expected, current
                    ),
                )
                .with_optional_player(player),
            );
            return true;
        }

        match self.state_hash_by_version.get(&state.version).copied() {
            None => {
                debug!("Trusting first state hash for v{}: {}", state.version, current);
                self.state_hash_by_version.insert(state.version, current);
                false
            }
            Some(stored) if stored == current => false,
            Some(stored) => {
                self.record_event(
                    SecurityEvent::new(
                        SecurityEventKind::StateTampering,
                        Severity::High,
                        format!(
                            "state v{} changed after first sighting: stored {}, computed {}",
                            state.version, stored, current
                        ),
                    )
                    .with_optional_player(player),
                );
                true
            }
        }
    }

    /// Verify a move. Returns true if it was accepted.
    ///
    /// Rate limit (opt-in, off by default), then replay guard, then the
    /// external verifier. Only accepted moves enter the replay guard; a
    /// replayed move is rejected without consulting the verifier.
    pub async fn verify_move(&mut self, mv: &Move) -> bool {
        if self.rate_limiter.is_enabled() && !self.check_rate_limit(&mv.player_address) {
            return false;
        }

        let move_hash = mv.replay_hash();
        if self.replay_guard.contains(&move_hash) {
            self.record_event(
                SecurityEvent::new(
                    SecurityEventKind::ReplayAttack,
                    Severity::Medium,
                    format!(
                        "move {} replayed ({} {} nonce {})",
                        move_hash, mv.move_type, mv.card_id, mv.nonce
                    ),
                )
                .with_player(mv.player_address.clone()),
            );
            return false;
        }

        match self.call_verifier(mv).await {
            Ok(verdict) if verdict.is_valid => {
                self.replay_guard.insert(move_hash);
                debug!("Accepted move {} from {}", move_hash, mv.player_address);
                true
            }
            Ok(verdict) => {
                let reason = verdict.reason.unwrap_or_else(|| "no reason given".to_string());
                self.record_event(
                    SecurityEvent::new(
                        SecurityEventKind::InvalidMove,
                        Severity::High,
                        format!("{} {} rejected: {}", mv.move_type, mv.card_id, reason),
                    )
                    .with_player(mv.player_address.clone()),
                );
                false
            }
            Err(e) => {
                warn!("Verifier failed for move {}: {}", move_hash, e);
                self.record_event(
                    SecurityEvent::new(
                        SecurityEventKind::InvalidMove,
                        Severity::High,
                        format!("{} {} not verified: {}", mv.move_type, mv.card_id, e),
                    )
                    .with_player(mv.player_address.clone()),
                );
                false
            }
        }
    }

    async fn call_verifier(&self, mv: &Move) -> Result<MoveVerdict, VerifierError> {
        match self.config.verifier_timeout {
            Some(limit) => tokio::time::timeout(limit, self.verifier.verify(mv))
                .await
                .unwrap_or(Err(VerifierError::Timeout(limit.as_millis()))),
            None => self.verifier.verify(mv).await,
        }
    }

    /// Count a move attempt. Returns false if the player is over the rate
    /// limit; always true when rate limiting is disabled.
    pub fn check_rate_limit(&mut self, player: &str) -> bool {
        if self.rate_limiter.check(player) {
            return true;
        }
        self.record_event(
            SecurityEvent::new(
                SecurityEventKind::RateLimitExceeded,
                Severity::Medium,
                format!(
                    "more than {} moves in {} ms",
                    self.config.rate_limit_max_moves,
                    self.config.rate_limit_window.as_millis()
                ),
            )
            .with_player(player),
        );
        false
    }

    /// Check that a move comes from the player owning the state.
    ///
    /// States without an owner accept any player.
    pub fn check_authorization(&mut self, state: &GameState, mv: &Move) -> bool {
        match state.player_address.as_deref() {
            Some(owner) if owner != mv.player_address => {
                self.record_event(
                    SecurityEvent::new(
                        SecurityEventKind::UnauthorizedAccess,
                        Severity::High,
                        format!(
                            "{} attempted {} on state v{} owned by {}",
                            mv.player_address, mv.move_type, state.version, owner
                        ),
                    )
                    .with_player(mv.player_address.clone()),
                );
                false
            }
            _ => true,
        }
    }

    /// Whether a player has reached the suspicion threshold.
    ///
    /// The first time a player crosses it, a `SUSPICIOUS_ACTIVITY` event is
    /// recorded; later calls keep returning true without recording again.
    pub fn detect_suspicious_activity(&mut self, player: &str) -> bool {
        let count = self.suspicion_count(player);
        if count < self.config.suspicion_threshold {
            return false;
        }

        if self.flagged_players.insert(player.to_string()) {
            info!("Player {} flagged after {} security events", player, count);
            self.record_event(
                SecurityEvent::new(
                    SecurityEventKind::SuspiciousActivity,
                    Severity::Medium,
                    format!(
                        "{} security events recorded (threshold {})",
                        count, self.config.suspicion_threshold
                    ),
                )
                .with_player(player),
            );
        }
        true
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// Record an event and fan it out.
    ///
    /// Counts it against its player, notifies listeners in registration
    /// order, auto-reports critical events (marking them resolved when the
    /// report succeeds) and alerts on high and critical events.
    pub fn record_event(&mut self, event: SecurityEvent) -> Uuid {
        let id = event.id;
        let severity = event.severity;

        if let Some(player) = &event.player_address {
            *self.suspicion_count.entry(player.clone()).or_insert(0) += 1;
        }
        debug!("Recorded {} ({}) event {}", event.kind, severity, id);
        self.events.push_back(event);

        if let Some(recorded) = self.events.back() {
            self.listeners.notify(recorded);
        }

        if severity == Severity::Critical && self.config.auto_report {
            if let Some(recorded) = self.events.back_mut() {
                match self.sink.report(recorded) {
                    Ok(()) => recorded.resolved = true,
                    Err(e) => warn!("Auto-report of event {} failed: {}", id, e),
                }
            }
        }

        if severity.is_alerting() {
            if let Some(recorded) = self.events.back() {
                self.sink.alert(recorded);
            }
        }

        if self.config.max_events > 0 {
            while self.events.len() > self.config.max_events {
                self.events.pop_front();
            }
        }

        id
    }

    /// Mark an event resolved. Returns false if it is not in the log.
    pub fn resolve_event(&mut self, id: Uuid) -> bool {
        match self.events.iter_mut().find(|event| event.id == id) {
            Some(event) => {
                event.resolved = true;
                true
            }
            None => false,
        }
    }

    /// All logged events, oldest first.
    pub fn events(&self) -> impl Iterator<Item = &SecurityEvent> {
        self.events.iter()
    }

    /// Logged events attributed to one player, oldest first.
    pub fn events_for_player<'a>(&'a self, player: &'a str) -> impl Iterator<Item = &'a SecurityEvent> {
        self.events
            .iter()
            .filter(move |event| event.player_address.as_deref() == Some(player))
    }

    /// Clear the event log and suspicion counters.
    pub fn clear_events(&mut self) {
        self.events.clear();
        self.suspicion_count.clear();
        self.flagged_players.clear();
        info!("Security events cleared");
    }

    /// Clear everything: events, counters, stored state hashes, replay
    /// guard and rate-limit windows. Used on session restart.
    pub fn reset(&mut self) {
        self.clear_events();
        self.state_hash_by_version.clear();
        self.replay_guard.clear();
        self.rate_limiter.clear();
        info!("Integrity monitor reset");
    }

    // =========================================================================
    // LISTENERS & SETTINGS
    // =========================================================================

    /// Register a listener at the end of the delivery order.
    pub fn add_listener(&mut self, listener: Box<dyn SecurityListener>) -> ListenerId {
        self.listeners.register(listener)
    }

    /// Unregister a listener. Returns false if it was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.unregister(id)
    }

    /// Enable or disable auto-reporting of critical events.
    pub fn set_auto_report(&mut self, enabled: bool) {
        self.config.auto_report = enabled;
    }

    /// Active configuration.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Recorded events attributed to a player since the last clear.
    pub fn suspicion_count(&self, player: &str) -> u32 {
        self.suspicion_count.get(player).copied().unwrap_or(0)
    }

    /// Stored first-seen hash for a version.
    pub fn stored_state_hash(&self, version: u64) -> Option<Hash> {
        self.state_hash_by_version.get(&version).copied()
    }

    /// Whether a move is currently held by the replay guard.
    pub fn is_move_seen(&self, mv: &Move) -> bool {
        self.replay_guard.contains(&mv.replay_hash())
    }

    /// Counter snapshot.
    pub fn stats(&self) -> MonitorStats {
        let mut events_by_kind = BTreeMap::new();
        for event in &self.events {
            *events_by_kind.entry(event.kind).or_insert(0) += 1;
        }

        MonitorStats {
            total_events: self.events.len(),
            unresolved_events: self.events.iter().filter(|e| !e.resolved).count(),
            events_by_kind,
            tracked_versions: self.state_hash_by_version.len(),
            guarded_moves: self.replay_guard.len(),
            flagged_players: self.flagged_players.len(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::listener::ListenerError;
    use crate::security::sink::SinkError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    /// Verifier with a fixed answer that counts its calls.
    struct FixedVerifier {
        valid: bool,
        calls: AtomicUsize,
    }

    impl FixedVerifier {
        fn new(valid: bool) -> Arc<Self> {
            Arc::new(Self { valid, calls: AtomicUsize::new(0) })
        }
    }

    #[async_trait]
    impl MoveVerifier for FixedVerifier {
        async fn verify(&self, _mv: &Move) -> Result<MoveVerdict, VerifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.valid {
                Ok(MoveVerdict::accept())
            } else {
                Ok(MoveVerdict::reject("card not in hand"))
            }
        }
    }

    struct HangingVerifier;

    #[async_trait]
    impl MoveVerifier for HangingVerifier {
        async fn verify(&self, _mv: &Move) -> Result<MoveVerdict, VerifierError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(MoveVerdict::accept())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        alerts: Arc<StdMutex<Vec<SecurityEventKind>>>,
        reports: Arc<StdMutex<Vec<Uuid>>>,
        fail_reports: bool,
    }

    impl EventSink for RecordingSink {
        fn alert(&self, event: &SecurityEvent) {
            self.alerts.lock().unwrap().push(event.kind);
        }

        fn report(&self, event: &SecurityEvent) -> Result<(), SinkError> {
            if self.fail_reports {
                return Err(SinkError::Unavailable("offline".into()));
            }
            self.reports.lock().unwrap().push(event.id);
            Ok(())
        }
    }

    fn monitor_with(verifier: Arc<dyn MoveVerifier>) -> IntegrityMonitor {
        IntegrityMonitor::new(MonitorConfig::default(), verifier)
    }

    fn monitor() -> IntegrityMonitor {
        monitor_with(FixedVerifier::new(true))
    }

    fn state() -> GameState {
        GameState::new(1)
            .with_player("0xA11CE")
            .with_field("life", 20)
            .with_field("hand", json!(["goblin", "bolt"]))
            .with_field("_hover", "bolt")
    }

    fn play(nonce: u64) -> Move {
        Move::new("0xA11CE", "bolt", "play", 1_700_000_000_000, nonce)
    }

    fn count_kind(monitor: &IntegrityMonitor, kind: SecurityEventKind) -> usize {
        monitor.events().filter(|e| e.kind == kind).count()
    }

    // --- tamper detection, by root ---

    #[test]
    fn test_tamper_by_root_untouched_state() {
        let mut monitor = monitor();
        let state = state();
        let root = state.compute_root().unwrap();
        assert!(!monitor.detect_tampering(&state, Some(&root)));
        assert_eq!(monitor.events().count(), 0);
    }

    #[test]
    fn test_tamper_by_root_business_field() {
        let mut monitor = monitor();
        let mut state = state();
        let root = state.compute_root().unwrap();
        state.set_field("life", 99);

        assert!(monitor.detect_tampering(&state, Some(&root)));
        let event = monitor.events().next().unwrap();
        assert_eq!(event.kind, SecurityEventKind::StateTampering);
        assert_eq!(event.severity, Severity::High);
        assert_eq!(event.player_address.as_deref(), Some("0xA11CE"));
    }

    #[test]
    fn test_tamper_by_root_excluded_fields() {
        let mut monitor = monitor();
        let mut state = state();
        let root = state.seal().unwrap();
        state.set_field("_hover", "goblin");
        state.set_field("merkleProof", json!([]));
        assert!(!monitor.detect_tampering(&state, Some(&root)));
    }

    #[test]
    fn test_tamper_by_root_version_is_committed() {
        let mut monitor = monitor();
        let mut state = state();
        let root = state.compute_root().unwrap();
        state.version = 2;
        assert!(monitor.detect_tampering(&state, Some(&root)));
    }

    // --- tamper detection, first seen ---

    #[test]
    fn test_first_seen_trust() {
        let mut monitor = monitor();
        let original = state();

        assert!(!monitor.detect_tampering(&original, None));
        assert_eq!(monitor.stored_state_hash(1), Some(original.compute_root().unwrap()));
        assert!(!monitor.detect_tampering(&original, None));

        let mut changed = original.clone();
        changed.set_field("life", 1);
        assert!(monitor.detect_tampering(&changed, None));
        assert_eq!(count_kind(&monitor, SecurityEventKind::StateTampering), 1);

        // Stored hash is not replaced by the tampered one.
        assert!(!monitor.detect_tampering(&original, None));
    }

    #[test]
    fn test_first_seen_per_version() {
        let mut monitor = monitor();
        let v1 = state();
        let mut v2 = state().with_field("life", 17);
        v2.version = 2;
        assert!(!monitor.detect_tampering(&v1, None));
        assert!(!monitor.detect_tampering(&v2, None));
        assert_eq!(monitor.stats().tracked_versions, 2);
    }

    // --- moves ---

    #[tokio::test]
    async fn test_accepted_move_then_replay() {
        let verifier = FixedVerifier::new(true);
        let mut monitor = monitor_with(verifier.clone());

        assert!(monitor.verify_move(&play(1)).await);
        assert!(monitor.is_move_seen(&play(1)));
        assert!(!monitor.verify_move(&play(1)).await);

        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
        let event = monitor.events().next().unwrap();
        assert_eq!(event.kind, SecurityEventKind::ReplayAttack);
        assert_eq!(event.severity, Severity::Medium);
    }

    #[tokio::test]
    async fn test_fresh_nonce_is_not_replay() {
        let mut monitor = monitor();
        assert!(monitor.verify_move(&play(1)).await);
        assert!(monitor.verify_move(&play(2)).await);
        assert_eq!(monitor.events().count(), 0);
    }

    #[tokio::test]
    async fn test_rejected_move_is_invalid_not_guarded() {
        let verifier = FixedVerifier::new(false);
        let mut monitor = monitor_with(verifier.clone());

        assert!(!monitor.verify_move(&play(1)).await);
        assert!(!monitor.is_move_seen(&play(1)));

        let event = monitor.events().next().unwrap();
        assert_eq!(event.kind, SecurityEventKind::InvalidMove);
        assert_eq!(event.severity, Severity::High);
        assert!(event.details.contains("card not in hand"));

        // Resubmission goes to the verifier again, not the replay path.
        assert!(!monitor.verify_move(&play(1)).await);
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 2);
        assert_eq!(count_kind(&monitor, SecurityEventKind::ReplayAttack), 0);
    }

    #[tokio::test]
    async fn test_verifier_timeout_rejects() {
        let config = MonitorConfig {
            verifier_timeout: Some(Duration::from_millis(20)),
            ..MonitorConfig::default()
        };
        let mut monitor = IntegrityMonitor::new(config, Arc::new(HangingVerifier));

        assert!(!monitor.verify_move(&play(1)).await);
        let event = monitor.events().next().unwrap();
        assert_eq!(event.kind, SecurityEventKind::InvalidMove);
        assert!(event.details.contains("timed out"));
        assert!(!monitor.is_move_seen(&play(1)));
    }

    #[tokio::test]
    async fn test_default_config_accepts_burst_of_distinct_moves() {
        let mut monitor = monitor();
        for nonce in 0..25 {
            assert!(monitor.verify_move(&play(nonce)).await, "nonce {} rejected", nonce);
        }
        assert_eq!(monitor.events().count(), 0);
        assert_eq!(monitor.suspicion_count("0xA11CE"), 0);
        assert!(monitor.check_rate_limit("0xA11CE"));
    }

    #[tokio::test]
    async fn test_rate_limit_in_verify_move() {
        let config = MonitorConfig {
            rate_limit_window: Duration::from_secs(3600),
            rate_limit_max_moves: 2,
            ..MonitorConfig::default()
        };
        let mut monitor = IntegrityMonitor::new(config, FixedVerifier::new(true));

        assert!(monitor.verify_move(&play(1)).await);
        assert!(monitor.verify_move(&play(2)).await);
        assert!(!monitor.verify_move(&play(3)).await);
        assert_eq!(count_kind(&monitor, SecurityEventKind::RateLimitExceeded), 1);
        assert!(!monitor.is_move_seen(&play(3)));
    }

    #[tokio::test]
    async fn test_shared_monitor_rejects_concurrent_duplicate() {
        let shared = monitor().into_shared();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let monitor = shared.clone();
            handles.push(tokio::spawn(async move {
                monitor.lock().await.verify_move(&play(7)).await
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(count_kind(&*shared.lock().await, SecurityEventKind::ReplayAttack), 7);
    }

    #[test]
    fn test_authorization() {
        let mut monitor = monitor();
        let state = state();
        assert!(monitor.check_authorization(&state, &play(1)));

        let intruder = Move::new("0xEVE", "bolt", "play", 1, 1);
        assert!(!monitor.check_authorization(&state, &intruder));
        let event = monitor.events().next().unwrap();
        assert_eq!(event.kind, SecurityEventKind::UnauthorizedAccess);
        assert_eq!(event.player_address.as_deref(), Some("0xEVE"));

        let unowned = GameState::new(1);
        assert!(monitor.check_authorization(&unowned, &intruder));
    }

    // --- events ---

    #[test]
    fn test_suspicion_escalation() {
        let mut monitor = monitor();
        for _ in 0..2 {
            monitor.record_event(
                SecurityEvent::new(SecurityEventKind::InvalidMove, Severity::Low, "x")
                    .with_player("0xA11CE"),
            );
        }
        assert!(!monitor.detect_suspicious_activity("0xA11CE"));

        monitor.record_event(
            SecurityEvent::new(SecurityEventKind::InvalidMove, Severity::Low, "x")
                .with_player("0xA11CE"),
        );
        assert!(monitor.detect_suspicious_activity("0xA11CE"));
        assert_eq!(count_kind(&monitor, SecurityEventKind::SuspiciousActivity), 1);

        // Recorded once per player.
        assert!(monitor.detect_suspicious_activity("0xA11CE"));
        assert_eq!(count_kind(&monitor, SecurityEventKind::SuspiciousActivity), 1);
        assert!(!monitor.detect_suspicious_activity("0xB0B"));
    }

    #[test]
    fn test_events_for_player() {
        let mut monitor = monitor();
        monitor.record_event(
            SecurityEvent::new(SecurityEventKind::ReplayAttack, Severity::Medium, "a").with_player("p1"),
        );
        monitor.record_event(
            SecurityEvent::new(SecurityEventKind::ReplayAttack, Severity::Medium, "b").with_player("p2"),
        );
        monitor.record_event(SecurityEvent::new(SecurityEventKind::StateTampering, Severity::High, "c"));

        assert_eq!(monitor.events().count(), 3);
        let p1: Vec<&str> = monitor.events_for_player("p1").map(|e| e.details.as_str()).collect();
        assert_eq!(p1, vec!["a"]);
        assert_eq!(monitor.suspicion_count("p2"), 1);
    }

    #[test]
    fn test_listener_failure_does_not_block_others() {
        let mut monitor = monitor();
        let seen = Arc::new(StdMutex::new(Vec::new()));

        monitor.add_listener(Box::new(|_: &SecurityEvent| -> Result<(), ListenerError> {
            Err(ListenerError::Failed("down".into()))
        }));
        let sink = seen.clone();
        let id = monitor.add_listener(Box::new(move |e: &SecurityEvent| -> Result<(), ListenerError> {
            sink.lock().unwrap().push(e.kind);
            Ok(())
        }));

        monitor.record_event(SecurityEvent::new(SecurityEventKind::InvalidMove, Severity::High, "x"));
        assert_eq!(*seen.lock().unwrap(), vec![SecurityEventKind::InvalidMove]);
        assert_eq!(monitor.events().count(), 1);

        assert!(monitor.remove_listener(id));
        monitor.record_event(SecurityEvent::new(SecurityEventKind::InvalidMove, Severity::High, "y"));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_alerts_for_high_and_critical_only() {
        let sink = RecordingSink::default();
        let mut monitor = monitor().with_sink(sink.clone());

        monitor.record_event(SecurityEvent::new(SecurityEventKind::ReplayAttack, Severity::Medium, "m"));
        monitor.record_event(SecurityEvent::new(SecurityEventKind::InvalidMove, Severity::High, "h"));
        monitor.record_event(SecurityEvent::new(SecurityEventKind::StateTampering, Severity::Critical, "c"));

        assert_eq!(
            *sink.alerts.lock().unwrap(),
            vec![SecurityEventKind::InvalidMove, SecurityEventKind::StateTampering]
        );
        // Auto-report is off by default.
        assert!(sink.reports.lock().unwrap().is_empty());
        assert!(monitor.events().all(|e| !e.resolved));
    }

    #[test]
    fn test_auto_report_resolves_critical() {
        let sink = RecordingSink::default();
        let mut monitor = monitor().with_sink(sink.clone());
        monitor.set_auto_report(true);

        let critical = monitor.record_event(
            SecurityEvent::new(SecurityEventKind::StateTampering, Severity::Critical, "c"),
        );
        let high = monitor.record_event(
            SecurityEvent::new(SecurityEventKind::StateTampering, Severity::High, "h"),
        );

        assert_eq!(*sink.reports.lock().unwrap(), vec![critical]);
        let resolved: Vec<Uuid> = monitor.events().filter(|e| e.resolved).map(|e| e.id).collect();
        assert_eq!(resolved, vec![critical]);
        assert_ne!(critical, high);
    }

    #[test]
    fn test_failed_report_leaves_event_unresolved() {
        let sink = RecordingSink { fail_reports: true, ..RecordingSink::default() };
        let mut monitor = monitor().with_sink(sink);
        monitor.set_auto_report(true);

        let id = monitor.record_event(
            SecurityEvent::new(SecurityEventKind::StateTampering, Severity::Critical, "c"),
        );
        assert!(monitor.events().all(|e| !e.resolved));
        assert!(monitor.resolve_event(id));
        assert!(monitor.events().all(|e| e.resolved));
        assert!(!monitor.resolve_event(Uuid::new_v4()));
    }

    #[test]
    fn test_event_log_bounded() {
        let config = MonitorConfig { max_events: 2, ..MonitorConfig::default() };
        let mut monitor = IntegrityMonitor::new(config, FixedVerifier::new(true));
        for details in ["a", "b", "c"] {
            monitor.record_event(
                SecurityEvent::new(SecurityEventKind::ReplayAttack, Severity::Low, details)
                    .with_player("p"),
            );
        }
        let kept: Vec<&str> = monitor.events().map(|e| e.details.as_str()).collect();
        assert_eq!(kept, vec!["b", "c"]);
        // Counters are not tied to the log.
        assert_eq!(monitor.suspicion_count("p"), 3);
    }

    #[tokio::test]
    async fn test_clear_and_reset() {
        let mut monitor = monitor();
        monitor.detect_tampering(&state(), None);
        assert!(monitor.verify_move(&play(1)).await);
        monitor.record_event(
            SecurityEvent::new(SecurityEventKind::ReplayAttack, Severity::Low, "x").with_player("0xA11CE"),
        );

        monitor.clear_events();
        assert_eq!(monitor.events().count(), 0);
        assert_eq!(monitor.suspicion_count("0xA11CE"), 0);
        assert!(monitor.is_move_seen(&play(1)));
        assert_eq!(monitor.stats().tracked_versions, 1);

        monitor.reset();
        assert!(!monitor.is_move_seen(&play(1)));
        assert_eq!(monitor.stats(), MonitorStats::default());
    }

    #[tokio::test]
    async fn test_stats() {
        let mut monitor = monitor();
        assert!(monitor.verify_move(&play(1)).await);
        assert!(!monitor.verify_move(&play(1)).await);
        monitor.detect_tampering(&state(), None);

        let stats = monitor.stats();
        assert_eq!(stats.total_events, 1);
        assert_eq!(stats.unresolved_events, 1);
        assert_eq!(stats.events_by_kind.get(&SecurityEventKind::ReplayAttack), Some(&1));
        assert_eq!(stats.guarded_moves, 1);
        assert_eq!(stats.tracked_versions, 1);
    }
}
