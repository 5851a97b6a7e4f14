//! Game Integrity Demo
//!
//! Walks one session through the integrity layer: seal a state, catch a
//! tampered copy, verify and replay a move, and commit a card pool through
//! sharded content trees.

use std::sync::Arc;

use anyhow::Result;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use game_integrity::{
    game::{GameState, Move},
    security::{IntegrityMonitor, ListenerError, MonitorConfig, SecurityEvent, StubMoveVerifier},
    tree::{BatchChange, ContentTree, TreeConfig},
    VERSION,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Game Integrity v{}", VERSION);

    let config = MonitorConfig::from_env();
    info!(
        "Suspicion threshold: {}, auto-report: {}, verifier timeout: {:?}",
        config.suspicion_threshold, config.auto_report, config.verifier_timeout
    );

    let mut monitor = IntegrityMonitor::new(config, Arc::new(StubMoveVerifier));
    monitor.add_listener(Box::new(|event: &SecurityEvent| -> std::result::Result<(), ListenerError> {
        info!("Listener saw {} ({})", event.kind, event.severity);
        Ok(())
    }));

    demo_state(&mut monitor)?;
    demo_moves(&mut monitor).await;
    demo_cards()?;

    let stats = monitor.stats();
    info!("=== Session Summary ===");
    info!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}

/// Seal a state, then check an untouched and a tampered copy.
fn demo_state(monitor: &mut IntegrityMonitor) -> Result<()> {
    info!("=== State Commitment ===");

    let mut state = GameState::new(1)
        .with_player("0xA11CE")
        .with_field("life", 20)
        .with_field("hand", json!(["goblin-guide", "lightning-bolt", "mountain"]))
        .with_field("_selectedCard", 1);
    let root = state.seal()?;
    info!("Sealed state v{} root {}", state.version, root);

    if let Some((entry, proof)) = state.field_proof("life")? {
        info!("Proof for '{}': {} steps", entry.key, proof.len());
    }

    let mut local = state.clone();
    local.set_field("_selectedCard", 2);
    info!("Private field changed, tampered: {}", monitor.detect_tampering(&local, Some(&root)));

    let mut forged = state.clone();
    forged.set_field("life", 99);
    info!("Life forged, tampered: {}", monitor.detect_tampering(&forged, Some(&root)));

    Ok(())
}

/// Submit moves, including a replay and one without proof.
async fn demo_moves(monitor: &mut IntegrityMonitor) {
    info!("=== Move Verification ===");

    let bolt = Move::new("0xA11CE", "lightning-bolt", "play", 1_700_000_000_000, 1).with_proof("zk:0001");
    info!("First submission accepted: {}", monitor.verify_move(&bolt).await);
    info!("Replay accepted: {}", monitor.verify_move(&bolt).await);

    let unproven = Move::new("0xA11CE", "goblin-guide", "attack", 1_700_000_000_500, 2);
    info!("Unproven move accepted: {}", monitor.verify_move(&unproven).await);

    if monitor.detect_suspicious_activity("0xA11CE") {
        warn!(
            "Player 0xA11CE flagged after {} events",
            monitor.suspicion_count("0xA11CE")
        );
    }
}

/// Commit a card pool, update it in a batch and compare shard roots.
fn demo_cards() -> Result<()> {
    info!("=== Content Tree ===");

    let cards: Vec<String> = (0..1000).map(|i| format!("card-{:04}", i)).collect();
    let config = TreeConfig { shard_count: 8, ..TreeConfig::default() };
    let mut pool = ContentTree::with_config(cards, config)?;
    info!("Pool of {} cards, root {}", pool.len(), pool.root());

    let changes = (0..100)
        .map(|i| BatchChange::new(i * 10, format!("foil-{:04}", i * 10)))
        .collect();
    let root = pool.update_with_batch(changes)?;
    info!("After batch update: {}", root);

    let shards = pool.create_shards()?;
    let combined = pool.combine_shard_roots(&shards)?;
    info!("{} shard roots combined: {}", shards.len(), combined);
    info!("Shard roots stable across runs: {}", pool.create_shards()? == shards);

    Ok(())
}
