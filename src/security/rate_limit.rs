//! Move Rate Limiting
//!
//! Keyed GCRA limiter per player: up to `max_per_window` moves in a burst,
//! replenished evenly over the window. Idle players are pruned from the
//! key store every `PRUNE_INTERVAL` checks, so arbitrary player addresses
//! cannot grow it without bound.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{
    clock::{Clock, DefaultClock},
    middleware::NoOpMiddleware,
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter as Governor,
};
use tracing::debug;

/// Checks between key-store prunes.
pub const PRUNE_INTERVAL: u64 = 1024;

type KeyedGovernor<C> =
    Governor<String, DefaultKeyedStateStore<String>, C, NoOpMiddleware<<C as Clock>::Instant>>;

/// Per-player move rate limiter.
pub struct RateLimiter<C: Clock = DefaultClock> {
    quota: Option<Quota>,
    clock: C,
    limiter: Option<KeyedGovernor<C>>,
    checks: u64,
}

impl RateLimiter {
    /// Create a limiter on the system clock. `max_per_window == 0` allows
    /// everything.
    pub fn new(window: Duration, max_per_window: u32) -> Self {
        Self::with_clock(window, max_per_window, DefaultClock::default())
    }
}

impl<C: Clock> RateLimiter<C> {
    /// Create a limiter on an explicit clock.
    pub fn with_clock(window: Duration, max_per_window: u32, clock: C) -> Self {
        let quota = NonZeroU32::new(max_per_window).and_then(|burst| {
            Quota::with_period(window / burst.get()).map(|quota| quota.allow_burst(burst))
        });
        let limiter = quota.map(|quota| Governor::dashmap_with_clock(quota, &clock));
        Self {
            quota,
            clock,
            limiter,
            checks: 0,
        }
    }

    /// Whether limiting is active.
    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }

    /// Count one move attempt. Returns true if it is within limits.
    pub fn check(&mut self, player: &str) -> bool {
        let Some(limiter) = &self.limiter else {
            return true;
        };

        let allowed = limiter.check_key(&player.to_string()).is_ok();

        self.checks += 1;
        if self.checks % PRUNE_INTERVAL == 0 {
            self.prune();
        }
        allowed
    }

    /// Drop players whose allowance has fully replenished.
    pub fn prune(&self) {
        if let Some(limiter) = &self.limiter {
            let before = limiter.len();
            limiter.retain_recent();
            limiter.shrink_to_fit();
            debug!("Rate limiter pruned {} idle players", before.saturating_sub(limiter.len()));
        }
    }

    /// Players currently held in the key store.
    pub fn tracked_players(&self) -> usize {
        self.limiter.as_ref().map_or(0, |limiter| limiter.len())
    }

    /// Forget all players.
    pub fn clear(&mut self) {
        self.limiter = self
            .quota
            .map(|quota| Governor::dashmap_with_clock(quota, &self.clock));
        self.checks = 0;
    }
}
