//! # Two-Tier Rate Limiter
//!
//! Keeps the migrator under the call ceilings of both remote APIs. Each tier
//! owns a fixed window counter behind its own lock, so the read and write
//! budgets never contend with each other. `acquire` never fails: it suspends
//! the caller until the current window rolls over and a slot frees up.
//!
//! A window that elapses with unused capacity simply restarts at zero; unused
//! calls never carry over into the next window.

use crate::remote::ApiTier;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Ceilings for both tiers over a shared window length
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub read_calls_per_window: u32,
    pub write_calls_per_window: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        use crate::constants::rate_limits;
        Self {
            read_calls_per_window: rate_limits::DEFAULT_READ_CALLS_PER_WINDOW,
            write_calls_per_window: rate_limits::DEFAULT_WRITE_CALLS_PER_WINDOW,
            window: Duration::from_secs(rate_limits::DEFAULT_WINDOW_SECONDS),
        }
    }
}

/// Counters of one tier since the limiter was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierMetrics {
    /// Slots handed out
    pub granted: u64,
    /// Slots that were only handed out after waiting for a window rollover
    pub delayed: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimiterMetrics {
    pub read: TierMetrics,
    pub write: TierMetrics,
}

#[derive(Debug)]
struct FixedWindow {
    ceiling: u32,
    length: Duration,
    started_at: Instant,
    used: u32,
    metrics: TierMetrics,
}

impl FixedWindow {
    fn new(ceiling: u32, length: Duration) -> Self {
        Self {
            ceiling: ceiling.max(1),
            length,
            started_at: Instant::now(),
            used: 0,
            metrics: TierMetrics::default(),
        }
    }

    /// Take a slot, or report how long until the window rolls over
    fn try_take(&mut self, now: Instant) -> Result<(), Duration> {
        if now.duration_since(self.started_at) >= self.length {
            self.started_at = now;
            self.used = 0;
        }

        if self.used < self.ceiling {
            self.used += 1;
            self.metrics.granted += 1;
            Ok(())
        } else {
            Err((self.started_at + self.length).saturating_duration_since(now))
        }
    }
}

/// Shared limiter; clone an `Arc<RateLimiter>` into every resource worker
#[derive(Debug)]
pub struct RateLimiter {
    read: Mutex<FixedWindow>,
    write: Mutex<FixedWindow>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        info!(
            read_calls_per_window = config.read_calls_per_window,
            write_calls_per_window = config.write_calls_per_window,
            window_seconds = config.window.as_secs(),
            "🚦 Rate limiter initialized"
        );

        Self {
            read: Mutex::new(FixedWindow::new(config.read_calls_per_window, config.window)),
            write: Mutex::new(FixedWindow::new(
                config.write_calls_per_window,
                config.window,
            )),
        }
    }

    fn window(&self, tier: ApiTier) -> &Mutex<FixedWindow> {
        match tier {
            ApiTier::Read => &self.read,
            ApiTier::Write => &self.write,
        }
    }

    /// Wait until a call slot for `tier` is available and take it
    pub async fn acquire(&self, tier: ApiTier) {
        let mut waited = false;
        loop {
            let wait = {
                let mut window = self.window(tier).lock();
                match window.try_take(Instant::now()) {
                    Ok(()) => {
                        if waited {
                            window.metrics.delayed += 1;
                        }
                        return;
                    }
                    Err(wait) => wait,
                }
            };

            if !waited {
                debug!(
                    %tier,
                    wait_ms = wait.as_millis() as u64,
                    "⏳ Rate ceiling reached, waiting for next window"
                );
            }
            waited = true;
            tokio::time::sleep(wait).await;
        }
    }

    /// Take a slot only if one is free right now
    pub fn try_acquire(&self, tier: ApiTier) -> bool {
        self.window(tier).lock().try_take(Instant::now()).is_ok()
    }

    pub fn metrics(&self) -> RateLimiterMetrics {
        RateLimiterMetrics {
            read: self.read.lock().metrics,
            write: self.write.lock().metrics,
        }
    }
}
