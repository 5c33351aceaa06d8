// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Truncated exponential backoff with jitter.
//!
//! Used independently by the MTP side (STOMP reconnects) and the DM side
//! (unacknowledged Notify redelivery) — both "threads" need the same
//! backoff math but must not share state across the channel boundary
//!, so this is pure, stateless computation rather than a shared
//! scheduler object. Each caller keeps its own small per-item attempt
//! counter and asks this module how long to wait next.

use std::time::Duration;

/// Backoff parameters for one retry category (e.g. "stomp-reconnect" or
/// "notify-redelivery").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub multiplier: f64,
    pub cap: Duration,
    /// Maximum total elapsed time across all attempts before the item is
    /// permanently failed.
    pub max_elapsed: Duration,
}

impl BackoffPolicy {
    pub const fn new(base: Duration, multiplier: f64, cap: Duration, max_elapsed: Duration) -> Self {
        Self { base, multiplier, cap, max_elapsed }
    }

    /// STOMP reconnect defaults: quick first retry, capped at a
    /// few minutes, give up permanently after an hour of failed attempts.
    pub const fn stomp_reconnect() -> Self {
        Self::new(
            Duration::from_secs(1),
            2.0,
            Duration::from_secs(300),
            Duration::from_secs(3600),
        )
    }

    /// Notify redelivery defaults: a little slower to start
    /// since the controller may simply be offline for a while.
    pub const fn notify_redelivery() -> Self {
        Self::new(
            Duration::from_secs(5),
            2.0,
            Duration::from_secs(600),
            Duration::from_secs(86_400),
        )
    }

    /// Delay before the given 1-based attempt number, with jitter drawn
    /// from `jitter_fraction` (a caller-supplied `[0, 1)` sample so this
    /// function stays a pure, testable computation with no RNG dependency).
    pub fn delay_for_attempt(&self, attempt: u32, jitter_fraction: f64) -> Duration {
        debug_assert!((0.0..1.0).contains(&jitter_fraction));
        let exp = self.multiplier.powi(attempt.saturating_sub(1) as i32);
        let raw = (self.base.as_secs_f64() * exp).min(self.cap.as_secs_f64());
        let jittered = raw * (0.5 + 0.5 * jitter_fraction);
        Duration::from_secs_f64(jittered.max(0.0))
    }

    /// Whether `elapsed` since the first attempt has exceeded the bound
    /// past which the item is permanently failed rather than retried again.
    pub fn is_expired(&self, elapsed: Duration) -> bool {
        elapsed >= self.max_elapsed
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
