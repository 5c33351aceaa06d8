// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscription Engine: ValueChange polling, subscription
//! lifecycle, and Notify delivery/redelivery tracking.
//!
//! Per-item elapsed-time bookkeeping for the redelivery backoff
//! (`BackoffPolicy::is_expired`) is kept here in memory rather than in
//! `MaterializedState` — `PendingNotify` durably records the retry count and
//! delivery state (so a restart resumes mid-retry correctly), but the exact
//! wall-clock moment of first send is not part of that contract and is
//! simpler to track as ephemeral runtime state, the same pattern
//! `InstanceCache` uses for refresh timestamps.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use uspa_core::{BackoffPolicy, EndpointId, Event};
use uspa_storage::MaterializedState;

fn pending_key(controller: &EndpointId, message_id: u64) -> String {
    format!("{controller}:{message_id}")
}

/// Diffs live parameter values against the last-seen snapshot for a set of
/// watched paths, the mechanism behind a ValueChange subscription's poll
/// loop.
#[derive(Default)]
pub struct ValueChangeWatch {
    last_seen: HashMap<String, String>,
}

impl ValueChangeWatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `(path, new_value)` for every watched path whose value
    /// differs from the last poll (or is seen for the first time), and
    /// updates the snapshot to match.
    pub fn poll(&mut self, state: &MaterializedState, watched_paths: &[String]) -> Vec<(String, String)> {
        let mut changed = Vec::new();
        for path in watched_paths {
            let current = state.param(path).unwrap_or_default();
            match self.last_seen.get(path) {
                Some(previous) if previous == current => {}
                _ => {
                    self.last_seen.insert(path.clone(), current.to_string());
                    changed.push((path.clone(), current.to_string()));
                }
            }
        }
        changed
    }

    /// Drops a path from the snapshot, e.g. when its owning subscription is
    /// deleted or the parameter's instance is removed.
    pub fn forget(&mut self, path: &str) {
        self.last_seen.remove(path);
    }
}

pub struct SubscriptionEngine {
    redelivery_policy: BackoffPolicy,
    first_attempt: HashMap<String, Instant>,
}

impl Default for SubscriptionEngine {
    fn default() -> Self {
        Self { redelivery_policy: BackoffPolicy::notify_redelivery(), first_attempt: HashMap::new() }
    }
}

impl SubscriptionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, controller: EndpointId, subscription_id: impl Into<String>) -> Event {
        Event::SubscriptionCreated { subscription_id: subscription_id.into(), controller }
    }

    pub fn delete(&self, subscription_id: impl Into<String>) -> Event {
        Event::SubscriptionDeleted { subscription_id: subscription_id.into() }
    }

    /// The next unused Notify message-id for `controller`.
    pub fn next_message_id(&self, state: &MaterializedState, controller: &EndpointId) -> u64 {
        state.notify_counters.get(controller.as_str()).copied().unwrap_or(0) + 1
    }

    pub fn sent(&mut self, controller: EndpointId, message_id: u64, kind: impl Into<String>, now: Instant) -> Event {
        self.first_attempt.entry(pending_key(&controller, message_id)).or_insert(now);
        Event::NotifySent { controller, message_id, kind: kind.into() }
    }

    pub fn acked(&mut self, controller: EndpointId, message_id: u64) -> Event {
        self.first_attempt.remove(&pending_key(&controller, message_id));
        Event::NotifyAcked { controller, message_id }
    }

    /// Decide whether an unacknowledged Notify gets another redelivery
    /// attempt or is abandoned, based on total elapsed time since it was
    /// first sent.
    pub fn retry_or_expire(&mut self, controller: EndpointId, message_id: u64, attempt: u32, now: Instant) -> Event {
        let key = pending_key(&controller, message_id);
        let first_sent = *self.first_attempt.entry(key.clone()).or_insert(now);
        if self.redelivery_policy.is_expired(now.duration_since(first_sent)) {
            self.first_attempt.remove(&key);
            Event::NotifyExpired { controller, message_id }
        } else {
            Event::NotifyRetryScheduled { controller, message_id, attempt }
        }
    }

    pub fn next_retry_delay(&self, attempt: u32, jitter_fraction: f64) -> Duration {
        self.redelivery_policy.delay_for_attempt(attempt, jitter_fraction)
    }
}

#[cfg(test)]
#[path = "subscriptions_tests.rs"]
mod tests;
