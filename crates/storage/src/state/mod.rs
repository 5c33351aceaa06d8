// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state built from WAL replay.

mod controllers;
mod datamodel;
mod helpers;
mod mtp;
mod subscription;
mod types;

pub use types::{
    CoapListenerRecord, ControllerRecord, MtpRecord, PendingNotify, PendingNotifyState,
    StompConnectionRecord, SubscriptionRecord,
};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uspa_core::Event;

/// Materialized state built from replaying the event log.
///
/// Every field here is either durable (present in a snapshot and rebuilt by
/// replaying the WAL on top of it) or explicitly `#[serde(skip)]`-marked
/// runtime-only state that repopulates naturally once the daemon resumes.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterializedState {
    /// Flat parameter store, keyed by canonical path. Values for parameters
    /// registered with [`uspa_core::schema::ParamDef::secure`] are stored
    /// already obfuscated by [`crate::db`] — this map never holds plaintext
    /// secrets.
    #[serde(default)]
    pub params: HashMap<String, String>,
    /// Known instance numbers per multi-instance table path, maintained by
    /// `ObjectAdded`/`ObjectDeleted`/`InstancesRefreshed`.
    #[serde(default)]
    pub instances: HashMap<String, Vec<u32>>,
    /// Per-table high-water mark of instance numbers ever handed out.
    /// Bumped by `ObjectAdded`/`InstancesRefreshed`, never lowered by
    /// `ObjectDeleted` — this is what keeps a deleted instance's number
    /// from being reused (spec §3, §8 "Instance uniqueness").
    #[serde(default)]
    pub instance_high_water: HashMap<String, u32>,
    #[serde(default)]
    pub controllers: HashMap<String, ControllerRecord>,
    #[serde(default)]
    pub mtps: HashMap<u32, MtpRecord>,
    #[serde(default)]
    pub stomp_connections: HashMap<u32, StompConnectionRecord>,
    #[serde(default)]
    pub coap_listeners: HashMap<u32, CoapListenerRecord>,
    #[serde(default)]
    pub subscriptions: HashMap<String, SubscriptionRecord>,
    /// Per-controller monotonic Notify message-id high-water mark.
    #[serde(default)]
    pub notify_counters: HashMap<String, u64>,
    /// Outstanding Notifies awaiting acknowledgement, keyed by
    /// `"<controller>:<message_id>"`.
    #[serde(default)]
    pub pending_notifies: HashMap<String, PendingNotify>,
}

impl MaterializedState {
    pub fn param(&self, path: &str) -> Option<&str> {
        self.params.get(path).map(String::as_str)
    }

    pub fn instances_of(&self, table_path: &str) -> &[u32] {
        self.instances.get(table_path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The next unused instance number for `table_path`: one past the
    /// higher of the persisted high-water mark and the current live max,
    /// so a number is never handed out twice even after its instance is
    /// deleted.
    pub fn next_instance_number(&self, table_path: &str) -> u32 {
        let high_water = self.instance_high_water.get(table_path).copied().unwrap_or(0);
        let live_max = self.instances_of(table_path).iter().max().copied().unwrap_or(0);
        high_water.max(live_max) + 1
    }

    /// Apply an event to derive state changes.
    ///
    /// # Idempotency Requirement
    ///
    /// **All event handlers MUST be idempotent.** Applying the same event
    /// twice must produce the same state as applying it once, because events
    /// are applied both for immediate in-process visibility and again during
    /// WAL replay after a restart. Guidelines:
    /// - Use assignment (`=`) instead of accumulation (`+=`, `-=`).
    /// - Guard inserts with existence checks, or use `entry(..).or_insert`.
    /// - Treat removal of an already-absent key as a no-op, not an error.
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::ParamValueSet { .. }
            | Event::ObjectAdded { .. }
            | Event::ObjectDeleted { .. }
            | Event::TransactionCommitted { .. }
            | Event::TransactionAborted { .. }
            | Event::InstancesRefreshed { .. }
            | Event::FactoryReset { .. } => datamodel::apply(self, event),

            Event::ControllerRegistered { .. } | Event::ControllerRemoved { .. } => {
                controllers::apply(self, event)
            }

            Event::MtpStarted { .. }
            | Event::MtpStopped { .. }
            | Event::MtpStatusChanged { .. }
            | Event::StompStateChanged { .. }
            | Event::StompReconnectScheduled { .. }
            | Event::StompReconnectAttempted { .. }
            | Event::CoapBound { .. }
            | Event::CoapBindFailed { .. } => mtp::apply(self, event),

            Event::SubscriptionCreated { .. }
            | Event::SubscriptionDeleted { .. }
            | Event::NotifySent { .. }
            | Event::NotifyAcked { .. }
            | Event::NotifyRetryScheduled { .. }
            | Event::NotifyExpired { .. }
            | Event::OperationCompleted { .. } => subscription::apply(self, event),

            // Control events carry no state of their own.
            Event::Custom | Event::Shutdown => {}
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
