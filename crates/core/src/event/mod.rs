// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events are the durable record of every state transition in the agent:
//! data-model edits, MTP lifecycle, and subscription/notify activity.
//!
//! Every event is applied to `MaterializedState` (`uspa-storage`) by an
//! idempotent handler and appended to the write-ahead log before anything
//! downstream observes it, so replaying the log from empty state reproduces
//! the live state exactly.

pub mod dispatch;

use crate::endpoint::EndpointId;
use serde::{Deserialize, Serialize};

/// Everything that can happen in the agent runtime, tagged by family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // --- Data model (registry + transaction manager) ---
    #[serde(rename = "datamodel:param_set")]
    ParamValueSet { path: String, value: String },
    #[serde(rename = "datamodel:object_added")]
    ObjectAdded { table_path: String, instance: u32 },
    #[serde(rename = "datamodel:object_deleted")]
    ObjectDeleted { table_path: String, instance: u32 },
    #[serde(rename = "datamodel:txn_committed")]
    TransactionCommitted { txn_id: String, edit_count: usize },
    #[serde(rename = "datamodel:txn_aborted")]
    TransactionAborted { txn_id: String, reason: String },
    #[serde(rename = "datamodel:instances_refreshed")]
    InstancesRefreshed { table_path: String, added: Vec<u32>, removed: Vec<u32> },
    #[serde(rename = "datamodel:factory_reset")]
    FactoryReset { source: String },

    // --- Controller table ---
    #[serde(rename = "controller:registered")]
    ControllerRegistered { endpoint_id: EndpointId, trust_role: String },
    #[serde(rename = "controller:removed")]
    ControllerRemoved { endpoint_id: EndpointId },

    // --- Agent MTP table / transport lifecycle ---
    #[serde(rename = "mtp:started")]
    MtpStarted { mtp_id: u32, protocol: String },
    #[serde(rename = "mtp:stopped")]
    MtpStopped { mtp_id: u32 },
    #[serde(rename = "mtp:status_changed")]
    MtpStatusChanged { mtp_id: u32, status: String },

    // --- STOMP connection state machine ---
    #[serde(rename = "stomp:state_changed")]
    StompStateChanged { conn_id: u32, state: String },
    #[serde(rename = "stomp:reconnect_scheduled")]
    StompReconnectScheduled { conn_id: u32 },
    #[serde(rename = "stomp:reconnect_attempted")]
    StompReconnectAttempted { conn_id: u32 },

    // --- CoAP listener lifecycle ---
    #[serde(rename = "coap:bound")]
    CoapBound { mtp_id: u32, port: u16 },
    #[serde(rename = "coap:bind_failed")]
    CoapBindFailed { mtp_id: u32, message: String },

    // --- Subscription engine ---
    #[serde(rename = "subscription:created")]
    SubscriptionCreated { subscription_id: String, controller: EndpointId },
    #[serde(rename = "subscription:deleted")]
    SubscriptionDeleted { subscription_id: String },
    #[serde(rename = "subscription:notify_sent")]
    NotifySent { controller: EndpointId, message_id: u64, kind: String },
    #[serde(rename = "subscription:notify_acked")]
    NotifyAcked { controller: EndpointId, message_id: u64 },
    #[serde(rename = "subscription:notify_retry_scheduled")]
    NotifyRetryScheduled { controller: EndpointId, message_id: u64, attempt: u32 },
    #[serde(rename = "subscription:notify_expired")]
    NotifyExpired { controller: EndpointId, message_id: u64 },
    #[serde(rename = "subscription:operation_completed")]
    OperationCompleted { command_key: String, success: bool },

    /// Forward-compatibility catch-all: events this build doesn't recognize
    /// are preserved verbatim across WAL replay instead of failing to parse.
    #[serde(other, skip_serializing)]
    Custom,

    /// Graceful shutdown marker. Appended to the WAL so a crash-recovery
    /// replay can tell a clean shutdown from a crash, but it carries no
    /// state mutation — `MaterializedState::apply_event` and the daemon's
    /// replay loop both skip it.
    #[serde(rename = "control:shutdown")]
    Shutdown,
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
