// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch helpers shared by every consumer of [`Event`]: a stable name for
//! log spans, a one-line human summary, and family-scoped accessors.

use super::Event;

impl Event {
    /// Stable event name for log spans and metrics, e.g. `"param_set"`.
    pub fn name(&self) -> &'static str {
        match self {
            Event::ParamValueSet { .. } => "param_set",
            Event::ObjectAdded { .. } => "object_added",
            Event::ObjectDeleted { .. } => "object_deleted",
            Event::TransactionCommitted { .. } => "txn_committed",
            Event::TransactionAborted { .. } => "txn_aborted",
            Event::InstancesRefreshed { .. } => "instances_refreshed",
            Event::FactoryReset { .. } => "factory_reset",
            Event::ControllerRegistered { .. } => "controller_registered",
            Event::ControllerRemoved { .. } => "controller_removed",
            Event::MtpStarted { .. } => "mtp_started",
            Event::MtpStopped { .. } => "mtp_stopped",
            Event::MtpStatusChanged { .. } => "mtp_status_changed",
            Event::StompStateChanged { .. } => "stomp_state_changed",
            Event::StompReconnectScheduled { .. } => "stomp_reconnect_scheduled",
            Event::StompReconnectAttempted { .. } => "stomp_reconnect_attempted",
            Event::CoapBound { .. } => "coap_bound",
            Event::CoapBindFailed { .. } => "coap_bind_failed",
            Event::SubscriptionCreated { .. } => "subscription_created",
            Event::SubscriptionDeleted { .. } => "subscription_deleted",
            Event::NotifySent { .. } => "notify_sent",
            Event::NotifyAcked { .. } => "notify_acked",
            Event::NotifyRetryScheduled { .. } => "notify_retry_scheduled",
            Event::NotifyExpired { .. } => "notify_expired",
            Event::OperationCompleted { .. } => "operation_completed",
            Event::Custom => "custom",
            Event::Shutdown => "shutdown",
        }
    }

    /// One-line human summary for log lines.
    pub fn log_summary(&self) -> String {
        match self {
            Event::ParamValueSet { path, value } => format!("{path}={value}"),
            Event::ObjectAdded { table_path, instance } => format!("{table_path}.{instance}"),
            Event::ObjectDeleted { table_path, instance } => format!("{table_path}.{instance}"),
            Event::TransactionCommitted { txn_id, edit_count } => {
                format!("txn={txn_id} edits={edit_count}")
            }
            Event::TransactionAborted { txn_id, reason } => format!("txn={txn_id} reason={reason}"),
            Event::InstancesRefreshed { table_path, added, removed } => {
                format!("{table_path} +{} -{}", added.len(), removed.len())
            }
            Event::FactoryReset { source } => format!("source={source}"),
            Event::ControllerRegistered { endpoint_id, trust_role } => {
                format!("{endpoint_id} role={trust_role}")
            }
            Event::ControllerRemoved { endpoint_id } => endpoint_id.to_string(),
            Event::MtpStarted { mtp_id, protocol } => format!("mtp={mtp_id} proto={protocol}"),
            Event::MtpStopped { mtp_id } => format!("mtp={mtp_id}"),
            Event::MtpStatusChanged { mtp_id, status } => format!("mtp={mtp_id} status={status}"),
            Event::StompStateChanged { conn_id, state } => format!("conn={conn_id} state={state}"),
            Event::StompReconnectScheduled { conn_id } => format!("conn={conn_id}"),
            Event::StompReconnectAttempted { conn_id } => format!("conn={conn_id}"),
            Event::CoapBound { mtp_id, port } => format!("mtp={mtp_id} port={port}"),
            Event::CoapBindFailed { mtp_id, message } => format!("mtp={mtp_id} err={message}"),
            Event::SubscriptionCreated { subscription_id, controller } => {
                format!("sub={subscription_id} ctrl={controller}")
            }
            Event::SubscriptionDeleted { subscription_id } => format!("sub={subscription_id}"),
            Event::NotifySent { controller, message_id, kind } => {
                format!("ctrl={controller} id={message_id} kind={kind}")
            }
            Event::NotifyAcked { controller, message_id } => {
                format!("ctrl={controller} id={message_id}")
            }
            Event::NotifyRetryScheduled { controller, message_id, attempt } => {
                format!("ctrl={controller} id={message_id} attempt={attempt}")
            }
            Event::NotifyExpired { controller, message_id } => {
                format!("ctrl={controller} id={message_id}")
            }
            Event::OperationCompleted { command_key, success } => {
                format!("cmd={command_key} success={success}")
            }
            Event::Custom => "unrecognized".to_string(),
            Event::Shutdown => String::new(),
        }
    }

    /// The controller this event is scoped to, if any — used to route
    /// per-controller monotonic message-id bookkeeping.
    pub fn controller(&self) -> Option<&crate::endpoint::EndpointId> {
        match self {
            Event::ControllerRegistered { endpoint_id, .. }
            | Event::ControllerRemoved { endpoint_id } => Some(endpoint_id),
            Event::SubscriptionCreated { controller, .. }
            | Event::NotifySent { controller, .. }
            | Event::NotifyAcked { controller, .. }
            | Event::NotifyRetryScheduled { controller, .. }
            | Event::NotifyExpired { controller, .. } => Some(controller),
            _ => None,
        }
    }

    /// Whether this event represents a durable data-model mutation that must
    /// be WAL-appended before being considered committed (as opposed to
    /// purely transient transport/subscription bookkeeping).
    pub fn is_durable_mutation(&self) -> bool {
        matches!(
            self,
            Event::ParamValueSet { .. }
                | Event::ObjectAdded { .. }
                | Event::ObjectDeleted { .. }
                | Event::ControllerRegistered { .. }
                | Event::ControllerRemoved { .. }
                | Event::MtpStarted { .. }
                | Event::MtpStopped { .. }
                | Event::SubscriptionCreated { .. }
                | Event::SubscriptionDeleted { .. }
        )
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
