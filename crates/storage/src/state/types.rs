// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use uspa_core::EndpointId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerRecord {
    pub endpoint_id: EndpointId,
    pub trust_role: String,
    pub registered_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MtpRecord {
    pub mtp_id: u32,
    pub protocol: String,
    pub status: String,
    pub started_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StompConnectionRecord {
    pub conn_id: u32,
    pub state: String,
    pub updated_at_ms: u64,
    /// Number of consecutive reconnect attempts since the connection last
    /// reached `RUNNING`; drives the debounced-reconnect backoff.
    pub reconnect_attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoapListenerRecord {
    pub mtp_id: u32,
    pub port: Option<u16>,
    pub bound: bool,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub subscription_id: String,
    pub controller: EndpointId,
    pub created_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PendingNotifyState {
    Sent,
    RetryScheduled,
    Expired,
}

/// An outstanding Notify awaiting acknowledgement, keyed by
/// `(controller, message_id)` in [`super::MaterializedState::pending_notifies`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingNotify {
    pub controller: EndpointId,
    pub message_id: u64,
    pub kind: String,
    pub attempt: u32,
    pub state: PendingNotifyState,
}
