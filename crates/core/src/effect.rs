// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effects represent side effects the DM task needs the MTP task (or the
//! event loop's own timer heap) to perform, queued across the bounded
//! `mpsc` channel that is the only contact between threads.

use crate::endpoint::EndpointId;
use crate::event::Event;
use crate::timer::TimerId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Effects that need to be executed by the runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// Emit an event into the system event bus / WAL.
    Emit { event: Event },

    // === MTP lifecycle effects ===
    /// Start (or restart) the transport instance backing an Agent MTP row.
    ///
    /// Carries the row's resolved connection parameters inline rather than
    /// a bare `mtp_id`: the MTP task deliberately holds no reference to
    /// `MaterializedState`, so this effect is the only way it can
    /// learn the host/port/credentials it needs to actually dial out.
    StartMtp { mtp_id: u32, config: MtpStartConfig },
    /// Stop the transport instance backing an Agent MTP row.
    StopMtp { mtp_id: u32 },

    // === STOMP-specific effects ===
    /// Set the dirty flag the MTP task drains each tick; idempotent across repeated calls within one tick.
    ScheduleStompReconnect { conn_id: u32 },

    // === Outbound wire effects ===
    /// Hand a pre-assembled USP Record to the MTP owning the controller's
    /// currently preferred send endpoint.
    SendUspRecord {
        controller: EndpointId,
        /// Preferred MTP row, if the caller already knows it (e.g. the MTP
        /// that originated the request being responded to).
        mtp_hint: Option<u32>,
        bytes: Vec<u8>,
    },

    // === Timer effects ===
    SetTimer {
        id: TimerId,
        #[serde(with = "duration_serde")]
        duration: Duration,
    },
    CancelTimer { id: TimerId },

    // === Instance cache effects ===
    /// Invoke a multi-instance table's refresh-instances callback and diff
    /// the result against the cache.
    RefreshInstances { table_path: String },

    // === Operate effects ===
    /// Invoke an asynchronous operation's handler in the background; its
    /// eventual result is delivered as an `OperationCompleted` event.
    InvokeOperation { command_key: String, path: String, input_args: HashMap<String, String> },
}

/// Connection parameters for one Agent MTP Table row, resolved by the DM
/// task from the data model and handed across the effect channel so the
/// MTP task never has to read a parameter itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MtpStartConfig {
    Stomp {
        host: String,
        port: u16,
        login: Option<String>,
        passcode: Option<String>,
        destination: String,
        tls: bool,
    },
    Coap {
        bind_addr: String,
        resource_path: String,
    },
}

impl MtpStartConfig {
    pub fn protocol_name(&self) -> &'static str {
        match self {
            MtpStartConfig::Stomp { .. } => "STOMP",
            MtpStartConfig::Coap { .. } => "CoAP",
        }
    }
}

/// A raw USP Record the MTP task has received and not yet decoded or
/// dispatched. Carried over its own channel rather than as an `Event`: it
/// names no state mutation of its own, only the `ParamValueSet`/etc events
/// the DM task eventually derives from handling it are WAL-appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRecord {
    pub mtp_id: u32,
    pub bytes: Vec<u8>,
}

impl Effect {
    /// Effect name for log spans.
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Emit { .. } => "emit",
            Effect::StartMtp { .. } => "start_mtp",
            Effect::StopMtp { .. } => "stop_mtp",
            Effect::ScheduleStompReconnect { .. } => "schedule_stomp_reconnect",
            Effect::SendUspRecord { .. } => "send_usp_record",
            Effect::SetTimer { .. } => "set_timer",
            Effect::CancelTimer { .. } => "cancel_timer",
            Effect::RefreshInstances { .. } => "refresh_instances",
            Effect::InvokeOperation { .. } => "invoke_operation",
        }
    }

    /// Key-value pairs for structured logging.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Effect::Emit { event } => vec![("event", event.log_summary())],
            Effect::StartMtp { mtp_id, config } => {
                vec![("mtp_id", mtp_id.to_string()), ("protocol", config.protocol_name().to_string())]
            }
            Effect::StopMtp { mtp_id } => vec![("mtp_id", mtp_id.to_string())],
            Effect::ScheduleStompReconnect { conn_id } => vec![("conn_id", conn_id.to_string())],
            Effect::SendUspRecord { controller, mtp_hint, bytes } => vec![
                ("controller", controller.to_string()),
                ("mtp_hint", mtp_hint.map(|m| m.to_string()).unwrap_or_default()),
                ("bytes", bytes.len().to_string()),
            ],
            Effect::SetTimer { id, duration } => {
                vec![("timer_id", id.to_string()), ("duration_ms", duration.as_millis().to_string())]
            }
            Effect::CancelTimer { id } => vec![("timer_id", id.to_string())],
            Effect::RefreshInstances { table_path } => vec![("table_path", table_path.clone())],
            Effect::InvokeOperation { command_key, path, .. } => {
                vec![("command_key", command_key.clone()), ("path", path.clone())]
            }
        }
    }

    /// Whether this effect is frequent enough to warrant terser logging.
    pub fn verbose(&self) -> bool {
        !matches!(self, Effect::Emit { .. } | Effect::SetTimer { .. } | Effect::CancelTimer { .. })
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
        duration.as_millis().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
#[path = "effect_tests.rs"]
mod tests;
