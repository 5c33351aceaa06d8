// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timer identifier type for the event loop's min-heap of scheduled wakeups
//!: poll ticks, connect timeouts, retry deadlines, and
//! async-operation start times.
//!
//! Unlike the random, fixed-length IDs generated by [`crate::define_id!`],
//! timer IDs are composite keys built from other entities' identifiers and
//! routinely exceed a fixed small capacity (e.g. `notify-retry:<endpoint>:<id>`),
//! so `TimerId` is a plain string newtype rather than an `IdBuf`.

use crate::endpoint::EndpointId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(String);

impl TimerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn value_change_poll() -> Self {
        TimerKind::ValueChangePoll.to_timer_id()
    }

    pub fn stomp_connect_timeout(conn_id: u32) -> Self {
        TimerKind::StompConnectTimeout { conn_id }.to_timer_id()
    }

    pub fn stomp_retry(conn_id: u32) -> Self {
        TimerKind::StompRetry { conn_id }.to_timer_id()
    }

    pub fn coap_bind_retry(mtp_id: u32) -> Self {
        TimerKind::CoapBindRetry { mtp_id }.to_timer_id()
    }

    pub fn notify_retry(controller: &EndpointId, message_id: u64) -> Self {
        TimerKind::NotifyRetry { controller: controller.clone(), message_id }.to_timer_id()
    }

    pub fn operation_start(command_key: &str) -> Self {
        TimerKind::OperationStart { command_key: command_key.to_string() }.to_timer_id()
    }

    pub fn kind(&self) -> Option<TimerKind> {
        TimerKind::parse(&self.0)
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parsed representation of a timer ID for type-safe routing by the event
/// loop's dispatch table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerKind {
    /// `VALUE_CHANGE_POLL_PERIOD` tick.
    ValueChangePoll,
    /// `STOMP_CONNECT_TIMEOUT` deadline for a connection attempt.
    StompConnectTimeout { conn_id: u32 },
    /// Backoff-computed reconnect deadline for a STOMP connection.
    StompRetry { conn_id: u32 },
    /// Backoff-computed rebind deadline for a CoAP listener.
    CoapBindRetry { mtp_id: u32 },
    /// Backoff-computed redelivery deadline for an unacknowledged Notify.
    NotifyRetry { controller: EndpointId, message_id: u64 },
    /// Deadline by which an async Operate must report completion or be
    /// considered timed out.
    OperationStart { command_key: String },
}

impl TimerKind {
    pub fn parse(id: &str) -> Option<TimerKind> {
        if id == "value-change-poll" {
            return Some(TimerKind::ValueChangePoll);
        }
        if let Some(rest) = id.strip_prefix("stomp-connect-timeout:") {
            return Some(TimerKind::StompConnectTimeout { conn_id: rest.parse().ok()? });
        }
        if let Some(rest) = id.strip_prefix("stomp-retry:") {
            return Some(TimerKind::StompRetry { conn_id: rest.parse().ok()? });
        }
        if let Some(rest) = id.strip_prefix("coap-bind-retry:") {
            return Some(TimerKind::CoapBindRetry { mtp_id: rest.parse().ok()? });
        }
        if let Some(rest) = id.strip_prefix("notify-retry:") {
            let (controller, message_id) = rest.rsplit_once(':')?;
            return Some(TimerKind::NotifyRetry {
                controller: EndpointId::new(controller),
                message_id: message_id.parse().ok()?,
            });
        }
        if let Some(rest) = id.strip_prefix("operation-start:") {
            return Some(TimerKind::OperationStart { command_key: rest.to_string() });
        }
        None
    }

    pub fn to_timer_id(&self) -> TimerId {
        match self {
            TimerKind::ValueChangePoll => TimerId("value-change-poll".to_string()),
            TimerKind::StompConnectTimeout { conn_id } => {
                TimerId(format!("stomp-connect-timeout:{conn_id}"))
            }
            TimerKind::StompRetry { conn_id } => TimerId(format!("stomp-retry:{conn_id}")),
            TimerKind::CoapBindRetry { mtp_id } => TimerId(format!("coap-bind-retry:{mtp_id}")),
            TimerKind::NotifyRetry { controller, message_id } => {
                TimerId(format!("notify-retry:{controller}:{message_id}"))
            }
            TimerKind::OperationStart { command_key } => {
                TimerId(format!("operation-start:{command_key}"))
            }
        }
    }
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
