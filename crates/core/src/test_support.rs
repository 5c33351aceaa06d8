// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::endpoint::EndpointId;
use crate::Event;

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for core data-model types.
pub mod strategies {
    use crate::path::parse;
    use crate::value::{ParamType, ParamValue};
    use proptest::prelude::*;

    pub fn arb_param_type() -> impl Strategy<Value = ParamType> {
        prop_oneof![
            Just(ParamType::String),
            Just(ParamType::Int),
            Just(ParamType::UnsignedInt),
            Just(ParamType::Boolean),
        ]
    }

    /// A value and a textual form known to parse back to it under its type.
    pub fn arb_param_value() -> impl Strategy<Value = ParamValue> {
        prop_oneof![
            "[a-zA-Z0-9_]{0,32}".prop_map(ParamValue::String),
            any::<i64>().prop_map(ParamValue::Int),
            any::<u64>().prop_map(ParamValue::UnsignedInt),
            any::<bool>().prop_map(ParamValue::Boolean),
        ]
    }

    /// A segment name drawn from a small alphabet, safe to join into a path.
    pub fn arb_segment_name() -> impl Strategy<Value = String> {
        "[A-Z][a-zA-Z0-9]{0,15}".prop_filter("must parse as a name segment", |s| {
            parse(s).is_ok()
        })
    }
}

// ── Event factory functions ─────────────────────────────────────────────────

pub fn param_set_event(path: &str, value: &str) -> Event {
    Event::ParamValueSet { path: path.to_string(), value: value.to_string() }
}

pub fn object_added_event(table_path: &str, instance: u32) -> Event {
    Event::ObjectAdded { table_path: table_path.to_string(), instance }
}

pub fn object_deleted_event(table_path: &str, instance: u32) -> Event {
    Event::ObjectDeleted { table_path: table_path.to_string(), instance }
}

pub fn txn_committed_event(txn_id: &str, edit_count: usize) -> Event {
    Event::TransactionCommitted { txn_id: txn_id.to_string(), edit_count }
}

pub fn controller_registered_event(endpoint_id: &str, trust_role: &str) -> Event {
    Event::ControllerRegistered {
        endpoint_id: EndpointId::new(endpoint_id),
        trust_role: trust_role.to_string(),
    }
}

pub fn mtp_started_event(mtp_id: u32, protocol: &str) -> Event {
    Event::MtpStarted { mtp_id, protocol: protocol.to_string() }
}

pub fn stomp_state_changed_event(conn_id: u32, state: &str) -> Event {
    Event::StompStateChanged { conn_id, state: state.to_string() }
}

pub fn subscription_created_event(subscription_id: &str, controller: &str) -> Event {
    Event::SubscriptionCreated {
        subscription_id: subscription_id.to_string(),
        controller: EndpointId::new(controller),
    }
}

pub fn notify_sent_event(controller: &str, message_id: u64, kind: &str) -> Event {
    Event::NotifySent {
        controller: EndpointId::new(controller),
        message_id,
        kind: kind.to_string(),
    }
}
