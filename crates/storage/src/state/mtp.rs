// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent MTP table and transport state-machine event handlers (spec
//! "Agent MTP Table", STOMP/CoAP MTPs).

use uspa_core::Event;

use super::helpers::epoch_ms_now;
use super::types::{CoapListenerRecord, MtpRecord, StompConnectionRecord};
use super::MaterializedState;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::MtpStarted { mtp_id, protocol } => {
            state.mtps.insert(
                *mtp_id,
                MtpRecord {
                    mtp_id: *mtp_id,
                    protocol: protocol.clone(),
                    status: "Up".to_string(),
                    started_at_ms: epoch_ms_now(),
                },
            );
        }

        Event::MtpStopped { mtp_id } => {
            state.mtps.remove(mtp_id);
            state.stomp_connections.remove(mtp_id);
            state.coap_listeners.remove(mtp_id);
        }

        Event::MtpStatusChanged { mtp_id, status } => {
            if let Some(mtp) = state.mtps.get_mut(mtp_id) {
                mtp.status = status.clone();
            }
        }

        Event::StompStateChanged { conn_id, state: conn_state } => {
            let record = state.stomp_connections.entry(*conn_id).or_insert_with(|| {
                StompConnectionRecord {
                    conn_id: *conn_id,
                    state: conn_state.clone(),
                    updated_at_ms: epoch_ms_now(),
                    reconnect_attempts: 0,
                }
            });
            record.state = conn_state.clone();
            record.updated_at_ms = epoch_ms_now();
            if conn_state == "RUNNING" {
                record.reconnect_attempts = 0;
            }
        }

        Event::StompReconnectScheduled { .. } => {
            // The dirty-flag bookkeeping this models lives on the MTP task's in-memory
            // connection handle, not in durable state.
        }

        Event::StompReconnectAttempted { conn_id } => {
            if let Some(record) = state.stomp_connections.get_mut(conn_id) {
                record.reconnect_attempts += 1;
            }
        }

        Event::CoapBound { mtp_id, port } => {
            state.coap_listeners.insert(
                *mtp_id,
                CoapListenerRecord { mtp_id: *mtp_id, port: Some(*port), bound: true, last_error: None },
            );
        }

        Event::CoapBindFailed { mtp_id, message } => {
            let record = state.coap_listeners.entry(*mtp_id).or_insert_with(|| CoapListenerRecord {
                mtp_id: *mtp_id,
                port: None,
                bound: false,
                last_error: None,
            });
            record.bound = false;
            record.last_error = Some(message.clone());
        }

        _ => {}
    }
}

#[cfg(test)]
#[path = "mtp_tests.rs"]
mod tests;
