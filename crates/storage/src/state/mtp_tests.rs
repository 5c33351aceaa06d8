// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use uspa_core::Event;

#[test]
fn mtp_started_then_stopped_clears_transport_records() {
    let mut state = MaterializedState::default();
    apply(&mut state, &Event::MtpStarted { mtp_id: 1, protocol: "STOMP".into() });
    apply(&mut state, &Event::StompStateChanged { conn_id: 1, state: "RUNNING".into() });
    assert!(state.mtps.contains_key(&1));
    assert!(state.stomp_connections.contains_key(&1));

    apply(&mut state, &Event::MtpStopped { mtp_id: 1 });
    assert!(state.mtps.is_empty());
    assert!(state.stomp_connections.is_empty());
}

#[test]
fn stomp_reconnect_attempt_increments_count_and_resets_on_running() {
    let mut state = MaterializedState::default();
    apply(&mut state, &Event::StompStateChanged { conn_id: 1, state: "RETRY_WAIT".into() });
    apply(&mut state, &Event::StompReconnectAttempted { conn_id: 1 });
    apply(&mut state, &Event::StompReconnectAttempted { conn_id: 1 });
    assert_eq!(state.stomp_connections.get(&1).unwrap().reconnect_attempts, 2);

    apply(&mut state, &Event::StompStateChanged { conn_id: 1, state: "RUNNING".into() });
    assert_eq!(state.stomp_connections.get(&1).unwrap().reconnect_attempts, 0);
}

#[test]
fn coap_bind_failure_then_success_clears_last_error() {
    let mut state = MaterializedState::default();
    apply(&mut state, &Event::CoapBindFailed { mtp_id: 2, message: "address in use".into() });
    assert!(!state.coap_listeners.get(&2).unwrap().bound);

    apply(&mut state, &Event::CoapBound { mtp_id: 2, port: 5683 });
    let record = state.coap_listeners.get(&2).unwrap();
    assert!(record.bound);
    assert_eq!(record.port, Some(5683));
    assert!(record.last_error.is_none());
}
