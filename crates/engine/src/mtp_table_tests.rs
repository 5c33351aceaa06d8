// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use uspa_storage::state::{CoapListenerRecord, MtpRecord, StompConnectionRecord};

fn state_with_row(mtp_id: u32, stomp: Option<&str>, coap_bound: Option<bool>) -> MaterializedState {
    let mut state = MaterializedState::default();
    state.mtps.insert(
        mtp_id,
        MtpRecord { mtp_id, protocol: "mixed".to_string(), status: "Up".to_string(), started_at_ms: 0 },
    );
    if let Some(conn_state) = stomp {
        state.stomp_connections.insert(
            mtp_id,
            StompConnectionRecord { conn_id: mtp_id, state: conn_state.to_string(), updated_at_ms: 0, reconnect_attempts: 0 },
        );
    }
    if let Some(bound) = coap_bound {
        state
            .coap_listeners
            .insert(mtp_id, CoapListenerRecord { mtp_id, port: Some(5683), bound, last_error: None });
    }
    state
}

#[test]
fn a_row_with_both_transports_bound_reports_kind_both() {
    let state = state_with_row(1, Some("RUNNING"), Some(true));
    let row = AgentMtpTable::row(&state, 1).expect("row");
    assert_eq!(row.kind(), Some(MtpKind::Both));
    assert!(row.is_up());
}

#[test]
fn a_row_with_only_stomp_is_down_while_stomp_is_reconnecting() {
    let state = state_with_row(1, Some("RETRY_WAIT"), None);
    let row = AgentMtpTable::row(&state, 1).expect("row");
    assert_eq!(row.kind(), Some(MtpKind::Stomp));
    assert!(!row.is_up());
}

#[test]
fn a_row_with_both_transports_is_down_if_either_is_down() {
    let state = state_with_row(1, Some("RUNNING"), Some(false));
    let row = AgentMtpTable::row(&state, 1).expect("row");
    assert!(!row.is_up());
}

#[test]
fn preferred_picks_the_lowest_id_among_rows_that_are_up() {
    let mut state = state_with_row(2, Some("RUNNING"), None);
    state.mtps.insert(1, MtpRecord { mtp_id: 1, protocol: "STOMP".to_string(), status: "Down".to_string(), started_at_ms: 0 });
    state.stomp_connections.insert(1, StompConnectionRecord { conn_id: 1, state: "RETRY_WAIT".to_string(), updated_at_ms: 0, reconnect_attempts: 3 });

    let preferred = AgentMtpTable::preferred_for(&state, None);
    assert_eq!(preferred, Some(2));
}

#[test]
fn an_unknown_mtp_id_has_no_row() {
    let state = MaterializedState::default();
    assert!(AgentMtpTable::row(&state, 99).is_none());
}

fn set(state: &mut MaterializedState, path: &str, value: &str) {
    state.params.insert(path.to_string(), value.to_string());
}

#[test]
fn resolves_a_stomp_row_s_config_from_its_referenced_connection() {
    let mut state = MaterializedState::default();
    set(&mut state, "Device.LocalAgent.MTP.1.Protocol", "STOMP");
    set(&mut state, "Device.LocalAgent.MTP.1.STOMP.Reference", "Device.STOMP.Connection.1.");
    set(&mut state, "Device.LocalAgent.MTP.1.STOMP.Destination", "agent-queue-1");
    set(&mut state, "Device.STOMP.Connection.1.Host", "broker.example");
    set(&mut state, "Device.STOMP.Connection.1.Port", "61613");
    set(&mut state, "Device.STOMP.Connection.1.Username", "agent");
    set(&mut state, "Device.STOMP.Connection.1.Password", &uspa_storage::db::obfuscate("hunter2"));
    set(&mut state, "Device.STOMP.Connection.1.VirtualHost", "/");

    let config = AgentMtpTable::start_config(&state, 1).expect("config");
    assert_eq!(
        config,
        uspa_core::MtpStartConfig::Stomp {
            host: "broker.example".to_string(),
            port: 61613,
            login: Some("agent".to_string()),
            passcode: Some("hunter2".to_string()),
            destination: "agent-queue-1".to_string(),
            tls: false,
        }
    );
}

#[test]
fn resolves_a_coap_row_s_config_from_its_own_parameters() {
    let mut state = MaterializedState::default();
    set(&mut state, "Device.LocalAgent.MTP.2.Protocol", "CoAP");
    set(&mut state, "Device.LocalAgent.MTP.2.CoAP.Port", "5683");
    set(&mut state, "Device.LocalAgent.MTP.2.CoAP.Path", "/usp");

    let config = AgentMtpTable::start_config(&state, 2).expect("config");
    assert_eq!(
        config,
        uspa_core::MtpStartConfig::Coap { bind_addr: "0.0.0.0:5683".to_string(), resource_path: "/usp".to_string() }
    );
}

#[test]
fn a_row_with_no_protocol_set_has_no_start_config() {
    let state = MaterializedState::default();
    assert!(AgentMtpTable::start_config(&state, 9).is_none());
}

#[test]
fn a_stomp_row_whose_referenced_connection_is_missing_has_no_start_config() {
    let mut state = MaterializedState::default();
    set(&mut state, "Device.LocalAgent.MTP.3.Protocol", "STOMP");
    set(&mut state, "Device.LocalAgent.MTP.3.STOMP.Reference", "Device.STOMP.Connection.9.");
    assert!(AgentMtpTable::start_config(&state, 3).is_none());
}
