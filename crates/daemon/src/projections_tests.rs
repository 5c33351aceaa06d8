// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn mtp_started_mirrors_up_status() {
    let mut state = MaterializedState::default();
    let event = Event::MtpStarted { mtp_id: 1, protocol: "STOMP".to_string() };
    state.apply_event(&event);

    let mirror = mirror_for(&state, &event).expect("status mirror");
    assert_eq!(mirror, Event::ParamValueSet { path: "Device.LocalAgent.MTP.1.Status".to_string(), value: "Up".to_string() });
}

#[test]
fn a_stomp_connection_not_yet_running_reports_the_row_down() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::MtpStarted { mtp_id: 2, protocol: "STOMP".to_string() });
    let event = Event::StompStateChanged { conn_id: 2, state: "CONNECTING".to_string() };
    state.apply_event(&event);

    let mirror = mirror_for(&state, &event).expect("status mirror");
    assert_eq!(mirror, Event::ParamValueSet { path: "Device.LocalAgent.MTP.2.Status".to_string(), value: "Down".to_string() });
}

#[test]
fn a_running_stomp_connection_reports_the_row_up() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::MtpStarted { mtp_id: 3, protocol: "STOMP".to_string() });
    let event = Event::StompStateChanged { conn_id: 3, state: "RUNNING".to_string() };
    state.apply_event(&event);

    let mirror = mirror_for(&state, &event).expect("status mirror");
    assert_eq!(mirror, Event::ParamValueSet { path: "Device.LocalAgent.MTP.3.Status".to_string(), value: "Up".to_string() });
}

#[test]
fn mtp_stopped_reports_down_without_consulting_the_removed_row() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::MtpStarted { mtp_id: 4, protocol: "STOMP".to_string() });
    let event = Event::MtpStopped { mtp_id: 4 };
    state.apply_event(&event);

    let mirror = mirror_for(&state, &event).expect("status mirror");
    assert_eq!(mirror, Event::ParamValueSet { path: "Device.LocalAgent.MTP.4.Status".to_string(), value: "Down".to_string() });
}

#[test]
fn object_added_mirrors_the_new_instance_count() {
    let mut state = MaterializedState::default();
    let event = Event::ObjectAdded { table_path: "Device.LocalAgent.MTP.".to_string(), instance: 1 };
    state.apply_event(&event);

    let mirror = mirror_for(&state, &event).expect("count mirror");
    assert_eq!(
        mirror,
        Event::ParamValueSet { path: "Device.LocalAgent.MTPNumberOfEntries".to_string(), value: "1".to_string() }
    );
}

#[test]
fn unrelated_events_have_no_mirror() {
    let state = MaterializedState::default();
    let event = Event::ControllerRemoved { endpoint_id: uspa_core::EndpointId::new("self::ctrl-1") };
    assert!(mirror_for(&state, &event).is_none());
}
