// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use uspa_core::Event;

#[test]
fn apply_event_routes_param_set_to_datamodel() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::ParamValueSet { path: "Device.X".into(), value: "1".into() });
    assert_eq!(state.param("Device.X"), Some("1"));
}

#[test]
fn apply_event_ignores_control_events() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::Shutdown);
    state.apply_event(&Event::Custom);
    assert_eq!(state, MaterializedState::default());
}

#[test]
fn applying_the_same_event_twice_is_idempotent() {
    let mut state = MaterializedState::default();
    let event = Event::MtpStarted { mtp_id: 1, protocol: "STOMP".into() };
    state.apply_event(&event);
    let after_first = state.clone();
    state.apply_event(&event);
    assert_eq!(state.mtps, after_first.mtps);
}

#[test]
fn instances_of_empty_table_is_empty_slice() {
    let state = MaterializedState::default();
    assert!(state.instances_of("Device.LocalAgent.MTP.").is_empty());
}
