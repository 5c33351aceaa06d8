// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use uspa_storage::state::ControllerRecord;

fn endpoint(id: &str) -> EndpointId {
    EndpointId::new(id)
}

#[test]
fn registering_with_an_unknown_role_is_rejected() {
    let table = ControllerTable::new();
    let err = table.register(endpoint("self::ctrl-1"), "Nonexistent-Role").unwrap_err();
    assert!(matches!(err, UspError::InvalidValue(_)));
}

#[test]
fn registering_with_a_built_in_role_succeeds() {
    let table = ControllerTable::new();
    let event = table.register(endpoint("self::ctrl-1"), "Full-Access").expect("register");
    assert!(matches!(event, Event::ControllerRegistered { trust_role, .. } if trust_role == "Full-Access"));
}

#[test]
fn removing_an_unregistered_controller_fails() {
    let table = ControllerTable::new();
    let state = MaterializedState::default();
    assert!(table.remove(&state, &endpoint("self::ctrl-1")).is_err());
}

#[test]
fn removing_a_registered_controller_succeeds() {
    let table = ControllerTable::new();
    let mut state = MaterializedState::default();
    state.controllers.insert(
        "self::ctrl-1".to_string(),
        ControllerRecord { endpoint_id: endpoint("self::ctrl-1"), trust_role: "Full-Access".to_string(), registered_at_ms: 0 },
    );
    assert!(table.remove(&state, &endpoint("self::ctrl-1")).is_ok());
}

#[test]
fn full_access_role_grants_every_permission() {
    let table = ControllerTable::new();
    let mut state = MaterializedState::default();
    state.controllers.insert(
        "self::ctrl-1".to_string(),
        ControllerRecord { endpoint_id: endpoint("self::ctrl-1"), trust_role: "Full-Access".to_string(), registered_at_ms: 0 },
    );
    assert!(table.allows(&state, &endpoint("self::ctrl-1"), Permission::Delete));
}

#[test]
fn an_unregistered_controller_is_denied_every_permission() {
    let table = ControllerTable::new();
    let state = MaterializedState::default();
    assert!(!table.allows(&state, &endpoint("self::ghost"), Permission::Read));
}

#[test]
fn a_custom_role_grants_only_what_it_lists() {
    let mut table = ControllerTable::new();
    table.register_role(TrustRole::new("Read-Only", vec![Permission::Read]));
    let mut state = MaterializedState::default();
    state.controllers.insert(
        "self::ctrl-2".to_string(),
        ControllerRecord { endpoint_id: endpoint("self::ctrl-2"), trust_role: "Read-Only".to_string(), registered_at_ms: 0 },
    );
    assert!(table.allows(&state, &endpoint("self::ctrl-2"), Permission::Read));
    assert!(!table.allows(&state, &endpoint("self::ctrl-2"), Permission::Write));
}
