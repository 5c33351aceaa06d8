// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use uspa_core::{EndpointId, Event};

#[test]
fn register_is_idempotent_and_keeps_first_role() {
    let mut state = MaterializedState::default();
    let ep = EndpointId::new("os::00D2E5-RTR-001");
    apply(&mut state, &Event::ControllerRegistered { endpoint_id: ep.clone(), trust_role: "admin".into() });
    apply(&mut state, &Event::ControllerRegistered { endpoint_id: ep.clone(), trust_role: "viewer".into() });
    assert_eq!(state.controllers.get(ep.as_str()).unwrap().trust_role, "admin");
}

#[test]
fn removed_controller_clears_notify_bookkeeping() {
    let mut state = MaterializedState::default();
    let ep = EndpointId::new("os::00D2E5-RTR-001");
    apply(&mut state, &Event::ControllerRegistered { endpoint_id: ep.clone(), trust_role: "admin".into() });
    state.notify_counters.insert(ep.to_string(), 5);
    apply(&mut state, &Event::ControllerRemoved { endpoint_id: ep.clone() });
    assert!(state.controllers.is_empty());
    assert!(state.notify_counters.is_empty());
}
