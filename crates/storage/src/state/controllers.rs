// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Controller table event handlers.

use uspa_core::Event;

use super::helpers::epoch_ms_now;
use super::types::ControllerRecord;
use super::MaterializedState;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::ControllerRegistered { endpoint_id, trust_role } => {
            state.controllers.entry(endpoint_id.to_string()).or_insert_with(|| ControllerRecord {
                endpoint_id: endpoint_id.clone(),
                trust_role: trust_role.clone(),
                registered_at_ms: epoch_ms_now(),
            });
        }

        Event::ControllerRemoved { endpoint_id } => {
            state.controllers.remove(endpoint_id.as_str());
            state.notify_counters.remove(endpoint_id.as_str());
            state.pending_notifies.retain(|_, n| n.controller != *endpoint_id);
        }

        _ => {}
    }
}

#[cfg(test)]
#[path = "controllers_tests.rs"]
mod tests;
