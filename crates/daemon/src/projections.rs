// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Companion parameter-value projections the DM task derives from other
//! events before applying them.
//!
//! `uspa-engine::dispatch::group_by_object` — the one code path `Get`
//! reads through — only ever looks at `MaterializedState::params`; it does
//! not consult the Agent MTP Table, the STOMP connection records, or a
//! `ParamDef`'s instance count. Rather than teach `Get` about every one of
//! those secondary views, the DM task mirrors them into `state.params` as
//! an ordinary `Event::ParamValueSet` the moment the event that changes
//! them is applied, so reads stay on the one uniform path every other
//! parameter already takes.

use uspa_core::Event;
use uspa_engine::AgentMtpTable;
use uspa_storage::MaterializedState;

/// Given an event just applied to `state`, return the companion
/// `ParamValueSet` (if any) that keeps a derived parameter in sync. Must be
/// called with `state` already reflecting `event` — the MTP/STOMP status
/// mirrors are recomputed from the post-apply row, not from the event's own
/// fields, so a row with multiple transports reports correctly even when
/// only one of them just changed.
pub fn mirror_for(state: &MaterializedState, event: &Event) -> Option<Event> {
    match event {
        Event::MtpStarted { mtp_id, .. }
        | Event::MtpStatusChanged { mtp_id, .. }
        | Event::CoapBound { mtp_id, .. }
        | Event::CoapBindFailed { mtp_id, .. } => Some(mtp_status_event(state, *mtp_id)),

        Event::StompStateChanged { conn_id, .. } => Some(mtp_status_event(state, *conn_id)),

        // The row no longer exists once stopped; no post-apply state to
        // derive from, so report Down directly.
        Event::MtpStopped { mtp_id } => {
            Some(Event::ParamValueSet { path: status_path(*mtp_id), value: "Down".to_string() })
        }

        Event::ObjectAdded { table_path, .. }
        | Event::ObjectDeleted { table_path, .. }
        | Event::InstancesRefreshed { table_path, .. } => Some(number_of_entries_event(state, table_path)),

        _ => None,
    }
}

fn mtp_status_event(state: &MaterializedState, mtp_id: u32) -> Event {
    let up = AgentMtpTable::row(state, mtp_id).map(|row| row.is_up()).unwrap_or(false);
    Event::ParamValueSet { path: status_path(mtp_id), value: if up { "Up" } else { "Down" }.to_string() }
}

fn status_path(mtp_id: u32) -> String {
    format!("Device.LocalAgent.MTP.{mtp_id}.Status")
}

fn number_of_entries_path(table_path: &str) -> String {
    let trimmed = table_path.trim_end_matches('.').trim_end_matches("{i}").trim_end_matches('.');
    format!("{trimmed}NumberOfEntries")
}

fn number_of_entries_event(state: &MaterializedState, table_path: &str) -> Event {
    let count = state.instances_of(table_path).len();
    Event::ParamValueSet { path: number_of_entries_path(table_path), value: count.to_string() }
}

#[cfg(test)]
#[path = "projections_tests.rs"]
mod tests;
