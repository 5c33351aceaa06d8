// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notify dispatch: turns live `Device.LocalAgent.Subscription`
//! rows into outbound Notify messages. `ValueChange` is driven off the same
//! poll tick `DmRuntime::on_poll_tick` already runs for vendor-computed
//! parameters and instance refresh; `ObjectCreation`/`ObjectDeletion` fire
//! synchronously right after the `ObjectAdded`/`ObjectDeleted` event that
//! triggers them commits (see `DmRuntime::apply_and_log`).
//!
//! Resolving a subscription's `ReferenceList` against live state is the Path
//! Resolver's job (`uspa_engine::resolver`), same as a wildcarded `Get` —
//! this module only decides which rows are due and builds the wire message.

use std::collections::HashMap;
use std::time::Instant;

use tracing::warn;

use uspa_core::{path, Effect, EndpointId, Event};
use uspa_engine::{resolve, SubscriptionEngine};
use uspa_storage::MaterializedState;
use uspa_wire::message::{MsgType, Notify as WireNotify, ReqType};
use uspa_wire::{Msg, Record};

fn subscription_id(instance: u32) -> String {
    format!("Device.LocalAgent.Subscription.{instance}")
}

struct SubscriptionRow {
    instance: u32,
    enable: bool,
    recipient: EndpointId,
    notif_type: String,
    reference_list: Vec<String>,
}

fn read_row(state: &MaterializedState, instance: u32) -> Option<SubscriptionRow> {
    let prefix = format!("Device.LocalAgent.Subscription.{instance}.");
    let recipient = state.param(&format!("{prefix}Recipient"))?.to_string();
    let notif_type = state.param(&format!("{prefix}NotifType"))?.to_string();
    let enable = state.param(&format!("{prefix}Enable")) == Some("true");
    let reference_list = state
        .param(&format!("{prefix}ReferenceList"))
        .unwrap_or_default()
        .split_whitespace()
        .map(String::from)
        .collect();
    Some(SubscriptionRow { instance, enable, recipient: EndpointId::new(recipient), notif_type, reference_list })
}

fn live_rows(state: &MaterializedState) -> Vec<SubscriptionRow> {
    state.instances_of("Device.LocalAgent.Subscription.").iter().filter_map(|&i| read_row(state, i)).collect()
}

/// Resolve every path expression in `exprs` against `state`, ignoring
/// expressions that fail to parse — a malformed `ReferenceList` entry
/// shouldn't take the whole subscription's poll down with it.
fn resolve_paths(state: &MaterializedState, exprs: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    for expr in exprs {
        match path::parse(expr) {
            Ok(parsed) => match resolve(&parsed, state) {
                Ok(mut paths) => out.append(&mut paths),
                Err(err) => warn!(expr, error = %err, "failed to resolve subscription reference"),
            },
            Err(err) => warn!(expr, error = %err, "failed to parse subscription reference"),
        }
    }
    out
}

/// Whether `table_path` (e.g. `Device.LocalAgent.MTP.`) is named by an
/// `ObjectCreation`/`ObjectDeletion` subscription's `ReferenceList` entry.
/// TR-369 ObjectCreation/ObjectDeletion subscriptions reference the table
/// itself rather than a wildcarded instance path, so exact comparison (after
/// trimming the trailing dot both carry) is sufficient.
fn names_table(reference: &str, table_path: &str) -> bool {
    reference.trim_end_matches('.') == table_path.trim_end_matches('.')
}

/// Per-subscription ValueChange snapshots plus the logic that turns a due
/// row into `Event`/`Effect` pairs. Owned by `DmRuntime`, which is also
/// responsible for persisting the events this produces and forwarding the
/// effects — this type itself never touches the WAL or the effect channel.
#[derive(Default)]
pub struct NotifyDispatch {
    value_watches: HashMap<u32, uspa_engine::subscriptions::ValueChangeWatch>,
}

impl NotifyDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// A subscription row was deleted; drop its ValueChange snapshot so a
    /// later row reusing the same instance number starts from a clean slate.
    pub fn forget(&mut self, instance: u32) {
        self.value_watches.remove(&instance);
    }

    /// Poll every enabled `ValueChange` subscription's resolved reference
    /// paths and build a Notify for each path whose value changed since the
    /// last tick.
    pub fn poll_value_change(
        &mut self,
        state: &MaterializedState,
        subs: &mut SubscriptionEngine,
        now: Instant,
    ) -> (Vec<Event>, Vec<Effect>) {
        let mut events = Vec::new();
        let mut effects = Vec::new();
        for sub in live_rows(state) {
            if !sub.enable || sub.notif_type != "ValueChange" {
                continue;
            }
            let watched = resolve_paths(state, &sub.reference_list);
            let watch = self.value_watches.entry(sub.instance).or_default();
            for (path, value) in watch.poll(state, &watched) {
                let mut params = HashMap::new();
                params.insert("param".to_string(), path.clone());
                params.insert("value".to_string(), value);
                build_and_send(&sub, "ValueChange", path, params, state, subs, now, &mut events, &mut effects);
            }
        }
        (events, effects)
    }

    /// Fire every enabled `OperationComplete` subscription whose
    /// `ReferenceList` names `command_path` (the operation's own path
    /// template, e.g. `Device.LocalAgent.Reboot()`). Called once an async
    /// Operate handler finishes and its `OperationCompleted` event has been
    /// applied.
    pub fn on_operation_completed(
        &mut self,
        state: &MaterializedState,
        subs: &mut SubscriptionEngine,
        now: Instant,
        command_key: &str,
        command_path: &str,
        success: bool,
    ) -> (Vec<Event>, Vec<Effect>) {
        let mut events = Vec::new();
        let mut effects = Vec::new();
        for sub in live_rows(state) {
            if !sub.enable || sub.notif_type != "OperationComplete" {
                continue;
            }
            if !sub.reference_list.iter().any(|r| names_table(r, command_path)) {
                continue;
            }
            let mut params = HashMap::new();
            params.insert("command_key".to_string(), command_key.to_string());
            params.insert("status".to_string(), if success { "Success".to_string() } else { "Failure".to_string() });
            build_and_send(
                &sub,
                "OperationComplete",
                command_path.to_string(),
                params,
                state,
                subs,
                now,
                &mut events,
                &mut effects,
            );
        }
        (events, effects)
    }

    /// Fire every enabled `ObjectCreation`/`ObjectDeletion` subscription
    /// whose `ReferenceList` names `table_path`. Called once per
    /// `ObjectAdded`/`ObjectDeleted` event, after it and its projection have
    /// already been applied to `state`.
    pub fn on_object_lifecycle(
        &mut self,
        state: &MaterializedState,
        subs: &mut SubscriptionEngine,
        now: Instant,
        kind: &'static str,
        table_path: &str,
        instance: u32,
    ) -> (Vec<Event>, Vec<Effect>) {
        let mut events = Vec::new();
        let mut effects = Vec::new();
        for sub in live_rows(state) {
            if !sub.enable || sub.notif_type != kind {
                continue;
            }
            if !sub.reference_list.iter().any(|r| names_table(r, table_path)) {
                continue;
            }
            let mut params = HashMap::new();
            params.insert("instance".to_string(), instance.to_string());
            let path = format!("{table_path}{instance}.");
            build_and_send(&sub, kind, path, params, state, subs, now, &mut events, &mut effects);
        }
        (events, effects)
    }
}

#[allow(clippy::too_many_arguments)]
fn build_and_send(
    sub: &SubscriptionRow,
    kind: &str,
    path: String,
    params: HashMap<String, String>,
    state: &MaterializedState,
    subs: &mut SubscriptionEngine,
    now: Instant,
    events: &mut Vec<Event>,
    effects: &mut Vec<Effect>,
) {
    let message_id = subs.next_message_id(state, &sub.recipient);
    let notify = WireNotify {
        subscription_id: subscription_id(sub.instance),
        send_resp: true,
        kind: kind.to_string(),
        path,
        params,
    };
    let msg = Msg::request(message_id.to_string(), MsgType::Notify, ReqType::Notify(notify));
    let bytes = <Msg as prost::Message>::encode_to_vec(&msg);
    let record = Record::new(sub.recipient.as_str(), "self::agent", bytes);
    let record_bytes = match uspa_wire::encode_record(&record) {
        Ok(b) => b,
        Err(err) => {
            warn!(error = %err, "failed to encode notify record");
            return;
        }
    };
    events.push(subs.sent(sub.recipient.clone(), message_id, kind, now));
    effects.push(Effect::SendUspRecord { controller: sub.recipient.clone(), mtp_hint: None, bytes: record_bytes });
}

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
