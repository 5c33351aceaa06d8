// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The DM task: owns the registry, the
//! materialized state, the WAL, and every data-model side-table, and is the
//! only code path that ever calls [`Dispatcher::handle`]. Everything it
//! learns about the outside world arrives over one of three channels —
//! decoded inbound Records from the MTP task, CLI commands from the IPC
//! listener, or its own poll timer — and everything it produces durable is
//! WAL-appended (and checkpointed) before anything else can observe it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::interval;
use tracing::{debug, warn};

use uspa_core::{EndpointId, Effect, Event, InboundRecord, UspError};
use uspa_engine::dispatch::{DispatchOutcome, ReqResult};
use uspa_engine::{AgentMtpTable, ControllerTable, Dispatcher, InstanceCache, Registry, SubscriptionEngine};
use uspa_storage::{Checkpointer, MaterializedState, Wal};
use uspa_wire::cli_protocol::CliPathResult;
use uspa_wire::{self, Body, CliRequest, CliResponse, Get, Msg, MsgType, ParamSetting, Record, ReqType, RespType, Set};

use crate::env;
use crate::notify::NotifyDispatch;
use crate::projections;

/// The identity every CLI request is attributed to. Bound to `Full-Access`
/// once at first boot (see [`DmRuntime::new`]) since the local Unix socket
/// is itself the trust boundary.
pub fn cli_controller() -> EndpointId {
    EndpointId::new("self::cli")
}

const SUBSCRIPTION_TABLE: &str = "Device.LocalAgent.Subscription.";

fn subscription_id(instance: u32) -> String {
    format!("Device.LocalAgent.Subscription.{instance}")
}

/// A decoded CLI request plus the channel its response is delivered on.
pub struct CliCommand {
    pub request: CliRequest,
    pub reply: oneshot::Sender<CliResponse>,
}

/// How often the materialized state is folded into a fresh snapshot and the
/// WAL trimmed to the tail since that point.
fn checkpoint_period() -> Duration {
    Duration::from_secs(300)
}

pub struct DmRuntime {
    registry: Registry,
    state: MaterializedState,
    wal: Wal,
    checkpointer: Checkpointer,
    controllers: ControllerTable,
    subscriptions: SubscriptionEngine,
    notify: NotifyDispatch,
    instances: InstanceCache,
    effects_tx: mpsc::Sender<Effect>,
    op_events_tx: mpsc::Sender<Event>,
    op_events_rx: mpsc::Receiver<Event>,
    pending_operations: HashMap<String, String>,
    txn_counter: u64,
}

impl DmRuntime {
    pub fn new(
        registry: Registry,
        state: MaterializedState,
        wal: Wal,
        checkpointer: Checkpointer,
        effects_tx: mpsc::Sender<Effect>,
    ) -> Self {
        let (op_events_tx, op_events_rx) = mpsc::channel(32);
        let mut runtime = Self {
            registry,
            state,
            wal,
            checkpointer,
            controllers: ControllerTable::new(),
            subscriptions: SubscriptionEngine::new(),
            notify: NotifyDispatch::new(),
            instances: InstanceCache::new(),
            effects_tx,
            op_events_tx,
            op_events_rx,
            pending_operations: HashMap::new(),
            txn_counter: 0,
        };
        runtime.bootstrap_cli_controller();
        runtime
    }

    /// Registers the local CLI's fixed identity against `Full-Access` on
    /// first boot. A no-op on every later boot: `ControllerRegistered`'s
    /// state handler is an `entry().or_insert`, so re-applying it once the
    /// row already exists changes nothing.
    fn bootstrap_cli_controller(&mut self) {
        if self.state.controllers.contains_key(cli_controller().as_str()) {
            return;
        }
        match self.controllers.register(cli_controller(), "Full-Access") {
            Ok(event) => self.apply_and_log(event),
            Err(err) => warn!(error = %err, "failed to bootstrap CLI controller"),
        }
    }

    fn next_txn_id(&mut self) -> String {
        self.txn_counter += 1;
        format!("txn-{}", self.txn_counter)
    }

    /// Append `event` to the WAL, apply it to state, and apply (and
    /// WAL-append) whatever companion projection it implies, in that order
    /// — `state` must already reflect `event` before a projection can be
    /// derived from it (see [`projections::mirror_for`]).
    fn apply_and_log(&mut self, event: Event) {
        if let Err(err) = self.wal.append(&event) {
            warn!(error = %err, event = event.name(), "failed to append event to WAL");
            return;
        }
        self.state.apply_event(&event);
        if let Some(mirror) = projections::mirror_for(&self.state, &event) {
            if let Err(err) = self.wal.append(&mirror) {
                warn!(error = %err, event = mirror.name(), "failed to append projection to WAL");
                return;
            }
            self.state.apply_event(&mirror);
        }
    }

    /// Apply a batch of events from one `DispatchOutcome`, then run the
    /// subscription-lifecycle and Notify hooks those events imply:
    /// `Add`/`Delete` against the Subscription table itself creates or
    /// retires a `SubscriptionEngine` entry, and any other `ObjectAdded`/
    /// `ObjectDeleted` fires `ObjectCreation`/`ObjectDeletion` Notifies for
    /// subscriptions watching that table. Returns the effects
    /// those Notifies produced, for the caller to fold into its own
    /// `dispatch_effects` call.
    fn apply_events_and_notify(&mut self, events: Vec<Event>) -> Vec<Effect> {
        for event in &events {
            self.apply_and_log(event.clone());
        }
        let now = Instant::now();
        let mut extra_effects = Vec::new();
        for event in &events {
            match event {
                Event::ObjectAdded { table_path, instance } if table_path == SUBSCRIPTION_TABLE => {
                    if let Some(recipient) =
                        self.state.param(&format!("{table_path}{instance}.Recipient")).map(str::to_string)
                    {
                        let created = self.subscriptions.create(EndpointId::new(recipient), subscription_id(*instance));
                        self.apply_and_log(created);
                    }
                }
                Event::ObjectDeleted { table_path, instance } if table_path == SUBSCRIPTION_TABLE => {
                    let deleted = self.subscriptions.delete(subscription_id(*instance));
                    self.apply_and_log(deleted);
                    self.notify.forget(*instance);
                }
                Event::ObjectAdded { table_path, instance } => {
                    let (notify_events, effects) = self.notify.on_object_lifecycle(
                        &self.state,
                        &mut self.subscriptions,
                        now,
                        "ObjectCreation",
                        table_path,
                        *instance,
                    );
                    for event in notify_events {
                        self.apply_and_log(event);
                    }
                    extra_effects.extend(effects);
                }
                Event::ObjectDeleted { table_path, instance } => {
                    let (notify_events, effects) = self.notify.on_object_lifecycle(
                        &self.state,
                        &mut self.subscriptions,
                        now,
                        "ObjectDeletion",
                        table_path,
                        *instance,
                    );
                    for event in notify_events {
                        self.apply_and_log(event);
                    }
                    extra_effects.extend(effects);
                }
                Event::OperationCompleted { command_key, success } => {
                    let Some(command_path) = self.pending_operations.remove(command_key) else { continue };
                    let (notify_events, effects) = self.notify.on_operation_completed(
                        &self.state,
                        &mut self.subscriptions,
                        now,
                        command_key,
                        &command_path,
                        *success,
                    );
                    for event in notify_events {
                        self.apply_and_log(event);
                    }
                    extra_effects.extend(effects);
                }
                _ => {}
            }
        }
        extra_effects
    }

    /// Forward effects to the MTP task, except `InvokeOperation`: an async
    /// Operate handler runs here, off the DM task's own loop, and its eventual result arrives back as an
    /// `OperationCompleted` event over `op_events_rx` rather than going out
    /// over the wire.
    async fn dispatch_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            if let Effect::InvokeOperation { command_key, path, input_args } = effect {
                self.spawn_operation(command_key, path, input_args);
                continue;
            }
            if self.effects_tx.send(effect).await.is_err() {
                warn!("effect channel closed, dropping effect");
            }
        }
    }

    /// Runs an async Operate handler on the blocking thread pool and delivers
    /// its result back as an `Event::OperationCompleted` once done; never
    /// awaited by the caller, so a slow handler cannot stall the DM task.
    fn spawn_operation(&mut self, command_key: String, path: String, input_args: HashMap<String, String>) {
        let Some(def) = self.registry.find_operation(&path).cloned() else {
            warn!(path, "no such operation to invoke");
            return;
        };
        self.pending_operations.insert(command_key.clone(), path);
        let tx = self.op_events_tx.clone();
        tokio::spawn(async move {
            let success = matches!(tokio::task::spawn_blocking(move || (def.handler)(&input_args)).await, Ok(Ok(_)));
            let _ = tx.send(Event::OperationCompleted { command_key, success }).await;
        });
    }

    /// Drive the task to completion: drains inbound records, CLI commands,
    /// MTP lifecycle events, and its own poll timer until `shutdown` is
    /// signalled.
    pub async fn run(
        mut self,
        mut inbound_rx: mpsc::Receiver<InboundRecord>,
        mut cli_rx: mpsc::Receiver<CliCommand>,
        mut mtp_events_rx: mpsc::Receiver<Event>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut poll_tick = interval(env::value_change_poll_period());
        let mut checkpoint_tick = interval(checkpoint_period());
        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                maybe_record = inbound_rx.recv() => {
                    match maybe_record {
                        Some(record) => self.handle_inbound(record).await,
                        None => break,
                    }
                }
                maybe_cmd = cli_rx.recv() => {
                    match maybe_cmd {
                        Some(cmd) => self.handle_cli(cmd).await,
                        None => break,
                    }
                }
                maybe_event = mtp_events_rx.recv() => {
                    match maybe_event {
                        Some(event) => self.apply_and_log(event),
                        None => break,
                    }
                }
                maybe_op_event = self.op_events_rx.recv() => {
                    if let Some(event) = maybe_op_event {
                        let extra_effects = self.apply_events_and_notify(vec![event]);
                        self.dispatch_effects(extra_effects).await;
                    }
                }
                _ = poll_tick.tick() => self.on_poll_tick().await,
                _ = checkpoint_tick.tick() => self.checkpoint(),
            }
        }
        self.checkpoint();
    }

    fn checkpoint(&mut self) {
        let seq = self.wal.processed_seq();
        if let Err(err) = self.checkpointer.save(seq, &self.state) {
            warn!(error = %err, "failed to save checkpoint");
            return;
        }
        if let Err(err) = self.wal.truncate_before(seq) {
            warn!(error = %err, "failed to truncate wal after checkpoint");
        }
    }

    /// One inbound USP Record off the wire: decode, dispatch, persist, and
    /// (when the request warrants a reply) send the Response back out the
    /// same MTP.
    async fn handle_inbound(&mut self, record: InboundRecord) {
        let decoded = match uspa_wire::decode_record(&record.bytes) {
            Ok(r) => r,
            Err(err) => {
                warn!(mtp_id = record.mtp_id, error = %err, "dropping undecodable record");
                return;
            }
        };
        let msg = match <Msg as prost::Message>::decode(decoded.payload.as_slice()) {
            Ok(m) => m,
            Err(err) => {
                warn!(mtp_id = record.mtp_id, error = %err, "dropping undecodable msg");
                return;
            }
        };
        let Some(Body::Request(req)) = msg.body else {
            debug!(mtp_id = record.mtp_id, "ignoring non-request msg on inbound path");
            return;
        };
        let Some(req_type) = req.req_type else {
            return;
        };

        let controller = EndpointId::new(decoded.from_id.clone());
        let txn_id = self.next_txn_id();
        let outcome = Dispatcher::handle(
            &req_type,
            &controller,
            &self.registry,
            &self.state,
            &self.controllers,
            &mut self.subscriptions,
            txn_id,
            Instant::now(),
        );

        self.finish(outcome, Some((record.mtp_id, decoded.from_id, msg.header.msg_id))).await;
    }

    /// Apply the events an outcome produced, forward its effects, and (for
    /// requests that arrived over the wire) encode and send the Response
    /// or Error back out the MTP the request came in on.
    async fn finish(&mut self, outcome: DispatchOutcome, reply_to: Option<(u32, String, String)>) {
        let extra_effects = self.apply_events_and_notify(outcome.events);
        let mut effects = outcome.effects;
        effects.extend(extra_effects);
        self.dispatch_effects(effects).await;

        let Some((mtp_id, from_id, msg_id)) = reply_to else { return };
        let resp_msg = match outcome.response {
            ReqResult::Denied(err) => Msg::error(msg_id, err),
            other => match resp_type_for(other) {
                Some((msg_type, resp_type)) => Msg::response(msg_id, msg_type, resp_type),
                None => return,
            },
        };
        let bytes = <Msg as prost::Message>::encode_to_vec(&resp_msg);
        let record = Record::new(from_id, "self::agent", bytes);
        let record_bytes = match uspa_wire::encode_record(&record) {
            Ok(b) => b,
            Err(err) => {
                warn!(error = %err, "failed to encode response record");
                return;
            }
        };
        let controller = EndpointId::new(record.to_id.clone());
        self.dispatch_effects(vec![Effect::SendUspRecord {
            controller,
            mtp_hint: Some(mtp_id),
            bytes: record_bytes,
        }])
        .await;
    }

    async fn handle_cli(&mut self, cmd: CliCommand) {
        let response = self.handle_cli_request(cmd.request).await;
        let _ = cmd.reply.send(response);
    }

    async fn handle_cli_request(&mut self, request: CliRequest) -> CliResponse {
        match request {
            CliRequest::Get { paths } => {
                let req_type = ReqType::Get(Get { param_paths: paths, max_depth: 0 });
                let outcome = self.dispatch_local(&req_type);
                let response = match outcome.response {
                    ReqResult::Get(resp) => CliResponse::Get { results: get_resp_to_cli(resp) },
                    ReqResult::Denied(err) => denied_response(err),
                    _ => internal_error_response("unexpected response for Get"),
                };
                self.dispatch_effects(outcome.effects).await;
                let extra_effects = self.apply_events_and_notify(outcome.events);
                self.dispatch_effects(extra_effects).await;
                response
            }
            CliRequest::Set { updates, allow_partial } => {
                let req_type = ReqType::Set(Set {
                    allow_partial,
                    updates: updates.into_iter().map(|(param, value)| ParamSetting { param, value }).collect(),
                });
                let outcome = self.dispatch_local(&req_type);
                let response = match outcome.response {
                    ReqResult::Set(resp) => CliResponse::Set {
                        results: resp
                            .results
                            .into_iter()
                            .map(|r| CliPathResult {
                                path: r.param,
                                value: None,
                                err_code: (r.err_code != 0).then_some(r.err_code),
                                err_msg: (!r.err_msg.is_empty()).then_some(r.err_msg),
                            })
                            .collect(),
                    },
                    ReqResult::Denied(err) => denied_response(err),
                    _ => internal_error_response("unexpected response for Set"),
                };
                let extra_effects = self.apply_events_and_notify(outcome.events);
                self.dispatch_effects(outcome.effects).await;
                self.dispatch_effects(extra_effects).await;
                response
            }
            CliRequest::Add { obj_path, param_settings } => {
                let req_type = ReqType::Add(uspa_wire::Add { obj_path, param_settings });
                let outcome = self.dispatch_local(&req_type);
                let response = match outcome.response {
                    ReqResult::Add(resp) if resp.err_code == 0 => {
                        CliResponse::Add { path: resp.path, instance: resp.instance }
                    }
                    ReqResult::Add(resp) => CliResponse::Error { err_code: resp.err_code, err_msg: resp.err_msg },
                    ReqResult::Denied(err) => denied_response(err),
                    _ => internal_error_response("unexpected response for Add"),
                };
                let extra_effects = self.apply_events_and_notify(outcome.events);
                self.dispatch_effects(outcome.effects).await;
                self.dispatch_effects(extra_effects).await;
                response
            }
            CliRequest::Delete { obj_paths, allow_partial } => {
                let req_type = ReqType::Delete(uspa_wire::Delete { obj_paths, allow_partial });
                let outcome = self.dispatch_local(&req_type);
                let response = match outcome.response {
                    ReqResult::Delete(resp) => CliResponse::Delete {
                        affected_paths: resp.results.into_iter().flat_map(|r| r.affected_paths).collect(),
                    },
                    ReqResult::Denied(err) => denied_response(err),
                    _ => internal_error_response("unexpected response for Delete"),
                };
                let extra_effects = self.apply_events_and_notify(outcome.events);
                self.dispatch_effects(outcome.effects).await;
                self.dispatch_effects(extra_effects).await;
                response
            }
            CliRequest::Dump => CliResponse::Dump { rows: self.state.params.clone() },
            CliRequest::TriggerFactoryReset => {
                let event = Event::FactoryReset { source: "cli".to_string() };
                self.apply_and_log(event);
                CliResponse::Ack
            }
            CliRequest::TriggerStompReconnect { conn_id } => {
                self.dispatch_effects(vec![Effect::ScheduleStompReconnect { conn_id }]).await;
                CliResponse::Ack
            }
        }
    }

    /// Run a CLI-originated request through the dispatcher as the
    /// fully-trusted local controller. Does not itself persist events or
    /// forward effects — callers decide what to do with a `DispatchOutcome`
    /// since `Get` needs neither.
    fn dispatch_local(&mut self, req_type: &ReqType) -> DispatchOutcome {
        let txn_id = self.next_txn_id();
        Dispatcher::handle(
            req_type,
            &cli_controller(),
            &self.registry,
            &self.state,
            &self.controllers,
            &mut self.subscriptions,
            txn_id,
            Instant::now(),
        )
    }

    /// Periodic work: invoke every `VendorComputed` parameter's getter and
    /// materialize a changed result, refresh any due multi-instance table,
    /// start any enabled MTP row that isn't up yet, and poll every enabled
    /// `ValueChange` subscription's watched paths for changes.
    async fn on_poll_tick(&mut self) {
        let now = Instant::now();
        self.poll_vendor_computed();
        self.poll_instance_refresh(now);
        self.poll_mtp_starts().await;
        self.poll_value_change_notify(now).await;
    }

    async fn poll_value_change_notify(&mut self, now: Instant) {
        let (events, effects) = self.notify.poll_value_change(&self.state, &mut self.subscriptions, now);
        for event in events {
            self.apply_and_log(event);
        }
        self.dispatch_effects(effects).await;
    }

    fn poll_vendor_computed(&mut self) {
        let mut updates = Vec::new();
        for def in self.registry.parameters() {
            if def.path_template.contains("{i}") {
                continue;
            }
            let Some(getter) = &def.getter else { continue };
            match getter() {
                Ok(value) => {
                    let rendered = value.to_db_string();
                    if self.state.param(&def.path_template) != Some(rendered.as_str()) {
                        updates.push(Event::ParamValueSet { path: def.path_template.clone(), value: rendered });
                    }
                }
                Err(err) => warn!(path = %def.path_template, error = %err, "vendor getter failed"),
            }
        }
        for event in updates {
            self.apply_and_log(event);
        }
    }

    fn poll_instance_refresh(&mut self, now: Instant) {
        let due: Vec<_> = self.instances.due_tables(&self.registry, now).into_iter().cloned().collect();
        for object in due {
            if let Some(event) = self.instances.refresh(&object, &self.state, now) {
                self.apply_and_log(event);
            }
        }
    }

    /// Rows whose `Enable` is true but have no live `MtpRecord` get started;
    /// this is the one place `Effect::StartMtp` is ever emitted, so it is
    /// also where the row's connection parameters are resolved into the
    /// `MtpStartConfig` the MTP task needs.
    async fn poll_mtp_starts(&mut self) {
        let Some(rows) = self.state.instances.get("Device.LocalAgent.MTP.").cloned() else { return };
        let mut to_start = Vec::new();
        for mtp_id in rows {
            if self.state.mtps.contains_key(&mtp_id) {
                continue;
            }
            let enabled = self.state.param(&format!("Device.LocalAgent.MTP.{mtp_id}.Enable")) == Some("true");
            if !enabled {
                continue;
            }
            if let Some(config) = AgentMtpTable::start_config(&self.state, mtp_id) {
                to_start.push(Effect::StartMtp { mtp_id, config });
            }
        }
        self.dispatch_effects(to_start).await;
    }
}

fn get_resp_to_cli(resp: uspa_wire::GetResp) -> Vec<CliPathResult> {
    resp.results
        .into_iter()
        .flat_map(|entry| {
            if entry.err_code != 0 {
                vec![CliPathResult {
                    path: entry.requested_path,
                    value: None,
                    err_code: Some(entry.err_code),
                    err_msg: Some(entry.err_msg),
                }]
            } else {
                entry
                    .params
                    .into_iter()
                    .map(|(leaf, value)| CliPathResult {
                        path: format!("{}{leaf}", entry.resolved_path),
                        value: Some(value),
                        err_code: None,
                        err_msg: None,
                    })
                    .collect()
            }
        })
        .collect()
}

fn denied_response(err: uspa_wire::UspWireError) -> CliResponse {
    CliResponse::Error { err_code: err.err_code, err_msg: err.err_msg }
}

fn internal_error_response(msg: &str) -> CliResponse {
    CliResponse::Error { err_code: UspError::InternalError(msg.to_string()).usp_err_code(), err_msg: msg.to_string() }
}

fn resp_type_for(response: ReqResult) -> Option<(MsgType, RespType)> {
    match response {
        ReqResult::Get(resp) => Some((MsgType::GetResp, RespType::GetResp(resp))),
        ReqResult::Set(resp) => Some((MsgType::SetResp, RespType::SetResp(resp))),
        ReqResult::Add(resp) => Some((MsgType::AddResp, RespType::AddResp(resp))),
        ReqResult::Delete(resp) => Some((MsgType::DeleteResp, RespType::DeleteResp(resp))),
        ReqResult::Operate(resp) => Some((MsgType::OperateResp, RespType::OperateResp(resp))),
        ReqResult::GetSupportedDM(resp) => Some((MsgType::GetSupportedDMResp, RespType::GetSupportedDMResp(resp))),
        ReqResult::GetSupportedProtocol(resp) => {
            Some((MsgType::GetSupportedProtocolResp, RespType::GetSupportedProtocolResp(resp)))
        }
        ReqResult::GetInstances(resp) => Some((MsgType::GetInstancesResp, RespType::GetInstancesResp(resp))),
        ReqResult::NotifyAck(_) | ReqResult::Denied(_) => None,
    }
}

#[cfg(test)]
#[path = "dm_runtime_tests.rs"]
mod tests;
