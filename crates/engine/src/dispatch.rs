// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message Dispatcher: the DM thread's single entry point for a
//! decoded inbound [`Request`], and the assembler of the matching
//! [`Response`]/[`Error`]. Mutating requests (Set/Add/Delete) run under a
//! fresh [`Transaction`] — a transaction never spans messages, so one
//! `handle_*` call commits at most one transaction.
//!
//! Resolving the sending controller and checking its Trust Role happen
//! once per request here; trust in this agent is a tree-wide role (see
//! [`uspa_core::TrustRole`] docs) rather than a per-path ACL, so a single
//! permission check covers the whole request rather than each touched path
//! individually.

use std::collections::HashMap;
use std::time::Instant;

use uspa_core::schema::ObjectDef;
use uspa_core::{parse_path, EndpointId, Effect, Event, Permission, UspError};
use uspa_storage::MaterializedState;
use uspa_wire::{
    Add, AddResp, Delete, DeleteResp, Get, GetInstances, GetInstancesResp, GetResp, GetSupportedDM,
    GetSupportedDMResp, GetSupportedProtocol, GetSupportedProtocolResp, NotifyResp, ObjPathResult, Operate,
    OperateResp, ReqType, ResultEntry, Set, SetResp, SupportedObjectResult, UspWireError as WireError,
};

use crate::controllers::ControllerTable;
use crate::registry::Registry;
use crate::resolver::resolve;
use crate::subscriptions::SubscriptionEngine;
use crate::txn::Transaction;

/// The data-model URI this agent advertises in `GetSupportedProtocolResp`.
pub const SUPPORTED_DM_URI: &str = "urn:broadband-forum-org:tr-181-2-12-0";

/// What handling a request produced: the response body, the events to
/// persist (empty for read-only requests), and any effects the DM thread
/// needs the event loop to carry out (currently only async-Operate kickoff).
pub struct DispatchOutcome {
    pub response: ReqResult,
    pub events: Vec<Event>,
    pub effects: Vec<Effect>,
}

pub enum ReqResult {
    Get(GetResp),
    Set(SetResp),
    Add(AddResp),
    Delete(DeleteResp),
    Operate(OperateResp),
    GetSupportedDM(GetSupportedDMResp),
    GetSupportedProtocol(GetSupportedProtocolResp),
    GetInstances(GetInstancesResp),
    NotifyAck(NotifyResp),
    /// The controller lacks permission, or the request named an unsupported
    /// combination; carries the per-request `Error` message body.
    Denied(WireError),
}

fn outcome(response: ReqResult) -> DispatchOutcome {
    DispatchOutcome { response, events: Vec::new(), effects: Vec::new() }
}

fn denied(code: &UspError) -> DispatchOutcome {
    outcome(ReqResult::Denied(WireError { err_code: error_code(code), err_msg: code.message().to_string(), param_errs: vec![] }))
}

pub struct Dispatcher;

impl Dispatcher {
    /// Route a decoded request to its handler after checking `controller`'s
    /// trust role grants the permission the request kind requires.
    #[allow(clippy::too_many_arguments)]
    pub fn handle(
        req_type: &ReqType,
        controller: &EndpointId,
        registry: &Registry,
        state: &MaterializedState,
        controllers: &ControllerTable,
        subscriptions: &mut SubscriptionEngine,
        txn_id: impl Into<String>,
        now: Instant,
    ) -> DispatchOutcome {
        let required = required_permission(req_type);
        if !controllers.allows(state, controller, required) {
            return denied(&UspError::PermissionDenied(format!("{controller} lacks {required:?}")));
        }

        match req_type {
            ReqType::Get(get) => Self::handle_get(get, registry, state),
            ReqType::Set(set) => Self::handle_set(set, registry, state, txn_id),
            ReqType::Add(add) => Self::handle_add(add, registry, state, txn_id),
            ReqType::Delete(delete) => Self::handle_delete(delete, registry, state, txn_id),
            ReqType::Operate(operate) => Self::handle_operate(operate, registry),
            ReqType::GetSupportedDM(req) => Self::handle_get_supported_dm(req, registry),
            ReqType::GetSupportedProtocol(req) => Self::handle_get_supported_protocol(req),
            ReqType::GetInstances(req) => Self::handle_get_instances(req, state),
            ReqType::Notify(_) => denied(&UspError::RequestDenied("agent does not accept inbound Notify".to_string())),
            ReqType::NotifyResp(resp) => Self::handle_notify_resp(resp, controller, subscriptions, now),
        }
    }

    fn handle_get(req: &Get, registry: &Registry, state: &MaterializedState) -> DispatchOutcome {
        let mut results = Vec::new();
        for requested_path in &req.param_paths {
            match resolve_request(requested_path, state) {
                Ok(concrete_paths) => {
                    results.extend(group_by_object(requested_path, &concrete_paths, state, registry))
                }
                Err(err) => results.push(ResultEntry {
                    requested_path: requested_path.clone(),
                    resolved_path: String::new(),
                    params: HashMap::new(),
                    err_code: error_code(&err),
                    err_msg: err.message().to_string(),
                }),
            }
        }
        outcome(ReqResult::Get(GetResp { results }))
    }

    fn handle_set(req: &Set, registry: &Registry, state: &MaterializedState, txn_id: impl Into<String>) -> DispatchOutcome {
        let mut txn = Transaction::begin(txn_id);
        let mut unresolved = Vec::new();
        for update in &req.updates {
            match resolve_request(&update.param, state) {
                Ok(paths) if paths.is_empty() => unresolved.push((update.param.clone(), UspError::InvalidPath(update.param.clone()))),
                Ok(paths) => {
                    for path in paths {
                        txn.push_set(path, update.value.clone());
                    }
                }
                Err(err) => unresolved.push((update.param.clone(), err)),
            }
        }
        let mut result = txn.commit(registry, state, req.allow_partial);
        for (param, err) in unresolved {
            result.sets.push(uspa_wire::ParamSettingResult { param, err_code: error_code(&err), err_msg: err.message().to_string() });
        }
        DispatchOutcome { response: ReqResult::Set(SetResp { results: result.sets }), events: result.events, effects: vec![] }
    }

    fn handle_add(req: &Add, registry: &Registry, state: &MaterializedState, txn_id: impl Into<String>) -> DispatchOutcome {
        let mut txn = Transaction::begin(txn_id);
        txn.push_add(req.obj_path.clone(), req.param_settings.clone());
        let result = txn.commit(registry, state, true);
        let add = result.adds.into_iter().next().unwrap_or_else(|| crate::txn::AddOutcome {
            table_path: req.obj_path.clone(),
            instance: None,
            param_errs: vec![],
            err: Some(UspError::InternalError("transaction produced no add outcome".to_string())),
        });
        let resp = match add.err {
            None => AddResp {
                path: req.obj_path.clone(),
                instance: add.instance.unwrap_or(0),
                param_errs: add.param_errs,
                err_code: 0,
                err_msg: String::new(),
            },
            Some(err) => AddResp {
                path: req.obj_path.clone(),
                instance: 0,
                param_errs: add.param_errs,
                err_code: error_code(&err),
                err_msg: err.message().to_string(),
            },
        };
        DispatchOutcome { response: ReqResult::Add(resp), events: result.events, effects: vec![] }
    }

    fn handle_delete(req: &Delete, registry: &Registry, state: &MaterializedState, txn_id: impl Into<String>) -> DispatchOutcome {
        let mut txn = Transaction::begin(txn_id);
        let mut unresolved = Vec::new();
        for obj_path in &req.obj_paths {
            match resolve_request(obj_path, state) {
                Ok(concrete) if concrete.is_empty() => {
                    unresolved.push((obj_path.clone(), UspError::ResolveTargetNotFound(obj_path.clone())))
                }
                Ok(concrete) => {
                    for path in concrete {
                        match split_instance_path(&path) {
                            Some((table_path, instance)) => txn.push_delete(table_path, instance),
                            None => unresolved.push((obj_path.clone(), UspError::InvalidPath(path))),
                        }
                    }
                }
                Err(err) => unresolved.push((obj_path.clone(), err)),
            }
        }
        let mut result = txn.commit(registry, state, req.allow_partial);
        for (requested_path, err) in unresolved {
            result.deletes.push(crate::txn::DeleteOutcome { requested_path, affected_paths: vec![], err: Some(err) });
        }
        let results = result
            .deletes
            .into_iter()
            .map(|d| match d.err {
                None => ObjPathResult { requested_path: d.requested_path, affected_paths: d.affected_paths, err_code: 0, err_msg: String::new() },
                Some(err) => ObjPathResult {
                    requested_path: d.requested_path,
                    affected_paths: vec![],
                    err_code: error_code(&err),
                    err_msg: err.message().to_string(),
                },
            })
            .collect();
        DispatchOutcome { response: ReqResult::Delete(DeleteResp { results }), events: result.events, effects: vec![] }
    }

    fn handle_operate(req: &Operate, registry: &Registry) -> DispatchOutcome {
        let Some(operation) = registry.find_operation(&req.command) else {
            return outcome(ReqResult::Operate(OperateResp {
                command: req.command.clone(),
                command_key: req.command_key.clone(),
                output_args: HashMap::new(),
                err_code: error_code(&UspError::CommandFailure(req.command.clone())),
                err_msg: format!("no such command: {}", req.command),
            }));
        };

        if operation.is_async {
            let effect = Effect::InvokeOperation {
                command_key: req.command_key.clone(),
                path: req.command.clone(),
                input_args: req.input_args.clone(),
            };
            return DispatchOutcome {
                response: ReqResult::Operate(OperateResp {
                    command: req.command.clone(),
                    command_key: req.command_key.clone(),
                    output_args: HashMap::new(),
                    err_code: 0,
                    err_msg: String::new(),
                }),
                events: vec![],
                effects: vec![effect],
            };
        }

        let resp = match (operation.handler)(&req.input_args) {
            Ok(output_args) => OperateResp {
                command: req.command.clone(),
                command_key: req.command_key.clone(),
                output_args,
                err_code: 0,
                err_msg: String::new(),
            },
            Err(err) => OperateResp {
                command: req.command.clone(),
                command_key: req.command_key.clone(),
                output_args: HashMap::new(),
                err_code: error_code(&err),
                err_msg: err.message().to_string(),
            },
        };
        outcome(ReqResult::Operate(resp))
    }

    fn handle_get_supported_dm(req: &GetSupportedDM, registry: &Registry) -> DispatchOutcome {
        let objects: Vec<SupportedObjectResult> = registry
            .objects()
            .filter(|o| req.obj_paths.is_empty() || req.obj_paths.iter().any(|p| object_matches_prefix(o, p)))
            .map(|object| SupportedObjectResult {
                obj_path: object.path_template.clone(),
                multi_instance: object.multi_instance,
                params: leaf_names(registry.parameters().map(|p| p.path_template.as_str()), &object.path_template),
                commands: leaf_names(registry.operations().map(|p| p.path_template.as_str()), &object.path_template),
                events: leaf_names(registry.events().map(|e| e.path_template.as_str()), &object.path_template),
            })
            .collect();
        outcome(ReqResult::GetSupportedDM(GetSupportedDMResp { objects }))
    }

    fn handle_get_supported_protocol(_req: &GetSupportedProtocol) -> DispatchOutcome {
        outcome(ReqResult::GetSupportedProtocol(GetSupportedProtocolResp {
            agent_supported_versions: SUPPORTED_DM_URI.to_string(),
        }))
    }

    fn handle_get_instances(req: &GetInstances, state: &MaterializedState) -> DispatchOutcome {
        let mut results = Vec::new();
        for obj_path in &req.obj_paths {
            match resolve_request(obj_path, state) {
                Ok(concrete) => results.push(ObjPathResult {
                    requested_path: obj_path.clone(),
                    affected_paths: concrete,
                    err_code: 0,
                    err_msg: String::new(),
                }),
                Err(err) => results.push(ObjPathResult {
                    requested_path: obj_path.clone(),
                    affected_paths: vec![],
                    err_code: error_code(&err),
                    err_msg: err.message().to_string(),
                }),
            }
        }
        outcome(ReqResult::GetInstances(GetInstancesResp { results }))
    }

    fn handle_notify_resp(
        resp: &NotifyResp,
        controller: &EndpointId,
        subscriptions: &mut SubscriptionEngine,
        now: Instant,
    ) -> DispatchOutcome {
        let _ = now;
        let message_id = resp.subscription_id.parse::<u64>().unwrap_or(0);
        let event = subscriptions.acked(controller.clone(), message_id);
        DispatchOutcome {
            response: ReqResult::NotifyAck(NotifyResp { subscription_id: resp.subscription_id.clone() }),
            events: vec![event],
            effects: vec![],
        }
    }
}

fn required_permission(req_type: &ReqType) -> Permission {
    match req_type {
        ReqType::Get(_) | ReqType::GetInstances(_) | ReqType::GetSupportedDM(_) | ReqType::GetSupportedProtocol(_) => {
            Permission::Read
        }
        ReqType::Set(_) => Permission::Write,
        ReqType::Add(_) => Permission::Add,
        ReqType::Delete(_) => Permission::Delete,
        ReqType::Operate(_) => Permission::Operate,
        ReqType::Notify(_) | ReqType::NotifyResp(_) => Permission::Notify,
    }
}

/// Reverse a secure parameter's on-disk obfuscation for a `Get` response;
/// every other parameter passes through unchanged.
fn displayed_value(registry: &Registry, path: &str, raw: &str) -> String {
    match registry.find_parameter(path) {
        Some(def) if def.secure => uspa_storage::db::deobfuscate(raw).unwrap_or_default(),
        _ => raw.to_string(),
    }
}

fn resolve_request(path: &str, state: &MaterializedState) -> Result<Vec<String>, UspError> {
    let expr = parse_path(path).map_err(|e| UspError::InvalidPath(format!("{path}: {e}")))?;
    resolve(&expr, state)
}

/// Groups resolved leaf/object paths into per-object `ResultEntry` rows.
fn group_by_object(
    requested_path: &str,
    concrete_paths: &[String],
    state: &MaterializedState,
    registry: &Registry,
) -> Vec<ResultEntry> {
    let mut by_object: std::collections::BTreeMap<String, HashMap<String, String>> = std::collections::BTreeMap::new();
    let mut errors: Vec<ResultEntry> = Vec::new();
    for path in concrete_paths {
        if let Some(object_path) = path.strip_suffix('.').map(|_| path.clone()).filter(|_| path.ends_with('.')) {
            let prefix_len = object_path.len();
            for (candidate, value) in &state.params {
                if let Some(leaf) = candidate.strip_prefix(&object_path) {
                    if !leaf.is_empty() && !leaf.contains('.') && candidate.len() > prefix_len {
                        let displayed = displayed_value(registry, candidate, value);
                        by_object.entry(object_path.clone()).or_default().insert(leaf.to_string(), displayed);
                    }
                }
            }
            by_object.entry(object_path).or_default();
        } else if let Some((object_path, leaf)) = path.rsplit_once('.') {
            // A literal (non-wildcard) leaf path only resolves if it names a
            // registered parameter — an unregistered leaf is `InvalidPath`,
            // not a silent empty value.
            if registry.find_parameter(path).is_none() {
                let err = UspError::InvalidPath(path.clone());
                errors.push(ResultEntry {
                    requested_path: requested_path.to_string(),
                    resolved_path: path.clone(),
                    params: HashMap::new(),
                    err_code: error_code(&err),
                    err_msg: err.message().to_string(),
                });
                continue;
            }
            let raw = state.param(path).unwrap_or_default();
            let value = displayed_value(registry, path, raw);
            by_object.entry(format!("{object_path}.")).or_default().insert(leaf.to_string(), value);
        }
    }
    by_object
        .into_iter()
        .map(|(resolved_path, params)| ResultEntry {
            requested_path: requested_path.to_string(),
            resolved_path,
            params,
            err_code: 0,
            err_msg: String::new(),
        })
        .chain(errors)
        .collect()
}

/// Splits a concrete object-instance path (`Device.LocalAgent.MTP.3.`) into
/// its owning table path (`Device.LocalAgent.MTP.`) and instance number.
fn split_instance_path(path: &str) -> Option<(String, u32)> {
    let trimmed = path.trim_end_matches('.');
    let (rest, last) = trimmed.rsplit_once('.')?;
    let instance: u32 = last.parse().ok()?;
    Some((format!("{rest}."), instance))
}

fn object_matches_prefix(object: &ObjectDef, requested: &str) -> bool {
    let requested = requested.trim_end_matches('*');
    object.path_template.starts_with(requested) || requested.starts_with(object.path_template.trim_end_matches("{i}."))
}

fn leaf_names<'a>(templates: impl Iterator<Item = &'a str>, object_template: &str) -> Vec<String> {
    templates
        .filter_map(|template| template.strip_prefix(object_template))
        .filter(|leaf| !leaf.is_empty())
        .map(|leaf| leaf.to_string())
        .collect()
}

fn error_code(err: &UspError) -> u32 {
    err.usp_err_code()
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
