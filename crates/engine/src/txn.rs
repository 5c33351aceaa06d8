// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transaction Manager: buffers a batch of Set/Add/Delete edits,
//! validates all of them, and — if the batch as a whole is acceptable —
//! produces the ordered sequence of [`Event`]s that persist it.
//!
//! Commit order is fixed regardless of the order edits were buffered in:
//! Add, then Set, then Delete. This lets an Add's freshly-created instance
//! be the target of a Set in the same transaction, and keeps a Delete from
//! removing an object a same-transaction Set still needs to validate against.
//! Nothing here touches [`MaterializedState`] directly — commit only
//! produces events; applying them (and so making them durable and visible)
//! is the WAL/state-apply pipeline's job, matching every other mutation path
//! in this agent.

use std::collections::HashMap;

use uspa_core::value::ParamValue;
use uspa_core::{Event, UspError};
use uspa_storage::db::obfuscate;
use uspa_storage::MaterializedState;
use uspa_wire::{ParamError, ParamSettingResult};

use crate::registry::Registry;

#[derive(Debug, Clone)]
enum Edit {
    Set { path: String, value: String },
    Add { table_path: String, param_settings: HashMap<String, String> },
    Delete { table_path: String, instance: u32 },
}

/// A buffered batch of edits awaiting commit.
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    pub txn_id: String,
    edits: Vec<Edit>,
}

#[derive(Debug, Clone)]
pub struct AddOutcome {
    pub table_path: String,
    pub instance: Option<u32>,
    pub param_errs: Vec<ParamError>,
    pub err: Option<UspError>,
}

#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    pub requested_path: String,
    pub affected_paths: Vec<String>,
    pub err: Option<UspError>,
}

/// The result of a commit: the events to persist, plus per-path results for
/// building the SetResp/AddResp/DeleteResp wire messages.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    pub events: Vec<Event>,
    pub sets: Vec<ParamSettingResult>,
    pub adds: Vec<AddOutcome>,
    pub deletes: Vec<DeleteOutcome>,
}

impl Outcome {
    /// Whether every buffered edit succeeded.
    pub fn is_fully_successful(&self) -> bool {
        self.sets.iter().all(|r| r.err_code == 0)
            && self.adds.iter().all(|a| a.err.is_none())
            && self.deletes.iter().all(|d| d.err.is_none())
    }
}

impl Transaction {
    pub fn begin(txn_id: impl Into<String>) -> Self {
        Self { txn_id: txn_id.into(), edits: Vec::new() }
    }

    pub fn push_set(&mut self, path: impl Into<String>, value: impl Into<String>) {
        self.edits.push(Edit::Set { path: path.into(), value: value.into() });
    }

    pub fn push_add(&mut self, table_path: impl Into<String>, param_settings: HashMap<String, String>) {
        self.edits.push(Edit::Add { table_path: table_path.into(), param_settings });
    }

    pub fn push_delete(&mut self, table_path: impl Into<String>, instance: u32) {
        self.edits.push(Edit::Delete { table_path: table_path.into(), instance });
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Validate and commit the buffered edits in Add, then Set, then Delete
    /// order. If `allow_partial` is `false` and any edit fails validation,
    /// the whole transaction aborts: `Outcome::events` is just a single
    /// `TransactionAborted` event and no state-mutating events are produced.
    pub fn commit(self, registry: &Registry, state: &MaterializedState, allow_partial: bool) -> Outcome {
        let adds: Vec<Edit> = self.edits.iter().filter(|e| matches!(e, Edit::Add { .. })).cloned().collect();
        let sets: Vec<Edit> = self.edits.iter().filter(|e| matches!(e, Edit::Set { .. })).cloned().collect();
        let deletes: Vec<Edit> = self.edits.iter().filter(|e| matches!(e, Edit::Delete { .. })).cloned().collect();

        let mut outcome = Outcome::default();
        for edit in adds {
            if let Edit::Add { table_path, param_settings } = edit {
                commit_add(registry, state, &table_path, param_settings, &mut outcome);
            }
        }
        for edit in sets {
            if let Edit::Set { path, value } = edit {
                commit_set(registry, &path, value, &mut outcome);
            }
        }
        for edit in deletes {
            if let Edit::Delete { table_path, instance } = edit {
                commit_delete(registry, state, &table_path, instance, &mut outcome);
            }
        }

        if !allow_partial && !outcome.is_fully_successful() {
            return Outcome {
                events: vec![Event::TransactionAborted {
                    txn_id: self.txn_id,
                    reason: "one or more edits failed and allow_partial is false".to_string(),
                }],
                ..outcome
            };
        }

        outcome.events.push(Event::TransactionCommitted { txn_id: self.txn_id, edit_count: outcome.events.len() });
        outcome
    }
}

fn commit_set(registry: &Registry, path: &str, value: String, outcome: &mut Outcome) {
    let result = (|| -> Result<(), UspError> {
        let def = registry
            .find_parameter(path)
            .ok_or_else(|| UspError::InvalidPath(path.to_string()))?;
        if !def.access.is_writable() {
            return Err(UspError::ParamReadOnly(path.to_string()));
        }
        let typed = ParamValue::parse(def.param_type, &value)?;
        if let Some(validator) = &def.validator {
            validator(&typed)?;
        }
        let stored = if def.secure { obfuscate(&typed.to_db_string()) } else { typed.to_db_string() };
        outcome.events.push(Event::ParamValueSet { path: path.to_string(), value: stored });
        if let Some(change_notify) = &def.change_notify {
            change_notify(path, &typed);
        }
        Ok(())
    })();
    outcome.sets.push(match result {
        Ok(()) => ParamSettingResult { param: path.to_string(), err_code: 0, err_msg: String::new() },
        Err(err) => ParamSettingResult { param: path.to_string(), err_code: error_code(&err), err_msg: err.message().to_string() },
    });
}

fn commit_add(
    registry: &Registry,
    state: &MaterializedState,
    table_path: &str,
    param_settings: HashMap<String, String>,
    outcome: &mut Outcome,
) {
    let result = (|| -> Result<(u32, Vec<ParamError>), UspError> {
        let object = registry
            .find_object(table_path)
            .ok_or_else(|| UspError::InvalidPath(table_path.to_string()))?;
        if !object.multi_instance {
            return Err(UspError::ObjectNotCreatable(table_path.to_string()));
        }
        if let Some(add_validator) = &object.add_validator {
            add_validator(&param_settings)?;
        }
        let instance = state.next_instance_number(table_path);

        let mut param_errs = Vec::new();
        let mut accepted = Vec::new();
        for (name, raw_value) in &param_settings {
            let path = format!("{table_path}{instance}.{name}");
            match registry.find_parameter(&path) {
                Some(def) => match ParamValue::parse(def.param_type, raw_value) {
                    Ok(typed) => {
                        let stored = if def.secure { obfuscate(&typed.to_db_string()) } else { typed.to_db_string() };
                        accepted.push((path, stored));
                    }
                    Err(err) => param_errs.push(ParamError { param: name.clone(), err_code: error_code(&err), err_msg: err.message().to_string() }),
                },
                None => param_errs.push(ParamError {
                    param: name.clone(),
                    err_code: error_code(&UspError::InvalidPath(path.clone())),
                    err_msg: format!("unknown parameter: {path}"),
                }),
            }
        }

        // Every child parameter of this table that declares a default and
        // wasn't explicitly supplied gets that default written on creation,
        // so a Get against the fresh instance sees it immediately rather
        // than an absent row.
        let member_prefix = format!("{table_path}{instance}.");
        for def in registry.parameters() {
            let Some(leaf) = def.path_template.strip_prefix(table_path).and_then(|s| s.strip_prefix("{i}.")) else {
                continue;
            };
            if param_settings.contains_key(leaf) {
                continue;
            }
            if let Some(default) = &def.default {
                let stored = if def.secure { obfuscate(&default.to_db_string()) } else { default.to_db_string() };
                accepted.push((format!("{member_prefix}{leaf}"), stored));
            }
        }

        outcome.events.push(Event::ObjectAdded { table_path: table_path.to_string(), instance });
        for (path, value) in accepted {
            outcome.events.push(Event::ParamValueSet { path, value });
        }
        if let Some(add_notify) = &object.add_notify {
            add_notify(table_path, instance);
        }
        Ok((instance, param_errs))
    })();

    outcome.adds.push(match result {
        Ok((instance, param_errs)) => AddOutcome {
            table_path: table_path.to_string(),
            instance: Some(instance),
            param_errs,
            err: None,
        },
        Err(err) => AddOutcome { table_path: table_path.to_string(), instance: None, param_errs: vec![], err: Some(err) },
    });
}

fn commit_delete(registry: &Registry, state: &MaterializedState, table_path: &str, instance: u32, outcome: &mut Outcome) {
    let requested_path = format!("{table_path}{instance}.");
    let result = (|| -> Result<Vec<String>, UspError> {
        let object = registry
            .find_object(table_path)
            .ok_or_else(|| UspError::InvalidPath(table_path.to_string()))?;
        if !object.multi_instance {
            return Err(UspError::ObjectNotDeletable(table_path.to_string()));
        }
        if !state.instances_of(table_path).contains(&instance) {
            return Err(UspError::ResolveTargetNotFound(requested_path.clone()));
        }

        outcome.events.push(Event::ObjectDeleted { table_path: table_path.to_string(), instance });
        if let Some(delete_notify) = &object.delete_notify {
            delete_notify(table_path, instance);
        }

        // Dangling reference cleanup: any parameter elsewhere in
        // the tree whose value points at the instance being removed is
        // cleared, since the path it names is about to stop existing.
        let mut cleared = Vec::new();
        for (path, value) in &state.params {
            if path.starts_with(&requested_path) {
                continue;
            }
            if value.trim_end_matches('.') == requested_path.trim_end_matches('.') {
                outcome.events.push(Event::ParamValueSet { path: path.clone(), value: String::new() });
                cleared.push(path.clone());
            }
        }

        Ok(cleared)
    })();

    outcome.deletes.push(match result {
        Ok(cleared) => {
            let mut affected_paths = vec![requested_path.clone()];
            affected_paths.extend(cleared);
            DeleteOutcome { requested_path, affected_paths, err: None }
        }
        Err(err) => DeleteOutcome { requested_path, affected_paths: vec![], err: Some(err) },
    });
}

fn error_code(err: &UspError) -> u32 {
    match err {
        UspError::InvalidPath(_) => 7016,
        UspError::InvalidValue(_) => 7012,
        UspError::ParamReadOnly(_) => 7008,
        UspError::PermissionDenied(_) => 7026,
        UspError::ObjectNotCreatable(_) => 7004,
        UspError::ObjectNotDeletable(_) => 7005,
        UspError::ResourcesExceeded(_) => 7009,
        UspError::ResolveTargetNotFound(_) => 7016,
        UspError::RequestDenied(_) => 7000,
        UspError::InternalError(_) => 7500,
        UspError::CommandFailure(_) => 7020,
        UspError::CrudFailure(_) => 7002,
    }
}

#[cfg(test)]
#[path = "txn_tests.rs"]
mod tests;
