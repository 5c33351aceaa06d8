// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Static schema types for the Data Model Registry: a table of small
//! trait-style capability objects indexed by path, rather than one big
//! callback per parameter. These are modeled here as `Arc<dyn Fn…>` closures
//! captured at registration time — `uspa-engine::registry::Registry` owns
//! the table itself and the (de)registration operations over it.

use crate::error::UspError;
use crate::value::{Access, ParamType, ParamValue, StorageClass};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub type ValidatorFn = Arc<dyn Fn(&ParamValue) -> Result<(), UspError> + Send + Sync>;
pub type ChangeNotifyFn = Arc<dyn Fn(&str, &ParamValue) + Send + Sync>;
pub type GetterFn = Arc<dyn Fn() -> Result<ParamValue, UspError> + Send + Sync>;
pub type SetterFn = Arc<dyn Fn(&ParamValue) -> Result<(), UspError> + Send + Sync>;

/// A registered leaf parameter definition.
#[derive(Clone)]
pub struct ParamDef {
    /// Canonical path template, e.g. `Device.LocalAgent.MTP.{i}.Enable`.
    pub path_template: String,
    pub param_type: ParamType,
    pub access: Access,
    pub storage: StorageClass,
    pub default: Option<ParamValue>,
    /// Run before a buffered Set is accepted into a transaction, and again
    /// at commit time.
    pub validator: Option<ValidatorFn>,
    /// Fired after DB persistence on commit.
    pub change_notify: Option<ChangeNotifyFn>,
    /// Overrides the DB lookup for [`StorageClass::VendorComputed`] params.
    pub getter: Option<GetterFn>,
    /// Overrides the DB write for params whose storage needs vendor handling.
    pub setter: Option<SetterFn>,
    /// Whether the value is XOR-obfuscated before being written to the KV
    /// store.
    pub secure: bool,
}

impl fmt::Debug for ParamDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamDef")
            .field("path_template", &self.path_template)
            .field("param_type", &self.param_type)
            .field("access", &self.access)
            .field("storage", &self.storage)
            .field("secure", &self.secure)
            .finish()
    }
}

impl ParamDef {
    /// A read-write, in-DB string parameter with no validator or callbacks —
    /// the common case for most registrations.
    pub fn simple(path_template: impl Into<String>, param_type: ParamType, access: Access) -> Self {
        Self {
            path_template: path_template.into(),
            param_type,
            access,
            storage: StorageClass::InDb,
            default: None,
            validator: None,
            change_notify: None,
            getter: None,
            setter: None,
            secure: false,
        }
    }

    pub fn with_default(mut self, default: ParamValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_validator(mut self, f: ValidatorFn) -> Self {
        self.validator = Some(f);
        self
    }

    pub fn with_change_notify(mut self, f: ChangeNotifyFn) -> Self {
        self.change_notify = Some(f);
        self
    }

    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }
}

pub type AddValidatorFn = Arc<dyn Fn(&HashMap<String, String>) -> Result<(), UspError> + Send + Sync>;
pub type AddNotifyFn = Arc<dyn Fn(&str, u32) + Send + Sync>;
pub type DeleteNotifyFn = Arc<dyn Fn(&str, u32) + Send + Sync>;
/// Returns the current live instance numbers for the table.
pub type RefreshInstancesFn = Arc<dyn Fn() -> Vec<u32> + Send + Sync>;

/// A registered object (branch) definition.
#[derive(Clone)]
pub struct ObjectDef {
    pub path_template: String,
    pub multi_instance: bool,
    pub add_validator: Option<AddValidatorFn>,
    pub add_notify: Option<AddNotifyFn>,
    pub delete_notify: Option<DeleteNotifyFn>,
    pub refresh_instances: Option<RefreshInstancesFn>,
    /// Instance-cache TTL; `None` means "refresh on every enumeration".
    pub refresh_ttl: Option<Duration>,
}

impl fmt::Debug for ObjectDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectDef")
            .field("path_template", &self.path_template)
            .field("multi_instance", &self.multi_instance)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl ObjectDef {
    pub fn single_instance(path_template: impl Into<String>) -> Self {
        Self {
            path_template: path_template.into(),
            multi_instance: false,
            add_validator: None,
            add_notify: None,
            delete_notify: None,
            refresh_instances: None,
            refresh_ttl: None,
        }
    }

    pub fn multi_instance(path_template: impl Into<String>) -> Self {
        Self { multi_instance: true, ..Self::single_instance(path_template) }
    }

    /// The implicit `…NumberOfEntries` sibling parameter path for a
    /// multi-instance table.
    pub fn number_of_entries_path(&self) -> String {
        let trimmed = self.path_template.trim_end_matches('.').trim_end_matches("{i}").trim_end_matches('.');
        format!("{trimmed}NumberOfEntries")
    }
}

pub type OperationHandlerFn =
    Arc<dyn Fn(&HashMap<String, String>) -> Result<HashMap<String, String>, UspError> + Send + Sync>;

/// A registered USP Operate handler.
#[derive(Clone)]
pub struct OperationDef {
    pub path_template: String,
    pub is_async: bool,
    pub input_args: Vec<String>,
    pub output_args: Vec<String>,
    pub handler: OperationHandlerFn,
}

impl fmt::Debug for OperationDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationDef")
            .field("path_template", &self.path_template)
            .field("is_async", &self.is_async)
            .field("input_args", &self.input_args)
            .field("output_args", &self.output_args)
            .finish()
    }
}

/// A registered USP event definition.
#[derive(Debug, Clone)]
pub struct EventDef {
    pub path_template: String,
    pub args: Vec<String>,
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
