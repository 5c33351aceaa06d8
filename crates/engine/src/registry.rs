// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data Model Registry: the table of every Parameter, Object,
//! Operation and Event the agent exposes, built once at startup and then
//! read-only for the life of the process.
//!
//! Registration happens single-threaded during boot, before either the MTP
//! or DM task starts running, so there is no synchronization here beyond
//! what `Registry` itself needs to be shared (immutably) across the two
//! tasks afterward.

use std::collections::HashMap;
use thiserror::Error;
use uspa_core::schema::{EventDef, ObjectDef, OperationDef, ParamDef};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("path template already registered: {0}")]
    DuplicatePath(String),
    #[error("registry is sealed; no further registration is allowed")]
    Sealed,
}

/// The schema table built at startup.
#[derive(Default)]
pub struct Registry {
    params: HashMap<String, ParamDef>,
    objects: HashMap<String, ObjectDef>,
    operations: HashMap<String, OperationDef>,
    events: HashMap<String, EventDef>,
    sealed: bool,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_parameter(&mut self, def: ParamDef) -> Result<(), RegistryError> {
        self.check_open()?;
        if self.params.contains_key(&def.path_template) {
            return Err(RegistryError::DuplicatePath(def.path_template));
        }
        self.params.insert(def.path_template.clone(), def);
        Ok(())
    }

    pub fn register_object(&mut self, def: ObjectDef) -> Result<(), RegistryError> {
        self.check_open()?;
        if self.objects.contains_key(&def.path_template) {
            return Err(RegistryError::DuplicatePath(def.path_template));
        }
        self.objects.insert(def.path_template.clone(), def);
        Ok(())
    }

    pub fn register_operation(&mut self, def: OperationDef) -> Result<(), RegistryError> {
        self.check_open()?;
        if self.operations.contains_key(&def.path_template) {
            return Err(RegistryError::DuplicatePath(def.path_template));
        }
        self.operations.insert(def.path_template.clone(), def);
        Ok(())
    }

    pub fn register_event(&mut self, def: EventDef) -> Result<(), RegistryError> {
        self.check_open()?;
        if self.events.contains_key(&def.path_template) {
            return Err(RegistryError::DuplicatePath(def.path_template));
        }
        self.events.insert(def.path_template.clone(), def);
        Ok(())
    }

    /// Close the registry to further registration; called once at the end
    /// of startup, before the MTP or DM task begins running.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    fn check_open(&self) -> Result<(), RegistryError> {
        if self.sealed {
            return Err(RegistryError::Sealed);
        }
        Ok(())
    }

    /// Finds the parameter definition whose template matches `path` (a
    /// concrete path, `{i}` placeholders replaced with decimal instance
    /// numbers).
    pub fn find_parameter(&self, path: &str) -> Option<&ParamDef> {
        self.params.values().find(|def| template_matches(&def.path_template, path))
    }

    /// Finds the object definition whose template matches `table_path`
    /// (ending in `.` — the owning table, not a concrete instance path).
    pub fn find_object(&self, table_path: &str) -> Option<&ObjectDef> {
        self.objects.values().find(|def| template_matches(&def.path_template, table_path))
    }

    pub fn find_operation(&self, path: &str) -> Option<&OperationDef> {
        self.operations.values().find(|def| template_matches(&def.path_template, path))
    }

    pub fn find_event(&self, path: &str) -> Option<&EventDef> {
        self.events.values().find(|def| template_matches(&def.path_template, path))
    }

    pub fn parameters(&self) -> impl Iterator<Item = &ParamDef> {
        self.params.values()
    }

    pub fn objects(&self) -> impl Iterator<Item = &ObjectDef> {
        self.objects.values()
    }

    pub fn operations(&self) -> impl Iterator<Item = &OperationDef> {
        self.operations.values()
    }

    pub fn events(&self) -> impl Iterator<Item = &EventDef> {
        self.events.values()
    }
}

/// Matches a concrete path against a `{i}`-templated schema path:
/// `Device.LocalAgent.MTP.{i}.Enable` matches `Device.LocalAgent.MTP.3.Enable`.
pub(crate) fn template_matches(template: &str, concrete: &str) -> bool {
    let template_segs: Vec<&str> = template.trim_end_matches('.').split('.').collect();
    let concrete_segs: Vec<&str> = concrete.trim_end_matches('.').split('.').collect();
    if template_segs.len() != concrete_segs.len() {
        return false;
    }
    template_segs.iter().zip(concrete_segs.iter()).all(|(t, c)| *t == "{i}" || t == c)
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
