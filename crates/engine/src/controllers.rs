// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Controller Table: the set of controllers this agent will accept requests
//! from, each bound to a named [`TrustRole`]. Registration/removal produce
//! events for `uspa-storage::state::controllers` to apply; role definitions
//! themselves are a small in-memory table built once at startup (akin to
//! the Data Model [`crate::registry::Registry`]) rather than durable state —
//! the set of roles is agent configuration, not controller-supplied data.

use std::collections::HashMap;

use uspa_core::{EndpointId, Event, Permission, TrustRole, UspError};
use uspa_storage::MaterializedState;

pub struct ControllerTable {
    roles: HashMap<String, TrustRole>,
}

impl Default for ControllerTable {
    fn default() -> Self {
        let mut roles = HashMap::new();
        let full = TrustRole::full_access();
        let none = TrustRole::no_access();
        roles.insert(full.name.clone(), full);
        roles.insert(none.name.clone(), none);
        Self { roles }
    }
}

impl ControllerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_role(&mut self, role: TrustRole) {
        self.roles.insert(role.name.clone(), role);
    }

    /// The role bound to `name`, or the built-in no-access role if `name`
    /// does not name a registered role (e.g. state was restored from a WAL
    /// written before the role existed).
    pub fn role(&self, name: &str) -> TrustRole {
        self.roles.get(name).cloned().unwrap_or_else(TrustRole::no_access)
    }

    /// Validate `trust_role` names a known role and produce the registration
    /// event. Re-registering an already-known endpoint is a no-op at the
    /// state layer (`ControllerRegistered` uses `entry().or_insert`), so this
    /// does not itself reject duplicates.
    pub fn register(&self, endpoint_id: EndpointId, trust_role: impl Into<String>) -> Result<Event, UspError> {
        let trust_role = trust_role.into();
        if !self.roles.contains_key(&trust_role) {
            return Err(UspError::InvalidValue(format!("unknown trust role: {trust_role}")));
        }
        Ok(Event::ControllerRegistered { endpoint_id, trust_role })
    }

    pub fn remove(&self, state: &MaterializedState, endpoint_id: &EndpointId) -> Result<Event, UspError> {
        if !state.controllers.contains_key(endpoint_id.as_str()) {
            return Err(UspError::ResolveTargetNotFound(endpoint_id.to_string()));
        }
        Ok(Event::ControllerRemoved { endpoint_id: endpoint_id.clone() })
    }

    /// Whether `endpoint_id` is registered and its bound role grants
    /// `permission`. An unregistered controller is always denied.
    pub fn allows(&self, state: &MaterializedState, endpoint_id: &EndpointId, permission: Permission) -> bool {
        state
            .controllers
            .get(endpoint_id.as_str())
            .map(|record| self.role(&record.trust_role))
            .is_some_and(|role| role.allows(permission))
    }
}

#[cfg(test)]
#[path = "controllers_tests.rs"]
mod tests;
