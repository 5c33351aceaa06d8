// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instance Cache & Refresh: tracks, per multi-instance table,
//! when its live instance numbers were last refreshed from the table's
//! `refresh_instances` callback, and diffs a fresh read against
//! `MaterializedState` to produce the `InstancesRefreshed` event.
//!
//! The cache itself holds only `Instant`s — runtime-only bookkeeping that is
//! never persisted and repopulates (as "due now") the moment the process
//! restarts. The instance numbers it diffs against live in
//! `MaterializedState`, same as every other piece of durable data-model state.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use uspa_core::schema::ObjectDef;
use uspa_core::Event;
use uspa_storage::MaterializedState;

use crate::registry::Registry;

#[derive(Default)]
pub struct InstanceCache {
    last_refreshed: HashMap<String, Instant>,
}

impl InstanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The owning table path (no `{i}` placeholder) for an object's template.
    pub fn table_path(object: &ObjectDef) -> String {
        object.path_template.trim_end_matches("{i}.").to_string()
    }

    fn is_due(&self, object: &ObjectDef, now: Instant) -> bool {
        match object.refresh_ttl {
            None => true,
            Some(ttl) => self
                .last_refreshed
                .get(&object.path_template)
                .map_or(true, |last| now.duration_since(*last) >= ttl),
        }
    }

    /// Every registered multi-instance table with a `refresh_instances`
    /// callback whose TTL has elapsed (or that has never been refreshed).
    pub fn due_tables<'a>(&self, registry: &'a Registry, now: Instant) -> Vec<&'a ObjectDef> {
        registry
            .objects()
            .filter(|object| object.multi_instance && object.refresh_instances.is_some())
            .filter(|object| self.is_due(object, now))
            .collect()
    }

    /// Invoke `object`'s refresh callback, diff the result against `state`,
    /// and record the refresh time. Returns `None` when the live set matches
    /// the cached set exactly — no event is warranted for a no-op refresh.
    pub fn refresh(&mut self, object: &ObjectDef, state: &MaterializedState, now: Instant) -> Option<Event> {
        let callback = object.refresh_instances.as_ref()?;
        let live: HashSet<u32> = callback().into_iter().collect();
        self.last_refreshed.insert(object.path_template.clone(), now);

        let table_path = Self::table_path(object);
        let cached: HashSet<u32> = state.instances_of(&table_path).iter().copied().collect();

        let mut added: Vec<u32> = live.difference(&cached).copied().collect();
        let mut removed: Vec<u32> = cached.difference(&live).copied().collect();
        if added.is_empty() && removed.is_empty() {
            return None;
        }
        added.sort_unstable();
        removed.sort_unstable();
        Some(Event::InstancesRefreshed { table_path, added, removed })
    }
}

#[cfg(test)]
#[path = "instances_tests.rs"]
mod tests;
