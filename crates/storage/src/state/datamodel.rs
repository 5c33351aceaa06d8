// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data-model event handlers: parameter values and object instances.

use uspa_core::Event;

use super::MaterializedState;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::ParamValueSet { path, value } => {
            state.params.insert(path.clone(), value.clone());
        }

        Event::ObjectAdded { table_path, instance } => {
            let instances = state.instances.entry(table_path.clone()).or_default();
            if !instances.contains(instance) {
                instances.push(*instance);
                instances.sort_unstable();
            }
            let high_water = state.instance_high_water.entry(table_path.clone()).or_insert(0);
            if *instance > *high_water {
                *high_water = *instance;
            }
        }

        Event::ObjectDeleted { table_path, instance } => {
            if let Some(instances) = state.instances.get_mut(table_path) {
                instances.retain(|i| i != instance);
            }
            let prefix = format!("{table_path}{instance}.");
            state.params.retain(|path, _| !path.starts_with(&prefix));
        }

        Event::InstancesRefreshed { table_path, added, removed } => {
            let instances = state.instances.entry(table_path.clone()).or_default();
            for i in added {
                if !instances.contains(i) {
                    instances.push(*i);
                }
            }
            instances.retain(|i| !removed.contains(i));
            instances.sort_unstable();
            if let Some(&max_added) = added.iter().max() {
                let high_water = state.instance_high_water.entry(table_path.clone()).or_insert(0);
                if max_added > *high_water {
                    *high_water = max_added;
                }
            }
        }

        Event::FactoryReset { .. } => {
            state.params.clear();
            state.instances.clear();
            state.instance_high_water.clear();
        }

        // Commit/abort bookkeeping carries no state of its own — the
        // individual ParamValueSet/ObjectAdded/ObjectDeleted events already
        // applied within the transaction are what's durable.
        Event::TransactionCommitted { .. } | Event::TransactionAborted { .. } => {}

        _ => {}
    }
}

#[cfg(test)]
#[path = "datamodel_tests.rs"]
mod tests;
