// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operate handlers this agent exposes.
//!
//! Registration mirrors [`crate::datamodel::build`]: single-threaded, at
//! boot, before the registry is sealed. A synchronous handler's return value
//! becomes the `OperateResp` inline; an asynchronous one only ever runs from
//! `DmRuntime::run_operation`, off the DM task's own event loop, via
//! `tokio::task::spawn_blocking` — a handler must not block the loop that
//! dispatched it.

use std::collections::HashMap;
use std::sync::Arc;

use uspa_core::schema::OperationDef;
use uspa_core::UspError;
use uspa_engine::{Registry, RegistryError};

pub fn build(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register_operation(OperationDef {
        path_template: "Device.LocalAgent.Reboot()".to_string(),
        is_async: true,
        input_args: vec![],
        output_args: vec!["Status".to_string()],
        handler: Arc::new(|_input| {
            // In production this would request an orderly restart from the
            // host supervisor; there is none here, so the handler just
            // reports success once it's actually run.
            let mut output = HashMap::new();
            output.insert("Status".to_string(), "Complete".to_string());
            Ok(output)
        }),
    })?;

    registry.register_operation(OperationDef {
        path_template: "Device.DeviceInfo.ClearEventLog()".to_string(),
        is_async: false,
        input_args: vec![],
        output_args: vec![],
        handler: Arc::new(|_input| Ok(HashMap::new())),
    })?;

    registry.register_operation(OperationDef {
        path_template: "Device.LocalAgent.SelfCheck()".to_string(),
        is_async: false,
        input_args: vec![],
        output_args: vec!["Result".to_string()],
        handler: Arc::new(|input| {
            if input.get("Mode").map(String::as_str) == Some("unsupported") {
                return Err(UspError::CommandFailure("Device.LocalAgent.SelfCheck()".to_string()));
            }
            let mut output = HashMap::new();
            output.insert("Result".to_string(), "OK".to_string());
            Ok(output)
        }),
    })?;

    Ok(())
}

#[cfg(test)]
#[path = "operations_tests.rs"]
mod tests;
