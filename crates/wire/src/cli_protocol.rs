// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The request/response shapes `usp-cli` exchanges with `uspad` over the
//! local Unix-domain socket: data-model
//! get/set/add/delete, a database dump, and trigger actions (factory reset,
//! scheduling a STOMP reconnect). Framed with [`crate::ipc`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CliRequest {
    Get { paths: Vec<String> },
    Set { updates: Vec<(String, String)>, allow_partial: bool },
    Add { obj_path: String, param_settings: HashMap<String, String> },
    Delete { obj_paths: Vec<String>, allow_partial: bool },
    Dump,
    TriggerFactoryReset,
    TriggerStompReconnect { conn_id: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliPathResult {
    pub path: String,
    pub value: Option<String>,
    pub err_code: Option<u32>,
    pub err_msg: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CliResponse {
    Get { results: Vec<CliPathResult> },
    Set { results: Vec<CliPathResult> },
    Add { path: String, instance: u32 },
    Delete { affected_paths: Vec<String> },
    Dump { rows: HashMap<String, String> },
    Ack,
    Error { err_code: u32, err_msg: String },
}

impl CliResponse {
    /// Exit code convention for `usp-cli`: 0 on success, non-zero on CLI
    /// transport or handler failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliResponse::Error { .. } => 1,
            _ => 0,
        }
    }
}

#[cfg(test)]
#[path = "cli_protocol_tests.rs"]
mod tests;
