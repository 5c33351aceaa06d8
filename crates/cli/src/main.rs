// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! `usp-cli`: the local command-line surface — data-model get/set/add/delete,
//! a database dump, and trigger actions — dialed over the Unix-domain stream
//! socket `uspad` serves.
//!
//! This binary is a thin transport: every request it sends is answered
//! entirely by the DM task (`uspa_daemon::dm_runtime::DmRuntime::handle_cli_request`).
//! `usp-cli` itself holds no data-model state and applies no trust checks —
//! the local socket is the trust boundary.

mod env;

use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::UnixStream;
use uspa_wire::{CliRequest, CliResponse};

#[derive(Parser)]
#[command(name = "usp-cli", version, about = "Local CLI for the USP agent (uspad)")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Get one or more data-model paths (may be search expressions).
    Get {
        /// Paths or path expressions to read.
        paths: Vec<String>,
    },
    /// Set one or more `path=value` pairs.
    Set {
        /// `path=value` pairs to write.
        updates: Vec<String>,
        /// Commit whatever subset validates, rather than all-or-nothing.
        #[arg(long)]
        allow_partial: bool,
    },
    /// Add an instance to a multi-instance object.
    Add {
        /// The table path, e.g. `Device.LocalAgent.MTP.`.
        obj_path: String,
        /// `param=value` pairs for the new instance.
        params: Vec<String>,
    },
    /// Delete one or more object instance paths.
    Delete {
        /// Object instance paths to delete.
        obj_paths: Vec<String>,
        /// Delete whatever subset succeeds, rather than all-or-nothing.
        #[arg(long)]
        allow_partial: bool,
    },
    /// Dump every row in the database.
    Dump,
    /// Trigger an out-of-band agent action.
    Trigger {
        #[command(subcommand)]
        action: TriggerAction,
    },
}

#[derive(Subcommand)]
enum TriggerAction {
    /// Reset the data model to factory defaults.
    FactoryReset,
    /// Schedule an immediate reconnect of a STOMP connection.
    StompReconnect {
        /// The `Device.LocalAgent.MTP.{i}` instance number.
        conn_id: u32,
    },
}

fn parse_pair(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw.split_once('=').ok_or_else(|| anyhow!("expected `path=value`, got `{raw}`"))?;
    Ok((key.to_string(), value.to_string()))
}

fn build_request(command: Command) -> Result<CliRequest> {
    Ok(match command {
        Command::Get { paths } => CliRequest::Get { paths },
        Command::Set { updates, allow_partial } => {
            let updates = updates.iter().map(|s| parse_pair(s)).collect::<Result<Vec<_>>>()?;
            CliRequest::Set { updates, allow_partial }
        }
        Command::Add { obj_path, params } => {
            let param_settings: HashMap<String, String> =
                params.iter().map(|s| parse_pair(s)).collect::<Result<_>>()?;
            CliRequest::Add { obj_path, param_settings }
        }
        Command::Delete { obj_paths, allow_partial } => CliRequest::Delete { obj_paths, allow_partial },
        Command::Dump => CliRequest::Dump,
        Command::Trigger { action: TriggerAction::FactoryReset } => CliRequest::TriggerFactoryReset,
        Command::Trigger { action: TriggerAction::StompReconnect { conn_id } } => {
            CliRequest::TriggerStompReconnect { conn_id }
        }
    })
}

fn print_response(response: &CliResponse) {
    match response {
        CliResponse::Get { results } | CliResponse::Set { results } => {
            for result in results {
                match (&result.value, &result.err_code) {
                    (Some(value), _) => println!("{} => {value}", result.path),
                    (None, Some(code)) => {
                        println!("{} => ERROR {code} {}", result.path, result.err_msg.as_deref().unwrap_or(""))
                    }
                    (None, None) => println!("{} => (no value)", result.path),
                }
            }
        }
        CliResponse::Add { path, instance } => println!("{path}{instance} added"),
        CliResponse::Delete { affected_paths } => {
            for path in affected_paths {
                println!("deleted {path}");
            }
        }
        CliResponse::Dump { rows } => {
            let mut keys: Vec<_> = rows.keys().collect();
            keys.sort();
            for key in keys {
                println!("{key} = {}", rows[key]);
            }
        }
        CliResponse::Ack => println!("ok"),
        CliResponse::Error { err_code, err_msg } => eprintln!("error {err_code}: {err_msg}"),
    }
}

async fn send_request(request: &CliRequest) -> Result<CliResponse> {
    let socket_path = env::socket_path().context("could not determine state directory")?;
    let mut stream = UnixStream::connect(&socket_path)
        .await
        .with_context(|| format!("could not connect to uspad at {}", socket_path.display()))?;
    uspa_wire::write_frame(&mut stream, request).await.context("failed to send request")?;
    uspa_wire::read_frame(&mut stream)
        .await
        .context("failed to read response")?
        .ok_or_else(|| anyhow!("uspad closed the connection without replying"))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli.command).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("usp-cli: {err:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

async fn run(command: Command) -> Result<i32> {
    let request = build_request(command)?;
    let response = send_request(&request).await?;
    print_response(&response);
    Ok(response.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pair_splits_on_first_equals() {
        let (k, v) = parse_pair("Device.A.B=x=y").unwrap();
        assert_eq!(k, "Device.A.B");
        assert_eq!(v, "x=y");
    }

    #[test]
    fn parse_pair_rejects_missing_equals() {
        assert!(parse_pair("no-equals-here").is_err());
    }

    #[test]
    fn build_request_maps_trigger_stomp_reconnect() {
        let command = Command::Trigger { action: TriggerAction::StompReconnect { conn_id: 3 } };
        let CliRequest::TriggerStompReconnect { conn_id } = build_request(command).unwrap() else {
            panic!("expected TriggerStompReconnect");
        };
        assert_eq!(conn_id, 3);
    }
}
