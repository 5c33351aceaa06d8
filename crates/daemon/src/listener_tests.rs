// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Instant;

use tempfile::tempdir;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, watch};
use uspa_core::{LocalAgentIdentity, SerialSource};
use uspa_storage::{Checkpointer, MaterializedState, Wal};
use uspa_wire::{CliRequest, CliResponse};

use super::*;
use crate::dm_runtime::DmRuntime;

fn identity() -> LocalAgentIdentity {
    LocalAgentIdentity::derive("00D09E", "USPAgent", SerialSource::Explicit("0000001".to_string()), None)
        .expect("derive identity")
}

#[tokio::test]
async fn a_get_request_round_trips_over_the_socket() {
    let dir = tempdir().unwrap();
    let sock_path = dir.path().join("uspad.sock");
    let unix = UnixListener::bind(&sock_path).unwrap();

    let registry = crate::datamodel::build(&identity(), Instant::now()).unwrap();
    let wal = Wal::open(dir.path().join("wal.log"), 0).unwrap();
    let checkpointer = Checkpointer::new(dir.path().join("snapshot.bin"));
    let (effects_tx, mut effects_rx) = mpsc::channel(32);
    tokio::spawn(async move { while effects_rx.recv().await.is_some() {} });

    let runtime = DmRuntime::new(registry, MaterializedState::default(), wal, checkpointer, effects_tx);
    let (inbound_tx, inbound_rx) = mpsc::channel(8);
    let (cli_tx, cli_rx) = mpsc::channel(8);
    let (mtp_events_tx, mtp_events_rx) = mpsc::channel(8);
    drop(inbound_tx);
    drop(mtp_events_tx);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let dm_task = tokio::spawn(runtime.run(inbound_rx, cli_rx, mtp_events_rx, shutdown_rx.clone()));
    let listener = Listener::new(unix, cli_tx);
    let listener_task = tokio::spawn(listener.run(shutdown_rx));

    let mut client = UnixStream::connect(&sock_path).await.unwrap();
    let request = CliRequest::Get { paths: vec!["Device.LocalAgent.EndpointID".to_string()] };
    uspa_wire::write_frame(&mut client, &request).await.unwrap();
    let response: CliResponse = uspa_wire::read_frame(&mut client).await.unwrap().unwrap();

    let CliResponse::Get { results } = response else { panic!("expected a Get response") };
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].value.as_deref(), Some(identity().endpoint_id.as_str()));

    let _ = shutdown_tx.send(true);
    let _ = listener_task.await;
    let _ = dm_task.await;
}

#[tokio::test]
async fn a_connection_that_sends_no_bytes_is_dropped_without_panicking() {
    let dir = tempdir().unwrap();
    let sock_path = dir.path().join("uspad.sock");
    let unix = UnixListener::bind(&sock_path).unwrap();
    let (cli_tx, mut cli_rx) = mpsc::channel(8);
    tokio::spawn(async move { while cli_rx.recv().await.is_some() {} });
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let listener = Listener::new(unix, cli_tx);
    let listener_task = tokio::spawn(listener.run(shutdown_rx));

    let client = UnixStream::connect(&sock_path).await.unwrap();
    drop(client);

    let _ = shutdown_tx.send(true);
    let _ = listener_task.await;
}
