// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Instant;

use tempfile::tempdir;
use tokio::sync::{mpsc, oneshot};
use uspa_core::{LocalAgentIdentity, SerialSource};
use uspa_storage::{Checkpointer, Wal};
use uspa_wire::CliResponse;

use super::*;

fn identity() -> LocalAgentIdentity {
    LocalAgentIdentity::derive("00D09E", "USPAgent", SerialSource::Explicit("0000001".to_string()), None)
        .expect("derive identity")
}

fn runtime(dir: &std::path::Path) -> (DmRuntime, mpsc::Receiver<Effect>) {
    let registry = crate::datamodel::build(&identity(), Instant::now()).expect("build registry");
    let wal = Wal::open(dir.join("wal.log"), 0).expect("open wal");
    let checkpointer = Checkpointer::new(dir.join("snapshot.bin"));
    let (effects_tx, effects_rx) = mpsc::channel(32);
    (DmRuntime::new(registry, MaterializedState::default(), wal, checkpointer, effects_tx), effects_rx)
}

async fn cli(runtime: &mut DmRuntime, request: CliRequest) -> CliResponse {
    runtime.handle_cli_request(request).await
}

#[tokio::test]
async fn get_returns_the_bootstrapped_endpoint_id() {
    let dir = tempdir().unwrap();
    let (mut runtime, _effects) = runtime(dir.path());

    let CliResponse::Get { results } = cli(&mut runtime, CliRequest::Get { paths: vec!["Device.LocalAgent.EndpointID".to_string()] }).await else {
        panic!("expected a Get response");
    };
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].value.as_deref(), Some(identity().endpoint_id.as_str()));
}

#[tokio::test]
async fn adding_a_subscription_row_registers_it_with_the_subscription_engine() {
    let dir = tempdir().unwrap();
    let (mut runtime, mut effects) = runtime(dir.path());

    let mut settings = std::collections::HashMap::new();
    settings.insert("Recipient".to_string(), "self::controller-1".to_string());
    settings.insert("NotifType".to_string(), "ObjectCreation".to_string());
    settings.insert("ReferenceList".to_string(), "Device.STOMP.Connection.".to_string());
    let response = cli(
        &mut runtime,
        CliRequest::Add { obj_path: "Device.LocalAgent.Subscription.".to_string(), param_settings: settings },
    )
    .await;
    let CliResponse::Add { instance, .. } = response else { panic!("expected an Add response, got {response:?}") };

    let mut stomp_settings = std::collections::HashMap::new();
    stomp_settings.insert("Host".to_string(), "controller.example.com".to_string());
    cli(&mut runtime, CliRequest::Add { obj_path: "Device.STOMP.Connection.".to_string(), param_settings: stomp_settings })
        .await;

    let mut saw_notify = false;
    while let Ok(effect) = effects.try_recv() {
        if let Effect::SendUspRecord { .. } = effect {
            saw_notify = true;
        }
    }
    assert!(saw_notify, "adding Device.STOMP.Connection. should have fired the ObjectCreation subscription");
    assert!(instance >= 1);
}

#[tokio::test]
async fn adding_a_subscription_with_an_unsupported_notif_type_is_denied() {
    let dir = tempdir().unwrap();
    let (mut runtime, _effects) = runtime(dir.path());

    let mut settings = std::collections::HashMap::new();
    settings.insert("Recipient".to_string(), "self::controller-1".to_string());
    settings.insert("NotifType".to_string(), "Telekinesis".to_string());
    let response = cli(
        &mut runtime,
        CliRequest::Add { obj_path: "Device.LocalAgent.Subscription.".to_string(), param_settings: settings },
    )
    .await;
    assert!(matches!(response, CliResponse::Error { .. }));
}

#[tokio::test]
async fn deleting_a_subscription_row_forgets_its_value_change_watch() {
    let dir = tempdir().unwrap();
    let (mut runtime, _effects) = runtime(dir.path());

    let mut settings = std::collections::HashMap::new();
    settings.insert("Recipient".to_string(), "self::controller-1".to_string());
    settings.insert("NotifType".to_string(), "ValueChange".to_string());
    settings.insert("ReferenceList".to_string(), "Device.DeviceInfo.UpTime".to_string());
    let response = cli(
        &mut runtime,
        CliRequest::Add { obj_path: "Device.LocalAgent.Subscription.".to_string(), param_settings: settings },
    )
    .await;
    let CliResponse::Add { instance, .. } = response else { panic!("expected an Add response, got {response:?}") };

    let response = cli(
        &mut runtime,
        CliRequest::Delete {
            obj_paths: vec![format!("Device.LocalAgent.Subscription.{instance}.")],
            allow_partial: false,
        },
    )
    .await;
    assert!(matches!(response, CliResponse::Delete { .. }));
}

#[tokio::test]
async fn an_async_operation_completes_off_the_loop_and_is_cleared_from_pending() {
    let dir = tempdir().unwrap();
    let (mut runtime, _effects) = runtime(dir.path());

    runtime.spawn_operation(
        "cmd-1".to_string(),
        "Device.LocalAgent.Reboot()".to_string(),
        std::collections::HashMap::new(),
    );
    assert_eq!(runtime.pending_operations.get("cmd-1").map(String::as_str), Some("Device.LocalAgent.Reboot()"));

    let event = runtime.op_events_rx.recv().await.expect("operation completion event");
    match &event {
        Event::OperationCompleted { command_key, success } => {
            assert_eq!(command_key, "cmd-1");
            assert!(*success);
        }
        other => panic!("unexpected event: {other:?}"),
    }

    runtime.apply_events_and_notify(vec![event]);
    assert!(!runtime.pending_operations.contains_key("cmd-1"));
}

#[tokio::test]
async fn invoking_an_unregistered_operation_is_silently_dropped() {
    let dir = tempdir().unwrap();
    let (mut runtime, _effects) = runtime(dir.path());

    runtime.spawn_operation("cmd-x".to_string(), "Device.LocalAgent.NoSuchOp()".to_string(), std::collections::HashMap::new());
    assert!(runtime.pending_operations.is_empty());

    // the oneshot-less drop path: nothing was scheduled, so the channel
    // should have no completion waiting for it.
    assert!(runtime.op_events_rx.try_recv().is_err());
}

#[tokio::test]
async fn cli_reply_channel_delivers_the_response() {
    let dir = tempdir().unwrap();
    let (mut runtime, _effects) = runtime(dir.path());
    let (reply_tx, reply_rx) = oneshot::channel();
    runtime
        .handle_cli(CliCommand { request: CliRequest::Dump, reply: reply_tx })
        .await;
    let response = reply_rx.await.expect("reply delivered");
    assert!(matches!(response, CliResponse::Dump { .. }));
}
