// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `uspad`: boots the DM task and the MTP task into one process and wires
//! the bounded channels between them (see `uspa_daemon::lib` for why this
//! build uses two `tokio::task`s rather than OS threads).

use std::time::Instant;

use tokio::net::UnixListener;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use uspa_daemon::bdc_stub;
use uspa_daemon::dm_runtime::DmRuntime;
use uspa_daemon::lifecycle::{self, Config};
use uspa_daemon::listener::Listener;
use uspa_daemon::mtp_runtime::MtpRuntime;
use uspa_daemon::{datamodel, identity};

/// Channel depths for the bounded `mpsc` queues between the two tasks —
/// small command structs, never unbounded.
const INBOUND_QUEUE_DEPTH: usize = 256;
const CLI_QUEUE_DEPTH: usize = 32;
const EVENTS_QUEUE_DEPTH: usize = 256;
const EFFECTS_QUEUE_DEPTH: usize = 256;
const BDC_QUEUE_DEPTH: usize = 32;

fn init_tracing(config: &Config) -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(&config.state_dir, "uspad.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    guard
}

#[tokio::main]
async fn main() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("uspad: could not resolve state directory: {err}");
            std::process::exit(1);
        }
    };

    // Held for the process lifetime: dropping it flushes the non-blocking
    // writer's background thread.
    let _tracing_guard = init_tracing(&config);

    info!(version = uspa_daemon::env::PROTOCOL_VERSION, "starting uspad");

    let startup = match lifecycle::startup(&config).await {
        Ok(startup) => startup,
        Err(err) => {
            error!(error = %err, "startup failed");
            std::process::exit(1);
        }
    };

    let identity = match identity::resolve() {
        Ok(identity) => identity,
        Err(err) => {
            error!(error = %err, "failed to resolve agent identity");
            std::process::exit(1);
        }
    };
    info!(endpoint_id = %identity.endpoint_id, "agent identity resolved");

    let registry = match datamodel::build(&identity, Instant::now()) {
        Ok(registry) => registry,
        Err(err) => {
            error!(error = %err, "data model registration failed");
            std::process::exit(1);
        }
    };

    let _ = std::fs::remove_file(&config.socket_path);
    let unix = match UnixListener::bind(&config.socket_path) {
        Ok(unix) => unix,
        Err(err) => {
            error!(path = %config.socket_path.display(), error = %err, "failed to bind cli socket");
            std::process::exit(1);
        }
    };

    let (effects_tx, effects_rx) = mpsc::channel(EFFECTS_QUEUE_DEPTH);
    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_QUEUE_DEPTH);
    let (cli_tx, cli_rx) = mpsc::channel(CLI_QUEUE_DEPTH);
    let (mtp_events_tx, mtp_events_rx) = mpsc::channel(EVENTS_QUEUE_DEPTH);
    // No producer wired up yet (the bulk-data-collector uploader is an
    // external collaborator); held here so the channel stays open for the
    // stub's lifetime instead of closing immediately.
    let (_bdc_tx, bdc_rx) = mpsc::channel(BDC_QUEUE_DEPTH);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let dm_runtime =
        DmRuntime::new(registry, startup.state, startup.wal, startup.checkpointer, effects_tx);
    let mtp_runtime = MtpRuntime::new(inbound_tx, mtp_events_tx);
    let cli_listener = Listener::new(unix, cli_tx);

    let mtp_task = tokio::spawn(mtp_runtime.run(effects_rx, shutdown_rx.clone()));
    let listener_task = tokio::spawn(cli_listener.run(shutdown_rx.clone()));
    let bdc_task = tokio::spawn(bdc_stub::run(bdc_rx, shutdown_rx.clone()));
    let signal_task = tokio::spawn(wait_for_shutdown_signal(shutdown_tx));

    // The DM task runs on the main task: it drains its queues to a
    // quiescent point (checkpointing once more) before this function
    // returns.
    dm_runtime.run(inbound_rx, cli_rx, mtp_events_rx, shutdown_rx).await;

    let _ = listener_task.await;
    let _ = mtp_task.await;
    let _ = bdc_task.await;
    signal_task.abort();

    lifecycle::cleanup(&config);
    info!("uspad stopped");
}

/// Waits for SIGTERM or SIGINT (Ctrl-C) and broadcasts the stop signal on
/// `shutdown_tx` exactly once: graceful shutdown broadcasts a stop signal
/// and each task drains its input queue to a quiescent point before exiting.
async fn wait_for_shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(err) => {
            warn!(error = %err, "failed to install SIGTERM handler");
            return;
        }
    };
    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM"),
        _ = tokio::signal::ctrl_c() => info!("received SIGINT"),
    }
    let _ = shutdown_tx.send(true);
}
