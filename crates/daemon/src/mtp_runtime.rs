// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The MTP task: owns every live transport
//! binding and nothing else. It never sees `MaterializedState` or the
//! `Registry` — `uspa-adapters` deliberately doesn't depend on `uspa-engine`
//! (see that crate's own doc comment) — so everything it needs to dial out
//! arrives pre-resolved on an [`Effect::StartMtp`], and everything it learns
//! about the transport's own health it reports back as an `Event` for the
//! DM task to fold into `Device.LocalAgent.MTP.{i}.Status`.
//!
//! One row, one background task: [`MtpRuntime::run`] only ever starts or
//! stops a row's task and forwards `Send`/`ScheduleStompReconnect` effects
//! to it over a small per-row command channel. The row task is the only code
//! path that ever calls the adapter's `&mut self` methods, so a slow
//! broker read never blocks another row's send.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::warn;

use uspa_adapters::mtp::coap::CoapConfig;
use uspa_adapters::{CoapListener, MtpAdapter, MtpError, MtpStatus, StompConfig, StompConnection};
use uspa_core::{Effect, Event, InboundRecord, MtpStartConfig};

enum RowAdapter {
    Stomp(StompConnection),
    Coap(CoapListener),
}

impl RowAdapter {
    async fn start(&mut self) -> Result<(), MtpError> {
        match self {
            RowAdapter::Stomp(c) => c.start().await,
            RowAdapter::Coap(c) => c.start().await,
        }
    }

    async fn stop(&mut self) -> Result<(), MtpError> {
        match self {
            RowAdapter::Stomp(c) => c.stop().await,
            RowAdapter::Coap(c) => c.stop().await,
        }
    }

    async fn send(&mut self, bytes: Vec<u8>) -> Result<(), MtpError> {
        match self {
            RowAdapter::Stomp(c) => c.send(bytes).await,
            RowAdapter::Coap(c) => c.send(bytes).await,
        }
    }

    fn status(&self) -> MtpStatus {
        match self {
            RowAdapter::Stomp(c) => c.status(),
            RowAdapter::Coap(c) => c.status(),
        }
    }

    /// Wait for the next complete inbound Record. Never returns `Ok(None)`
    /// forever — a STOMP connection that drops reports `Err` and the row
    /// loop falls back to its reconnect tick; a CoAP listener simply blocks
    /// on its socket until the next datagram.
    async fn poll_inbound(&mut self) -> Result<Option<Vec<u8>>, MtpError> {
        match self {
            RowAdapter::Stomp(c) => c.poll_incoming().await,
            RowAdapter::Coap(c) => c.poll_inbound().await,
        }
    }

    async fn tick(&mut self) {
        if let RowAdapter::Stomp(c) = self {
            c.tick().await;
        }
    }

    fn request_reconnect(&self) {
        if let RowAdapter::Stomp(c) = self {
            c.request_reconnect();
        }
    }

    fn protocol(&self) -> &'static str {
        match self {
            RowAdapter::Stomp(_) => "STOMP",
            RowAdapter::Coap(_) => "CoAP",
        }
    }
}

fn build_adapter(mtp_id: u32, config: MtpStartConfig) -> Result<RowAdapter, MtpError> {
    match config {
        MtpStartConfig::Stomp { host, port, login, passcode, destination, tls } => {
            let mut stomp_config = StompConfig::new(host, port, destination);
            stomp_config.login = login;
            stomp_config.passcode = passcode;
            stomp_config.tls = tls;
            Ok(RowAdapter::Stomp(StompConnection::new(mtp_id, stomp_config)))
        }
        MtpStartConfig::Coap { bind_addr, resource_path } => {
            let addr: SocketAddr = bind_addr
                .parse()
                .map_err(|_| MtpError::Protocol(format!("invalid CoAP bind address: {bind_addr}")))?;
            Ok(RowAdapter::Coap(CoapListener::new(mtp_id, CoapConfig::new(addr, resource_path))))
        }
    }
}

enum RowCommand {
    Send(Vec<u8>),
    ScheduleReconnect,
    Stop,
}

/// How often a STOMP row's reconnect flag is drained while no inbound bytes
/// are arriving to otherwise wake the row's loop.
fn stomp_tick_period() -> Duration {
    Duration::from_secs(1)
}

struct RowHandle {
    cmd_tx: mpsc::Sender<RowCommand>,
}

/// Owns every live Agent MTP Table row's transport binding. Never
/// holds a reference to `MaterializedState` or the `Registry` — everything
/// it needs arrives over `effects_rx`, and everything it learns is reported
/// back over `inbound_tx`/`events_tx`.
pub struct MtpRuntime {
    rows: HashMap<u32, RowHandle>,
    inbound_tx: mpsc::Sender<InboundRecord>,
    events_tx: mpsc::Sender<Event>,
}

impl MtpRuntime {
    pub fn new(inbound_tx: mpsc::Sender<InboundRecord>, events_tx: mpsc::Sender<Event>) -> Self {
        Self { rows: HashMap::new(), inbound_tx, events_tx }
    }

    pub async fn run(mut self, mut effects_rx: mpsc::Receiver<Effect>, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                maybe_effect = effects_rx.recv() => {
                    match maybe_effect {
                        Some(effect) => self.handle_effect(effect).await,
                        None => break,
                    }
                }
            }
        }
        for (_, row) in self.rows.drain() {
            let _ = row.cmd_tx.send(RowCommand::Stop).await;
        }
    }

    async fn handle_effect(&mut self, effect: Effect) {
        match effect {
            Effect::StartMtp { mtp_id, config } => self.start_row(mtp_id, config).await,
            Effect::StopMtp { mtp_id } => self.stop_row(mtp_id).await,
            Effect::ScheduleStompReconnect { conn_id } => {
                if let Some(row) = self.rows.get(&conn_id) {
                    let _ = row.cmd_tx.send(RowCommand::ScheduleReconnect).await;
                }
            }
            Effect::SendUspRecord { mtp_hint, bytes, .. } => self.send_record(mtp_hint, bytes).await,
            // Timer and Operate effects are handled entirely on the DM side
            // (`uspa_engine::timer`, `DmRuntime::spawn_operation`); a
            // `RefreshInstances`/`Emit` never crosses to this task either.
            Effect::SetTimer { .. }
            | Effect::CancelTimer { .. }
            | Effect::RefreshInstances { .. }
            | Effect::InvokeOperation { .. }
            | Effect::Emit { .. } => {
                warn!(effect = effect.name(), "effect unexpectedly routed to the MTP task");
            }
        }
    }

    async fn start_row(&mut self, mtp_id: u32, config: MtpStartConfig) {
        if self.rows.contains_key(&mtp_id) {
            return;
        }
        let protocol = config.protocol_name().to_string();
        let coap_port = match &config {
            MtpStartConfig::Coap { bind_addr, .. } => bind_addr.rsplit(':').next().and_then(|p| p.parse().ok()),
            MtpStartConfig::Stomp { .. } => None,
        };
        let mut adapter = match build_adapter(mtp_id, config) {
            Ok(adapter) => adapter,
            Err(err) => {
                warn!(mtp_id, error = %err, "failed to build mtp adapter");
                let _ = self.events_tx.send(Event::CoapBindFailed { mtp_id, message: err.to_string() }).await;
                return;
            }
        };
        if let Err(err) = adapter.start().await {
            warn!(mtp_id, protocol, error = %err, "failed to start mtp transport");
            let event = match &adapter {
                RowAdapter::Coap(_) => Event::CoapBindFailed { mtp_id, message: err.to_string() },
                RowAdapter::Stomp(_) => Event::StompStateChanged { conn_id: mtp_id, state: "RETRY_WAIT".to_string() },
            };
            let _ = self.events_tx.send(event).await;
            return;
        }

        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        self.rows.insert(mtp_id, RowHandle { cmd_tx });
        let inbound_tx = self.inbound_tx.clone();
        let events_tx = self.events_tx.clone();
        tokio::spawn(run_row(mtp_id, protocol, coap_port, adapter, cmd_rx, inbound_tx, events_tx));
    }

    async fn stop_row(&mut self, mtp_id: u32) {
        if let Some(row) = self.rows.remove(&mtp_id) {
            let _ = row.cmd_tx.send(RowCommand::Stop).await;
        }
        let _ = self.events_tx.send(Event::MtpStopped { mtp_id }).await;
    }

    /// `mtp_hint` names the row to use when the caller already knows it
    /// (replying on the MTP a request arrived on); otherwise the first row
    /// reporting `Up` is used.
    async fn send_record(&mut self, mtp_hint: Option<u32>, bytes: Vec<u8>) {
        let target = match mtp_hint {
            Some(id) if self.rows.contains_key(&id) => Some(id),
            Some(_) | None => self.rows.keys().next().copied(),
        };
        let Some(mtp_id) = target else {
            warn!("no mtp row available to send a record");
            return;
        };
        if let Some(row) = self.rows.get(&mtp_id) {
            if row.cmd_tx.send(RowCommand::Send(bytes)).await.is_err() {
                warn!(mtp_id, "mtp row task gone, dropping outbound record");
            }
        }
    }
}

async fn poll_inbound_if_up(adapter: &mut RowAdapter) -> Result<Option<Vec<u8>>, MtpError> {
    if matches!(adapter.status(), MtpStatus::Up) {
        adapter.poll_inbound().await
    } else {
        std::future::pending().await
    }
}

async fn run_row(
    mtp_id: u32,
    protocol: String,
    coap_port: Option<u16>,
    mut adapter: RowAdapter,
    mut cmd_rx: mpsc::Receiver<RowCommand>,
    inbound_tx: mpsc::Sender<InboundRecord>,
    events_tx: mpsc::Sender<Event>,
) {
    let _ = events_tx.send(Event::MtpStarted { mtp_id, protocol: protocol.clone() }).await;
    match (&adapter, adapter.status()) {
        (RowAdapter::Coap(_), MtpStatus::Up) => {
            let _ = events_tx.send(Event::CoapBound { mtp_id, port: coap_port.unwrap_or(0) }).await;
        }
        (RowAdapter::Coap(_), _) => {
            let _ = events_tx.send(Event::CoapBindFailed { mtp_id, message: "bind failed".to_string() }).await;
        }
        (RowAdapter::Stomp(_), MtpStatus::Up) => {
            let _ = events_tx.send(Event::StompStateChanged { conn_id: mtp_id, state: "RUNNING".to_string() }).await;
        }
        (RowAdapter::Stomp(_), _) => {
            let _ = events_tx.send(Event::StompStateChanged { conn_id: mtp_id, state: "RETRY_WAIT".to_string() }).await;
        }
    }

    let mut tick = tokio::time::interval(stomp_tick_period());
    loop {
        tokio::select! {
            biased;

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(RowCommand::Stop) | None => break,
                    Some(RowCommand::Send(bytes)) => {
                        if let Err(err) = adapter.send(bytes).await {
                            warn!(mtp_id, error = %err, "failed to send record");
                        }
                    }
                    Some(RowCommand::ScheduleReconnect) => adapter.request_reconnect(),
                }
            }
            // Only polled while the transport actually reports `Up` —
            // otherwise a dropped STOMP socket's immediate `NotConnected`
            // would spin this branch hot until the next reconnect tick.
            inbound = poll_inbound_if_up(&mut adapter) => {
                match inbound {
                    Ok(Some(bytes)) => {
                        if inbound_tx.send(InboundRecord { mtp_id, bytes }).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(err) => {
                        warn!(mtp_id, error = %err, "mtp transport read failed");
                        let status = match &adapter {
                            RowAdapter::Stomp(_) => Event::StompStateChanged { conn_id: mtp_id, state: "RETRY_WAIT".to_string() },
                            RowAdapter::Coap(_) => Event::CoapBindFailed { mtp_id, message: err.to_string() },
                        };
                        let _ = events_tx.send(status).await;
                    }
                }
            }
            _ = tick.tick() => {
                adapter.tick().await;
                if matches!(adapter, RowAdapter::Stomp(_)) && matches!(adapter.status(), MtpStatus::Up) {
                    let _ = events_tx.send(Event::StompStateChanged { conn_id: mtp_id, state: "RUNNING".to_string() }).await;
                }
            }
        }
    }
    let _ = adapter.stop().await;
}

#[cfg(test)]
#[path = "mtp_runtime_tests.rs"]
mod tests;
