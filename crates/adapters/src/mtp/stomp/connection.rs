// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! STOMP connection state machine.
//!
//! `IDLE -> CONNECTING -> AWAITING_CONNECTED -> SUBSCRIBING -> RUNNING`, with
//! any transport error dropping back to `RETRY_WAIT` behind
//! [`uspa_core::BackoffPolicy::stomp_reconnect`]. A flood of
//! `Effect::ScheduleStompReconnect` (e.g. a 100-connection reconnect storm
//! from a broker bounce) collapses into exactly one reconnect attempt per
//! backoff tick, because the request is a dirty flag rather than a queued
//! command.

use crate::capability::{MtpAdapter, MtpError, MtpStatus};
use crate::mtp::stomp::frame::{FrameDecoder, StompFrame};
use async_trait::async_trait;
use rand::Rng;
use std::collections::HashMap;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;
use tracing::{debug, info, warn};
use uspa_core::BackoffPolicy;

/// How long a SEND waits for its `RECEIPT` before the connection gives up
/// on it and drops to `RETRY_WAIT` (spec §4.7: "a failing receipt promotes
/// to RETRY_WAIT").
const RECEIPT_TIMEOUT: Duration = Duration::from_secs(10);

/// Broker connection parameters for one Agent MTP Table row.
#[derive(Debug, Clone)]
pub struct StompConfig {
    pub host: String,
    pub port: u16,
    pub login: Option<String>,
    pub passcode: Option<String>,
    pub agent_destination: String,
    pub tls: bool,
}

impl StompConfig {
    pub fn new(host: impl Into<String>, port: u16, agent_destination: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            login: None,
            passcode: None,
            agent_destination: agent_destination.into(),
            tls: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnState {
    Idle,
    Connecting,
    AwaitingConnected,
    Subscribing,
    Running,
    Disconnecting,
    RetryWait,
    Error,
}

trait AsyncStream: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> AsyncStream for T {}

enum Transport {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl AsyncRead for Transport {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Transport::Plain(s) => Pin::new(s).poll_read(cx, buf),
            Transport::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Transport {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Transport::Plain(s) => Pin::new(s).poll_write(cx, buf),
            Transport::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Transport::Plain(s) => Pin::new(s).poll_flush(cx),
            Transport::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Transport::Plain(s) => Pin::new(s).poll_shutdown(cx),
            Transport::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

/// One STOMP broker connection, keyed by `conn_id` in the Agent MTP Table.
pub struct StompConnection {
    conn_id: u32,
    config: StompConfig,
    state: ConnState,
    socket: Option<Transport>,
    decoder: FrameDecoder,
    backoff: BackoffPolicy,
    attempt: u32,
    /// Set by `request_reconnect`, drained by `tick`. A flood of identical
    /// requests collapses to a single `true` rather than queuing N retries.
    reconnect_requested: AtomicBool,
    /// Receipt-ids of outstanding SENDs, keyed to when they were sent.
    /// Cleared by a matching `RECEIPT`; purged and failed by `tick` once
    /// older than [`RECEIPT_TIMEOUT`].
    pending_receipts: HashMap<String, Instant>,
    next_receipt_id: u64,
}

impl StompConnection {
    pub fn new(conn_id: u32, config: StompConfig) -> Self {
        Self {
            conn_id,
            config,
            state: ConnState::Idle,
            socket: None,
            decoder: FrameDecoder::default(),
            backoff: BackoffPolicy::stomp_reconnect(),
            attempt: 0,
            reconnect_requested: AtomicBool::new(false),
            pending_receipts: HashMap::new(),
            next_receipt_id: 0,
        }
    }

    pub fn conn_id(&self) -> u32 {
        self.conn_id
    }

    /// Idempotent: repeated calls before the next tick collapse into one
    /// reconnect attempt.
    pub fn request_reconnect(&self) {
        self.reconnect_requested.store(true, Ordering::Relaxed);
    }

    /// Backoff delay before the next reconnect attempt, with jitter drawn
    /// from the thread-local RNG.
    pub fn next_retry_delay(&self) -> Duration {
        let jitter = rand::thread_rng().gen_range(0.0..1.0);
        self.backoff.delay_for_attempt(self.attempt.max(1), jitter)
    }

    async fn dial(&self) -> Result<Transport, MtpError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let tcp = TcpStream::connect(&addr).await?;
        if !self.config.tls {
            return Ok(Transport::Plain(tcp));
        }
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let tls_config = ClientConfig::builder().with_root_certificates(roots).with_no_client_auth();
        let connector = TlsConnector::from(std::sync::Arc::new(tls_config));
        let server_name = ServerName::try_from(self.config.host.clone())
            .map_err(|_| MtpError::Protocol("invalid TLS server name".to_string()))?;
        let stream = connector
            .connect(server_name, tcp)
            .await
            .map_err(|e| MtpError::Protocol(format!("tls handshake failed: {e}")))?;
        Ok(Transport::Tls(Box::new(stream)))
    }

    async fn handshake(&mut self) -> Result<(), MtpError> {
        self.state = ConnState::Connecting;
        let mut socket = self.dial().await?;
        self.state = ConnState::AwaitingConnected;
        let connect = StompFrame::connect(&self.config.host, self.config.login.as_deref(), self.config.passcode.as_deref());
        socket.write_all(&connect.encode()).await?;
        socket.flush().await?;

        let mut buf = [0u8; 4096];
        let mut decoder = FrameDecoder::default();
        let frame = loop {
            let n = tokio::io::AsyncReadExt::read(&mut socket, &mut buf).await?;
            if n == 0 {
                return Err(MtpError::Io(io::Error::new(io::ErrorKind::UnexpectedEof, "broker closed during handshake")));
            }
            decoder.push(&buf[..n]);
            if let Some(frame) = decoder.next_frame()? {
                break frame;
            }
        };
        if frame.command != "CONNECTED" {
            return Err(MtpError::Protocol(format!("expected CONNECTED, got {}", frame.command)));
        }

        self.state = ConnState::Subscribing;
        let subscribe = StompFrame::subscribe(&self.config.agent_destination, "usp-agent-sub");
        socket.write_all(&subscribe.encode()).await?;
        socket.flush().await?;

        self.socket = Some(socket);
        self.decoder = FrameDecoder::default();
        self.state = ConnState::Running;
        self.attempt = 0;
        self.pending_receipts.clear();
        info!(conn_id = self.conn_id, host = %self.config.host, "stomp connection established");
        Ok(())
    }

    /// Read one incoming STOMP frame body, if a complete frame has arrived.
    /// Returns `Ok(None)` when more bytes are needed.
    pub async fn poll_incoming(&mut self) -> Result<Option<Vec<u8>>, MtpError> {
        if self.socket.is_none() {
            return Err(MtpError::NotConnected);
        }
        if let Some(frame) = self.decoder.next_frame()? {
            return Ok(self.handle_frame(frame));
        }
        let mut buf = [0u8; 8192];
        let n = {
            let socket = self.socket.as_mut().ok_or(MtpError::NotConnected)?;
            tokio::io::AsyncReadExt::read(socket, &mut buf).await?
        };
        if n == 0 {
            self.state = ConnState::RetryWait;
            self.socket = None;
            return Err(MtpError::Io(io::Error::new(io::ErrorKind::UnexpectedEof, "broker closed connection")));
        }
        self.decoder.push(&buf[..n]);
        match self.decoder.next_frame()? {
            Some(frame) => Ok(self.handle_frame(frame)),
            None => Ok(None),
        }
    }

    /// Dispatch one decoded frame: `MESSAGE` bodies are forwarded to the
    /// dispatcher, `RECEIPT` clears the outstanding SEND it acknowledges,
    /// and `ERROR` (the broker's NACK-equivalent for a failed receipt)
    /// drops the connection to `RETRY_WAIT`.
    fn handle_frame(&mut self, frame: StompFrame) -> Option<Vec<u8>> {
        match frame.command.as_str() {
            "MESSAGE" => Some(frame.body),
            "RECEIPT" => {
                match frame.header("receipt-id") {
                    Some(id) => {
                        if self.pending_receipts.remove(id).is_some() {
                            debug!(conn_id = self.conn_id, receipt_id = id, "stomp receipt acknowledged");
                        } else {
                            debug!(conn_id = self.conn_id, receipt_id = id, "stomp receipt for unknown send");
                        }
                    }
                    None => warn!(conn_id = self.conn_id, "stomp RECEIPT frame missing receipt-id header"),
                }
                None
            }
            "ERROR" => {
                if let Some(id) = frame.header("receipt-id") {
                    self.pending_receipts.remove(id);
                }
                warn!(
                    conn_id = self.conn_id,
                    message = %String::from_utf8_lossy(&frame.body),
                    "stomp broker ERROR frame, dropping to retry-wait"
                );
                self.state = ConnState::RetryWait;
                self.socket = None;
                None
            }
            _ => {
                debug!(command = %frame.command, "ignoring non-MESSAGE stomp frame");
                None
            }
        }
    }

    /// Drop any SEND whose `RECEIPT` never arrived within [`RECEIPT_TIMEOUT`],
    /// promoting the connection to `RETRY_WAIT`.
    fn expire_stale_receipts(&mut self) {
        if self.state != ConnState::Running || self.pending_receipts.is_empty() {
            return;
        }
        let now = Instant::now();
        let expired: Vec<String> = self
            .pending_receipts
            .iter()
            .filter(|(_, sent_at)| now.duration_since(**sent_at) >= RECEIPT_TIMEOUT)
            .map(|(id, _)| id.clone())
            .collect();
        if expired.is_empty() {
            return;
        }
        for id in &expired {
            self.pending_receipts.remove(id);
        }
        warn!(conn_id = self.conn_id, count = expired.len(), "stomp receipt timed out, dropping to retry-wait");
        self.state = ConnState::RetryWait;
        self.socket = None;
    }

    /// Drain the reconnect-request flag and attempt reconnection if one was
    /// pending and the connection isn't already healthy; also purges any
    /// SEND whose receipt never arrived.
    pub async fn tick(&mut self) {
        self.expire_stale_receipts();
        let requested = self.reconnect_requested.swap(false, Ordering::Relaxed);
        if !requested || self.state == ConnState::Running {
            return;
        }
        self.attempt = self.attempt.saturating_add(1);
        if let Err(err) = self.handshake().await {
            warn!(conn_id = self.conn_id, attempt = self.attempt, error = %err, "stomp reconnect failed");
            self.state = ConnState::RetryWait;
        }
    }
}

#[async_trait]
impl MtpAdapter for StompConnection {
    async fn start(&mut self) -> Result<(), MtpError> {
        if matches!(self.state, ConnState::Running) {
            return Ok(());
        }
        match self.handshake().await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.state = ConnState::RetryWait;
                warn!(conn_id = self.conn_id, error = %err, "initial stomp connect failed, will retry");
                Ok(())
            }
        }
    }

    async fn stop(&mut self) -> Result<(), MtpError> {
        self.state = ConnState::Disconnecting;
        if let Some(mut socket) = self.socket.take() {
            let _ = socket.write_all(&StompFrame::disconnect().encode()).await;
            let _ = socket.shutdown().await;
        }
        self.state = ConnState::Idle;
        self.pending_receipts.clear();
        Ok(())
    }

    fn status(&self) -> MtpStatus {
        match self.state {
            ConnState::Running => MtpStatus::Up,
            ConnState::Error => MtpStatus::Error,
            _ => MtpStatus::Down,
        }
    }

    async fn send(&mut self, bytes: Vec<u8>) -> Result<(), MtpError> {
        let socket = self.socket.as_mut().ok_or(MtpError::NotConnected)?;
        let receipt_id = format!("snd-{}-{}", self.conn_id, self.next_receipt_id);
        self.next_receipt_id += 1;
        let frame = StompFrame::send(&self.config.agent_destination, "application/vnd.bbf.usp.msg", bytes, &receipt_id);
        socket.write_all(&frame.encode()).await?;
        socket.flush().await?;
        self.pending_receipts.insert(receipt_id, Instant::now());
        Ok(())
    }
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
