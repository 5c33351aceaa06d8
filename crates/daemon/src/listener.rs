// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for the local CLI IPC socket: accepts connections on the Unix-domain stream socket,
//! decodes one length-prefixed [`uspa_wire::CliRequest`] frame per
//! connection, and forwards it to the DM task as a [`CliCommand`].
//!
//! One request per connection, matching `usp-cli`'s dial-send-wait-close
//! usage: there is no persistent session to manage here, so a connection
//! that never sends a well-formed frame (or disconnects mid-read) is simply
//! dropped rather than tracked.

use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, warn};
use uspa_core::UspError;
use uspa_wire::{CliRequest, CliResponse};

use crate::dm_runtime::CliCommand;

pub struct Listener {
    unix: UnixListener,
    cli_tx: mpsc::Sender<CliCommand>,
}

impl Listener {
    pub fn new(unix: UnixListener, cli_tx: mpsc::Sender<CliCommand>) -> Self {
        Self { unix, cli_tx }
    }

    /// Accept connections until `shutdown` is signalled. Each connection is
    /// handled on its own spawned task so a slow or stalled client can never
    /// block the next `accept()`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                accepted = self.unix.accept() => {
                    match accepted {
                        Ok((stream, _addr)) => {
                            let cli_tx = self.cli_tx.clone();
                            tokio::spawn(async move { handle_connection(stream, cli_tx).await });
                        }
                        Err(err) => warn!(error = %err, "cli socket accept failed"),
                    }
                }
            }
        }
    }
}

async fn handle_connection(mut stream: UnixStream, cli_tx: mpsc::Sender<CliCommand>) {
    let request = match uspa_wire::read_frame::<_, CliRequest>(&mut stream).await {
        Ok(Some(request)) => request,
        Ok(None) => return,
        Err(err) => {
            debug!(error = %err, "malformed cli request frame");
            return;
        }
    };

    let (reply_tx, reply_rx) = oneshot::channel();
    if cli_tx.send(CliCommand { request, reply: reply_tx }).await.is_err() {
        let err = UspError::InternalError("daemon is shutting down".to_string());
        let response = CliResponse::Error { err_code: err.usp_err_code(), err_msg: err.message().to_string() };
        let _ = uspa_wire::write_frame(&mut stream, &response).await;
        return;
    }

    let Ok(response) = reply_rx.await else { return };
    if let Err(err) = uspa_wire::write_frame(&mut stream, &response).await {
        debug!(error = %err, "failed to write cli response frame");
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
