// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stub consumer for the bulk-data-collector task.
//!
//! The BDC uploader (periodic HTTP push of collected parameter reports to a
//! remote collector) is an external collaborator out of scope for this
//! agent's core. This module only models the one interface the core
//! consumes from it: a channel of upload requests that the core may enqueue
//! onto, and a task that drains it. A real BDC implementation would report,
//! retry and batch; this stub logs and drops.

use tokio::sync::{mpsc, watch};
use tracing::info;

/// A bulk-data report ready to hand off to the collector uploader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BdcUploadRequest {
    pub profile_name: String,
    pub report: Vec<(String, String)>,
}

/// Drains `BdcUploadRequest`s until told to stop; logs each at `info` and
/// discards it. Runs as its own `tokio::task`, matching the DM/MTP tasks'
/// pattern of one task per bounded channel rather than a shared queue.
pub async fn run(mut inbound: mpsc::Receiver<BdcUploadRequest>, mut shutdown: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            req = inbound.recv() => {
                match req {
                    Some(req) => info!(
                        profile = %req.profile_name,
                        params = req.report.len(),
                        "bdc upload request received (stub: not sent)"
                    ),
                    None => break,
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "bdc_stub_tests.rs"]
mod tests;
