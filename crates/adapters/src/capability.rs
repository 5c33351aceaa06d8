// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The shared adapter capability every MTP binding implements.
//!
//! Both the STOMP and CoAP bindings satisfy the same small surface so the
//! Agent MTP Table (`uspa-engine::mtp_table`) can start, stop, and query any
//! of them uniformly; sending a Record never blocks the DM side waiting for
//! the network.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Coarse transport status reported up to the Agent MTP Table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MtpStatus {
    Down,
    Up,
    Error,
}

impl fmt::Display for MtpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MtpStatus::Down => "Down",
            MtpStatus::Up => "Up",
            MtpStatus::Error => "Error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum MtpError {
    #[error("transport io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not connected")]
    NotConnected,
    #[error("frame too large: {0} bytes")]
    FrameTooLarge(usize),
    #[error("protocol violation: {0}")]
    Protocol(String),
}

/// Capability every MTP binding (STOMP, CoAP, and any future transport)
/// implements. An MTP row in the Agent MTP Table owns exactly one
/// `MtpAdapter` instance for its lifetime.
#[async_trait]
pub trait MtpAdapter: Send {
    /// Begin (or resume) transport activity. Idempotent: calling `start` on
    /// an already-started adapter is a no-op.
    async fn start(&mut self) -> Result<(), MtpError>;

    /// Stop transport activity and release any held sockets. Idempotent.
    async fn stop(&mut self) -> Result<(), MtpError>;

    /// Current coarse status for the Agent MTP Table row.
    fn status(&self) -> MtpStatus;

    /// Hand a pre-encoded USP Record to the transport for delivery to
    /// `controller`. Returns once the bytes are queued on the wire, not once
    /// the peer has acknowledged receipt — delivery acknowledgement, where
    /// the protocol offers one, surfaces later as an `Event`.
    async fn send(&mut self, bytes: Vec<u8>) -> Result<(), MtpError>;
}
