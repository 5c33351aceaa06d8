// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A fully in-memory [`MtpAdapter`] for tests in `uspa-engine`/`uspa-daemon`
//! that need an MTP row without opening a real socket.

use crate::capability::{MtpAdapter, MtpError, MtpStatus};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct FakeAdapter {
    inner: Arc<Mutex<FakeAdapterState>>,
}

#[derive(Default)]
struct FakeAdapterState {
    status: FakeStatus,
    sent: Vec<Vec<u8>>,
}

#[derive(Default, Clone, Copy, PartialEq, Eq)]
enum FakeStatus {
    #[default]
    Down,
    Up,
}

impl FakeAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything handed to `send` so far, in order.
    pub fn sent_messages(&self) -> Vec<Vec<u8>> {
        self.inner.lock().sent.clone()
    }

    pub fn force_status(&self, up: bool) {
        self.inner.lock().status = if up { FakeStatus::Up } else { FakeStatus::Down };
    }
}

#[async_trait]
impl MtpAdapter for FakeAdapter {
    async fn start(&mut self) -> Result<(), MtpError> {
        self.inner.lock().status = FakeStatus::Up;
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), MtpError> {
        self.inner.lock().status = FakeStatus::Down;
        Ok(())
    }

    fn status(&self) -> MtpStatus {
        match self.inner.lock().status {
            FakeStatus::Up => MtpStatus::Up,
            FakeStatus::Down => MtpStatus::Down,
        }
    }

    async fn send(&mut self, bytes: Vec<u8>) -> Result<(), MtpError> {
        let mut inner = self.inner.lock();
        if inner.status != FakeStatus::Up {
            return Err(MtpError::NotConnected);
        }
        inner.sent.push(bytes);
        Ok(())
    }
}

#[cfg(test)]
#[path = "test_support_tests.rs"]
mod tests;
