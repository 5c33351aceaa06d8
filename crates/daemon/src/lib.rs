// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! uspa-daemon: the DM task, the MTP task, and the glue that boots both of
//! them into one process.
//!
//! What's conceptually a pair of threads is, in this build, two
//! `tokio::task::spawn`ed async tasks talking over bounded `mpsc` channels —
//! [`dm_runtime::DmRuntime`] on one side, [`mtp_runtime::MtpRuntime`] on the
//! other. Neither ever touches the other's owned state directly; everything
//! one learns from the other arrives as an [`uspa_core::Effect`] or an
//! [`uspa_core::Event`]. `uspad`'s `main.rs` is the only thing that wires the
//! channels together and spawns both tasks.

pub mod bdc_stub;
pub mod datamodel;
pub mod dm_runtime;
pub mod env;
pub mod identity;
pub mod lifecycle;
pub mod listener;
pub mod mtp_runtime;
pub mod notify;
pub mod operations;
pub mod projections;
