// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! uspa-adapters: Message Transfer Protocol (MTP) bindings.
//!
//! This crate owns the "MTP thread" half of the two-task split:
//! every transport-specific byte pushed on or off the wire lives here, behind
//! the single [`capability::MtpAdapter`] trait. It talks to the Data Model
//! side (`uspa-engine`) only through the `uspa_core::Effect`/`uspa_core::Event`
//! channel pair wired up by `uspa-daemon` — this crate deliberately does not
//! depend on `uspa-engine`, so there is no path by which the two sides of the
//! split can come to share mutable state.

pub mod capability;
pub mod mtp;

pub use capability::{MtpAdapter, MtpError, MtpStatus};
pub use mtp::coap::CoapListener;
pub use mtp::stomp::{StompConfig, StompConnection};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
