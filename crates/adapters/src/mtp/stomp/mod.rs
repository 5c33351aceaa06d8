// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! STOMP Message Transfer Protocol binding.

pub mod connection;
pub mod frame;

pub use connection::{StompConfig, StompConnection};
pub use frame::{FrameDecoder, StompFrame};
