// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! uspa-storage: the write-ahead log, snapshot/checkpoint layer, and
//! event-sourced materialized state for the USP agent runtime.

pub mod checkpoint;
pub mod db;
pub mod error;
pub mod migrations;
pub mod snapshot;
pub mod state;
pub mod wal;

pub use checkpoint::{load_snapshot, Checkpointer};
pub use error::StorageError;
pub use migrations::{Migration, MigrationError, MigrationRegistry};
pub use snapshot::{Snapshot, CURRENT_SNAPSHOT_VERSION};
pub use state::MaterializedState;
pub use wal::{Wal, WalEntry};
