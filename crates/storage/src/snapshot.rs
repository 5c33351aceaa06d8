// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot persistence for crash recovery.
//!
//! A snapshot stores the complete materialized state at a point in time,
//! identified by the WAL sequence number it was taken after. Recovery loads
//! the snapshot and replays WAL entries with a higher sequence number on top
//! of it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::MaterializedState;

/// Current snapshot schema version.
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "v")]
    pub version: u32,
    /// WAL sequence number at the time of snapshot.
    pub seq: u64,
    pub state: MaterializedState,
    pub created_at: DateTime<Utc>,
}
