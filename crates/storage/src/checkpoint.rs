// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic folding of the materialized state into a snapshot, and the
//! startup-time counterpart that loads it back.
//!
//! The snapshot is written zstd-compressed to a temp file and renamed into
//! place, so a crash mid-write never leaves a half-written snapshot at the
//! well-known path — the rename either happens or it doesn't.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::StorageError;
use crate::migrations::MigrationRegistry;
use crate::snapshot::{Snapshot, CURRENT_SNAPSHOT_VERSION};
use crate::state::MaterializedState;
use crate::wal::rotate_bak_path;

pub struct Checkpointer {
    path: PathBuf,
}

impl Checkpointer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn save(&self, seq: u64, state: &MaterializedState) -> Result<(), StorageError> {
        let snapshot = Snapshot {
            version: CURRENT_SNAPSHOT_VERSION,
            seq,
            state: state.clone(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_vec(&snapshot)?;
        let compressed = zstd::encode_all(json.as_slice(), 0)?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &compressed)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn load(&self) -> Result<Option<Snapshot>, StorageError> {
        load_snapshot(&self.path)
    }
}

/// Load and migrate the snapshot at `path`, if present.
///
/// A snapshot that fails to decompress or parse is treated the same way a
/// corrupt WAL tail is: rotated into a `.bak` file rather than left in
/// place, and recovery proceeds as if no snapshot existed (the daemon then
/// replays the WAL from the beginning).
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Option<Snapshot>, StorageError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }

    let compressed = fs::read(path)?;
    let parsed = zstd::decode_all(compressed.as_slice())
        .ok()
        .and_then(|json| serde_json::from_slice::<serde_json::Value>(&json).ok());

    let Some(raw) = parsed else {
        let bak = rotate_bak_path(path);
        fs::rename(path, bak)?;
        return Ok(None);
    };

    let registry = MigrationRegistry::new();
    let migrated = registry.migrate_to(raw, CURRENT_SNAPSHOT_VERSION)?;
    let snapshot: Snapshot = serde_json::from_value(migrated)?;
    Ok(Some(snapshot))
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
