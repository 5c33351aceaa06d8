// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::migrations::MigrationError;

/// Errors surfaced by the WAL, snapshot, and KV-store layers.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("migration error: {0}")]
    Migration(#[from] MigrationError),
    #[error("snapshot at {0} has no matching WAL state to recover")]
    MissingWal(std::path::PathBuf),
}
