// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup, factory reset, and WAL/snapshot recovery.

use std::io::Write;
use std::path::PathBuf;

use fs2::FileExt;
use thiserror::Error;
use tracing::{info, warn};
use uspa_core::Event;
use uspa_storage::{load_snapshot, Checkpointer, MaterializedState, Wal};

use crate::env;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine state directory")]
    NoStateDir,
    #[error("failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),
    #[error("failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),
    #[error("storage error: {0}")]
    Storage(#[from] uspa_storage::StorageError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("identity error: {0}")]
    Identity(#[from] uspa_core::IdentityError),
}

/// Daemon configuration: every path the runtime touches, resolved once at
/// startup from [`env`]. All state lives in the single KV DB — everything
/// below is either that DB's own files or transient runtime control files.
#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    pub lock_path: PathBuf,
    pub wal_path: PathBuf,
    pub snapshot_path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = env::state_dir()?;
        Ok(Self {
            socket_path: state_dir.join("uspad.sock"),
            lock_path: state_dir.join("uspad.pid"),
            wal_path: state_dir.join("wal").join("events.wal"),
            snapshot_path: state_dir.join("snapshot.json.zst"),
            state_dir,
        })
    }
}

/// Source consulted to populate the data model when the DB file is absent
/// or a factory-reset trigger fires.
pub enum ResetSource {
    SeedFile(PathBuf),
    VendorDefaults(Vec<(String, String)>),
}

/// Recovered startup state: the hydrated [`MaterializedState`], the WAL
/// positioned at its write cursor, and the advisory lock file (held for the
/// life of the process — dropping it releases the lock).
pub struct StartupResult {
    pub state: MaterializedState,
    pub wal: Wal,
    pub checkpointer: Checkpointer,
    pub processed_seq: u64,
    _lock_file: std::fs::File,
}

pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;
    if let Some(parent) = config.wal_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let lock_file =
        std::fs::OpenOptions::new().write(true).create(true).truncate(false).open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    let is_first_boot = !config.snapshot_path.exists() && !config.wal_path.exists();

    let (mut state, processed_seq) = match load_snapshot(&config.snapshot_path)? {
        Some(snapshot) => {
            info!(seq = snapshot.seq, params = snapshot.state.params.len(), "loaded snapshot");
            (snapshot.state, snapshot.seq)
        }
        None => {
            info!("no snapshot found, starting from empty state");
            (MaterializedState::default(), 0)
        }
    };

    let mut wal = Wal::open(&config.wal_path, processed_seq)?;
    let replay = wal.entries_after(processed_seq)?;
    let replay_count = replay.len();
    for entry in &replay {
        state.apply_event(&entry.event);
    }
    if replay_count > 0 {
        info!(count = replay_count, "replayed WAL entries");
    }

    if is_first_boot {
        if let Some(seed_path) = env::reset_seed_file() {
            factory_reset(&mut state, &mut wal, ResetSource::SeedFile(seed_path))?;
        }
    }

    let checkpointer = Checkpointer::new(&config.snapshot_path);
    Ok(StartupResult { state, wal, checkpointer, processed_seq, _lock_file: lock_file })
}

/// Populate `state` from `source` and WAL-append the mutations.
/// A corrupt or unreadable seed file is logged and treated as an empty
/// reset rather than a fatal error — startup tolerates partial
/// configuration.
pub fn factory_reset(
    state: &mut MaterializedState,
    wal: &mut Wal,
    source: ResetSource,
) -> Result<(), LifecycleError> {
    let (label, rows) = match source {
        ResetSource::SeedFile(path) => {
            let rows = std::fs::read_to_string(&path)
                .ok()
                .and_then(|body| serde_json::from_str::<Vec<(String, String)>>(&body).ok())
                .unwrap_or_else(|| {
                    warn!(path = %path.display(), "seed file missing or unreadable, resetting to empty state");
                    Vec::new()
                });
            (path.display().to_string(), rows)
        }
        ResetSource::VendorDefaults(rows) => ("vendor-defaults".to_string(), rows),
    };

    let event = Event::FactoryReset { source: label };
    wal.append(&event)?;
    state.apply_event(&event);
    for (path, value) in rows {
        let set = Event::ParamValueSet { path, value };
        wal.append(&set)?;
        state.apply_event(&set);
    }
    wal.flush()?;
    Ok(())
}

/// Release the lock file and remove the Unix socket on clean shutdown:
/// graceful shutdown closes sockets, closes the DB cleanly, then exits.
pub fn cleanup(config: &Config) {
    let _ = std::fs::remove_file(&config.socket_path);
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
