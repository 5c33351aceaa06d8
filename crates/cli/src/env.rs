// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI crate.
//!
//! Duplicated rather than shared with `uspa-daemon::env` (this crate
//! deliberately has no dependency on the daemon crate — it only speaks the
//! wire-level IPC contract in `uspa-wire::cli_protocol`); both resolve the
//! state directory identically so `usp-cli` finds the socket `uspad` bound.

use std::path::PathBuf;

/// Resolve state directory: `USPA_STATE_DIR` > `XDG_STATE_HOME`/uspa >
/// `~/.local/state/uspa`.
pub fn state_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("USPA_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("uspa"));
    }
    std::env::var("HOME").ok().map(|home| PathBuf::from(home).join(".local/state/uspa"))
}

pub fn socket_path() -> Option<PathBuf> {
    state_dir().map(|dir| dir.join("uspad.sock"))
}
