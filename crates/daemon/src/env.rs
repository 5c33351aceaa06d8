// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Protocol version (from Cargo.toml)
pub const PROTOCOL_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH"));

/// Resolve state directory: USPA_STATE_DIR > XDG_STATE_HOME/uspa > ~/.local/state/uspa
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("USPA_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("uspa"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/uspa"))
}

/// `VALUE_CHANGE_POLL_PERIOD`, default 30s.
pub fn value_change_poll_period() -> Duration {
    std::env::var("USPA_VALUE_CHANGE_POLL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(30))
}

/// `STOMP_CONNECT_TIMEOUT`, default 10s.
pub fn stomp_connect_timeout() -> Duration {
    std::env::var("USPA_STOMP_CONNECT_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(10))
}

/// `MAX_AGENT_MTPS`, default 8.
pub fn max_agent_mtps() -> usize {
    std::env::var("USPA_MAX_AGENT_MTPS").ok().and_then(|s| s.parse().ok()).unwrap_or(8)
}

/// Shutdown drain timeout (default 5s, configurable via `USPA_DRAIN_TIMEOUT_MS`).
pub fn drain_timeout() -> Duration {
    std::env::var("USPA_DRAIN_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Vendor OUI used to derive this agent's Endpoint-ID.
pub fn agent_oui() -> String {
    std::env::var("USPA_AGENT_OUI").unwrap_or_else(|_| "00D09E".to_string())
}

/// Vendor product class used to derive this agent's Endpoint-ID.
pub fn agent_product_class() -> String {
    std::env::var("USPA_AGENT_PRODUCT_CLASS").unwrap_or_else(|_| "USPAgent".to_string())
}

/// Explicit serial number override; when unset the serial is read from
/// `wan_iface`'s MAC address at startup.
pub fn agent_serial() -> Option<String> {
    std::env::var("USPA_AGENT_SERIAL").ok().filter(|s| !s.is_empty())
}

/// WAN interface whose MAC the agent reads at startup, default `eth0`.
pub fn wan_iface() -> String {
    std::env::var("USPA_WAN_IFACE").unwrap_or_else(|_| "eth0".to_string())
}

/// Path to a seed DB file consulted on factory reset when the DB is absent.
pub fn reset_seed_file() -> Option<PathBuf> {
    std::env::var("USPA_RESET_SEED_FILE").ok().map(PathBuf::from)
}
