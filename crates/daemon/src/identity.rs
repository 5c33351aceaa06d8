// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolves this agent's own identity at startup.

use uspa_core::{IdentityError, LocalAgentIdentity, SerialSource};

use crate::env;

/// Read the WAN interface's MAC address from sysfs, trimmed of whitespace.
/// `None` if the interface doesn't exist or has no `address` file — callers
/// only consult this when no explicit serial number is configured.
fn read_wan_mac(iface: &str) -> Option<String> {
    let path = format!("/sys/class/net/{iface}/address");
    std::fs::read_to_string(path).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Derive this agent's [`LocalAgentIdentity`] from environment-configured
/// vendor fields, falling back to the WAN interface MAC for the serial
/// number component when none is configured explicitly.
pub fn resolve() -> Result<LocalAgentIdentity, IdentityError> {
    let oui = env::agent_oui();
    let product_class = env::agent_product_class();

    let serial = match env::agent_serial() {
        Some(serial) => SerialSource::Explicit(serial),
        None => SerialSource::WanMac,
    };

    let wan_mac = read_wan_mac(&env::wan_iface());
    LocalAgentIdentity::derive(&oui, &product_class, serial, wan_mac.as_deref())
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
