// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Endpoint identity: the globally unique controller/agent identifier string.
//!
//! Unlike the nanoid-backed IDs in [`crate::id`], an `EndpointId` is either
//! supplied by a remote controller or derived locally from vendor/interface
//! configuration — it is never randomly generated, so it does not go through
//! [`crate::define_id!`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// A controller or agent Endpoint-ID, e.g. `self::controller-1` or
/// `os::00D09E-TR369Agent-0000001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointId(String);

impl EndpointId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for EndpointId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EndpointId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::borrow::Borrow<str> for EndpointId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Source of the serial-number component of a derived agent Endpoint-ID
/// (see DESIGN.md): either an explicit configuration value or the WAN
/// interface's MAC address, whichever is supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerialSource {
    /// Use this literal serial number.
    Explicit(String),
    /// Derive the serial from the WAN interface's MAC address, colon-stripped
    /// and upper-cased.
    WanMac,
}

/// This agent's own identity, derived once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalAgentIdentity {
    pub endpoint_id: EndpointId,
    pub oui: String,
    pub product_class: String,
    pub serial_number: String,
}

/// Error deriving the local agent identity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("WAN interface {0:?} has no MAC address available")]
    NoWanMac(String),
    #[error("OUI {0:?} is not 6 hex characters")]
    InvalidOui(String),
}

impl LocalAgentIdentity {
    /// Format: `os::<OUI>-<PRODUCT>-<SERIAL>`.
    pub fn derive(
        oui: &str,
        product_class: &str,
        serial: SerialSource,
        wan_mac: Option<&str>,
    ) -> Result<Self, IdentityError> {
        if oui.len() != 6 || !oui.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(IdentityError::InvalidOui(oui.to_string()));
        }
        let serial_number = match serial {
            SerialSource::Explicit(s) => s,
            SerialSource::WanMac => {
                let mac = wan_mac.ok_or_else(|| IdentityError::NoWanMac("<unset>".to_string()))?;
                mac.replace(':', "").to_uppercase()
            }
        };
        let endpoint_id =
            EndpointId::new(format!("os::{}-{}-{}", oui.to_uppercase(), product_class, serial_number));
        Ok(Self { endpoint_id, oui: oui.to_uppercase(), product_class: product_class.to_string(), serial_number })
    }
}

#[cfg(test)]
#[path = "endpoint_tests.rs"]
mod tests;
