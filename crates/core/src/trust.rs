// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trust roles: "a label assigning permissions to a controller based on its
//! authenticated identity" (Glossary). The Message Dispatcher checks a
//! controller's role against every path touched by a request.

use serde::{Deserialize, Serialize};

/// The operation kinds a trust role grants or withholds per path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    Read,
    Write,
    Add,
    Delete,
    Operate,
    Notify,
}

/// A named trust role with a permission set applied uniformly across the
/// data model tree.
///
/// Real deployments typically scope permissions per schema subtree; this
/// models the common case of a full-tree role — simple enum-shaped access
/// control rather than a generalized per-path ACL tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustRole {
    pub name: String,
    pub permissions: Vec<Permission>,
}

impl TrustRole {
    pub fn new(name: impl Into<String>, permissions: Vec<Permission>) -> Self {
        Self { name: name.into(), permissions }
    }

    /// The built-in role granted every permission, used for controllers
    /// authenticated over a fully-trusted transport (e.g. local Unix socket).
    pub fn full_access() -> Self {
        Self::new(
            "Full-Access",
            vec![
                Permission::Read,
                Permission::Write,
                Permission::Add,
                Permission::Delete,
                Permission::Operate,
                Permission::Notify,
            ],
        )
    }

    /// The built-in role granted no permissions, used as the default for an
    /// unrecognized controller before explicit provisioning.
    pub fn no_access() -> Self {
        Self::new("No-Access", vec![])
    }

    pub fn allows(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

#[cfg(test)]
#[path = "trust_tests.rs"]
mod tests;
