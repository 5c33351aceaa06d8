// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn full_access_allows_everything() {
    let role = TrustRole::full_access();
    for p in [
        Permission::Read,
        Permission::Write,
        Permission::Add,
        Permission::Delete,
        Permission::Operate,
        Permission::Notify,
    ] {
        assert!(role.allows(p));
    }
}

#[test]
fn no_access_allows_nothing() {
    let role = TrustRole::no_access();
    assert!(!role.allows(Permission::Read));
    assert!(!role.allows(Permission::Write));
}

#[test]
fn custom_role_allows_only_configured_permissions() {
    let role = TrustRole::new("Read-Only", vec![Permission::Read]);
    assert!(role.allows(Permission::Read));
    assert!(!role.allows(Permission::Write));
}
