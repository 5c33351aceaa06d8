// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn derives_endpoint_id_from_wan_mac() {
    let id =
        LocalAgentIdentity::derive("00d09e", "TR369Agent", SerialSource::WanMac, Some("aa:bb:cc:dd:ee:ff"))
            .unwrap();
    assert_eq!(id.endpoint_id.as_str(), "os::00D09E-TR369Agent-AABBCCDDEEFF");
}

#[test]
fn derives_endpoint_id_from_explicit_serial() {
    let id = LocalAgentIdentity::derive(
        "00d09e",
        "TR369Agent",
        SerialSource::Explicit("SN12345".to_string()),
        None,
    )
    .unwrap();
    assert_eq!(id.endpoint_id.as_str(), "os::00D09E-TR369Agent-SN12345");
}

#[test]
fn rejects_invalid_oui() {
    assert!(LocalAgentIdentity::derive("zzzzzz", "X", SerialSource::Explicit("1".into()), None).is_err());
    assert!(LocalAgentIdentity::derive("abc", "X", SerialSource::Explicit("1".into()), None).is_err());
}

#[test]
fn requires_wan_mac_when_no_explicit_serial() {
    let err = LocalAgentIdentity::derive("00d09e", "X", SerialSource::WanMac, None).unwrap_err();
    assert!(matches!(err, IdentityError::NoWanMac(_)));
}

#[test]
fn endpoint_id_equality_and_display() {
    let a = EndpointId::new("self::ctrl-1");
    let b: EndpointId = "self::ctrl-1".into();
    assert_eq!(a, b);
    assert_eq!(a.to_string(), "self::ctrl-1");
}
