// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn serializes_with_tagged_type_field() {
    let e = Event::ParamValueSet { path: "Device.X".into(), value: "1".into() };
    let json = serde_json::to_value(&e).unwrap();
    assert_eq!(json["type"], "datamodel:param_set");
    assert_eq!(json["path"], "Device.X");
}

#[test]
fn round_trips_through_json() {
    let e = Event::ObjectAdded { table_path: "Device.LocalAgent.MTP".into(), instance: 1 };
    let json = serde_json::to_string(&e).unwrap();
    let back: Event = serde_json::from_str(&json).unwrap();
    assert_eq!(e, back);
}

#[test]
fn notify_events_carry_endpoint_id() {
    let ep = EndpointId::new("self::controller-1");
    let e = Event::NotifySent { controller: ep.clone(), message_id: 7, kind: "ValueChange".into() };
    let json = serde_json::to_value(&e).unwrap();
    assert_eq!(json["controller"], "self::controller-1");
    let back: Event = serde_json::from_value(json).unwrap();
    assert_eq!(e, back);
}
