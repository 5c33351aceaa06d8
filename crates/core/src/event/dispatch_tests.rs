// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::super::Event;
use crate::endpoint::EndpointId;

#[test]
fn name_is_stable_identifier() {
    let e = Event::ParamValueSet { path: "Device.X".into(), value: "1".into() };
    assert_eq!(e.name(), "param_set");
}

#[test]
fn log_summary_includes_path_and_value() {
    let e = Event::ParamValueSet { path: "Device.X".into(), value: "1".into() };
    assert_eq!(e.log_summary(), "Device.X=1");
}

#[test]
fn controller_extracts_endpoint_for_notify_family() {
    let ep = EndpointId::new("self::ctrl-1");
    let e = Event::NotifySent { controller: ep.clone(), message_id: 1, kind: "ValueChange".into() };
    assert_eq!(e.controller(), Some(&ep));
}

#[test]
fn controller_is_none_for_datamodel_events() {
    let e = Event::ParamValueSet { path: "Device.X".into(), value: "1".into() };
    assert_eq!(e.controller(), None);
}

#[test]
fn durable_mutation_classifies_datamodel_and_controller_events() {
    assert!(Event::ParamValueSet { path: "X".into(), value: "1".into() }.is_durable_mutation());
    assert!(Event::ObjectAdded { table_path: "X".into(), instance: 1 }.is_durable_mutation());
    assert!(!Event::StompReconnectScheduled { conn_id: 1 }.is_durable_mutation());
    assert!(!Event::NotifySent {
        controller: EndpointId::new("c"),
        message_id: 1,
        kind: "ValueChange".into()
    }
    .is_durable_mutation());
}

#[test]
fn custom_catch_all_deserializes_unknown_variant() {
    let json = serde_json::json!({ "type": "future:unknown_event", "foo": "bar" });
    let e: Event = serde_json::from_value(json).unwrap();
    assert_eq!(e, Event::Custom);
}

#[test]
fn shutdown_is_not_a_durable_mutation() {
    assert!(!Event::Shutdown.is_durable_mutation());
    assert_eq!(Event::Shutdown.name(), "shutdown");
}
