// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

use uspa_engine::Registry;

use super::build;

#[test]
fn reboot_is_registered_asynchronous() {
    let mut registry = Registry::new();
    build(&mut registry).expect("register operations");
    let def = registry.find_operation("Device.LocalAgent.Reboot()").expect("reboot registered");
    assert!(def.is_async);
}

#[test]
fn self_check_fails_for_an_unsupported_mode_and_succeeds_otherwise() {
    let mut registry = Registry::new();
    build(&mut registry).expect("register operations");
    let def = registry.find_operation("Device.LocalAgent.SelfCheck()").expect("self check registered");
    assert!(!def.is_async);

    let mut input = HashMap::new();
    input.insert("Mode".to_string(), "unsupported".to_string());
    assert!((def.handler)(&input).is_err());

    input.insert("Mode".to_string(), "quick".to_string());
    assert_eq!((def.handler)(&input).unwrap().get("Result").map(String::as_str), Some("OK"));
}

#[test]
fn clear_event_log_is_synchronous_with_no_output_args() {
    let mut registry = Registry::new();
    build(&mut registry).expect("register operations");
    let def = registry.find_operation("Device.DeviceInfo.ClearEventLog()").expect("clear event log registered");
    assert!(!def.is_async);
    assert!(def.output_args.is_empty());
}
