// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn value_change_poll_round_trips() {
    let id = TimerId::value_change_poll();
    assert_eq!(id.kind(), Some(TimerKind::ValueChangePoll));
}

#[test]
fn stomp_connect_timeout_round_trips() {
    let id = TimerId::stomp_connect_timeout(3);
    assert_eq!(id.kind(), Some(TimerKind::StompConnectTimeout { conn_id: 3 }));
}

#[test]
fn stomp_retry_round_trips() {
    let id = TimerId::stomp_retry(7);
    assert_eq!(id.kind(), Some(TimerKind::StompRetry { conn_id: 7 }));
}

#[test]
fn notify_retry_round_trips_with_endpoint_containing_colons() {
    let ep = EndpointId::new("os::00D09E-TR369Agent-0001");
    let id = TimerId::notify_retry(&ep, 42);
    assert_eq!(id.kind(), Some(TimerKind::NotifyRetry { controller: ep, message_id: 42 }));
}

#[test]
fn operation_start_round_trips() {
    let id = TimerId::operation_start("cmd-abc123");
    assert_eq!(id.kind(), Some(TimerKind::OperationStart { command_key: "cmd-abc123".to_string() }));
}

#[test]
fn unknown_prefix_fails_to_parse() {
    assert_eq!(TimerKind::parse("unknown-timer:x"), None);
}

#[test]
fn distinct_timer_ids_are_not_equal() {
    assert_ne!(TimerId::stomp_retry(1), TimerId::stomp_retry(2));
}
