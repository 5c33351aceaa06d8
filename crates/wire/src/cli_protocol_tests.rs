// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn error_response_exits_non_zero() {
    let resp = CliResponse::Error { err_code: 7000, err_msg: "boom".to_string() };
    assert_eq!(resp.exit_code(), 1);
}

#[test]
fn ack_response_exits_zero() {
    assert_eq!(CliResponse::Ack.exit_code(), 0);
}

#[test]
fn request_serializes_with_tagged_op() {
    let req = CliRequest::Dump;
    let json = serde_json::to_value(&req).expect("serialize");
    assert_eq!(json["op"], "dump");
}
