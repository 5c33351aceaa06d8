// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_round_trips_through_db_string() {
    for (ty, raw) in [
        (ParamType::String, "hello"),
        (ParamType::Int, "-42"),
        (ParamType::UnsignedInt, "42"),
        (ParamType::Boolean, "true"),
        (ParamType::DateTime, "2026-07-28T00:00:00Z"),
        (ParamType::Base64, "aGVsbG8="),
    ] {
        let v = ParamValue::parse(ty, raw).unwrap();
        assert_eq!(v.param_type(), ty);
        assert_eq!(v.to_db_string(), raw);
    }
}

#[test]
fn boolean_accepts_numeric_form() {
    assert_eq!(ParamValue::parse(ParamType::Boolean, "1").unwrap(), ParamValue::Boolean(true));
    assert_eq!(ParamValue::parse(ParamType::Boolean, "0").unwrap(), ParamValue::Boolean(false));
}

#[test]
fn invalid_boolean_is_invalid_value() {
    let err = ParamValue::parse(ParamType::Boolean, "notabool").unwrap_err();
    assert_eq!(err.kind(), "INVALID_VALUE");
}

#[test]
fn invalid_int_is_invalid_value() {
    assert!(ParamValue::parse(ParamType::Int, "abc").is_err());
    assert!(ParamValue::parse(ParamType::UnsignedInt, "-1").is_err());
}

#[test]
fn invalid_base64_rejected() {
    assert!(ParamValue::parse(ParamType::Base64, "not base64!!").is_err());
}

#[test]
fn empty_base64_is_valid() {
    assert!(ParamValue::parse(ParamType::Base64, "").is_ok());
}

#[test]
fn access_is_writable() {
    assert!(Access::ReadWrite.is_writable());
    assert!(!Access::ReadOnly.is_writable());
}
