// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_record_defaults_to_plaintext() {
    let r = Record::new("self::controller-1", "os::00D09E-Agent-1", vec![1, 2, 3]);
    assert_eq!(r.payload_security, PayloadSecurity::Plaintext as i32);
    assert_eq!(r.payload, vec![1, 2, 3]);
    assert_eq!(r.to_id, "self::controller-1");
}
