// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn send_before_start_is_rejected() {
    let mut adapter = FakeAdapter::new();
    let err = adapter.send(vec![1]).await.unwrap_err();
    assert!(matches!(err, MtpError::NotConnected));
}

#[tokio::test]
async fn sent_messages_accumulate_in_order() {
    let mut adapter = FakeAdapter::new();
    adapter.start().await.expect("start");
    adapter.send(vec![1]).await.expect("send");
    adapter.send(vec![2]).await.expect("send");
    assert_eq!(adapter.sent_messages(), vec![vec![1], vec![2]]);
}
