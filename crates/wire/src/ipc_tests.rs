// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::cli_protocol::{CliRequest, CliResponse};

#[tokio::test]
async fn write_then_read_round_trips() {
    let (mut client, mut server) = tokio::io::duplex(4096);

    let req = CliRequest::Get { paths: vec!["Device.DeviceInfo.UpTime".to_string()] };
    write_frame(&mut client, &req).await.expect("write");

    let got: CliRequest = read_frame(&mut server).await.expect("read").expect("some");
    assert_eq!(got, req);
}

#[tokio::test]
async fn read_frame_returns_none_on_clean_eof() {
    let (client, mut server) = tokio::io::duplex(4096);
    drop(client);
    let got: Option<CliResponse> = read_frame(&mut server).await.expect("read");
    assert!(got.is_none());
}
