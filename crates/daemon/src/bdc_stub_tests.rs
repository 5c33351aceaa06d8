// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn drains_requests_until_channel_closes() {
    let (tx, rx) = mpsc::channel(4);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    tx.send(BdcUploadRequest {
        profile_name: "Device.BulkData.Profile.1".to_string(),
        report: vec![("Device.DeviceInfo.UpTime".to_string(), "42".to_string())],
    })
    .await
    .unwrap();
    drop(tx);

    // Channel closed with no shutdown signal: `run` observes `recv` return
    // `None` and returns on its own.
    run(rx, shutdown_rx).await;
}

#[tokio::test]
async fn stops_on_shutdown_signal_even_with_no_pending_requests() {
    let (_tx, rx) = mpsc::channel(4);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    shutdown_tx.send(true).unwrap();
    run(rx, shutdown_rx).await;
}
