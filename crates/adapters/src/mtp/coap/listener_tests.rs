// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn start_binds_the_socket_and_reports_up() {
    let config = CoapConfig::new("127.0.0.1:0".parse().expect("addr"), "/usp");
    let mut listener = CoapListener::new(1, config);
    assert_eq!(listener.status(), MtpStatus::Down);
    listener.start().await.expect("start");
    assert_eq!(listener.status(), MtpStatus::Up);
}

#[tokio::test]
async fn stop_releases_the_socket_and_reports_down() {
    let config = CoapConfig::new("127.0.0.1:0".parse().expect("addr"), "/usp");
    let mut listener = CoapListener::new(2, config);
    listener.start().await.expect("start");
    listener.stop().await.expect("stop");
    assert_eq!(listener.status(), MtpStatus::Down);
}

#[tokio::test]
async fn send_without_a_configured_controller_is_rejected() {
    let config = CoapConfig::new("127.0.0.1:0".parse().expect("addr"), "/usp");
    let mut listener = CoapListener::new(3, config);
    listener.start().await.expect("start");
    let err = listener.send(vec![1, 2, 3]).await.unwrap_err();
    assert!(matches!(err, MtpError::NotConnected));
}

#[tokio::test]
async fn a_small_post_is_received_and_acknowledged() {
    let config = CoapConfig::new("127.0.0.1:0".parse().expect("addr"), "/usp");
    let mut listener = CoapListener::new(4, config);
    listener.start().await.expect("start");
    let bound_addr = listener.socket.as_ref().expect("socket").local_addr().expect("addr");

    let client = UdpSocket::bind("127.0.0.1:0").await.expect("client bind");
    let mut packet = Packet::new();
    packet.header.set_type(coap_lite::MessageType::Confirmable);
    packet.header.code = MessageClass::Request(RequestType::Post);
    packet.header.message_id = 1;
    packet.set_token(vec![1, 2, 3, 4]);
    packet.payload = b"hello usp".to_vec();
    client.send_to(&packet.to_bytes().expect("encode"), bound_addr).await.expect("send");

    let received = listener.poll_inbound().await.expect("poll").expect("payload present");
    assert_eq!(received, b"hello usp");
}
