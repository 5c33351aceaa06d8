// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CoAP Message Transfer Protocol binding.
//!
//! The agent binds one UDP socket per CoAP Agent MTP Table row and serves
//! USP Records as the payload of confirmable POST requests to a single
//! resource path, reassembling Block1-tagged requests that exceed one
//! datagram. Outbound Records
//! (agent-initiated, e.g. a Notify to a CoAP controller) are sent the same
//! way in reverse, chunked into Block1 requests if needed.

use crate::capability::{MtpAdapter, MtpError, MtpStatus};
use crate::mtp::coap::block::{split_into_blocks, BlockReassembler, BlockValue};
use async_trait::async_trait;
use coap_lite::{CoapOption, MessageClass, Packet, RequestType, ResponseType};
use std::collections::{HashMap, LinkedList};
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

const MAX_DATAGRAM: usize = 1500;

#[derive(Debug, Clone)]
pub struct CoapConfig {
    pub bind_addr: SocketAddr,
    pub resource_path: String,
    /// Controller endpoint this MTP row sends agent-initiated Records to.
    pub controller_addr: Option<SocketAddr>,
}

impl CoapConfig {
    pub fn new(bind_addr: SocketAddr, resource_path: impl Into<String>) -> Self {
        Self { bind_addr, resource_path: resource_path.into(), controller_addr: None }
    }
}

pub struct CoapListener {
    mtp_id: u32,
    config: CoapConfig,
    socket: Option<UdpSocket>,
    reassemblers: HashMap<(SocketAddr, Vec<u8>), BlockReassembler>,
}

impl CoapListener {
    pub fn new(mtp_id: u32, config: CoapConfig) -> Self {
        Self { mtp_id, config, socket: None, reassemblers: HashMap::new() }
    }

    pub fn mtp_id(&self) -> u32 {
        self.mtp_id
    }

    /// Receives and reassembles the next complete inbound Record, if any
    /// datagram is currently pending on the socket. Replies 2.04 Changed (or
    /// 2.31 Continue for a non-final block) inline, per RFC 7959 §2.4.
    pub async fn poll_inbound(&mut self) -> Result<Option<Vec<u8>>, MtpError> {
        let socket = self.socket.as_ref().ok_or(MtpError::NotConnected)?;
        let mut buf = [0u8; MAX_DATAGRAM];
        let (n, peer) = socket.recv_from(&mut buf).await?;
        let packet = Packet::from_bytes(&buf[..n])
            .map_err(|_| MtpError::Protocol("malformed coap packet".to_string()))?;
        if !matches!(packet.header.code, MessageClass::Request(RequestType::Post)) {
            debug!(mtp_id = self.mtp_id, "ignoring non-POST coap request");
            return Ok(None);
        }

        let token = packet.get_token().to_vec();
        let block1 = packet
            .get_option(CoapOption::Block1)
            .and_then(|values| values.iter().next())
            .and_then(|bytes| BlockValue::decode(bytes));

        let complete = match block1 {
            Some(block) => {
                let entry = self.reassemblers.entry((peer, token.clone())).or_default();
                match entry.accept(block, &packet.payload) {
                    Ok(Some(full)) => {
                        self.reassemblers.remove(&(peer, token.clone()));
                        Some(full)
                    }
                    Ok(None) => None,
                    Err(reason) => {
                        self.reassemblers.remove(&(peer, token.clone()));
                        warn!(mtp_id = self.mtp_id, reason, "dropping out-of-order coap block");
                        None
                    }
                }
            }
            None => Some(packet.payload.clone()),
        };

        let ack = make_response(&packet, block1.map(|b| b.num));
        self.send_datagram(&ack, peer).await?;

        Ok(complete)
    }

    async fn send_datagram(&self, packet: &Packet, peer: SocketAddr) -> Result<(), MtpError> {
        let socket = self.socket.as_ref().ok_or(MtpError::NotConnected)?;
        let bytes = packet.to_bytes().map_err(|_| MtpError::Protocol("coap encode failed".to_string()))?;
        socket.send_to(&bytes, peer).await?;
        Ok(())
    }
}

fn make_response(request: &Packet, block_num: Option<u32>) -> Packet {
    let mut response = Packet::new();
    response.header.set_type(request.header.get_type());
    response.header.message_id = request.header.message_id;
    response.set_token(request.get_token().to_vec());
    let more_follows = block_num.is_some();
    response.header.code = if more_follows {
        MessageClass::Response(ResponseType::Continue)
    } else {
        MessageClass::Response(ResponseType::Changed)
    };
    response
}

#[async_trait]
impl MtpAdapter for CoapListener {
    async fn start(&mut self) -> Result<(), MtpError> {
        if self.socket.is_some() {
            return Ok(());
        }
        let socket = UdpSocket::bind(self.config.bind_addr).await?;
        self.socket = Some(socket);
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), MtpError> {
        self.socket = None;
        self.reassemblers.clear();
        Ok(())
    }

    fn status(&self) -> MtpStatus {
        if self.socket.is_some() {
            MtpStatus::Up
        } else {
            MtpStatus::Down
        }
    }

    async fn send(&mut self, bytes: Vec<u8>) -> Result<(), MtpError> {
        let peer = self.config.controller_addr.ok_or(MtpError::NotConnected)?;
        let token = uuid::Uuid::new_v4().as_bytes()[..4].to_vec();
        for (block, chunk) in split_into_blocks(&bytes) {
            let mut packet = Packet::new();
            packet.header.set_type(coap_lite::MessageType::Confirmable);
            packet.header.code = MessageClass::Request(RequestType::Post);
            packet.header.message_id = rand::random();
            packet.set_token(token.clone());
            let mut path_option = LinkedList::new();
            path_option.push_back(self.config.resource_path.clone().into_bytes());
            packet.set_option(CoapOption::UriPath, path_option);
            let mut block_option = LinkedList::new();
            block_option.push_back(block.encode());
            packet.set_option(CoapOption::Block1, block_option);
            packet.payload = chunk.to_vec();
            self.send_datagram(&packet, peer).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
