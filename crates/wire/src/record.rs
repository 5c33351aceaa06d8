// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The USP Record envelope (TR-369 `usp-record.proto`): the outermost
//! protobuf message carried inside a STOMP frame body or a CoAP payload,
//! wrapping a [`crate::message::Msg`].

use prost::Message;

/// Payload security applied to `payload` before it left the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, prost::Enumeration)]
#[repr(i32)]
pub enum PayloadSecurity {
    Plaintext = 0,
    TlsSecure = 1,
}

/// A USP Record: the envelope every MTP frame carries, independent of
/// transport.
#[derive(Debug, Clone, PartialEq, Message)]
pub struct Record {
    #[prost(string, tag = "1")]
    pub version: String,
    #[prost(string, tag = "2")]
    pub to_id: String,
    #[prost(string, tag = "3")]
    pub from_id: String,
    #[prost(enumeration = "PayloadSecurity", tag = "4")]
    pub payload_security: i32,
    #[prost(bytes = "vec", tag = "5")]
    pub mac_signature: Vec<u8>,
    #[prost(bytes = "vec", tag = "6")]
    pub sender_cert: Vec<u8>,
    /// Encoded [`crate::message::Msg`] bytes.
    #[prost(bytes = "vec", tag = "7")]
    pub payload: Vec<u8>,
}

impl Record {
    pub fn new(to_id: impl Into<String>, from_id: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            version: "1.3".to_string(),
            to_id: to_id.into(),
            from_id: from_id.into(),
            payload_security: PayloadSecurity::Plaintext as i32,
            mac_signature: Vec::new(),
            sender_cert: Vec::new(),
            payload,
        }
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
