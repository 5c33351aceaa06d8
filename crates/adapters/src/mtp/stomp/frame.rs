// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal STOMP 1.2 frame encoding/decoding — just enough of the protocol
//! for the Agent MTP binding: CONNECT/CONNECTED, SUBSCRIBE,
//! SEND/MESSAGE, ERROR, and DISCONNECT. Not a general-purpose STOMP client.

use crate::capability::MtpError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StompFrame {
    pub command: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl StompFrame {
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into(), headers: Vec::new(), body: Vec::new() }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn connect(host: &str, login: Option<&str>, passcode: Option<&str>) -> Self {
        let mut frame = StompFrame::new("CONNECT")
            .with_header("accept-version", "1.2")
            .with_header("host", host)
            .with_header("heart-beat", "10000,10000");
        if let Some(login) = login {
            frame = frame.with_header("login", login);
        }
        if let Some(passcode) = passcode {
            frame = frame.with_header("passcode", passcode);
        }
        frame
    }

    pub fn subscribe(destination: &str, id: &str) -> Self {
        StompFrame::new("SUBSCRIBE")
            .with_header("destination", destination)
            .with_header("id", id)
            .with_header("ack", "client-individual")
    }

    /// `receipt_id` is echoed back by the broker on a `RECEIPT` frame (or
    /// referenced by an `ERROR` frame's `receipt-id` header on failure) so
    /// the sender can match the acknowledgement to this specific SEND.
    pub fn send(destination: &str, content_type: &str, body: Vec<u8>, receipt_id: &str) -> Self {
        StompFrame::new("SEND")
            .with_header("destination", destination)
            .with_header("content-type", content_type)
            .with_header("content-length", body.len().to_string())
            .with_header("receipt", receipt_id)
            .with_body(body)
    }

    pub fn ack(message_id: &str, subscription: &str) -> Self {
        StompFrame::new("ACK")
            .with_header("message-id", message_id)
            .with_header("subscription", subscription)
    }

    pub fn disconnect() -> Self {
        StompFrame::new("DISCONNECT")
    }

    /// Encode to wire bytes, terminated by the mandatory NUL octet.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.body.len() + 64);
        out.extend_from_slice(self.command.as_bytes());
        out.push(b'\n');
        for (name, value) in &self.headers {
            out.extend_from_slice(name.as_bytes());
            out.push(b':');
            out.extend_from_slice(value.as_bytes());
            out.push(b'\n');
        }
        out.push(b'\n');
        out.extend_from_slice(&self.body);
        out.push(0);
        out
    }
}

/// Incremental decoder fed raw socket bytes; yields complete frames as they
/// become available, tolerating frames split across multiple TCP reads.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Pop the next complete frame out of the buffer, if one is present.
    /// Leading newlines (STOMP heart-beat keepalives) are silently consumed.
    pub fn next_frame(&mut self) -> Result<Option<StompFrame>, MtpError> {
        while self.buf.first() == Some(&b'\n') {
            self.buf.remove(0);
        }
        if self.buf.is_empty() {
            return Ok(None);
        }
        let header_end = match find_subslice(&self.buf, b"\n\n") {
            Some(idx) => idx,
            None => return Ok(None),
        };
        let head = &self.buf[..header_end];
        let mut lines = head.split(|&b| b == b'\n');
        let command = lines
            .next()
            .map(|l| String::from_utf8_lossy(l).to_string())
            .ok_or_else(|| MtpError::Protocol("empty frame".to_string()))?;
        let mut headers = Vec::new();
        for line in lines {
            if line.is_empty() {
                continue;
            }
            if let Some(colon) = line.iter().position(|&b| b == b':') {
                let name = String::from_utf8_lossy(&line[..colon]).to_string();
                let value = String::from_utf8_lossy(&line[colon + 1..]).to_string();
                headers.push((name, value));
            }
        }
        let body_start = header_end + 2;
        let content_length: Option<usize> = headers
            .iter()
            .find(|(k, _)| k == "content-length")
            .and_then(|(_, v)| v.parse().ok());
        let body_end = match content_length {
            Some(len) => {
                let end = body_start + len;
                if self.buf.len() <= end {
                    return Ok(None);
                }
                if self.buf[end] != 0 {
                    return Err(MtpError::Protocol("missing NUL after content-length body".to_string()));
                }
                end
            }
            None => match find_subslice(&self.buf[body_start..], &[0]) {
                Some(rel) => body_start + rel,
                None => return Ok(None),
            },
        };
        let body = self.buf[body_start..body_end].to_vec();
        self.buf.drain(..=body_end);
        Ok(Some(StompFrame { command, headers, body }))
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
