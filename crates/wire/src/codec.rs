// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Protobuf encode/decode for [`Record`], with the `MAX_USP_MSG_LEN` bound
//! enforced before a frame is handed to `prost` at all.

use prost::Message;
use thiserror::Error;

use crate::record::Record;

/// Maximum accepted message length: 64 KiB.
pub const MAX_USP_MSG_LEN: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("record of {0} bytes exceeds MAX_USP_MSG_LEN ({MAX_USP_MSG_LEN})")]
    TooLarge(usize),
    #[error("protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),
}

/// Encode a [`Record`] to protobuf bytes. Callers are expected to have
/// already bounded `record.payload`; this only re-checks the outer frame.
pub fn encode_record(record: &Record) -> Result<Vec<u8>, WireError> {
    let mut buf = Vec::with_capacity(record.encoded_len());
    // A `Vec<u8>` buffer sized by `encoded_len()` never runs out of
    // capacity, so `encode` cannot fail here; the `Result` only exists for
    // `BufMut` implementors that can.
    let _ = record.encode(&mut buf);
    if buf.len() > MAX_USP_MSG_LEN {
        return Err(WireError::TooLarge(buf.len()));
    }
    Ok(buf)
}

/// Decode a [`Record`] from protobuf bytes, rejecting oversized input before
/// it ever reaches `prost::Message::decode`.
pub fn decode_record(bytes: &[u8]) -> Result<Record, WireError> {
    if bytes.len() > MAX_USP_MSG_LEN {
        return Err(WireError::TooLarge(bytes.len()));
    }
    Ok(Record::decode(bytes)?)
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
