// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CoAP Block1/Block2 option value encoding (RFC 7959), used to carry USP
//! Records that exceed a single UDP datagram.
//!
//! `coap-lite` hands us raw option bytes; the 3-byte-packed block value
//! itself (block number, more-flag, size exponent) is simple enough to
//! encode by hand rather than pull in a second crate for it.

/// Block size exponent for 1024-byte blocks (`szx = 6`), the largest size
/// the 64 KiB `MAX_USP_MSG_LEN` budget needs before reassembly.
pub const BLOCK_SZX: u8 = 6;
pub const BLOCK_SIZE: usize = 1 << (BLOCK_SZX as usize + 4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockValue {
    pub num: u32,
    pub more: bool,
    pub szx: u8,
}

impl BlockValue {
    pub fn encode(&self) -> Vec<u8> {
        let szx_more = (self.szx & 0x07) | if self.more { 0x08 } else { 0 };
        let mut value = (self.num << 4) | u32::from(szx_more);
        // Minimal big-endian encoding: CoAP block options are 0-3 bytes.
        let mut bytes = Vec::new();
        while value > 0 || bytes.is_empty() {
            bytes.push((value & 0xFF) as u8);
            value >>= 8;
            if bytes.len() == 3 {
                break;
            }
        }
        bytes.reverse();
        bytes
    }

    pub fn decode(bytes: &[u8]) -> Option<BlockValue> {
        if bytes.is_empty() || bytes.len() > 3 {
            return None;
        }
        let mut value: u32 = 0;
        for b in bytes {
            value = (value << 8) | u32::from(*b);
        }
        let szx_more = (value & 0x0F) as u8;
        Some(BlockValue { num: value >> 4, more: szx_more & 0x08 != 0, szx: szx_more & 0x07 })
    }

    pub fn block_size(&self) -> usize {
        1 << (self.szx as usize + 4)
    }
}

/// Splits `payload` into consecutive `BLOCK_SIZE` chunks, each paired with
/// the Block1 value to send alongside it.
pub fn split_into_blocks(payload: &[u8]) -> Vec<(BlockValue, &[u8])> {
    if payload.is_empty() {
        return vec![(BlockValue { num: 0, more: false, szx: BLOCK_SZX }, payload)];
    }
    payload
        .chunks(BLOCK_SIZE)
        .enumerate()
        .map(|(i, chunk)| {
            let more = (i + 1) * BLOCK_SIZE < payload.len();
            (BlockValue { num: i as u32, more, szx: BLOCK_SZX }, chunk)
        })
        .collect()
}

/// Reassembles blocks received in order into one payload buffer. Returns
/// `None` if the caller needs to wait for more blocks.
#[derive(Debug, Default)]
pub struct BlockReassembler {
    buf: Vec<u8>,
    expected_next: u32,
}

impl BlockReassembler {
    /// Appends one block's payload; returns `Some(complete)` once the final
    /// (`more == false`) block has been received, in order.
    pub fn accept(&mut self, block: BlockValue, chunk: &[u8]) -> Result<Option<Vec<u8>>, &'static str> {
        if block.num != self.expected_next {
            return Err("out-of-order block");
        }
        self.buf.extend_from_slice(chunk);
        self.expected_next += 1;
        if block.more {
            Ok(None)
        } else {
            Ok(Some(std::mem::take(&mut self.buf)))
        }
    }
}

#[cfg(test)]
#[path = "block_tests.rs"]
mod tests;
