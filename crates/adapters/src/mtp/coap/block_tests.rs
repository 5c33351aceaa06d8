// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn block_value_round_trips_through_encode_decode() {
    let value = BlockValue { num: 42, more: true, szx: BLOCK_SZX };
    let bytes = value.encode();
    let decoded = BlockValue::decode(&bytes).expect("decode");
    assert_eq!(decoded, value);
}

#[test]
fn last_block_clears_the_more_flag() {
    let payload = vec![7u8; BLOCK_SIZE + 10];
    let blocks = split_into_blocks(&payload);
    assert_eq!(blocks.len(), 2);
    assert!(blocks[0].0.more);
    assert!(!blocks[1].0.more);
}

#[test]
fn reassembler_rebuilds_the_original_payload_in_order() {
    let payload: Vec<u8> = (0u8..=255).cycle().take(BLOCK_SIZE * 2 + 17).collect();
    let blocks = split_into_blocks(&payload);
    let mut reassembler = BlockReassembler::default();
    let mut result = None;
    for (block, chunk) in blocks {
        result = reassembler.accept(block, chunk).expect("accept");
    }
    assert_eq!(result, Some(payload));
}

#[test]
fn reassembler_rejects_an_out_of_order_block() {
    let mut reassembler = BlockReassembler::default();
    let block = BlockValue { num: 1, more: false, szx: BLOCK_SZX };
    assert!(reassembler.accept(block, b"late").is_err());
}
