// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Secure parameter storage.
//!
//! TR-369 calls out that plaintext secrets (STOMP passwords, PSKs) must not
//! sit in the clear in durable storage — but also only asks for obfuscation
//! against casual inspection of the snapshot file, not cryptographic
//! confidentiality against an attacker who already has disk access (that's
//! the factory-reset-on-tamper and filesystem-permission boundary's job).
//! [`obfuscate`]/[`deobfuscate`] is a reversible XOR stream over a
//! fixed keystream; callers that need real secrecy belong behind a vendor
//! HSM-backed [`uspa_core::schema::GetterFn`]/[`uspa_core::schema::SetterFn`]
//! pair instead of this module.

const KEYSTREAM: &[u8] = b"uspa-agent-obfuscation-keystream";

fn xor(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().zip(KEYSTREAM.iter().cycle()).map(|(b, k)| b ^ k).collect()
}

/// Obfuscate `plaintext` into a hex string suitable for [`crate::state::MaterializedState::params`].
pub fn obfuscate(plaintext: &str) -> String {
    xor(plaintext.as_bytes()).iter().map(|b| format!("{b:02x}")).collect()
}

/// Recover the plaintext from a value previously produced by [`obfuscate`].
pub fn deobfuscate(stored: &str) -> Option<String> {
    if stored.len() % 2 != 0 {
        return None;
    }
    let bytes: Option<Vec<u8>> =
        (0..stored.len()).step_by(2).map(|i| u8::from_str_radix(&stored[i..i + 2], 16).ok()).collect();
    let bytes = xor(&bytes?);
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
