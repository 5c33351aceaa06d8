// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead log of [`Event`]s.
//!
//! Every durable mutation is appended here before it is considered
//! committed; [`crate::checkpoint::Checkpointer`] periodically folds the log
//! into a snapshot and truncates the entries it has folded in. Replaying an
//! empty snapshot plus the full log must reproduce live state exactly, so
//! entries are never rewritten in place — only appended or, after a
//! checkpoint, truncated from the front.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use uspa_core::Event;

use crate::error::StorageError;

const FLUSH_THRESHOLD: usize = 100;
const FLUSH_INTERVAL: Duration = Duration::from_secs(1);
const MAX_BAK_FILES: u32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    pub seq: u64,
    pub event: Event,
}

pub struct Wal {
    path: PathBuf,
    writer: BufWriter<File>,
    entries: Vec<WalEntry>,
    write_seq: u64,
    processed_seq: u64,
    read_cursor: usize,
    pending_since_flush: usize,
    last_flush: Instant,
}

impl Wal {
    /// Open (creating if absent) the log at `path`, resuming from
    /// `processed_seq` — the sequence number already folded into the last
    /// loaded snapshot. Any trailing garbage (a partially-written final
    /// line from a crash mid-append) is rotated into a `.bak` file and the
    /// log is rewritten with only its valid prefix.
    pub fn open(path: impl AsRef<Path>, processed_seq: u64) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        let raw = if path.exists() { fs::read(&path)? } else { Vec::new() };
        let (entries, corrupt) = Self::parse_valid_prefix(&raw);

        if corrupt {
            let bak = rotate_bak_path(&path);
            fs::write(&bak, &raw)?;
            Self::rewrite(&path, &entries)?;
        }

        let write_seq = entries.last().map(|e| e.seq).unwrap_or(0);
        let read_cursor = entries.iter().position(|e| e.seq > processed_seq).unwrap_or(entries.len());

        let writer = BufWriter::new(OpenOptions::new().create(true).append(true).open(&path)?);

        Ok(Self {
            path,
            writer,
            entries,
            write_seq,
            processed_seq,
            read_cursor,
            pending_since_flush: 0,
            last_flush: Instant::now(),
        })
    }

    /// Parse newline-delimited JSON entries, stopping at the first line that
    /// isn't valid UTF-8 or valid JSON. Returns the valid prefix and whether
    /// anything (including unterminated/corrupt trailing bytes) was dropped.
    fn parse_valid_prefix(raw: &[u8]) -> (Vec<WalEntry>, bool) {
        let mut entries = Vec::new();
        let mut consumed = 0usize;
        for line in raw.split(|&b| b == b'\n') {
            if line.is_empty() {
                consumed += 1;
                continue;
            }
            let Ok(text) = std::str::from_utf8(line) else { return (entries, true) };
            let Ok(entry) = serde_json::from_str::<WalEntry>(text) else { return (entries, true) };
            entries.push(entry);
            consumed += line.len() + 1;
        }
        (entries, consumed < raw.len())
    }

    fn rewrite(path: &Path, entries: &[WalEntry]) -> Result<(), StorageError> {
        let mut buf = Vec::new();
        for entry in entries {
            serde_json::to_writer(&mut buf, entry)?;
            buf.push(b'\n');
        }
        fs::write(path, buf)?;
        Ok(())
    }

    pub fn append(&mut self, event: &Event) -> Result<u64, StorageError> {
        let seq = self.write_seq + 1;
        let entry = WalEntry { seq, event: event.clone() };
        serde_json::to_writer(&mut self.writer, &entry)?;
        self.writer.write_all(b"\n")?;
        self.entries.push(entry);
        self.write_seq = seq;
        self.pending_since_flush += 1;
        Ok(seq)
    }

    pub fn flush(&mut self) -> Result<(), StorageError> {
        self.writer.flush()?;
        self.pending_since_flush = 0;
        self.last_flush = Instant::now();
        Ok(())
    }

    pub fn needs_flush(&self) -> bool {
        self.pending_since_flush >= FLUSH_THRESHOLD || self.last_flush.elapsed() >= FLUSH_INTERVAL
    }

    /// Next entry that hasn't been handed out by this call before, in
    /// sequence order. Returns `None` once the in-memory log is exhausted —
    /// data appended directly to the file outside this handle is never seen.
    pub fn next_unprocessed(&mut self) -> Result<Option<WalEntry>, StorageError> {
        let entry = self.entries.get(self.read_cursor).cloned();
        if entry.is_some() {
            self.read_cursor += 1;
        }
        Ok(entry)
    }

    pub fn mark_processed(&mut self, seq: u64) {
        self.processed_seq = seq;
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn entries_after(&self, seq: u64) -> Result<Vec<WalEntry>, StorageError> {
        Ok(self.entries.iter().filter(|e| e.seq > seq).cloned().collect())
    }

    /// Drop entries with `seq < keep_from` and rewrite the log, called after
    /// a checkpoint has folded them into a snapshot.
    pub fn truncate_before(&mut self, keep_from: u64) -> Result<(), StorageError> {
        self.entries.retain(|e| e.seq >= keep_from);
        self.flush()?;
        Self::rewrite(&self.path, &self.entries)?;
        self.writer = BufWriter::new(OpenOptions::new().create(true).append(true).open(&self.path)?);
        self.read_cursor = self.read_cursor.min(self.entries.len());
        Ok(())
    }
}

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out. Keeps
/// at most [`MAX_BAK_FILES`] generations, evicting the oldest.
pub(crate) fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| if n == 1 { path.with_extension("bak") } else { path.with_extension(format!("bak.{n}")) };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }
    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }
    bak(1)
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
