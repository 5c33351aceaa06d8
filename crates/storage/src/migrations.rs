// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot schema migrations.
//!
//! A snapshot written by an older build carries a lower `v` than
//! [`crate::snapshot::CURRENT_SNAPSHOT_VERSION`]. [`MigrationRegistry`] walks
//! the chain of registered single-version-step migrations to bring it
//! forward before it is deserialized into [`crate::state::MaterializedState`].

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MigrationError {
    #[error("snapshot version {0} is newer than this build supports ({1})")]
    TooNew(u32, u32),
    #[error("no migration path from version {0} to {1}")]
    NoPath(u32, u32),
    #[error("migration failed: {0}")]
    Failed(String),
}

/// A single schema-version step, applied in place to the raw JSON snapshot.
pub trait Migration: Send + Sync {
    fn source_version(&self) -> u32;
    fn target_version(&self) -> u32;
    fn migrate(&self, snapshot: &mut Value) -> Result<(), MigrationError>;
}

#[derive(Default)]
pub struct MigrationRegistry {
    migrations: Vec<Box<dyn Migration>>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self { migrations: Vec::new() }
    }

    fn version_of(snapshot: &Value) -> u32 {
        snapshot.get("v").and_then(Value::as_u64).unwrap_or(0) as u32
    }

    /// Migrate `snapshot` forward to `target`, or reject it if it's either
    /// already current, from a newer build, or has no registered path.
    pub fn migrate_to(&self, snapshot: Value, target: u32) -> Result<Value, MigrationError> {
        let mut current = snapshot;
        let mut version = Self::version_of(&current);

        if version == target {
            return Ok(current);
        }
        if version > target {
            return Err(MigrationError::TooNew(version, target));
        }

        while version != target {
            let step = self
                .migrations
                .iter()
                .find(|m| m.source_version() == version)
                .ok_or(MigrationError::NoPath(version, target))?;
            step.migrate(&mut current)?;
            version = step.target_version();
            if let Some(obj) = current.as_object_mut() {
                obj.insert("v".into(), version.into());
            }
        }
        Ok(current)
    }
}

#[cfg(test)]
#[path = "migration_tests.rs"]
mod tests;
