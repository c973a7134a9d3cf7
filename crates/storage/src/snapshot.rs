// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed checkpoint store.
//!
//! One `{chk-…}.json` per checkpoint under the checkpoints directory, with
//! a `latest.json` pointer (symlink, falling back to a copy where symlinks
//! are unavailable). This is the secondary half of the dual write; either
//! side suffices to rebuild a mission.

use sqk_core::{Checkpoint, CheckpointId, ErrorClass};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const LATEST: &str = "latest.json";

/// Errors from the checkpoint file store
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("checkpoint schema violation: {0}")]
    Schema(String),
}

impl SnapshotError {
    pub fn class(&self) -> ErrorClass {
        match self {
            SnapshotError::Io(_) => ErrorClass::TransientIo,
            SnapshotError::Json(_) | SnapshotError::Schema(_) => ErrorClass::Integrity,
        }
    }
}

/// Checkpoint directory handle.
pub struct CheckpointFiles {
    dir: PathBuf,
}

impl CheckpointFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_path(&self, id: &CheckpointId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Write a checkpoint file and repoint `latest.json` at it.
    pub fn write(&self, checkpoint: &Checkpoint) -> Result<PathBuf, SnapshotError> {
        fs::create_dir_all(&self.dir)?;

        let path = self.file_path(&checkpoint.id);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(checkpoint)?)?;
        fs::rename(&tmp, &path)?;

        self.point_latest(Some(&format!("{}.json", checkpoint.id)))?;
        Ok(path)
    }

    /// Read one checkpoint by id. `Ok(None)` when no file exists.
    pub fn read(&self, id: &CheckpointId) -> Result<Option<Checkpoint>, SnapshotError> {
        let path = self.file_path(id);
        if !path.exists() {
            return Ok(None);
        }
        read_file(&path).map(Some)
    }

    /// Newest checkpoint for a mission by snapshot timestamp, scanning the
    /// directory. Unreadable files are skipped with a warning.
    pub fn latest_for(&self, mission_id: &str) -> Result<Option<Checkpoint>, SnapshotError> {
        Ok(self
            .scan()?
            .into_iter()
            .filter(|c| c.mission_id.as_str() == mission_id)
            .max_by_key(|c| c.timestamp_epoch_ms))
    }

    /// The checkpoint `latest.json` points at, if any.
    pub fn latest(&self) -> Result<Option<Checkpoint>, SnapshotError> {
        let pointer = self.dir.join(LATEST);
        if !pointer.exists() {
            return Ok(None);
        }
        read_file(&pointer).map(Some)
    }

    /// Delete a checkpoint file, repointing `latest.json` at the newest
    /// remaining checkpoint (or removing it). Returns whether a file was
    /// removed.
    pub fn delete(&self, id: &CheckpointId) -> Result<bool, SnapshotError> {
        let path = self.file_path(id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        self.refresh_latest()?;
        Ok(true)
    }

    /// Remove expired checkpoints and those older than the retention window.
    pub fn prune_expired(&self, now_ms: u64, retention_ms: u64) -> Result<usize, SnapshotError> {
        let mut pruned = 0;
        for checkpoint in self.scan()? {
            if checkpoint.is_expired(now_ms) || checkpoint.age_ms(now_ms) > retention_ms {
                if fs::remove_file(self.file_path(&checkpoint.id)).is_ok() {
                    pruned += 1;
                }
            }
        }
        if pruned > 0 {
            self.refresh_latest()?;
        }
        Ok(pruned)
    }

    /// All readable checkpoints in the directory.
    pub fn scan(&self) -> Result<Vec<Checkpoint>, SnapshotError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut checkpoints = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name == LATEST || !name.ends_with(".json") {
                continue;
            }
            match read_file(&entry.path()) {
                Ok(checkpoint) => checkpoints.push(checkpoint),
                Err(err) => {
                    tracing::warn!(
                        file = %entry.path().display(),
                        error = %err,
                        "skipping unreadable checkpoint file"
                    );
                }
            }
        }
        Ok(checkpoints)
    }

    fn refresh_latest(&self) -> Result<(), SnapshotError> {
        let newest = self
            .scan()?
            .into_iter()
            .max_by_key(|c| c.timestamp_epoch_ms)
            .map(|c| format!("{}.json", c.id));
        self.point_latest(newest.as_deref())
    }

    /// Atomically repoint `latest.json`. A symlink is preferred; a copy is
    /// the fallback when the filesystem refuses (e.g. mismatched mounts).
    fn point_latest(&self, file_name: Option<&str>) -> Result<(), SnapshotError> {
        let pointer = self.dir.join(LATEST);
        // Remove the pointer itself, not its target
        if pointer.symlink_metadata().is_ok() {
            fs::remove_file(&pointer)?;
        }
        let Some(file_name) = file_name else {
            return Ok(());
        };

        #[cfg(unix)]
        {
            if std::os::unix::fs::symlink(file_name, &pointer).is_ok() {
                return Ok(());
            }
        }
        fs::copy(self.dir.join(file_name), &pointer)?;
        Ok(())
    }
}

fn read_file(path: &Path) -> Result<Checkpoint, SnapshotError> {
    let checkpoint: Checkpoint = serde_json::from_slice(&fs::read(path)?)?;
    validate(&checkpoint)?;
    Ok(checkpoint)
}

/// Structural checks beyond what deserialization enforces.
fn validate(checkpoint: &Checkpoint) -> Result<(), SnapshotError> {
    if checkpoint.id.is_empty() {
        return Err(SnapshotError::Schema("empty checkpoint id".to_string()));
    }
    if checkpoint.mission_id.is_empty() {
        return Err(SnapshotError::Schema("empty mission id".to_string()));
    }
    if checkpoint.timestamp_epoch_ms == 0 {
        return Err(SnapshotError::Schema("missing snapshot timestamp".to_string()));
    }
    if checkpoint.progress_percent > 100 {
        return Err(SnapshotError::Schema(format!(
            "progress_percent out of range: {}",
            checkpoint.progress_percent
        )));
    }
    if checkpoint.version == 0 {
        return Err(SnapshotError::Schema("missing schema version".to_string()));
    }
    if let Some(expires) = checkpoint.expires_at_epoch_ms {
        if expires <= checkpoint.timestamp_epoch_ms {
            return Err(SnapshotError::Schema("expiry precedes snapshot timestamp".to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
