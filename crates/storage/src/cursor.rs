// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Consumer positions in event streams.
//!
//! Consumers never hold pointers into the log; they hold a
//! `(stream, position)` pair persisted here. Positions only move forward.

use crate::bak::rotate_bak_path;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sqk_core::id::CursorId;
use sqk_core::{ErrorClass, StreamType};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CursorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot advance past stream head: position {position} > head {head}")]
    InvalidPosition { position: u64, head: u64 },
}

impl CursorError {
    pub fn class(&self) -> ErrorClass {
        match self {
            CursorError::Io(_) => ErrorClass::TransientIo,
            CursorError::Json(_) => ErrorClass::Integrity,
            CursorError::InvalidPosition { .. } => ErrorClass::Validation,
        }
    }
}

/// A consumer's position in one stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub id: CursorId,
    pub stream_type: StreamType,
    pub stream_id: String,
    /// Last processed sequence number. Non-decreasing.
    pub position: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_id: Option<String>,
    pub updated_at_epoch_ms: u64,
}

/// JSON-file-backed cursor collection.
pub struct CursorStore {
    path: PathBuf,
    inner: Mutex<HashMap<String, Cursor>>,
}

impl CursorStore {
    /// Open (or create) the cursor file. A corrupt file is rotated to `.bak`
    /// and the store starts empty; cursors repopulate as consumers advance.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CursorError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let cursors = if path.exists() {
            match serde_json::from_slice::<HashMap<String, Cursor>>(&fs::read(&path)?) {
                Ok(map) => map,
                Err(err) => {
                    let bak = rotate_bak_path(&path);
                    fs::rename(&path, &bak)?;
                    tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "cursor file corrupt; rotated to bak and starting empty"
                    );
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        Ok(Self { path, inner: Mutex::new(cursors) })
    }

    fn key(stream_type: StreamType, stream_id: &str, consumer_id: Option<&str>) -> String {
        format!("{stream_type}/{stream_id}/{}", consumer_id.unwrap_or("-"))
    }

    /// Advance a cursor.
    ///
    /// Advancing to a position at or below the current one is a no-op
    /// (returns `Ok(false)`); advancing past the stream head fails with
    /// [`CursorError::InvalidPosition`].
    pub fn advance(
        &self,
        stream_type: StreamType,
        stream_id: &str,
        consumer_id: Option<&str>,
        position: u64,
        head: u64,
        now_ms: u64,
    ) -> Result<bool, CursorError> {
        if position > head {
            return Err(CursorError::InvalidPosition { position, head });
        }

        let mut inner = self.inner.lock();
        let key = Self::key(stream_type, stream_id, consumer_id);
        let current = inner.get(&key).map(|c| c.position).unwrap_or(0);
        if position <= current {
            return Ok(false);
        }

        match inner.get_mut(&key) {
            Some(cursor) => {
                cursor.position = position;
                cursor.updated_at_epoch_ms = now_ms;
            }
            None => {
                inner.insert(
                    key,
                    Cursor {
                        id: CursorId::new(),
                        stream_type,
                        stream_id: stream_id.to_string(),
                        position,
                        consumer_id: consumer_id.map(str::to_string),
                        updated_at_epoch_ms: now_ms,
                    },
                );
            }
        }
        self.persist(&inner)?;
        Ok(true)
    }

    pub fn get(
        &self,
        stream_type: StreamType,
        stream_id: &str,
        consumer_id: Option<&str>,
    ) -> Option<Cursor> {
        self.inner.lock().get(&Self::key(stream_type, stream_id, consumer_id)).cloned()
    }

    /// Current position (0 when the consumer has seen nothing).
    pub fn position(
        &self,
        stream_type: StreamType,
        stream_id: &str,
        consumer_id: Option<&str>,
    ) -> u64 {
        self.get(stream_type, stream_id, consumer_id).map(|c| c.position).unwrap_or(0)
    }

    fn persist(&self, cursors: &HashMap<String, Cursor>) -> Result<(), CursorError> {
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(cursors)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "cursor_tests.rs"]
mod tests;
