// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only event log partitioned by `(stream_type, stream_id)`.
//!
//! One JSON envelope per line. Sequence numbers are allocated per stream,
//! gapless from 1, atomically with the insert: the whole log sits behind a
//! single writer lock, so concurrent appends to the same stream serialize
//! and no allocation can be observed without its record. Events are never
//! updated or deleted; a corrupt tail is rotated to `.bak` on open and the
//! valid prefix preserved.

use crate::bak::rotate_bak_path;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sqk_core::{Clock, ErrorClass, Event, EventId, StreamType};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Current event envelope schema version. Evolution is by additive fields.
pub const EVENT_SCHEMA_VERSION: u32 = 1;

/// Errors from the event log
#[derive(Debug, Error)]
pub enum LogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stream {stream_type}/{stream_id} has exhausted its sequence space")]
    StreamExhausted {
        stream_type: StreamType,
        stream_id: String,
    },
}

impl LogError {
    pub fn class(&self) -> ErrorClass {
        match self {
            LogError::Io(_) => ErrorClass::TransientIo,
            LogError::Json(_) => ErrorClass::Integrity,
            LogError::StreamExhausted { .. } => ErrorClass::Fatal,
        }
    }
}

/// A recorded event: the payload plus its envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Monotone within `(stream_type, stream_id)`, gapless from 1.
    pub sequence_number: u64,
    /// Globally unique.
    pub event_id: EventId,
    pub stream_type: StreamType,
    pub stream_id: String,
    pub event: Event,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub causation_id: Option<EventId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<EventId>,
    pub occurred_at_epoch_ms: u64,
    pub recorded_at_epoch_ms: u64,
    pub schema_version: u32,
}

impl EventRecord {
    /// The payload's serialized type tag.
    pub fn event_type(&self) -> &'static str {
        self.event.kind()
    }
}

/// Input to [`EventStore::append`].
#[derive(Debug, Clone)]
pub struct AppendEvent {
    pub stream_type: StreamType,
    pub stream_id: String,
    pub event: Event,
    pub causation_id: Option<EventId>,
    pub correlation_id: Option<EventId>,
    /// When the event happened; defaults to append time.
    pub occurred_at_epoch_ms: Option<u64>,
}

impl AppendEvent {
    pub fn new(stream_type: StreamType, stream_id: impl Into<String>, event: Event) -> Self {
        Self {
            stream_type,
            stream_id: stream_id.into(),
            event,
            causation_id: None,
            correlation_id: None,
            occurred_at_epoch_ms: None,
        }
    }

    pub fn caused_by(mut self, event_id: EventId) -> Self {
        self.causation_id = Some(event_id);
        self
    }

    pub fn correlated_with(mut self, event_id: EventId) -> Self {
        self.correlation_id = Some(event_id);
        self
    }
}

/// Filter for [`EventStore::get_events`]. Empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub stream_type: Option<StreamType>,
    pub stream_id: Option<String>,
    pub event_type: Option<String>,
    pub after_sequence: Option<u64>,
    pub limit: Option<usize>,
}

struct LogInner {
    writer: File,
    records: Vec<EventRecord>,
    /// Highest allocated sequence per stream.
    heads: HashMap<(StreamType, String), u64>,
}

/// The append-only event store. The single writer lock makes appends
/// linearizable; reads clone matching records out of the lock.
pub struct EventStore<C: Clock> {
    path: PathBuf,
    clock: C,
    inner: Mutex<LogInner>,
}

impl<C: Clock> EventStore<C> {
    /// Open (or create) the log, replaying existing records.
    ///
    /// A corrupt or binary tail is rotated to a `.bak` file and the valid
    /// prefix rewritten in place, matching how the snapshot store treats
    /// damaged files.
    pub fn open(path: impl Into<PathBuf>, clock: C) -> Result<Self, LogError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let (records, salvaged) = read_records(&path)?;
        if salvaged {
            let bak = rotate_bak_path(&path);
            fs::rename(&path, &bak)?;
            let mut clean = File::create(&path)?;
            for record in &records {
                let line = serde_json::to_string(record)?;
                writeln!(clean, "{line}")?;
            }
            clean.sync_all()?;
            tracing::warn!(
                path = %path.display(),
                bak = %bak.display(),
                kept = records.len(),
                "event log had a corrupt tail; rotated and kept valid prefix"
            );
        }

        let mut heads: HashMap<(StreamType, String), u64> = HashMap::new();
        for record in &records {
            let head = heads
                .entry((record.stream_type, record.stream_id.clone()))
                .or_insert(0);
            *head = (*head).max(record.sequence_number);
        }

        let writer = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, clock, inner: Mutex::new(LogInner { writer, records, heads }) })
    }

    /// Append an event, allocating the next sequence number for its stream.
    pub fn append(&self, input: AppendEvent) -> Result<EventRecord, LogError> {
        let now_ms = self.clock.epoch_ms();
        let mut inner = self.inner.lock();

        let key = (input.stream_type, input.stream_id.clone());
        let head = inner.heads.get(&key).copied().unwrap_or(0);
        if head >= i64::MAX as u64 {
            return Err(LogError::StreamExhausted {
                stream_type: input.stream_type,
                stream_id: input.stream_id,
            });
        }

        let record = EventRecord {
            sequence_number: head + 1,
            event_id: EventId::new(),
            stream_type: input.stream_type,
            stream_id: input.stream_id,
            event: input.event,
            causation_id: input.causation_id,
            correlation_id: input.correlation_id,
            occurred_at_epoch_ms: input.occurred_at_epoch_ms.unwrap_or(now_ms),
            recorded_at_epoch_ms: now_ms,
            schema_version: EVENT_SCHEMA_VERSION,
        };

        let line = serde_json::to_string(&record)?;
        writeln!(inner.writer, "{line}")?;
        inner.writer.flush()?;

        inner.heads.insert(key, record.sequence_number);
        inner.records.push(record.clone());
        Ok(record)
    }

    /// Records of a stream, ordered by sequence, optionally after a position.
    pub fn query_by_stream(
        &self,
        stream_type: StreamType,
        stream_id: &str,
        after_sequence: Option<u64>,
    ) -> Vec<EventRecord> {
        let after = after_sequence.unwrap_or(0);
        self.inner
            .lock()
            .records
            .iter()
            .filter(|r| {
                r.stream_type == stream_type
                    && r.stream_id == stream_id
                    && r.sequence_number > after
            })
            .cloned()
            .collect()
    }

    /// All records with the given payload type tag, in recorded order.
    pub fn query_by_type(&self, event_type: &str) -> Vec<EventRecord> {
        self.inner
            .lock()
            .records
            .iter()
            .filter(|r| r.event_type() == event_type)
            .cloned()
            .collect()
    }

    pub fn get_events(&self, filter: &EventFilter) -> Vec<EventRecord> {
        let inner = self.inner.lock();
        let matches = inner.records.iter().filter(|r| {
            filter.stream_type.is_none_or(|t| r.stream_type == t)
                && filter.stream_id.as_deref().is_none_or(|id| r.stream_id == id)
                && filter.event_type.as_deref().is_none_or(|t| r.event_type() == t)
                && filter.after_sequence.is_none_or(|s| r.sequence_number > s)
        });
        match filter.limit {
            Some(limit) => matches.take(limit).cloned().collect(),
            None => matches.cloned().collect(),
        }
    }

    pub fn latest_by_stream(
        &self,
        stream_type: StreamType,
        stream_id: &str,
    ) -> Option<EventRecord> {
        self.inner
            .lock()
            .records
            .iter()
            .filter(|r| r.stream_type == stream_type && r.stream_id == stream_id)
            .max_by_key(|r| r.sequence_number)
            .cloned()
    }

    /// Highest allocated sequence for a stream (0 when empty).
    pub fn head(&self, stream_type: StreamType, stream_id: &str) -> u64 {
        self.inner
            .lock()
            .heads
            .get(&(stream_type, stream_id.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Every record in recorded order, for state replay.
    pub fn all(&self) -> Vec<EventRecord> {
        self.inner.lock().records.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().records.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read records from disk, stopping at the first invalid line.
/// Returns the valid prefix and whether anything was discarded.
fn read_records(path: &Path) -> Result<(Vec<EventRecord>, bool), LogError> {
    if !path.exists() {
        return Ok((Vec::new(), false));
    }

    let data = fs::read(path)?;
    let mut records = Vec::new();
    let mut salvaged = false;

    for raw in data.split(|b| *b == b'\n') {
        if raw.is_empty() {
            continue;
        }
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line,
            Err(_) => {
                salvaged = true;
                break;
            }
        };
        match serde_json::from_str::<EventRecord>(line) {
            Ok(record) => records.push(record),
            Err(_) => {
                salvaged = true;
                break;
            }
        }
    }

    Ok((records, salvaged))
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
