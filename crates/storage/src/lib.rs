// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sqk-storage: durable state for the coordinator.
//!
//! The append-only event log is the system of record. [`FleetState`] is
//! materialized from it by replay; checkpoint files are a secondary
//! redundant store for per-mission snapshots.

mod bak;
pub mod cursor;
pub mod log;
pub mod snapshot;
pub mod state;

pub use cursor::{Cursor, CursorError, CursorStore};
pub use log::{AppendEvent, EventFilter, EventRecord, EventStore, LogError, EVENT_SCHEMA_VERSION};
pub use snapshot::{CheckpointFiles, SnapshotError};
pub use state::FleetState;
