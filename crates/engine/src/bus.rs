// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The shared append-and-apply path.
//!
//! Recording a fact means appending it to the event log and applying it to
//! the materialized state for immediate visibility. Handlers are
//! idempotent, so the second apply during startup replay is harmless.

use parking_lot::Mutex;
use sqk_core::{Clock, Event, StreamType};
use sqk_storage::{AppendEvent, EventRecord, EventStore, FleetState, LogError};
use std::sync::Arc;

/// Shared handle to the event store and materialized state.
pub struct FleetBus<C: Clock> {
    pub store: Arc<EventStore<C>>,
    pub state: Arc<Mutex<FleetState>>,
}

impl<C: Clock> Clone for FleetBus<C> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store), state: Arc::clone(&self.state) }
    }
}

impl<C: Clock> FleetBus<C> {
    pub fn new(store: Arc<EventStore<C>>, state: Arc<Mutex<FleetState>>) -> Self {
        Self { store, state }
    }

    /// Append an event and apply it to the materialized state.
    pub fn record(
        &self,
        stream_type: StreamType,
        stream_id: &str,
        event: Event,
    ) -> Result<EventRecord, LogError> {
        let record = self.store.append(AppendEvent::new(stream_type, stream_id, event))?;
        self.state.lock().apply_event(&record.event);
        Ok(record)
    }

    /// Rebuild the materialized state by replaying the full log.
    pub fn replay(&self) -> usize {
        let records = self.store.all();
        let mut state = self.state.lock();
        for record in &records {
            state.apply_event(&record.event);
        }
        records.len()
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
