// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests.

use crate::bus::FleetBus;
use parking_lot::Mutex;
use sqk_core::FakeClock;
use sqk_storage::{EventStore, FleetState};
use std::sync::Arc;
use tempfile::TempDir;

/// A bus over a fresh on-disk log with a controllable clock.
pub(crate) struct TestBus {
    pub bus: FleetBus<FakeClock>,
    pub clock: FakeClock,
    // NOTE(lifetime): held so the log directory outlives the test
    #[allow(dead_code)]
    pub dir: TempDir,
}

pub(crate) fn test_bus() -> TestBus {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let clock = FakeClock::new();
    let store = Arc::new(
        EventStore::open(dir.path().join("events.log"), clock.clone())
            .unwrap_or_else(|e| panic!("open store: {e}")),
    );
    let state = Arc::new(Mutex::new(FleetState::default()));
    TestBus { bus: FleetBus::new(store, state), clock, dir }
}
