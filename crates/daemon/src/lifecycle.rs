// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and shutdown.
//!
//! Startup opens the durable stores under the data dir, replays the event
//! log into a fresh [`FleetState`], and wires every engine into one
//! [`Coordinator`]. Shutdown cancels the background workers and waits for
//! all of them to exit.

use crate::config::CoordinatorConfig;
use crate::coordinator::Coordinator;
use crate::workers::{spawn_workers, WorkerSet};
use parking_lot::Mutex;
use sqk_core::Clock;
use sqk_engine::{
    CheckpointEngine, ConflictResolver, FleetBus, LockManager, MessageBus, RecoveryManager,
    Scheduler, SpecialistLauncher, SpecialistRegistry,
};
use sqk_planner::{DecompositionPipeline, FileWalker, Planner};
use sqk_storage::{CheckpointFiles, CursorStore, EventStore, FleetState};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Default TTL for locks taken by the scheduler at launch.
const LAUNCH_LOCK_TTL_MS: u64 = 10 * 60 * 1000;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("log error: {0}")]
    Log(#[from] sqk_storage::LogError),

    #[error("cursor error: {0}")]
    Cursor(#[from] sqk_storage::CursorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Layout under the data dir.
#[derive(Debug, Clone)]
pub struct Paths {
    pub datadir: PathBuf,
    pub events: PathBuf,
    pub cursors: PathBuf,
    pub checkpoints: PathBuf,
    pub recovery_log: PathBuf,
    pub daemon_log: PathBuf,
}

impl Paths {
    pub fn under(datadir: &std::path::Path) -> Self {
        Self {
            datadir: datadir.to_path_buf(),
            events: datadir.join("events.log"),
            cursors: datadir.join("cursors.json"),
            checkpoints: datadir.join("checkpoints"),
            recovery_log: datadir.join("recovery.log"),
            daemon_log: datadir.join("sqkd.log"),
        }
    }
}

/// A running coordinator with its background workers.
pub struct Daemon<P: Planner, W: FileWalker, L: SpecialistLauncher, C: Clock> {
    pub coordinator: Arc<Coordinator<P, W, L, C>>,
    pub workers: WorkerSet,
    pub paths: Paths,
}

impl<P: Planner, W: FileWalker, L: SpecialistLauncher, C: Clock> Daemon<P, W, L, C> {
    /// Graceful shutdown: stop workers, then wait for every one to exit.
    pub async fn shutdown(self) {
        tracing::info!("coordinator shutting down");
        self.workers.shutdown().await;
        tracing::info!("coordinator shutdown complete");
    }
}

/// Open the stores, replay state, wire the engines, start the workers.
pub fn startup<P, W, L, C>(
    config: CoordinatorConfig,
    planner: P,
    walker: W,
    launcher: L,
    clock: C,
) -> Result<Daemon<P, W, L, C>, LifecycleError>
where
    P: Planner,
    W: FileWalker,
    L: SpecialistLauncher + 'static,
    C: Clock,
{
    let paths = Paths::under(&config.datadir);
    std::fs::create_dir_all(&paths.datadir)?;

    let store = Arc::new(EventStore::open(&paths.events, clock.clone())?);
    let state = Arc::new(Mutex::new(FleetState::default()));
    let bus = FleetBus::new(store, state);
    let replayed = bus.replay();
    tracing::info!(events = replayed, "event log replayed");

    let cursors = Arc::new(CursorStore::open(&paths.cursors)?);

    let locks = Arc::new(LockManager::new(bus.clone(), clock.clone()));
    let registry = Arc::new(SpecialistRegistry::new(
        bus.clone(),
        clock.clone(),
        config.heartbeat_timeout_ms,
    ));
    let messages = MessageBus::new(bus.clone(), clock.clone());
    let conflicts = Arc::new(ConflictResolver::new(
        bus.clone(),
        clock.clone(),
        config.autoresolve_threshold,
    ));
    let checkpoints = Arc::new(CheckpointEngine::new(
        bus.clone(),
        CheckpointFiles::new(&paths.checkpoints),
        clock.clone(),
        config.checkpoint_retention_ms(),
    ));
    let recovery = RecoveryManager::new(
        bus.clone(),
        Arc::clone(&locks),
        clock.clone(),
        paths.recovery_log.clone(),
    );
    let scheduler = Scheduler::new(
        bus.clone(),
        Arc::clone(&locks),
        Arc::new(launcher),
        clock.clone(),
        LAUNCH_LOCK_TTL_MS,
    );
    let pipeline =
        DecompositionPipeline::new(planner, walker, clock.clone(), config.llm.timeout_ms);

    let workers = spawn_workers(
        &config,
        Arc::clone(&locks),
        Arc::clone(&conflicts),
        Arc::clone(&registry),
        Arc::clone(&checkpoints),
    );

    let coordinator = Arc::new(Coordinator::new(
        bus,
        cursors,
        pipeline,
        locks,
        scheduler,
        registry,
        messages,
        conflicts,
        checkpoints,
        recovery,
        clock,
        config,
    ));

    Ok(Daemon { coordinator, workers, paths })
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
