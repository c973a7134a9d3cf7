// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervised background workers.
//!
//! Lock reaper, conflict sweep, heartbeat watcher, checkpoint cleaner.
//! Each runs on its own cancellable task; teardown waits for all of them.

use crate::config::CoordinatorConfig;
use sqk_core::Clock;
use sqk_engine::{CheckpointEngine, ConflictResolver, LockManager, SpecialistRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// How often expired checkpoints are pruned.
const CHECKPOINT_CLEAN_INTERVAL_MS: u64 = 60 * 60 * 1000;

/// Handle to the running worker tasks.
pub struct WorkerSet {
    cancel: CancellationToken,
    tasks: JoinSet<()>,
}

impl WorkerSet {
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel every worker and wait for all of them to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        while self.tasks.join_next().await.is_some() {}
    }
}

/// One interval-driven worker loop.
fn worker<F>(
    tasks: &mut JoinSet<()>,
    cancel: &CancellationToken,
    name: &'static str,
    interval: Duration,
    mut tick: F,
) where
    F: FnMut() + Send + 'static,
{
    let cancel = cancel.clone();
    tasks.spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        ticker.tick().await;
        tracing::debug!(worker = name, interval_ms = interval.as_millis() as u64, "worker started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => tick(),
            }
        }
        tracing::debug!(worker = name, "worker stopped");
    });
}

/// Start the four background workers.
pub fn spawn_workers<C: Clock>(
    config: &CoordinatorConfig,
    locks: Arc<LockManager<C>>,
    conflicts: Arc<ConflictResolver<C>>,
    registry: Arc<SpecialistRegistry<C>>,
    checkpoints: Arc<CheckpointEngine<C>>,
) -> WorkerSet {
    let cancel = CancellationToken::new();
    let mut tasks = JoinSet::new();

    let conflict_retention_ms = config.conflict_retention_ms();

    worker(
        &mut tasks,
        &cancel,
        "lock-reaper",
        Duration::from_millis(config.reaper_interval_ms),
        move || match locks.release_expired() {
            Ok(0) => {}
            Ok(count) => tracing::info!(count, "expired locks reaped"),
            Err(err) => tracing::warn!(%err, "lock reaper sweep failed"),
        },
    );

    worker(
        &mut tasks,
        &cancel,
        "conflict-sweep",
        Duration::from_millis(config.heartbeat_interval_ms),
        move || {
            match conflicts.sweep() {
                Ok(detected) if !detected.is_empty() => {
                    tracing::info!(count = detected.len(), "conflicts detected")
                }
                Ok(_) => {}
                Err(err) => tracing::warn!(%err, "conflict sweep failed"),
            }
            let pruned = conflicts.prune_resolved(conflict_retention_ms);
            if pruned > 0 {
                tracing::debug!(pruned, "resolved conflicts compacted");
            }
        },
    );

    worker(
        &mut tasks,
        &cancel,
        "heartbeat-watcher",
        Duration::from_millis(config.heartbeat_interval_ms),
        move || match registry.sweep_missed_heartbeats() {
            Ok(flagged) if !flagged.is_empty() => {
                tracing::warn!(count = flagged.len(), "specialists missed heartbeats")
            }
            Ok(_) => {}
            Err(err) => tracing::warn!(%err, "heartbeat sweep failed"),
        },
    );

    worker(
        &mut tasks,
        &cancel,
        "checkpoint-cleaner",
        Duration::from_millis(CHECKPOINT_CLEAN_INTERVAL_MS),
        move || match checkpoints.prune_expired() {
            Ok(0) => {}
            Ok(pruned) => tracing::info!(pruned, "expired checkpoints pruned"),
            Err(err) => tracing::warn!(%err, "checkpoint prune failed"),
        },
    );

    WorkerSet { cancel, tasks }
}

#[cfg(test)]
#[path = "workers_tests.rs"]
mod tests;
