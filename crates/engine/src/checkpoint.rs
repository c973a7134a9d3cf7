// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint engine: dual-write mission snapshots.
//!
//! The store half is an event (`checkpoint:created` carrying the snapshot);
//! the file half is a JSON file plus the `latest.json` pointer. The writes
//! are best effort together (either surviving suffices to rebuild), so a
//! file-side failure after retries degrades to a warning.

use crate::bus::FleetBus;
use crate::retry::Backoff;
use sqk_core::{
    Checkpoint, CheckpointId, CheckpointTrigger, Clock, ErrorClass, Event, Metadata, MissionId,
    RecoveryContext, SortieStatus, StreamType, CHECKPOINT_VERSION,
};
use sqk_storage::{CheckpointFiles, LogError, SnapshotError};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("mission not found: {0}")]
    MissionNotFound(MissionId),

    #[error(transparent)]
    Log(#[from] LogError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

impl CheckpointError {
    pub fn class(&self) -> ErrorClass {
        match self {
            CheckpointError::MissionNotFound(_) => ErrorClass::Validation,
            CheckpointError::Log(err) => err.class(),
            CheckpointError::Snapshot(err) => err.class(),
        }
    }
}

pub struct CheckpointEngine<C: Clock> {
    bus: FleetBus<C>,
    files: CheckpointFiles,
    clock: C,
    retention_ms: u64,
    backoff: Backoff,
}

impl<C: Clock> CheckpointEngine<C> {
    pub fn new(bus: FleetBus<C>, files: CheckpointFiles, clock: C, retention_ms: u64) -> Self {
        Self { bus, files, clock, retention_ms, backoff: Backoff::default() }
    }

    /// Override the file-write retry schedule (tests use tight timings).
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Snapshot a mission: its sorties, the locks its specialists hold,
    /// their pending mailbox traffic, and a recovery context.
    pub async fn save(
        &self,
        mission_id: &MissionId,
        trigger: CheckpointTrigger,
        trigger_details: Option<String>,
        created_by: &str,
    ) -> Result<Checkpoint, CheckpointError> {
        let now_ms = self.clock.epoch_ms();
        let checkpoint = {
            let state = self.bus.state.lock();
            let mission = state
                .get_mission(mission_id.as_str())
                .ok_or(CheckpointError::MissionNotFound(*mission_id))?;

            let sorties: Vec<_> =
                state.mission_sorties(mission_id.as_str()).into_iter().cloned().collect();
            let specialists: HashSet<&str> = sorties
                .iter()
                .filter_map(|s| s.assigned_to.as_ref().map(|id| id.as_str()))
                .collect();

            let active_locks: Vec<_> = state
                .active_locks(now_ms)
                .into_iter()
                .filter(|l| specialists.contains(l.reserved_by.as_str()))
                .cloned()
                .collect();

            let mailboxes: HashSet<&str> = state
                .mailboxes
                .values()
                .filter(|m| specialists.contains(m.owner.as_str()))
                .map(|m| m.id.as_str())
                .collect();
            let pending_messages: Vec<_> = state
                .messages
                .values()
                .filter(|m| m.is_pending() && mailboxes.contains(m.mailbox_id.as_str()))
                .cloned()
                .collect();

            let last_event =
                self.bus.store.latest_by_stream(StreamType::Mission, mission_id.as_str());
            let next_steps: Vec<String> = sorties
                .iter()
                .filter(|s| !s.status.is_terminal())
                .map(|s| format!("resume {}", s.title))
                .collect();
            let blockers: Vec<String> = sorties
                .iter()
                .filter(|s| s.status == SortieStatus::Blocked)
                .filter_map(|s| s.blocked_reason.clone())
                .collect();

            let started = mission.started_at_epoch_ms.unwrap_or(mission.created_at_epoch_ms);
            Checkpoint {
                id: CheckpointId::new(),
                mission_id: *mission_id,
                timestamp_epoch_ms: now_ms,
                trigger,
                trigger_details,
                progress_percent: mission.progress_percent(),
                recovery_context: RecoveryContext {
                    last_action: last_event
                        .as_ref()
                        .map(|r| r.event_type().to_string())
                        .unwrap_or_else(|| "mission:created".to_string()),
                    next_steps,
                    blockers,
                    files_modified: active_locks.iter().map(|l| l.file.clone()).collect(),
                    mission_summary: mission.title.clone(),
                    elapsed_time_ms: now_ms.saturating_sub(started),
                    last_activity_at_epoch_ms: last_event
                        .map(|r| r.occurred_at_epoch_ms)
                        .unwrap_or(now_ms),
                },
                sorties,
                active_locks,
                pending_messages,
                created_by: created_by.to_string(),
                expires_at_epoch_ms: Some(now_ms + self.retention_ms),
                consumed_at_epoch_ms: None,
                version: CHECKPOINT_VERSION,
                metadata: Metadata::new(),
            }
        };

        // Store half: the event is the relational row
        self.bus.record(
            StreamType::Checkpoint,
            checkpoint.id.as_str(),
            Event::CheckpointCreated { checkpoint: Box::new(checkpoint.clone()) },
        )?;

        // File half, retried as transient I/O; a final failure is a warning
        // because the store half already stands
        let result = self
            .backoff
            .run(|| {
                let files = &self.files;
                let checkpoint = &checkpoint;
                async move { files.write(checkpoint).map(|_| ()) }
            })
            .await;
        if let Err(err) = result {
            tracing::warn!(
                checkpoint = %checkpoint.id,
                error = %err,
                "checkpoint file write failed; store copy stands alone"
            );
        }

        tracing::info!(
            checkpoint = %checkpoint.id,
            mission = %mission_id,
            trigger = %trigger,
            "checkpoint saved"
        );
        Ok(checkpoint)
    }

    /// Latest checkpoint for a mission: the store is preferred; the file
    /// directory is scanned only when the store has nothing.
    pub fn get_latest(&self, mission_id: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        let from_state = {
            let state = self.bus.state.lock();
            state.latest_checkpoint(mission_id).cloned()
        };
        if from_state.is_some() {
            return Ok(from_state);
        }
        Ok(self.files.latest_for(mission_id)?)
    }

    pub fn get(&self, id: &CheckpointId) -> Result<Option<Checkpoint>, CheckpointError> {
        let from_state = self.bus.state.lock().checkpoints.get(id.as_str()).cloned();
        if from_state.is_some() {
            return Ok(from_state);
        }
        Ok(self.files.read(id)?)
    }

    pub fn list(&self, mission_id: &str) -> Vec<Checkpoint> {
        let state = self.bus.state.lock();
        let mut checkpoints: Vec<Checkpoint> = state
            .checkpoints
            .values()
            .filter(|c| c.mission_id.as_str() == mission_id)
            .cloned()
            .collect();
        checkpoints.sort_by_key(|c| c.timestamp_epoch_ms);
        checkpoints
    }

    /// Remove a checkpoint from both stores. True when either side had it.
    pub fn delete(&self, id: &CheckpointId) -> Result<bool, CheckpointError> {
        let in_state = self.bus.state.lock().checkpoints.contains_key(id.as_str());
        if in_state {
            self.bus.record(
                StreamType::Checkpoint,
                id.as_str(),
                Event::CheckpointDeleted { id: *id },
            )?;
        }
        let in_files = self.files.delete(id)?;
        Ok(in_state || in_files)
    }

    /// Mark a checkpoint consumed (set once, never unset).
    pub fn consume(&self, id: &CheckpointId) -> Result<(), CheckpointError> {
        self.bus.record(
            StreamType::Checkpoint,
            id.as_str(),
            Event::CheckpointConsumed { id: *id, at_epoch_ms: self.clock.epoch_ms() },
        )?;
        Ok(())
    }

    /// Drop expired checkpoints from both stores. Returns how many rows
    /// and files were removed in total.
    pub fn prune_expired(&self) -> Result<usize, CheckpointError> {
        let now_ms = self.clock.epoch_ms();
        let expired: Vec<CheckpointId> = {
            let state = self.bus.state.lock();
            state
                .checkpoints
                .values()
                .filter(|c| c.is_expired(now_ms))
                .map(|c| c.id)
                .collect()
        };
        for id in &expired {
            self.bus.record(
                StreamType::Checkpoint,
                id.as_str(),
                Event::CheckpointDeleted { id: *id },
            )?;
        }
        let files_pruned = self.files.prune_expired(now_ms, self.retention_ms)?;
        Ok(expired.len() + files_pruned)
    }

    pub fn files(&self) -> &CheckpointFiles {
        &self.files
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
