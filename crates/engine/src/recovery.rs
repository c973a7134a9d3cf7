// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recovery planning and execution from a checkpoint.
//!
//! Planning is read-only and deterministic: the same checkpoint and the
//! same live state yield the same plan, and anything already restored
//! (registered specialists, held locks, running sorties) is not re-planned.
//! Execution runs in three phases with a per-item error budget.

use crate::bus::FleetBus;
use crate::locks::{LockManager, LockError};
use sqk_core::{
    AgentType, Checkpoint, CheckpointId, Clock, ErrorClass, Event, Priority, SortieId,
    SortieStatus, Specialist, SpecialistId, StreamType,
};
use sqk_storage::{LogError, SnapshotError};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

const CHECKPOINT_STALE_MS: u64 = 24 * 60 * 60 * 1000;
const MANY_AGENTS: usize = 5;
/// Per-item failures up to this share still count as success.
const ERROR_BUDGET: f64 = 0.10;

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("checkpoint not found: {0}")]
    CheckpointNotFound(CheckpointId),

    #[error(transparent)]
    Log(#[from] LogError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("recovery log write failed: {0}")]
    LogFile(#[from] std::io::Error),
}

impl RecoveryError {
    pub fn class(&self) -> ErrorClass {
        match self {
            RecoveryError::CheckpointNotFound(_) => ErrorClass::Validation,
            RecoveryError::Log(err) => err.class(),
            RecoveryError::Lock(err) => err.class(),
            RecoveryError::Snapshot(err) => err.class(),
            RecoveryError::LogFile(_) => ErrorClass::TransientIo,
        }
    }
}

/// One specialist to bring back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRestore {
    pub sortie_id: SortieId,
    pub assignment: String,
    pub agent_type: AgentType,
    pub priority: Priority,
}

/// One sortie to resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResume {
    pub sortie_id: SortieId,
    pub progress: u8,
    pub assigned_agent: Option<String>,
    pub next_steps: Vec<String>,
}

/// One lock to re-acquire, flagged for a conflict check at execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockRestore {
    pub file: String,
    pub holder: SpecialistId,
    pub purpose: sqk_core::LockPurpose,
    pub remaining_ttl_ms: u64,
    pub conflict_check: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryPlan {
    pub checkpoint_id: CheckpointId,
    pub agents_to_restore: Vec<AgentRestore>,
    pub tasks_to_resume: Vec<TaskResume>,
    pub locks_to_restore: Vec<LockRestore>,
    pub risks: Vec<String>,
}

impl RecoveryPlan {
    /// Total work items across all three phases.
    pub fn attempted_items(&self) -> usize {
        self.agents_to_restore.len() + self.tasks_to_resume.len() + self.locks_to_restore.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempted_items() == 0
    }
}

/// Outcome of one recovery attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryReport {
    pub checkpoint_id: CheckpointId,
    pub dry_run: bool,
    pub attempted: usize,
    pub restored: usize,
    pub errors: Vec<String>,
    /// Some failures, but within the error budget.
    pub partial: bool,
    pub success: bool,
}

#[derive(Serialize)]
struct RecoveryLogEntry<'a> {
    at_epoch_ms: u64,
    checkpoint_id: &'a str,
    dry_run: bool,
    attempted: usize,
    restored: usize,
    errors: &'a [String],
    success: bool,
}

pub struct RecoveryManager<C: Clock> {
    bus: FleetBus<C>,
    locks: Arc<LockManager<C>>,
    clock: C,
    /// JSONL file receiving one entry per recovery attempt.
    log_path: PathBuf,
}

impl<C: Clock> RecoveryManager<C> {
    pub fn new(
        bus: FleetBus<C>,
        locks: Arc<LockManager<C>>,
        clock: C,
        log_path: PathBuf,
    ) -> Self {
        Self { bus, locks, clock, log_path }
    }

    /// Build a restoration plan from a checkpoint.
    ///
    /// `force` only suppresses the active-agents risk; it never changes the
    /// work items. Items already restored in live state are skipped, which
    /// is what makes re-planning after a real run produce a strict subset.
    pub fn create_plan(
        &self,
        checkpoint: &Checkpoint,
        force: bool,
    ) -> RecoveryPlan {
        let now_ms = self.clock.epoch_ms();
        let state = self.bus.state.lock();

        let live_names: Vec<String> =
            state.live_specialists().iter().map(|s| s.name.clone()).collect();

        let mut agents_to_restore = Vec::new();
        for sortie in checkpoint.sorties.iter().filter(|s| s.status == SortieStatus::InProgress) {
            let assignment = sortie
                .assigned_to
                .as_ref()
                .and_then(|id| state.specialists.get(id.as_str()).map(|s| s.name.clone()))
                .or_else(|| sortie.assigned_to.map(|id| id.to_string()))
                .unwrap_or_else(|| sortie.title.clone());
            // Already live again: nothing to restore for this sortie
            if live_names.contains(&assignment) {
                continue;
            }
            agents_to_restore.push(AgentRestore {
                sortie_id: sortie.id,
                agent_type: AgentType::from_assignment(&assignment),
                assignment,
                priority: sortie.priority,
            });
        }

        let tasks_to_resume: Vec<TaskResume> = checkpoint
            .sorties
            .iter()
            .filter(|s| s.status != SortieStatus::Completed)
            .filter(|s| {
                // Skip sorties already running in live state
                state.get_sortie(s.id.as_str()).map(|live| live.status != SortieStatus::InProgress)
                    .unwrap_or(true)
            })
            .map(|s| TaskResume {
                sortie_id: s.id,
                progress: s.progress,
                assigned_agent: s.assigned_to.map(|id| id.to_string()),
                next_steps: checkpoint.recovery_context.next_steps.clone(),
            })
            .collect();

        let locks_to_restore: Vec<LockRestore> = checkpoint
            .active_locks
            .iter()
            .filter(|lock| {
                // Locks still held by the same holder are not re-planned
                let normalized = crate::locks::normalize_path(&lock.file);
                !state
                    .locks
                    .values()
                    .any(|live| {
                        live.normalized_path == normalized
                            && live.reserved_by == lock.reserved_by
                            && live.is_active(now_ms)
                    })
            })
            .map(|lock| LockRestore {
                file: lock.file.clone(),
                holder: lock.reserved_by,
                purpose: lock.purpose,
                remaining_ttl_ms: lock.expires_at_epoch_ms.saturating_sub(lock.reserved_at_epoch_ms),
                conflict_check: true,
            })
            .collect();

        let mut risks = Vec::new();
        if checkpoint.age_ms(now_ms) > CHECKPOINT_STALE_MS {
            risks.push("Checkpoint is older than 24 hours".to_string());
        }
        if !checkpoint.active_locks.is_empty() {
            risks.push("Active locks may conflict with current state".to_string());
        }
        let live_count = state.live_specialists().len();
        if live_count > 0 && !force {
            risks.push(format!("{live_count} specialists are already active"));
        }
        if agents_to_restore.len() > MANY_AGENTS {
            risks.push(format!(
                "Restoring {} specialists at once",
                agents_to_restore.len()
            ));
        }

        RecoveryPlan {
            checkpoint_id: checkpoint.id,
            agents_to_restore,
            tasks_to_resume,
            locks_to_restore,
            risks,
        }
    }

    /// Execute a plan: restore agents (high → low priority), resume tasks,
    /// restore locks. Per-item errors never abort the run; the attempt is
    /// successful when failures stay within the error budget. Every attempt
    /// is appended to the recovery log.
    ///
    /// The checkpoint itself rides along so missing sortie rows can be
    /// reconstructed from the snapshot.
    pub fn execute(
        &self,
        checkpoint: &Checkpoint,
        plan: &RecoveryPlan,
        dry_run: bool,
    ) -> Result<RecoveryReport, RecoveryError> {
        let attempted = plan.attempted_items();
        let mut errors: Vec<String> = Vec::new();
        let mut restored = 0usize;

        if dry_run {
            let report = RecoveryReport {
                checkpoint_id: plan.checkpoint_id,
                dry_run: true,
                attempted,
                restored: 0,
                errors,
                partial: false,
                success: true,
            };
            self.append_log(&report)?;
            return Ok(report);
        }

        self.bus.record(
            StreamType::Fleet,
            plan.checkpoint_id.as_str(),
            Event::RecoveryStarted { checkpoint_id: plan.checkpoint_id, dry_run: false },
        )?;

        // Phase 1: agents, most urgent first
        let mut agents = plan.agents_to_restore.clone();
        agents.sort_by(|a, b| b.priority.cmp(&a.priority));
        let mut restored_agents: Vec<(SortieId, SpecialistId)> = Vec::new();
        for agent in &agents {
            let now_ms = self.clock.epoch_ms();
            let mut specialist =
                Specialist::new(SpecialistId::new(), &agent.assignment, agent.agent_type, now_ms);
            specialist.current_sortie = Some(agent.sortie_id);
            match self.bus.record(
                StreamType::Specialist,
                specialist.id.as_str(),
                Event::SpecialistRegistered { specialist: Box::new(specialist.clone()) },
            ) {
                Ok(_) => {
                    restored_agents.push((agent.sortie_id, specialist.id));
                    restored += 1;
                }
                Err(err) => errors.push(format!("restore agent {}: {err}", agent.assignment)),
            }
        }

        // Phase 2: tasks
        for task in &plan.tasks_to_resume {
            let result = self.resume_task(checkpoint, task, &restored_agents);
            match result {
                Ok(()) => restored += 1,
                Err(err) => errors.push(format!("resume sortie {}: {err}", task.sortie_id)),
            }
        }

        // Phase 3: locks, each checked for conflicts against live state
        for lock in &plan.locks_to_restore {
            match self.locks.acquire(
                &lock.file,
                lock.holder,
                lock.remaining_ttl_ms.max(1),
                lock.purpose,
                None,
            ) {
                Ok(outcome) if outcome.conflict => {
                    let holder = outcome
                        .existing_lock
                        .map(|l| l.reserved_by.to_string())
                        .unwrap_or_else(|| "unknown".to_string());
                    errors.push(format!("lock {} conflicts with holder {holder}", lock.file));
                }
                Ok(_) => restored += 1,
                Err(err) => errors.push(format!("lock {}: {err}", lock.file)),
            }
        }

        let success = attempted == 0
            || (errors.len() as f64) <= (attempted as f64 * ERROR_BUDGET);
        let report = RecoveryReport {
            checkpoint_id: plan.checkpoint_id,
            dry_run: false,
            attempted,
            restored,
            partial: success && !errors.is_empty(),
            success,
            errors,
        };

        self.bus.record(
            StreamType::Fleet,
            plan.checkpoint_id.as_str(),
            Event::RecoveryCompleted {
                checkpoint_id: plan.checkpoint_id,
                restored: report.restored as u32,
                errors: report.errors.len() as u32,
                partial: report.partial,
            },
        )?;
        // The checkpoint is spent once a real recovery ran against it
        self.bus.record(
            StreamType::Checkpoint,
            plan.checkpoint_id.as_str(),
            Event::CheckpointConsumed {
                id: plan.checkpoint_id,
                at_epoch_ms: self.clock.epoch_ms(),
            },
        )?;

        self.append_log(&report)?;
        tracing::info!(
            checkpoint = %plan.checkpoint_id,
            restored = report.restored,
            errors = report.errors.len(),
            success = report.success,
            "recovery executed"
        );
        Ok(report)
    }

    fn resume_task(
        &self,
        checkpoint: &Checkpoint,
        task: &TaskResume,
        restored_agents: &[(SortieId, SpecialistId)],
    ) -> Result<(), RecoveryError> {
        let now_ms = self.clock.epoch_ms();

        // Reconstruct the row from the snapshot if the store lost it
        let missing = self.bus.state.lock().get_sortie(task.sortie_id.as_str()).is_none();
        if missing {
            if let Some(snapshot) =
                checkpoint.sorties.iter().find(|s| s.id == task.sortie_id)
            {
                self.bus.record(
                    StreamType::Sortie,
                    task.sortie_id.as_str(),
                    Event::SortieCreated { sortie: Box::new(snapshot.clone()) },
                )?;
            }
        }

        if let Some((_, specialist_id)) =
            restored_agents.iter().find(|(sortie_id, _)| *sortie_id == task.sortie_id)
        {
            self.bus.record(
                StreamType::Sortie,
                task.sortie_id.as_str(),
                Event::SortieAssigned {
                    id: task.sortie_id,
                    specialist_id: *specialist_id,
                    at_epoch_ms: now_ms,
                },
            )?;
        }
        self.bus.record(
            StreamType::Sortie,
            task.sortie_id.as_str(),
            Event::SortieStatusChanged {
                id: task.sortie_id,
                status: SortieStatus::InProgress,
                reason: None,
                at_epoch_ms: now_ms,
            },
        )?;
        if task.progress > 0 {
            self.bus.record(
                StreamType::Sortie,
                task.sortie_id.as_str(),
                Event::SortieProgress {
                    id: task.sortie_id,
                    progress: task.progress,
                    note: Some("restored from checkpoint".to_string()),
                },
            )?;
        }
        Ok(())
    }

    fn append_log(&self, report: &RecoveryReport) -> Result<(), RecoveryError> {
        if let Some(parent) = self.log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let entry = RecoveryLogEntry {
            at_epoch_ms: self.clock.epoch_ms(),
            checkpoint_id: report.checkpoint_id.as_str(),
            dry_run: report.dry_run,
            attempted: report.attempted,
            restored: report.restored,
            errors: &report.errors,
            success: report.success,
        };
        let mut file = OpenOptions::new().create(true).append(true).open(&self.log_path)?;
        let line = serde_json::to_string(&entry).map_err(|e| {
            RecoveryError::LogFile(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

/// Resolve a checkpoint by id: the store row first, then the file backup.
pub fn find_checkpoint<C: Clock>(
    bus: &FleetBus<C>,
    files: &sqk_storage::CheckpointFiles,
    id: &CheckpointId,
) -> Result<Checkpoint, RecoveryError> {
    if let Some(checkpoint) = bus.state.lock().checkpoints.get(id.as_str()) {
        return Ok(checkpoint.clone());
    }
    files.read(id)?.ok_or(RecoveryError::CheckpointNotFound(*id))
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
