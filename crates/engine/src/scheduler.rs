// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sortie scheduling and specialist spawn handoff.
//!
//! Consumes a validated [`SortieTree`]: independent sorties launch in
//! parallel, dependent sorties sequentially in topological order once their
//! dependencies reach terminal success. The scheduler reserves files,
//! registers specialists, and hands off to the external launch capability;
//! it never executes workload itself.

use crate::bus::FleetBus;
use crate::locks::{LockError, LockManager};
use async_trait::async_trait;
use sqk_core::{
    AgentType, Clock, Event, LockId, LockPurpose, MailboxId, MissionId, MissionStatus, Sortie,
    SortieId, SortieStatus, SortieTree, Specialist, SpecialistId, SpecialistStatus, StreamType,
};
use sqk_storage::LogError;
use std::sync::Arc;
use thiserror::Error;

/// External capability: actually start a specialist's workload.
#[async_trait]
pub trait SpecialistLauncher: Send + Sync {
    async fn launch(&self, sortie: &Sortie, specialist: &Specialist) -> Result<(), LaunchError>;
}

#[derive(Debug, Error)]
#[error("launch failed: {0}")]
pub struct LaunchError(pub String);

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Log(#[from] LogError),

    #[error(transparent)]
    Lock(#[from] LockError),
}

/// What happened to each sortie during one dispatch pass.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub launched: Vec<SortieId>,
    pub failed: Vec<(SortieId, String)>,
    pub skipped: Vec<(SortieId, String)>,
}

pub struct Scheduler<L: SpecialistLauncher, C: Clock> {
    bus: FleetBus<C>,
    locks: Arc<LockManager<C>>,
    launcher: Arc<L>,
    clock: C,
    /// TTL for file reservations taken at launch.
    lock_timeout_ms: u64,
}

impl<L: SpecialistLauncher, C: Clock> Scheduler<L, C> {
    pub fn new(
        bus: FleetBus<C>,
        locks: Arc<LockManager<C>>,
        launcher: Arc<L>,
        clock: C,
        lock_timeout_ms: u64,
    ) -> Self {
        Self { bus, locks, launcher, clock, lock_timeout_ms }
    }

    /// Mixed-mode dispatch: the parallel phase first, then the sequential
    /// phase. A failed launch never cancels its siblings.
    pub async fn dispatch(&self, tree: &SortieTree) -> Result<DispatchReport, SchedulerError> {
        let mut report = DispatchReport::default();

        let mission_pending = {
            let state = self.bus.state.lock();
            state.get_mission(tree.mission.id.as_str()).map(|m| m.status)
                == Some(MissionStatus::Pending)
        };
        if mission_pending {
            self.bus.record(
                StreamType::Mission,
                tree.mission.id.as_str(),
                Event::MissionStatusChanged {
                    id: tree.mission.id,
                    status: MissionStatus::InProgress,
                    at_epoch_ms: self.clock.epoch_ms(),
                },
            )?;
        }

        let (independent, dependent): (Vec<&Sortie>, Vec<&Sortie>) =
            tree.sorties.iter().partition(|s| s.is_independent());

        // Parallel phase: all spawn calls proceed concurrently and are
        // awaited together before the sequential phase starts.
        let results =
            futures_util::future::join_all(independent.iter().map(|s| self.launch_one(s))).await;
        for (sortie, result) in independent.iter().zip(results) {
            match result? {
                Ok(_) => report.launched.push(sortie.id),
                Err(reason) => report.failed.push((sortie.id, reason)),
            }
        }

        // Sequential phase, dependencies first.
        for sortie in topo_order(&dependent) {
            let unmet = {
                let state = self.bus.state.lock();
                sortie
                    .dependencies
                    .iter()
                    .find(|dep| {
                        state
                            .get_sortie(dep.as_str())
                            .map(|s| !s.status.is_terminal_success())
                            .unwrap_or(true)
                    })
                    .copied()
            };
            if let Some(dep) = unmet {
                let reason = format!("dependency {dep} has not completed");
                self.bus.record(
                    StreamType::Sortie,
                    sortie.id.as_str(),
                    Event::SortieStatusChanged {
                        id: sortie.id,
                        status: SortieStatus::Blocked,
                        reason: Some(reason.clone()),
                        at_epoch_ms: self.clock.epoch_ms(),
                    },
                )?;
                report.skipped.push((sortie.id, reason));
                continue;
            }
            match self.launch_one(sortie).await? {
                Ok(_) => report.launched.push(sortie.id),
                Err(reason) => report.failed.push((sortie.id, reason)),
            }
        }

        tracing::info!(
            mission = %tree.mission.id,
            launched = report.launched.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "dispatch complete"
        );
        Ok(report)
    }

    /// Re-dispatch sorties parked during earlier passes.
    ///
    /// A dependent sortie skipped at dispatch time stays `blocked` until
    /// its dependencies reach terminal success, which happens long after
    /// the launch hand-off returns. Callers invoke this whenever a sortie
    /// of the mission completes; every blocked or still-pending dependent
    /// sortie whose dependencies are now all complete launches here.
    pub async fn retry_blocked(
        &self,
        mission_id: &MissionId,
    ) -> Result<DispatchReport, SchedulerError> {
        let ready: Vec<Sortie> = {
            let state = self.bus.state.lock();
            state
                .mission_sorties(mission_id.as_str())
                .into_iter()
                .filter(|s| {
                    matches!(s.status, SortieStatus::Blocked | SortieStatus::Pending)
                        && !s.dependencies.is_empty()
                })
                .filter(|s| {
                    s.dependencies.iter().all(|dep| {
                        state
                            .get_sortie(dep.as_str())
                            .map(|d| d.status.is_terminal_success())
                            .unwrap_or(false)
                    })
                })
                .cloned()
                .collect()
        };

        let mut report = DispatchReport::default();
        for sortie in &ready {
            match self.launch_one(sortie).await? {
                Ok(_) => report.launched.push(sortie.id),
                Err(reason) => report.failed.push((sortie.id, reason)),
            }
        }
        if !report.launched.is_empty() {
            tracing::info!(
                mission = %mission_id,
                launched = report.launched.len(),
                "blocked sorties re-dispatched"
            );
        }
        Ok(report)
    }

    /// One launch: reserve files, register the specialist, ensure a
    /// mailbox, assign, hand off. The inner `Err` is a per-sortie failure
    /// that must not abort the dispatch.
    async fn launch_one(
        &self,
        sortie: &Sortie,
    ) -> Result<Result<SpecialistId, String>, SchedulerError> {
        let now_ms = self.clock.epoch_ms();
        let agent_type =
            AgentType::from_assignment(&format!("{} {}", sortie.title, sortie.description));
        let suffix = sortie.id.suffix();
        let mut specialist = Specialist::new(
            SpecialistId::new(),
            format!("{}-{}", agent_type, &suffix[..suffix.len().min(6)]),
            agent_type,
            now_ms,
        );
        specialist.current_sortie = Some(sortie.id);
        specialist.current_task = Some(sortie.title.clone());

        // Reserve every file up front; back out on the first conflict
        let mut held: Vec<LockId> = Vec::new();
        for file in &sortie.files {
            let outcome = self.locks.acquire(
                file,
                specialist.id,
                self.lock_timeout_ms,
                LockPurpose::Edit,
                None,
            )?;
            if outcome.conflict {
                let holder = outcome
                    .existing_lock
                    .map(|l| l.reserved_by.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                for id in &held {
                    self.locks.release(id)?;
                }
                return Ok(Err(format!("file {file} is reserved by {holder}")));
            }
            if let Some(lock) = outcome.lock {
                held.push(lock.id);
            }
        }

        self.bus.record(
            StreamType::Specialist,
            specialist.id.as_str(),
            Event::SpecialistRegistered { specialist: Box::new(specialist.clone()) },
        )?;
        self.bus.record(
            StreamType::Specialist,
            specialist.id.as_str(),
            Event::SpecialistStatusChanged { id: specialist.id, status: SpecialistStatus::Busy },
        )?;

        let has_mailbox = {
            let state = self.bus.state.lock();
            state.mailbox_for(specialist.id.as_str()).is_some()
        };
        if !has_mailbox {
            let mailbox_id = MailboxId::new();
            self.bus.record(
                StreamType::Squawk,
                mailbox_id.as_str(),
                Event::MailboxCreated { id: mailbox_id, owner: specialist.id, at_epoch_ms: now_ms },
            )?;
        }

        self.bus.record(
            StreamType::Sortie,
            sortie.id.as_str(),
            Event::SortieAssigned {
                id: sortie.id,
                specialist_id: specialist.id,
                at_epoch_ms: now_ms,
            },
        )?;

        match self.launcher.launch(sortie, &specialist).await {
            Ok(()) => Ok(Ok(specialist.id)),
            Err(err) => {
                // The sortie failed to start; free its reservations so a
                // retry or sibling can proceed
                for id in &held {
                    self.locks.release(id)?;
                }
                self.bus.record(
                    StreamType::Sortie,
                    sortie.id.as_str(),
                    Event::SortieFailed {
                        id: sortie.id,
                        error: err.to_string(),
                        at_epoch_ms: self.clock.epoch_ms(),
                    },
                )?;
                self.bus.record(
                    StreamType::Specialist,
                    specialist.id.as_str(),
                    Event::SpecialistStatusChanged {
                        id: specialist.id,
                        status: SpecialistStatus::Inactive,
                    },
                )?;
                Ok(Err(err.to_string()))
            }
        }
    }
}

/// Dependencies-first order over the dependent subset. Dependencies outside
/// the subset (already launched or missing) do not constrain the order.
fn topo_order<'a>(dependent: &[&'a Sortie]) -> Vec<&'a Sortie> {
    let mut remaining: Vec<&Sortie> = dependent.to_vec();
    let mut order: Vec<&Sortie> = Vec::new();

    while !remaining.is_empty() {
        let ready = remaining.iter().position(|s| {
            s.dependencies.iter().all(|dep| !remaining.iter().any(|r| r.id == *dep))
        });
        match ready {
            Some(index) => order.push(remaining.remove(index)),
            None => {
                // Cycle (validated trees have none); preserve input order
                order.append(&mut remaining);
            }
        }
    }
    order
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
