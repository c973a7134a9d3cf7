// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The coordinator façade: every API operation as a direct call.
//!
//! Sibling components call these contracts directly (never back through
//! HTTP); the external transport maps its routes onto [`Request`] values
//! and renders [`Response`] values with their [`Status`].

use crate::config::CoordinatorConfig;
use sqk_core::{
    Clock, Event, Metadata, MissionStatus, SortieStatus, SortieTree, SpecialistId, StreamType,
};
use sqk_engine::{
    CheckpointEngine, ConflictResolver, FleetBus, LockManager, MessageBus, RecoveryManager,
    Scheduler, SpecialistLauncher, SpecialistRegistry,
};
use sqk_planner::{DecomposeRequest, DecompositionPipeline, FileWalker, PipelineError, Planner};
use sqk_storage::CursorStore;
use sqk_wire::{ErrorBody, RecoveryOutcome, Request, Response, Status};
use std::path::PathBuf;
use std::sync::Arc;

pub struct Coordinator<P: Planner, W: FileWalker, L: SpecialistLauncher, C: Clock> {
    pub bus: FleetBus<C>,
    pub cursors: Arc<CursorStore>,
    pub pipeline: DecompositionPipeline<P, W, C>,
    pub locks: Arc<LockManager<C>>,
    pub scheduler: Scheduler<L, C>,
    pub registry: Arc<SpecialistRegistry<C>>,
    pub messages: MessageBus<C>,
    pub conflicts: Arc<ConflictResolver<C>>,
    pub checkpoints: Arc<CheckpointEngine<C>>,
    pub recovery: RecoveryManager<C>,
    clock: C,
    config: CoordinatorConfig,
}

impl<P: Planner, W: FileWalker, L: SpecialistLauncher, C: Clock> Coordinator<P, W, L, C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bus: FleetBus<C>,
        cursors: Arc<CursorStore>,
        pipeline: DecompositionPipeline<P, W, C>,
        locks: Arc<LockManager<C>>,
        scheduler: Scheduler<L, C>,
        registry: Arc<SpecialistRegistry<C>>,
        messages: MessageBus<C>,
        conflicts: Arc<ConflictResolver<C>>,
        checkpoints: Arc<CheckpointEngine<C>>,
        recovery: RecoveryManager<C>,
        clock: C,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
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
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Advance a consumer's position in one event stream.
    ///
    /// A no-op (`Ok(false)`) at or below the current position; rejected
    /// past the stream head. Consumers poll `query_by_stream` from their
    /// cursor rather than holding references into the log.
    pub fn advance_cursor(
        &self,
        stream_type: StreamType,
        stream_id: &str,
        consumer_id: Option<&str>,
        position: u64,
    ) -> Result<bool, sqk_storage::CursorError> {
        let head = self.bus.store.head(stream_type, stream_id);
        self.cursors.advance(
            stream_type,
            stream_id,
            consumer_id,
            position,
            head,
            self.clock.epoch_ms(),
        )
    }

    /// Handle one request. Failures come back as `Response::Error` with the
    /// standard status mapping; this function itself never fails.
    pub async fn handle(&self, request: Request) -> Response {
        match request {
            Request::Decompose { task_description, strategy, context, metadata } => {
                let request = DecomposeRequest {
                    task_description,
                    strategy,
                    codebase_root: context.map(PathBuf::from),
                    tech_orders_dir: None,
                    priority: sqk_core::Priority::Medium,
                    metadata: metadata.into_iter().collect::<Metadata>(),
                };
                match self.pipeline.decompose(request).await {
                    Ok(outcome) => match self.persist_tree(&outcome.tree) {
                        Ok(()) => Response::Decomposition {
                            sortie_tree: Box::new(outcome.tree),
                            warnings: outcome.warnings,
                            strategy_confidence: outcome.strategy.confidence,
                        },
                        Err(response) => response,
                    },
                    Err(err) => pipeline_error(err),
                }
            }

            Request::CreateMission { task_description, strategy, priority } => {
                let request = DecomposeRequest {
                    task_description,
                    strategy,
                    codebase_root: None,
                    tech_orders_dir: None,
                    priority,
                    metadata: Metadata::new(),
                };
                let outcome = match self.pipeline.decompose(request).await {
                    Ok(outcome) => outcome,
                    Err(err) => return pipeline_error(err),
                };
                if let Err(response) = self.persist_tree(&outcome.tree) {
                    return response;
                }
                match self.scheduler.dispatch(&outcome.tree).await {
                    Ok(report) => Response::MissionStarted {
                        mission: Box::new(outcome.tree.mission.clone()),
                        dispatch: sqk_wire::DispatchSummary {
                            launched: report.launched,
                            failed: report.failed,
                            skipped: report.skipped,
                        },
                    },
                    Err(err) => internal(err),
                }
            }

            Request::ListMissions => {
                let state = self.bus.state.lock();
                let mut missions: Vec<_> = state.missions.values().cloned().collect();
                missions.sort_by_key(|m| m.created_at_epoch_ms);
                Response::Missions { missions }
            }

            Request::GetMission { id } => {
                let mission = self.bus.state.lock().get_mission(id.as_str()).cloned();
                match mission {
                    Some(mission) => Response::Mission { mission: Some(Box::new(mission)) },
                    None => not_found("mission", id.as_str()),
                }
            }

            Request::MissionProgress { id, completed_sorties } => {
                let exists = self.bus.state.lock().get_mission(id.as_str()).is_some();
                if !exists {
                    return not_found("mission", id.as_str());
                }
                match self.bus.record(
                    StreamType::Mission,
                    id.as_str(),
                    Event::MissionProgress { id, completed_sorties },
                ) {
                    Ok(_) => Response::Ok,
                    Err(err) => internal(err),
                }
            }

            Request::GetSortie { id } => {
                let sortie = self.bus.state.lock().get_sortie(id.as_str()).cloned();
                match sortie {
                    Some(sortie) => Response::Sortie { sortie: Some(Box::new(sortie)) },
                    None => not_found("sortie", id.as_str()),
                }
            }

            Request::SpawnSpecialist { name, capabilities } => {
                let agent_type = sqk_core::AgentType::from_assignment(&name);
                match self.registry.register(&name, agent_type, capabilities) {
                    Ok(specialist) => Response::SpecialistSpawned { id: specialist.id },
                    Err(err) => internal(err),
                }
            }

            Request::ListSpecialists => {
                Response::Specialists { specialists: self.registry.list() }
            }

            Request::GetSpecialist { id } => match self.registry.get(id.as_str()) {
                Some(specialist) => {
                    Response::Specialist { specialist: Some(Box::new(specialist)) }
                }
                None => not_found("specialist", id.as_str()),
            },

            Request::TerminateSpecialist { id, force, reason } => {
                match self.registry.terminate(&id, reason, force) {
                    Ok(true) => Response::Ok,
                    Ok(false) => not_found("specialist", id.as_str()),
                    Err(err) => internal(err),
                }
            }

            Request::SpecialistProgress { id, status, progress, message } => {
                self.specialist_progress(id, status, progress, message).await
            }

            Request::Heartbeat { id } => match self.registry.update_heartbeat(&id) {
                Ok(true) => Response::Ok,
                Ok(false) => not_found("specialist", id.as_str()),
                Err(err) => internal(err),
            },

            Request::SpecialistHealth { id } => {
                let health = sqk_engine::health::specialist_health(
                    &self.bus.state.lock(),
                    id.as_str(),
                    self.clock.epoch_ms(),
                    self.config.heartbeat_timeout_ms,
                );
                match health.map(serde_json::to_value) {
                    Some(Ok(body)) => Response::Health { body },
                    Some(Err(err)) => internal(err),
                    None => not_found("specialist", id.as_str()),
                }
            }

            Request::SystemHealth => {
                let health = sqk_engine::health::system_health(
                    &self.bus.state.lock(),
                    self.clock.epoch_ms(),
                );
                match serde_json::to_value(health) {
                    Ok(body) => Response::Health { body },
                    Err(err) => internal(err),
                }
            }

            Request::CreateCheckpoint { mission_id, trigger, trigger_details } => {
                match self
                    .checkpoints
                    .save(&mission_id, trigger, trigger_details, "coordinator")
                    .await
                {
                    Ok(checkpoint) => {
                        Response::CheckpointCreated { checkpoint: Box::new(checkpoint) }
                    }
                    Err(err) => engine_error(err.class(), err),
                }
            }

            Request::ListCheckpoints { mission_id } => Response::Checkpoints {
                checkpoints: self.checkpoints.list(mission_id.as_str()),
            },

            Request::LatestCheckpoint { mission_id } => {
                match self.checkpoints.get_latest(mission_id.as_str()) {
                    Ok(Some(checkpoint)) => {
                        Response::Checkpoint { checkpoint: Some(Box::new(checkpoint)) }
                    }
                    Ok(None) => not_found("checkpoint for mission", mission_id.as_str()),
                    Err(err) => engine_error(err.class(), err),
                }
            }

            Request::DeleteCheckpoint { id } => match self.checkpoints.delete(&id) {
                Ok(true) => Response::Ok,
                Ok(false) => not_found("checkpoint", id.as_str()),
                Err(err) => engine_error(err.class(), err),
            },

            Request::Resume { id, force, dry_run } => self.resume(id, force, dry_run),

            Request::AcquireLock { file, specialist_id, timeout_ms, purpose, checksum } => {
                match self.locks.acquire(&file, specialist_id, timeout_ms, purpose, checksum) {
                    Ok(outcome) => Response::Lock {
                        conflict: outcome.conflict,
                        lock: outcome.lock.map(Box::new),
                        existing_lock: outcome.existing_lock.map(Box::new),
                    },
                    Err(err) => engine_error(err.class(), err),
                }
            }

            Request::ReleaseLock { id } => match self.locks.release(&id) {
                Ok(released) => Response::Released { released },
                Err(err) => engine_error(err.class(), err),
            },

            Request::AckMessage { id } => match self.messages.ack(&id) {
                Ok(_) => Response::Ok,
                Err(err) => engine_error(err.class(), err),
            },
        }
    }

    /// Record a validated tree: the mission row, then every sortie.
    fn persist_tree(&self, tree: &SortieTree) -> Result<(), Response> {
        self.bus
            .record(
                StreamType::Mission,
                tree.mission.id.as_str(),
                Event::MissionCreated { mission: Box::new(tree.mission.clone()) },
            )
            .map_err(internal)?;
        for sortie in &tree.sorties {
            self.bus
                .record(
                    StreamType::Sortie,
                    sortie.id.as_str(),
                    Event::SortieCreated { sortie: Box::new(sortie.clone()) },
                )
                .map_err(internal)?;
        }
        Ok(())
    }

    async fn specialist_progress(
        &self,
        id: SpecialistId,
        status: Option<sqk_core::SpecialistStatus>,
        progress: Option<u8>,
        message: Option<String>,
    ) -> Response {
        let Some(specialist) = self.registry.get(id.as_str()) else {
            return not_found("specialist", id.as_str());
        };
        if let Some(progress) = progress {
            if progress > 100 {
                return Response::Error {
                    status: Status::BadRequest,
                    body: ErrorBody {
                        error: "progress out of range".to_string(),
                        message: Some(format!("progress {progress} exceeds 100")),
                    },
                };
            }
        }

        if let Some(status) = status {
            if let Err(err) = self.registry.set_status(&id, status) {
                return internal(err);
            }
        }

        // Progress lands on the specialist's current sortie
        if let (Some(progress), Some(sortie_id)) = (progress, specialist.current_sortie) {
            let completed = progress >= 100;
            let event = if completed {
                Event::SortieCompleted {
                    id: sortie_id,
                    result: message.clone(),
                    at_epoch_ms: self.clock.epoch_ms(),
                }
            } else {
                Event::SortieProgress { id: sortie_id, progress, note: message.clone() }
            };
            if let Err(err) = self.bus.record(StreamType::Sortie, sortie_id.as_str(), event) {
                return internal(err);
            }
            if completed {
                // A fresh terminal success may satisfy the dependencies of
                // sorties parked as blocked during the original dispatch
                self.retry_blocked_siblings(&sortie_id).await;
            }
            self.refresh_mission_counters(&sortie_id);
        }
        Response::Ok
    }

    /// Re-dispatch blocked siblings of a just-completed sortie. Launch
    /// failures are per-sortie facts already recorded by the scheduler;
    /// the progress report itself still succeeds.
    async fn retry_blocked_siblings(&self, sortie_id: &sqk_core::SortieId) {
        let mission_id = {
            let state = self.bus.state.lock();
            state.get_sortie(sortie_id.as_str()).and_then(|s| s.mission_id)
        };
        let Some(mission_id) = mission_id else { return };
        match self.scheduler.retry_blocked(&mission_id).await {
            Ok(report) if !report.launched.is_empty() => {
                tracing::info!(
                    mission = %mission_id,
                    launched = report.launched.len(),
                    "dependents unblocked"
                );
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(mission = %mission_id, %err, "re-dispatch of blocked sorties failed")
            }
        }
    }

    /// Keep the mission's derived fields in step after a sortie completion.
    fn refresh_mission_counters(&self, sortie_id: &sqk_core::SortieId) {
        let mission = {
            let state = self.bus.state.lock();
            state
                .get_sortie(sortie_id.as_str())
                .and_then(|s| s.mission_id)
                .and_then(|id| state.get_mission(id.as_str()).cloned())
        };
        let Some(mission) = mission else { return };

        let all_done = {
            let state = self.bus.state.lock();
            let sorties = state.mission_sorties(mission.id.as_str());
            !sorties.is_empty() && sorties.iter().all(|s| s.status == SortieStatus::Completed)
        };
        if all_done && mission.status == MissionStatus::InProgress {
            let _ = self.bus.record(
                StreamType::Mission,
                mission.id.as_str(),
                Event::MissionStatusChanged {
                    id: mission.id,
                    status: MissionStatus::Completed,
                    at_epoch_ms: self.clock.epoch_ms(),
                },
            );
        }
    }

    fn resume(&self, id: sqk_core::CheckpointId, force: bool, dry_run: bool) -> Response {
        let checkpoint =
            match sqk_engine::recovery::find_checkpoint(&self.bus, self.checkpoints.files(), &id)
            {
                Ok(checkpoint) => checkpoint,
                Err(sqk_engine::recovery::RecoveryError::CheckpointNotFound(_)) => {
                    return not_found("checkpoint", id.as_str());
                }
                Err(err) => return engine_error(err.class(), err),
            };

        let plan = self.recovery.create_plan(&checkpoint, force);
        match self.recovery.execute(&checkpoint, &plan, dry_run) {
            Ok(report) if report.success => Response::Recovery {
                outcome: RecoveryOutcome {
                    attempted: report.attempted,
                    restored: report.restored,
                    errors: report.errors,
                    partial: report.partial,
                    dry_run: report.dry_run,
                },
            },
            Ok(report) => Response::Error {
                status: Status::Internal,
                body: ErrorBody {
                    error: "recovery failed".to_string(),
                    message: Some(report.errors.join("; ")),
                },
            },
            Err(err) => engine_error(err.class(), err),
        }
    }
}

fn not_found(entity: &str, id: &str) -> Response {
    Response::Error {
        status: Status::NotFound,
        body: ErrorBody {
            error: format!("{entity} not found"),
            message: Some(id.to_string()),
        },
    }
}

fn internal(err: impl std::fmt::Display) -> Response {
    Response::Error {
        status: Status::Internal,
        body: ErrorBody { error: err.to_string(), message: None },
    }
}

fn engine_error(class: sqk_core::ErrorClass, err: impl std::fmt::Display) -> Response {
    Response::Error {
        status: Status::from_class(class),
        body: ErrorBody { error: err.to_string(), message: None },
    }
}

fn pipeline_error(err: PipelineError) -> Response {
    let status = Status::from_class(err.class());
    let message = match &err {
        PipelineError::Validation { errors, .. } => {
            Some(errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))
        }
        _ => None,
    };
    Response::Error {
        status,
        body: ErrorBody { error: err.to_string(), message },
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
