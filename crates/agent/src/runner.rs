// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The specialist run loop.
//!
//! starting → initialized → executing | idling → completed | failed |
//! terminated. Heartbeats ride a separate task; cancellation (signal or
//! coordinator order) drains everything before the loop returns.

use crate::steps;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqk_core::{AgentType, Clock, Rng, SpecialistId};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Where the runner reports. The transport (HTTP posts back to the
/// coordinator) lives outside the core.
#[async_trait]
pub trait ReportSink: Send + Sync + 'static {
    async fn heartbeat(&self, heartbeat: Heartbeat);
    async fn progress(&self, update: ProgressUpdate);
}

/// Sink that logs reports; the default when no transport is wired.
pub struct TracingSink;

#[async_trait]
impl ReportSink for TracingSink {
    async fn heartbeat(&self, heartbeat: Heartbeat) {
        tracing::debug!(
            specialist = %heartbeat.specialist_id,
            uptime_ms = heartbeat.uptime_ms,
            state = ?heartbeat.state,
            "heartbeat"
        );
    }

    async fn progress(&self, update: ProgressUpdate) {
        tracing::info!(
            specialist = %update.specialist_id,
            progress = update.progress,
            step = %update.step,
            "progress"
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerState {
    Starting,
    Initialized,
    Executing,
    Idling,
    Completed,
    Failed,
    Terminated,
}

sqk_core::simple_display! {
    RunnerState {
        Starting => "starting",
        Initialized => "initialized",
        Executing => "executing",
        Idling => "idling",
        Completed => "completed",
        Failed => "failed",
        Terminated => "terminated",
    }
}

/// Periodic liveness report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heartbeat {
    pub specialist_id: SpecialistId,
    pub at_epoch_ms: u64,
    pub uptime_ms: u64,
    pub state: RunnerState,
    /// Simulated resource usage; the runner simulates its workload too.
    pub memory_bytes: u64,
    /// Sequence number of this beat within the run.
    pub beat: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub specialist_id: SpecialistId,
    pub progress: u8,
    pub step: String,
    pub state: RunnerState,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("wall-clock timeout after {0:?}")]
    Timeout(Duration),
}

/// How a run ended (both are exit-code-0 paths).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Terminated,
}

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub specialist_id: SpecialistId,
    pub agent_type: AgentType,
    /// Task description; `None` puts the runner in the idle loop.
    pub task: Option<String>,
    pub heartbeat_interval: Duration,
    /// Simulated per-step delay range `[min, max)`.
    pub step_delay_min: Duration,
    pub step_delay_max: Duration,
    pub wall_clock_timeout: Option<Duration>,
}

impl RunnerConfig {
    pub fn new(specialist_id: SpecialistId, agent_type: AgentType) -> Self {
        Self {
            specialist_id,
            agent_type,
            task: None,
            heartbeat_interval: Duration::from_secs(15),
            step_delay_min: Duration::from_secs(2),
            step_delay_max: Duration::from_secs(5),
            wall_clock_timeout: None,
        }
    }

    pub fn task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }
}

pub struct Runner<S: ReportSink, R: Rng, C: Clock> {
    config: RunnerConfig,
    sink: Arc<S>,
    rng: R,
    clock: C,
    cancel: CancellationToken,
}

impl<S: ReportSink, R: Rng, C: Clock> Runner<S, R, C> {
    pub fn new(config: RunnerConfig, sink: Arc<S>, rng: R, clock: C) -> Self {
        Self { config, sink, rng, clock, cancel: CancellationToken::new() }
    }

    /// Token to trigger graceful shutdown from a signal handler.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Drive the run to completion, cancellation, or timeout.
    pub async fn run(&self) -> Result<RunOutcome, RunnerError> {
        match self.config.wall_clock_timeout {
            Some(timeout) => {
                match tokio::time::timeout(timeout, self.run_inner()).await {
                    Ok(outcome) => Ok(outcome),
                    Err(_) => {
                        // Deadline hit: stop the loops, then report failure
                        self.cancel.cancel();
                        Err(RunnerError::Timeout(timeout))
                    }
                }
            }
            None => Ok(self.run_inner().await),
        }
    }

    async fn run_inner(&self) -> RunOutcome {
        let started_ms = self.clock.epoch_ms();
        tracing::info!(
            specialist = %self.config.specialist_id,
            agent_type = %self.config.agent_type,
            "specialist starting"
        );

        self.initialize().await;

        let heartbeat_task = self.spawn_heartbeat(started_ms);

        let outcome = match self.config.task.clone() {
            Some(task) => self.execute_task(&task).await,
            None => self.idle_loop().await,
        };

        // Stop the heartbeat before reporting the final state
        self.cancel.cancel();
        let _ = heartbeat_task.await;

        tracing::info!(specialist = %self.config.specialist_id, outcome = ?outcome, "specialist stopping");
        outcome
    }

    /// Initialization is an opaque side-effectful step per agent type.
    async fn initialize(&self) {
        tracing::debug!(agent_type = %self.config.agent_type, "initializing toolchain");
        tokio::task::yield_now().await;
    }

    fn spawn_heartbeat(&self, started_ms: u64) -> tokio::task::JoinHandle<()> {
        let sink = Arc::clone(&self.sink);
        let cancel = self.cancel.clone();
        let clock = self.clock.clone();
        let rng = self.rng.clone();
        let specialist_id = self.config.specialist_id;
        let interval = self.config.heartbeat_interval;
        let has_task = self.config.task.is_some();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick fires immediately; skip it so beats are spaced
            ticker.tick().await;
            let mut beats: u32 = 0;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        beats += 1;
                        let now_ms = clock.epoch_ms();
                        sink.heartbeat(Heartbeat {
                            specialist_id,
                            at_epoch_ms: now_ms,
                            uptime_ms: now_ms.saturating_sub(started_ms),
                            state: if has_task { RunnerState::Executing } else { RunnerState::Idling },
                            memory_bytes: 64 * 1024 * 1024 + rng.range_u64(0, 16 * 1024 * 1024),
                            beat: beats,
                        }).await;
                    }
                }
            }
        })
    }

    async fn execute_task(&self, task: &str) -> RunOutcome {
        let steps = steps::steps_for(task);
        let total = steps.len();

        for (index, step) in steps.iter().enumerate() {
            let delay = self.step_delay();
            tokio::select! {
                _ = self.cancel.cancelled() => return RunOutcome::Terminated,
                _ = tokio::time::sleep(delay) => {}
            }

            let progress = (((index + 1) as f64 / total as f64) * 100.0).round() as u8;
            self.sink
                .progress(ProgressUpdate {
                    specialist_id: self.config.specialist_id,
                    progress,
                    step: step.clone(),
                    state: RunnerState::Executing,
                })
                .await;
        }
        RunOutcome::Completed
    }

    /// No task: loop on randomized default activities until shutdown.
    async fn idle_loop(&self) -> RunOutcome {
        loop {
            let delay = self.step_delay();
            tokio::select! {
                _ = self.cancel.cancelled() => return RunOutcome::Terminated,
                _ = tokio::time::sleep(delay) => {}
            }
            self.sink
                .progress(ProgressUpdate {
                    specialist_id: self.config.specialist_id,
                    progress: 0,
                    step: steps::idle_activity(&self.rng).to_string(),
                    state: RunnerState::Idling,
                })
                .await;
        }
    }

    fn step_delay(&self) -> Duration {
        let min = self.config.step_delay_min.as_millis() as u64;
        let max = self.config.step_delay_max.as_millis() as u64;
        Duration::from_millis(self.rng.range_u64(min, max.max(min + 1)))
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
