// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Specialist entry point.
//!
//! Configuration comes from the environment (the coordinator spawns this
//! binary; argument parsing stays outside the core):
//!   SQK_SPECIALIST_ID, SQK_AGENT_TYPE, SQK_TASK, SQK_HEARTBEAT_MS,
//!   SQK_TIMEOUT_MS.
//!
//! Exit codes: 0 on completion or graceful shutdown, 1 on failure or
//! wall-clock timeout.

use sqk_agent::{Runner, RunnerConfig, RunnerError, TracingSink};
use sqk_core::{AgentType, SpecialistId, SystemClock, SystemRng};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn config_from_env() -> RunnerConfig {
    let specialist_id = std::env::var("SQK_SPECIALIST_ID")
        .map(SpecialistId::from_string)
        .unwrap_or_default();
    let agent_type = std::env::var("SQK_AGENT_TYPE")
        .map(|t| AgentType::from_assignment(&t))
        .unwrap_or_default();

    let mut config = RunnerConfig::new(specialist_id, agent_type);
    if let Ok(task) = std::env::var("SQK_TASK") {
        if !task.trim().is_empty() {
            config.task = Some(task);
        }
    }
    if let Some(ms) = env_ms("SQK_HEARTBEAT_MS") {
        config.heartbeat_interval = Duration::from_millis(ms);
    }
    if let Some(ms) = env_ms("SQK_TIMEOUT_MS") {
        config.wall_clock_timeout = Some(Duration::from_millis(ms));
    }
    config
}

fn env_ms(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let runner =
        Runner::new(config_from_env(), Arc::new(TracingSink), SystemRng, SystemClock);
    let cancel = runner.cancellation_token();

    // SIGINT/SIGTERM trigger graceful shutdown: cancel the loops and let
    // the runner drain; the run then exits 0 as Terminated
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};
        let mut interrupt = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(_) => return,
        };
        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(_) => return,
        };
        tokio::select! {
            _ = interrupt.recv() => {}
            _ = terminate.recv() => {}
        }
        tracing::info!("shutdown signal received");
        cancel.cancel();
    });

    match runner.run().await {
        Ok(outcome) => {
            tracing::info!(?outcome, "run finished");
            ExitCode::SUCCESS
        }
        Err(err @ RunnerError::Timeout(_)) => {
            tracing::error!(%err, "run failed");
            ExitCode::FAILURE
        }
    }
}
