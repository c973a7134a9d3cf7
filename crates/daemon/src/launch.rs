// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Default implementations of the external capabilities.
//!
//! The LLM provider and the process spawner live outside the core; these
//! are the adapters the daemon binary wires in when nothing else is
//! configured.

use async_trait::async_trait;
use sqk_core::{Sortie, Specialist};
use sqk_planner::{PlanError, Planner};
use sqk_engine::{LaunchError, SpecialistLauncher};
use std::process::Stdio;

/// Placeholder planner for deployments without an LLM transport wired in.
/// Decompose requests fail fast with a clear error instead of hanging.
pub struct UnconfiguredPlanner;

#[async_trait]
impl Planner for UnconfiguredPlanner {
    async fn plan(&self, _prompt: &str) -> Result<String, PlanError> {
        Err(PlanError::Request(
            "no LLM transport configured; set llm.api_key and wire a Planner".to_string(),
        ))
    }
}

/// Spawns the `sqk-agent` binary, detached, with its assignment in the
/// environment. The child reports back over the external transport.
pub struct ProcessLauncher {
    /// Path or name of the specialist binary.
    pub binary: String,
    pub heartbeat_interval_ms: u64,
}

impl ProcessLauncher {
    pub fn new(heartbeat_interval_ms: u64) -> Self {
        Self { binary: "sqk-agent".to_string(), heartbeat_interval_ms }
    }
}

#[async_trait]
impl SpecialistLauncher for ProcessLauncher {
    async fn launch(&self, sortie: &Sortie, specialist: &Specialist) -> Result<(), LaunchError> {
        let child = tokio::process::Command::new(&self.binary)
            .env("SQK_SPECIALIST_ID", specialist.id.as_str())
            .env("SQK_AGENT_TYPE", specialist.agent_type.to_string())
            .env("SQK_TASK", format!("{}: {}", sortie.title, sortie.description))
            .env("SQK_HEARTBEAT_MS", self.heartbeat_interval_ms.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| LaunchError(format!("spawn {}: {e}", self.binary)))?;

        tracing::info!(
            specialist = %specialist.id,
            sortie = %sortie.id,
            pid = child.id(),
            "specialist process launched"
        );
        Ok(())
    }
}
