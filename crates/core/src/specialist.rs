// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Specialist (worker) identity and health.

use crate::sortie::SortieId;
use crate::Metadata;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a specialist worker.
    pub struct SpecialistId("spc-");
}

/// Broad role a specialist is initialized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    Frontend,
    #[default]
    Backend,
    Testing,
    Documentation,
    Security,
    Performance,
}

crate::simple_display! {
    AgentType {
        Frontend => "frontend",
        Backend => "backend",
        Testing => "testing",
        Documentation => "documentation",
        Security => "security",
        Performance => "performance",
    }
}

impl AgentType {
    /// Derive the type from an assignment string by substring match.
    /// Unrecognized assignments default to `Backend`.
    pub fn from_assignment(assignment: &str) -> Self {
        let lower = assignment.to_lowercase();
        for (needle, agent_type) in [
            ("frontend", AgentType::Frontend),
            ("backend", AgentType::Backend),
            ("testing", AgentType::Testing),
            ("documentation", AgentType::Documentation),
            ("security", AgentType::Security),
            ("performance", AgentType::Performance),
        ] {
            if lower.contains(needle) {
                return agent_type;
            }
        }
        AgentType::Backend
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecialistStatus {
    Active,
    Busy,
    Idle,
    Inactive,
    Completed,
}

crate::simple_display! {
    SpecialistStatus {
        Active => "active",
        Busy => "busy",
        Idle => "idle",
        Inactive => "inactive",
        Completed => "completed",
    }
}

impl SpecialistStatus {
    /// Eligible for scheduling (subject to heartbeat freshness).
    pub fn is_live(&self) -> bool {
        matches!(self, SpecialistStatus::Active | SpecialistStatus::Busy | SpecialistStatus::Idle)
    }
}

/// An autonomous worker process that executes sorties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specialist {
    pub id: SpecialistId,
    pub name: String,
    pub agent_type: AgentType,
    pub status: SpecialistStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<String>,
    pub registered_at_epoch_ms: u64,
    pub last_seen_epoch_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_sortie: Option<SortieId>,
    /// Free-form description of the work in hand; conflict detection compares these.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_task: Option<String>,
    /// Named resources in use (conflict detection input).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,
    /// Set by the heartbeat watcher; cleared by the next heartbeat.
    #[serde(default)]
    pub unhealthy: bool,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl Specialist {
    pub fn new(
        id: SpecialistId,
        name: impl Into<String>,
        agent_type: AgentType,
        now_ms: u64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            agent_type,
            status: SpecialistStatus::Active,
            capabilities: Vec::new(),
            registered_at_epoch_ms: now_ms,
            last_seen_epoch_ms: now_ms,
            current_sortie: None,
            current_task: None,
            resources: Vec::new(),
            unhealthy: false,
            metadata: Metadata::new(),
        }
    }

    /// No heartbeat within the timeout. A stale specialist is treated as
    /// `inactive` for scheduling even before its status is updated.
    pub fn is_stale(&self, now_ms: u64, heartbeat_timeout_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_seen_epoch_ms) > heartbeat_timeout_ms
    }

    /// Live status and a fresh heartbeat.
    pub fn is_healthy(&self, now_ms: u64, heartbeat_timeout_ms: u64) -> bool {
        self.status.is_live() && !self.is_stale(now_ms, heartbeat_timeout_ms)
    }

    /// Data items (files, databases, endpoints) declared in metadata.
    /// Conflict detection compares these across live specialists.
    pub fn data_items(&self) -> Vec<String> {
        let mut items = Vec::new();
        for key in ["files", "databases", "endpoints"] {
            if let Some(values) = self.metadata.get(key).and_then(|v| v.as_array()) {
                items.extend(values.iter().filter_map(|v| v.as_str().map(str::to_string)));
            }
        }
        items
    }
}

#[cfg(test)]
#[path = "specialist_tests.rs"]
mod tests;
