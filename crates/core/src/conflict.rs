// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Detected clashes between specialists over resources, tasks, or data.

use crate::specialist::SpecialistId;
use crate::Metadata;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a detected conflict.
    pub struct ConflictId("cnf-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictKind {
    Resource,
    Task,
    Data,
}

crate::simple_display! {
    ConflictKind {
        Resource => "resource",
        Task => "task",
        Data => "data",
    }
}

/// Ordered so thresholds can be compared (`severity <= threshold`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

crate::simple_display! {
    Severity {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

/// Resolution approach, selected from the `(kind, severity)` priority table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionStrategy {
    FirstComeFirstServe,
    PriorityBased,
    ResourceSharing,
    TaskSplitting,
    AgentCooperation,
    Arbitration,
}

crate::simple_display! {
    ResolutionStrategy {
        FirstComeFirstServe => "first-come-first-serve",
        PriorityBased => "priority-based",
        ResourceSharing => "resource-sharing",
        TaskSplitting => "task-splitting",
        AgentCooperation => "agent-cooperation",
        Arbitration => "arbitration",
    }
}

/// A detected clash. Once resolved, never reopened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub id: ConflictId,
    pub kind: ConflictKind,
    pub specialists: Vec<SpecialistId>,
    pub description: String,
    pub severity: Severity,
    pub detected_at_epoch_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at_epoch_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<ResolutionStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_details: Option<String>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl Conflict {
    pub fn is_resolved(&self) -> bool {
        self.resolved_at_epoch_ms.is_some()
    }
}
