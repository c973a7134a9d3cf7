// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sortie entity: an atomic unit of work within a mission.

use crate::mission::{MissionId, Priority};
use crate::specialist::SpecialistId;
use crate::Metadata;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

crate::define_id! {
    /// Unique identifier for a sortie.
    pub struct SortieId("srt-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortieStatus {
    Pending,
    Assigned,
    InProgress,
    Blocked,
    Review,
    Completed,
    Failed,
    Cancelled,
}

crate::simple_display! {
    SortieStatus {
        Pending => "pending",
        Assigned => "assigned",
        InProgress => "in_progress",
        Blocked => "blocked",
        Review => "review",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

impl SortieStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SortieStatus::Completed | SortieStatus::Failed | SortieStatus::Cancelled)
    }

    /// Terminal success, the only state that satisfies a dependency.
    pub fn is_terminal_success(&self) -> bool {
        matches!(self, SortieStatus::Completed)
    }
}

/// LLM-estimated implementation complexity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

crate::simple_display! {
    Complexity {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

/// An atomic unit of work, executable by one specialist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sortie {
    pub id: SortieId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mission_id: Option<MissionId>,
    pub title: String,
    pub description: String,
    pub status: SortieStatus,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<SpecialistId>,
    /// Files this sortie will touch. Concurrent sorties must not overlap.
    pub files: BTreeSet<String>,
    /// Sorties (same mission) that must complete before this one starts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<SortieId>,
    /// Whole percentage, non-decreasing while non-terminal.
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_epoch_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_epoch_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<SortieId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    pub complexity: Complexity,
    /// Always positive; validated at the planner boundary.
    pub estimated_effort_hours: f64,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl Sortie {
    pub fn new(id: SortieId, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            mission_id: None,
            title: title.into(),
            description: description.into(),
            status: SortieStatus::Pending,
            priority: Priority::Medium,
            assigned_to: None,
            files: BTreeSet::new(),
            dependencies: Vec::new(),
            progress: 0,
            progress_notes: None,
            started_at_epoch_ms: None,
            completed_at_epoch_ms: None,
            blocked_by: None,
            blocked_reason: None,
            result: None,
            complexity: Complexity::Medium,
            estimated_effort_hours: 1.0,
            metadata: Metadata::new(),
        }
    }

    pub fn is_independent(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Raise progress, clamped to 100. Lower values and terminal states are
    /// ignored so the materialized value never decreases.
    pub fn advance_progress(&mut self, progress: u8, note: Option<&str>) {
        if self.status.is_terminal() || progress <= self.progress {
            return;
        }
        self.progress = progress.min(100);
        if let Some(note) = note {
            self.progress_notes = Some(note.to_string());
        }
    }

    /// Whether the sortie names at least one file, component, or function.
    pub fn has_scope(&self) -> bool {
        if !self.files.is_empty() {
            return true;
        }
        ["components", "functions"].iter().any(|key| {
            self.metadata
                .get(*key)
                .and_then(|v| v.as_array())
                .is_some_and(|a| !a.is_empty())
        })
    }
}

#[cfg(test)]
#[path = "sortie_tests.rs"]
mod tests;
