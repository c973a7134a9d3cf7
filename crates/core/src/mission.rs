// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mission entity and status machine.

use crate::Metadata;
use serde::{Deserialize, Serialize};
use thiserror::Error;

crate::define_id! {
    /// Unique identifier for a mission (a user-supplied goal).
    pub struct MissionId("msn-");
}

/// Decomposition strategy, selected from the task description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    FileBased,
    FeatureBased,
    RiskBased,
    ResearchBased,
}

crate::simple_display! {
    Strategy {
        FileBased => "file-based",
        FeatureBased => "feature-based",
        RiskBased => "risk-based",
        ResearchBased => "research-based",
    }
}

/// Urgency, ordered from least to most urgent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

crate::simple_display! {
    Priority {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

/// Mission status. Transitions are monotone except `Cancelled`, which is
/// terminal from any non-`Completed` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    Pending,
    InProgress,
    Review,
    Completed,
    Cancelled,
}

crate::simple_display! {
    MissionStatus {
        Pending => "pending",
        InProgress => "in_progress",
        Review => "review",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

impl MissionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MissionStatus::Completed | MissionStatus::Cancelled)
    }

    fn rank(&self) -> u8 {
        match self {
            MissionStatus::Pending => 0,
            MissionStatus::InProgress => 1,
            MissionStatus::Review => 2,
            MissionStatus::Completed => 3,
            MissionStatus::Cancelled => 4,
        }
    }
}

/// Rejected mission status transition.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid mission transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: MissionStatus,
    pub to: MissionStatus,
}

/// A user-supplied goal; the parent of all derived work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub id: MissionId,
    pub title: String,
    pub description: String,
    pub strategy: Strategy,
    pub status: MissionStatus,
    pub priority: Priority,
    pub created_at_epoch_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_epoch_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_epoch_ms: Option<u64>,
    pub total_sorties: u32,
    pub completed_sorties: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl Mission {
    pub fn new(
        id: MissionId,
        title: impl Into<String>,
        description: impl Into<String>,
        strategy: Strategy,
        priority: Priority,
        created_at_epoch_ms: u64,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            strategy,
            status: MissionStatus::Pending,
            priority,
            created_at_epoch_ms,
            started_at_epoch_ms: None,
            completed_at_epoch_ms: None,
            total_sorties: 0,
            completed_sorties: 0,
            result: None,
            metadata: Metadata::new(),
        }
    }

    /// Completed share of the mission as a whole percentage.
    pub fn progress_percent(&self) -> u8 {
        if self.total_sorties == 0 {
            return 0;
        }
        ((self.completed_sorties as f64 / self.total_sorties as f64) * 100.0).round() as u8
    }

    /// Whether a status transition is permitted.
    ///
    /// Status only moves forward; `Cancelled` is reachable from any
    /// non-`Completed` state.
    pub fn can_transition(&self, to: MissionStatus) -> bool {
        match to {
            MissionStatus::Cancelled => self.status != MissionStatus::Completed,
            _ => to.rank() > self.status.rank() && !self.status.is_terminal(),
        }
    }

    /// Apply a status transition, stamping lifecycle timestamps.
    pub fn transition(&mut self, to: MissionStatus, now_ms: u64) -> Result<(), TransitionError> {
        if !self.can_transition(to) {
            return Err(TransitionError { from: self.status, to });
        }
        match to {
            MissionStatus::InProgress => {
                if self.started_at_epoch_ms.is_none() {
                    self.started_at_epoch_ms = Some(now_ms);
                }
            }
            MissionStatus::Completed | MissionStatus::Cancelled => {
                self.completed_at_epoch_ms = Some(now_ms);
            }
            _ => {}
        }
        self.status = to;
        Ok(())
    }

    /// Record one sortie reaching `completed`. Guarded so replaying the same
    /// completion event cannot push the counter past `total_sorties`.
    pub fn record_sortie_completed(&mut self) {
        if self.completed_sorties < self.total_sorties {
            self.completed_sorties += 1;
        }
    }
}

#[cfg(test)]
#[path = "mission_tests.rs"]
mod tests;
