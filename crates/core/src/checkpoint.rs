// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable mission snapshots for crash recovery.

use crate::lock::FileLock;
use crate::message::Message;
use crate::mission::MissionId;
use crate::sortie::Sortie;
use crate::Metadata;
use serde::{Deserialize, Serialize};

/// Current checkpoint schema version
pub const CHECKPOINT_VERSION: u32 = 1;

crate::define_id! {
    /// Unique identifier for a checkpoint.
    pub struct CheckpointId("chk-");
}

/// What caused the snapshot to be taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointTrigger {
    Progress,
    Error,
    Manual,
    Compaction,
}

crate::simple_display! {
    CheckpointTrigger {
        Progress => "progress",
        Error => "error",
        Manual => "manual",
        Compaction => "compaction",
    }
}

/// Narrative state captured alongside the snapshot, consumed by the
/// recovery planner when rebuilding a mission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RecoveryContext {
    pub last_action: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub next_steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blockers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files_modified: Vec<String>,
    pub mission_summary: String,
    pub elapsed_time_ms: u64,
    pub last_activity_at_epoch_ms: u64,
}

/// A durable snapshot of a mission's live state sufficient to reconstruct it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: CheckpointId,
    pub mission_id: MissionId,
    pub timestamp_epoch_ms: u64,
    pub trigger: CheckpointTrigger,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_details: Option<String>,
    /// Whole percentage in `[0, 100]`.
    pub progress_percent: u8,
    pub sorties: Vec<Sortie>,
    pub active_locks: Vec<FileLock>,
    pub pending_messages: Vec<Message>,
    pub recovery_context: RecoveryContext,
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at_epoch_ms: Option<u64>,
    /// Once set, never unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumed_at_epoch_ms: Option<u64>,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl Checkpoint {
    pub fn is_consumed(&self) -> bool {
        self.consumed_at_epoch_ms.is_some()
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at_epoch_ms.is_some_and(|at| at <= now_ms)
    }

    /// Age of the snapshot relative to `now_ms`.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp_epoch_ms)
    }
}
