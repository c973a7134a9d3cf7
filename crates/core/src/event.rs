// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event payloads for the fleet coordination system.
//!
//! Serializes with `{"type": "event:name", ...fields}` format.
//! Unknown type tags deserialize to `Custom`; consumers must ignore
//! fields and variants they do not recognize (additive schema evolution).

use crate::checkpoint::{Checkpoint, CheckpointId};
use crate::conflict::{Conflict, ConflictId, ResolutionStrategy};
use crate::lock::{FileLock, LockId};
use crate::message::{MailboxId, Message, MessageId};
use crate::mission::{MissionId, MissionStatus};
use crate::sortie::{Sortie, SortieId, SortieStatus};
use crate::specialist::{Specialist, SpecialistId, SpecialistStatus};
use serde::{Deserialize, Serialize};

/// Stream partition for sequence numbering.
///
/// `ctk` carries lock traffic (tool-control), `squawk` carries mailbox
/// traffic, `fleet` carries conflicts and recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    Specialist,
    Squawk,
    Ctk,
    Sortie,
    Mission,
    Checkpoint,
    Fleet,
    System,
}

crate::simple_display! {
    StreamType {
        Specialist => "specialist",
        Squawk => "squawk",
        Ctk => "ctk",
        Sortie => "sortie",
        Mission => "mission",
        Checkpoint => "checkpoint",
        Fleet => "fleet",
        System => "system",
    }
}

/// Events that record state transitions in the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // -- mission --
    #[serde(rename = "mission:created")]
    MissionCreated {
        mission: Box<crate::mission::Mission>,
    },

    #[serde(rename = "mission:status_changed")]
    MissionStatusChanged {
        id: MissionId,
        status: MissionStatus,
        at_epoch_ms: u64,
    },

    #[serde(rename = "mission:progress")]
    MissionProgress {
        id: MissionId,
        completed_sorties: u32,
    },

    // -- sortie --
    #[serde(rename = "sortie:created")]
    SortieCreated { sortie: Box<Sortie> },

    #[serde(rename = "sortie:assigned")]
    SortieAssigned {
        id: SortieId,
        specialist_id: SpecialistId,
        at_epoch_ms: u64,
    },

    #[serde(rename = "sortie:status_changed")]
    SortieStatusChanged {
        id: SortieId,
        status: SortieStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        at_epoch_ms: u64,
    },

    #[serde(rename = "sortie:progress")]
    SortieProgress {
        id: SortieId,
        progress: u8,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },

    #[serde(rename = "sortie:completed")]
    SortieCompleted {
        id: SortieId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<String>,
        at_epoch_ms: u64,
    },

    #[serde(rename = "sortie:failed")]
    SortieFailed {
        id: SortieId,
        error: String,
        at_epoch_ms: u64,
    },

    // -- lock (ctk stream) --
    #[serde(rename = "lock:acquired")]
    LockAcquired { lock: Box<FileLock> },

    #[serde(rename = "lock:released")]
    LockReleased { id: LockId, at_epoch_ms: u64 },

    #[serde(rename = "lock:expired")]
    LockExpired {
        id: LockId,
        file: String,
        reserved_by: SpecialistId,
        at_epoch_ms: u64,
    },

    #[serde(rename = "lock:force_released")]
    LockForceReleased { id: LockId, at_epoch_ms: u64 },

    // -- specialist --
    #[serde(rename = "specialist:registered")]
    SpecialistRegistered { specialist: Box<Specialist> },

    #[serde(rename = "specialist:heartbeat")]
    SpecialistHeartbeat { id: SpecialistId, at_epoch_ms: u64 },

    #[serde(rename = "specialist:missed_heartbeat")]
    SpecialistMissedHeartbeat {
        id: SpecialistId,
        last_seen_epoch_ms: u64,
    },

    #[serde(rename = "specialist:status_changed")]
    SpecialistStatusChanged {
        id: SpecialistId,
        status: SpecialistStatus,
    },

    #[serde(rename = "specialist:terminated")]
    SpecialistTerminated {
        id: SpecialistId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        forced: bool,
    },

    // -- mailbox / message (squawk stream) --
    #[serde(rename = "mailbox:created")]
    MailboxCreated {
        id: MailboxId,
        owner: SpecialistId,
        at_epoch_ms: u64,
    },

    #[serde(rename = "message:sent")]
    MessageSent { message: Box<Message> },

    #[serde(rename = "message:read")]
    MessageRead { id: MessageId, at_epoch_ms: u64 },

    #[serde(rename = "message:acked")]
    MessageAcked { id: MessageId, at_epoch_ms: u64 },

    #[serde(rename = "message:requeued")]
    MessageRequeued { id: MessageId },

    // -- checkpoint --
    #[serde(rename = "checkpoint:created")]
    CheckpointCreated { checkpoint: Box<Checkpoint> },

    #[serde(rename = "checkpoint:consumed")]
    CheckpointConsumed {
        id: CheckpointId,
        at_epoch_ms: u64,
    },

    #[serde(rename = "checkpoint:deleted")]
    CheckpointDeleted { id: CheckpointId },

    // -- conflict / recovery (fleet stream) --
    #[serde(rename = "conflict:detected")]
    ConflictDetected { conflict: Box<Conflict> },

    #[serde(rename = "conflict:resolved")]
    ConflictResolved {
        id: ConflictId,
        strategy: ResolutionStrategy,
        details: String,
        at_epoch_ms: u64,
    },

    #[serde(rename = "recovery:started")]
    RecoveryStarted {
        checkpoint_id: CheckpointId,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        dry_run: bool,
    },

    #[serde(rename = "recovery:completed")]
    RecoveryCompleted {
        checkpoint_id: CheckpointId,
        restored: u32,
        errors: u32,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        partial: bool,
    },

    // -- system --
    #[serde(rename = "system:shutdown")]
    Shutdown,

    /// Catch-all for unknown event types (extensibility)
    #[serde(other, skip_serializing)]
    Custom,
}

impl Event {
    /// The serialized type tag, for querying by event type.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::MissionCreated { .. } => "mission:created",
            Event::MissionStatusChanged { .. } => "mission:status_changed",
            Event::MissionProgress { .. } => "mission:progress",
            Event::SortieCreated { .. } => "sortie:created",
            Event::SortieAssigned { .. } => "sortie:assigned",
            Event::SortieStatusChanged { .. } => "sortie:status_changed",
            Event::SortieProgress { .. } => "sortie:progress",
            Event::SortieCompleted { .. } => "sortie:completed",
            Event::SortieFailed { .. } => "sortie:failed",
            Event::LockAcquired { .. } => "lock:acquired",
            Event::LockReleased { .. } => "lock:released",
            Event::LockExpired { .. } => "lock:expired",
            Event::LockForceReleased { .. } => "lock:force_released",
            Event::SpecialistRegistered { .. } => "specialist:registered",
            Event::SpecialistHeartbeat { .. } => "specialist:heartbeat",
            Event::SpecialistMissedHeartbeat { .. } => "specialist:missed_heartbeat",
            Event::SpecialistStatusChanged { .. } => "specialist:status_changed",
            Event::SpecialistTerminated { .. } => "specialist:terminated",
            Event::MailboxCreated { .. } => "mailbox:created",
            Event::MessageSent { .. } => "message:sent",
            Event::MessageRead { .. } => "message:read",
            Event::MessageAcked { .. } => "message:acked",
            Event::MessageRequeued { .. } => "message:requeued",
            Event::CheckpointCreated { .. } => "checkpoint:created",
            Event::CheckpointConsumed { .. } => "checkpoint:consumed",
            Event::CheckpointDeleted { .. } => "checkpoint:deleted",
            Event::ConflictDetected { .. } => "conflict:detected",
            Event::ConflictResolved { .. } => "conflict:resolved",
            Event::RecoveryStarted { .. } => "recovery:started",
            Event::RecoveryCompleted { .. } => "recovery:completed",
            Event::Shutdown => "system:shutdown",
            Event::Custom => "custom",
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
