// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized fleet state, rebuilt from event log replay.

mod checkpoints;
mod conflicts;
mod locks;
mod messages;
mod missions;
mod sorties;
mod specialists;

use serde::{Deserialize, Serialize};
use sqk_core::{
    Checkpoint, Conflict, Event, FileLock, Mailbox, Message, MessageStatus, Mission, Sortie,
    Specialist,
};
use std::collections::HashMap;

/// Materialized state built from the event log.
///
/// This plays the "relational store" role: missions, sorties, specialists,
/// locks, mailboxes, messages, conflicts, and checkpoint rows, all derived
/// from events.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct FleetState {
    pub missions: HashMap<String, Mission>,
    pub sorties: HashMap<String, Sortie>,
    pub specialists: HashMap<String, Specialist>,
    pub locks: HashMap<String, FileLock>,
    pub mailboxes: HashMap<String, Mailbox>,
    pub messages: HashMap<String, Message>,
    pub conflicts: HashMap<String, Conflict>,
    pub checkpoints: HashMap<String, Checkpoint>,
}

impl FleetState {
    /// Apply an event to derive state changes.
    ///
    /// Events are facts about what happened; state is derived from those
    /// facts.
    ///
    /// # Idempotency Requirement
    ///
    /// **All event handlers MUST be idempotent.** The same event may be
    /// applied twice: once when a component records it for immediate
    /// visibility, and again when the log is replayed at startup.
    ///
    /// Guidelines:
    /// - Use assignment (`=`) instead of mutation (`+=`, `-=`)
    /// - Guard inserts with existence checks
    /// - Guard counters and transitions with status checks
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::MissionCreated { .. }
            | Event::MissionStatusChanged { .. }
            | Event::MissionProgress { .. } => missions::apply(self, event),

            Event::SortieCreated { .. }
            | Event::SortieAssigned { .. }
            | Event::SortieStatusChanged { .. }
            | Event::SortieProgress { .. }
            | Event::SortieCompleted { .. }
            | Event::SortieFailed { .. } => sorties::apply(self, event),

            Event::LockAcquired { .. }
            | Event::LockReleased { .. }
            | Event::LockExpired { .. }
            | Event::LockForceReleased { .. } => locks::apply(self, event),

            Event::SpecialistRegistered { .. }
            | Event::SpecialistHeartbeat { .. }
            | Event::SpecialistMissedHeartbeat { .. }
            | Event::SpecialistStatusChanged { .. }
            | Event::SpecialistTerminated { .. } => specialists::apply(self, event),

            Event::MailboxCreated { .. }
            | Event::MessageSent { .. }
            | Event::MessageRead { .. }
            | Event::MessageAcked { .. }
            | Event::MessageRequeued { .. } => messages::apply(self, event),

            Event::CheckpointCreated { .. }
            | Event::CheckpointConsumed { .. }
            | Event::CheckpointDeleted { .. } => checkpoints::apply(self, event),

            Event::ConflictDetected { .. } | Event::ConflictResolved { .. } => {
                conflicts::apply(self, event)
            }

            // Control events with no persisted state effect
            Event::RecoveryStarted { .. }
            | Event::RecoveryCompleted { .. }
            | Event::Shutdown
            | Event::Custom => {}
        }
    }

    pub fn get_mission(&self, id: &str) -> Option<&Mission> {
        self.missions.get(id)
    }

    pub fn get_sortie(&self, id: &str) -> Option<&Sortie> {
        self.sorties.get(id)
    }

    /// Sorties belonging to a mission, unordered.
    pub fn mission_sorties(&self, mission_id: &str) -> Vec<&Sortie> {
        self.sorties
            .values()
            .filter(|s| s.mission_id.as_ref().is_some_and(|m| m.as_str() == mission_id))
            .collect()
    }

    /// Locks that are active and unexpired at `now_ms`.
    pub fn active_locks(&self, now_ms: u64) -> Vec<&FileLock> {
        self.locks.values().filter(|l| l.is_active(now_ms)).collect()
    }

    /// Specialists with a live status.
    pub fn live_specialists(&self) -> Vec<&Specialist> {
        self.specialists.values().filter(|s| s.status.is_live()).collect()
    }

    pub fn mailbox_for(&self, owner: &str) -> Option<&Mailbox> {
        self.mailboxes.values().find(|m| m.owner.as_str() == owner)
    }

    /// Pending messages in a mailbox, oldest first.
    pub fn pending_messages(&self, mailbox_id: &str) -> Vec<&Message> {
        let mut pending: Vec<&Message> = self
            .messages
            .values()
            .filter(|m| m.mailbox_id.as_str() == mailbox_id && m.status == MessageStatus::Pending)
            .collect();
        pending.sort_by_key(|m| m.sent_at_epoch_ms);
        pending
    }

    /// Newest checkpoint for a mission, by snapshot timestamp.
    pub fn latest_checkpoint(&self, mission_id: &str) -> Option<&Checkpoint> {
        self.checkpoints
            .values()
            .filter(|c| c.mission_id.as_str() == mission_id)
            .max_by_key(|c| c.timestamp_epoch_ms)
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
