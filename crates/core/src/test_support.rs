// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builders and fixtures shared by tests across the workspace.

use crate::checkpoint::{Checkpoint, CheckpointId, CheckpointTrigger, RecoveryContext};
use crate::lock::{FileLock, LockId, LockPurpose, LockStatus};
use crate::message::{Mailbox, MailboxId, Message, MessageId, MessageStatus};
use crate::mission::{Mission, MissionId, Priority, Strategy};
use crate::sortie::{Sortie, SortieId, SortieStatus};
use crate::specialist::{AgentType, Specialist, SpecialistId};
use crate::Metadata;

/// A pending mission with sensible defaults.
pub fn mission(id: &str, title: &str) -> Mission {
    Mission::new(
        MissionId::from_string(id),
        title,
        format!("{title} (description)"),
        Strategy::FeatureBased,
        Priority::Medium,
        1_000_000,
    )
}

/// Builder for sortie fixtures.
pub struct SortieBuilder {
    sortie: Sortie,
}

impl SortieBuilder {
    pub fn new(id: &str, title: &str) -> Self {
        let mut sortie =
            Sortie::new(SortieId::from_string(id), title, format!("{title} (description)"));
        sortie.files.insert(format!("src/{}.rs", title.replace(' ', "_")));
        Self { sortie }
    }

    pub fn mission(mut self, id: &str) -> Self {
        self.sortie.mission_id = Some(MissionId::from_string(id));
        self
    }

    pub fn files(mut self, files: &[&str]) -> Self {
        self.sortie.files = files.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn depends_on(mut self, ids: &[&str]) -> Self {
        self.sortie.dependencies = ids.iter().map(|i| SortieId::from_string(i)).collect();
        self
    }

    pub fn status(mut self, status: SortieStatus) -> Self {
        self.sortie.status = status;
        self
    }

    pub fn assigned_to(mut self, specialist: &str) -> Self {
        self.sortie.assigned_to = Some(SpecialistId::from_string(specialist));
        self
    }

    pub fn effort(mut self, hours: f64) -> Self {
        self.sortie.estimated_effort_hours = hours;
        self
    }

    pub fn progress(mut self, progress: u8) -> Self {
        self.sortie.progress = progress;
        self
    }

    pub fn build(self) -> Sortie {
        self.sortie
    }
}

pub fn sortie(id: &str, title: &str) -> SortieBuilder {
    SortieBuilder::new(id, title)
}

pub fn specialist(id: &str, name: &str) -> Specialist {
    Specialist::new(
        SpecialistId::from_string(id),
        name,
        AgentType::from_assignment(name),
        1_000_000,
    )
}

pub fn active_lock(id: &str, path: &str, holder: &str, expires_at_ms: u64) -> FileLock {
    FileLock {
        id: LockId::from_string(id),
        file: path.to_string(),
        normalized_path: path.to_string(),
        reserved_by: SpecialistId::from_string(holder),
        purpose: LockPurpose::Edit,
        reserved_at_epoch_ms: 1_000_000,
        expires_at_epoch_ms: expires_at_ms,
        released_at_epoch_ms: None,
        checksum: None,
        status: LockStatus::Active,
        metadata: Metadata::new(),
    }
}

pub fn mailbox(id: &str, owner: &str) -> Mailbox {
    Mailbox {
        id: MailboxId::from_string(id),
        owner: SpecialistId::from_string(owner),
        created_at_epoch_ms: 1_000_000,
    }
}

pub fn pending_message(id: &str, mailbox_id: &str, content: &str) -> Message {
    Message {
        id: MessageId::from_string(id),
        mailbox_id: MailboxId::from_string(mailbox_id),
        sender_id: None,
        thread_id: None,
        message_type: "task".to_string(),
        content: content.to_string(),
        priority: Priority::Medium,
        status: MessageStatus::Pending,
        sent_at_epoch_ms: 1_000_000,
        read_at_epoch_ms: None,
        acked_at_epoch_ms: None,
    }
}

/// A checkpoint wrapping the given sorties/locks/messages.
pub fn checkpoint(
    id: &str,
    mission_id: &str,
    timestamp_ms: u64,
    sorties: Vec<Sortie>,
    active_locks: Vec<FileLock>,
    pending_messages: Vec<Message>,
) -> Checkpoint {
    Checkpoint {
        id: CheckpointId::from_string(id),
        mission_id: MissionId::from_string(mission_id),
        timestamp_epoch_ms: timestamp_ms,
        trigger: CheckpointTrigger::Manual,
        trigger_details: None,
        progress_percent: 50,
        sorties,
        active_locks,
        pending_messages,
        recovery_context: RecoveryContext {
            last_action: "dispatched sorties".to_string(),
            next_steps: vec!["resume in-flight sorties".to_string()],
            blockers: Vec::new(),
            files_modified: Vec::new(),
            mission_summary: "test mission".to_string(),
            elapsed_time_ms: 60_000,
            last_activity_at_epoch_ms: timestamp_ms,
        },
        created_by: "coordinator".to_string(),
        expires_at_epoch_ms: None,
        consumed_at_epoch_ms: None,
        version: crate::checkpoint::CHECKPOINT_VERSION,
        metadata: Metadata::new(),
    }
}
