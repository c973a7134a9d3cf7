// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mailboxes and messages between specialists and the coordinator.

use crate::mission::Priority;
use crate::specialist::SpecialistId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Identifier for a specialist's mailbox.
    pub struct MailboxId("mbx-");
}

crate::define_id! {
    /// Identifier for a single message.
    pub struct MessageId("msg-");
}

/// An addressable queue owned by one specialist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mailbox {
    pub id: MailboxId,
    pub owner: SpecialistId,
    pub created_at_epoch_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Pending,
    Read,
    Acked,
}

crate::simple_display! {
    MessageStatus {
        Pending => "pending",
        Read => "read",
        Acked => "acked",
    }
}

/// Delivery is at-least-once; an acked message is never redelivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub mailbox_id: MailboxId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<SpecialistId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    pub message_type: String,
    pub content: String,
    pub priority: Priority,
    pub status: MessageStatus,
    pub sent_at_epoch_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at_epoch_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acked_at_epoch_ms: Option<u64>,
}

impl Message {
    pub fn is_pending(&self) -> bool {
        self.status == MessageStatus::Pending
    }
}
