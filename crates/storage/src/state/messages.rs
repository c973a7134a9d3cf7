// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mailbox and message event handlers.

use super::FleetState;
use sqk_core::{Event, Mailbox, MessageStatus};

pub(crate) fn apply(state: &mut FleetState, event: &Event) {
    match event {
        Event::MailboxCreated { id, owner, at_epoch_ms } => {
            if !state.mailboxes.contains_key(id.as_str()) {
                state.mailboxes.insert(
                    id.to_string(),
                    Mailbox { id: *id, owner: *owner, created_at_epoch_ms: *at_epoch_ms },
                );
            }
        }

        Event::MessageSent { message } => {
            if !state.messages.contains_key(message.id.as_str()) {
                state.messages.insert(message.id.to_string(), (**message).clone());
            }
        }

        Event::MessageRead { id, at_epoch_ms } => {
            if let Some(message) = state.messages.get_mut(id.as_str()) {
                if message.status == MessageStatus::Pending {
                    message.status = MessageStatus::Read;
                    message.read_at_epoch_ms = Some(*at_epoch_ms);
                }
            }
        }

        Event::MessageAcked { id, at_epoch_ms } => {
            if let Some(message) = state.messages.get_mut(id.as_str()) {
                if message.status != MessageStatus::Acked {
                    message.status = MessageStatus::Acked;
                    message.acked_at_epoch_ms = Some(*at_epoch_ms);
                }
            }
        }

        Event::MessageRequeued { id } => {
            if let Some(message) = state.messages.get_mut(id.as_str()) {
                message.status = MessageStatus::Pending;
            }
        }

        _ => {}
    }
}
