// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mailbox-addressed messaging between specialists and the coordinator.
//!
//! Delivery is at-least-once: reading marks messages `read`, an explicit
//! ack finalizes them, and a requeue returns them to `pending`. An acked
//! message is never redelivered by `read_pending`.

use crate::bus::FleetBus;
use sqk_core::{
    Clock, ErrorClass, Event, Mailbox, MailboxId, Message, MessageId, MessageStatus, Priority,
    SpecialistId, StreamType,
};
use sqk_storage::LogError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailboxError {
    #[error("mailbox not found: {0}")]
    MailboxNotFound(MailboxId),

    #[error("message not found: {0}")]
    MessageNotFound(MessageId),

    #[error(transparent)]
    Log(#[from] LogError),
}

impl MailboxError {
    pub fn class(&self) -> ErrorClass {
        match self {
            MailboxError::MailboxNotFound(_) | MailboxError::MessageNotFound(_) => {
                ErrorClass::Validation
            }
            MailboxError::Log(err) => err.class(),
        }
    }
}

pub struct MessageBus<C: Clock> {
    bus: FleetBus<C>,
    clock: C,
}

impl<C: Clock> MessageBus<C> {
    pub fn new(bus: FleetBus<C>, clock: C) -> Self {
        Self { bus, clock }
    }

    /// The owner's mailbox, created on first use.
    pub fn ensure_mailbox(&self, owner: SpecialistId) -> Result<Mailbox, LogError> {
        if let Some(existing) = self.bus.state.lock().mailbox_for(owner.as_str()).cloned() {
            return Ok(existing);
        }
        let mailbox =
            Mailbox { id: MailboxId::new(), owner, created_at_epoch_ms: self.clock.epoch_ms() };
        self.bus.record(
            StreamType::Squawk,
            mailbox.id.as_str(),
            Event::MailboxCreated {
                id: mailbox.id,
                owner,
                at_epoch_ms: mailbox.created_at_epoch_ms,
            },
        )?;
        Ok(mailbox)
    }

    /// Send a message. The mailbox must exist.
    pub fn send(
        &self,
        mailbox_id: MailboxId,
        sender_id: Option<SpecialistId>,
        message_type: &str,
        content: &str,
        priority: Priority,
    ) -> Result<Message, MailboxError> {
        if !self.bus.state.lock().mailboxes.contains_key(mailbox_id.as_str()) {
            return Err(MailboxError::MailboxNotFound(mailbox_id));
        }
        let message = Message {
            id: MessageId::new(),
            mailbox_id,
            sender_id,
            thread_id: None,
            message_type: message_type.to_string(),
            content: content.to_string(),
            priority,
            status: MessageStatus::Pending,
            sent_at_epoch_ms: self.clock.epoch_ms(),
            read_at_epoch_ms: None,
            acked_at_epoch_ms: None,
        };
        self.bus.record(
            StreamType::Squawk,
            mailbox_id.as_str(),
            Event::MessageSent { message: Box::new(message.clone()) },
        )?;
        Ok(message)
    }

    /// Drain pending messages, marking each `read`.
    pub fn read_pending(&self, mailbox_id: &MailboxId) -> Result<Vec<Message>, MailboxError> {
        let pending: Vec<Message> = {
            let state = self.bus.state.lock();
            state.pending_messages(mailbox_id.as_str()).into_iter().cloned().collect()
        };
        let now_ms = self.clock.epoch_ms();
        for message in &pending {
            self.bus.record(
                StreamType::Squawk,
                mailbox_id.as_str(),
                Event::MessageRead { id: message.id, at_epoch_ms: now_ms },
            )?;
        }
        Ok(pending)
    }

    /// Finalize a message. Once acked it is never redelivered.
    pub fn ack(&self, message_id: &MessageId) -> Result<bool, MailboxError> {
        let mailbox_id = self.mailbox_of(message_id)?;
        self.bus.record(
            StreamType::Squawk,
            mailbox_id.as_str(),
            Event::MessageAcked { id: *message_id, at_epoch_ms: self.clock.epoch_ms() },
        )?;
        Ok(true)
    }

    /// Return a read or acked message to `pending` (operator action).
    pub fn requeue(&self, message_id: &MessageId) -> Result<bool, MailboxError> {
        let mailbox_id = self.mailbox_of(message_id)?;
        self.bus.record(
            StreamType::Squawk,
            mailbox_id.as_str(),
            Event::MessageRequeued { id: *message_id },
        )?;
        Ok(true)
    }

    fn mailbox_of(&self, message_id: &MessageId) -> Result<MailboxId, MailboxError> {
        self.bus
            .state
            .lock()
            .messages
            .get(message_id.as_str())
            .map(|m| m.mailbox_id)
            .ok_or(MailboxError::MessageNotFound(*message_id))
    }
}

#[cfg(test)]
#[path = "mailbox_tests.rs"]
mod tests;
