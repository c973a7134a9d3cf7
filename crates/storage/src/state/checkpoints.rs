// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint row event handlers (the store half of the dual write).

use super::FleetState;
use sqk_core::Event;

pub(crate) fn apply(state: &mut FleetState, event: &Event) {
    match event {
        Event::CheckpointCreated { checkpoint } => {
            if !state.checkpoints.contains_key(checkpoint.id.as_str()) {
                state.checkpoints.insert(checkpoint.id.to_string(), (**checkpoint).clone());
            }
        }

        Event::CheckpointConsumed { id, at_epoch_ms } => {
            if let Some(checkpoint) = state.checkpoints.get_mut(id.as_str()) {
                // Once set, never unset
                if checkpoint.consumed_at_epoch_ms.is_none() {
                    checkpoint.consumed_at_epoch_ms = Some(*at_epoch_ms);
                }
            }
        }

        Event::CheckpointDeleted { id } => {
            state.checkpoints.remove(id.as_str());
        }

        _ => {}
    }
}
