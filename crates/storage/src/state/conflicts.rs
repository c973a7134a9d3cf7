// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conflict event handlers. A resolved conflict is never reopened.

use super::FleetState;
use sqk_core::Event;

pub(crate) fn apply(state: &mut FleetState, event: &Event) {
    match event {
        Event::ConflictDetected { conflict } => {
            if !state.conflicts.contains_key(conflict.id.as_str()) {
                state.conflicts.insert(conflict.id.to_string(), (**conflict).clone());
            }
        }

        Event::ConflictResolved { id, strategy, details, at_epoch_ms } => {
            if let Some(conflict) = state.conflicts.get_mut(id.as_str()) {
                if !conflict.is_resolved() {
                    conflict.resolved_at_epoch_ms = Some(*at_epoch_ms);
                    conflict.resolution = Some(*strategy);
                    conflict.resolution_details = Some(details.clone());
                }
            }
        }

        _ => {}
    }
}
