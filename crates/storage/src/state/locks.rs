// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock event handlers. `active` is the only non-terminal status.

use super::FleetState;
use sqk_core::{Event, LockStatus};

pub(crate) fn apply(state: &mut FleetState, event: &Event) {
    match event {
        Event::LockAcquired { lock } => {
            if !state.locks.contains_key(lock.id.as_str()) {
                state.locks.insert(lock.id.to_string(), (**lock).clone());
            }
        }

        Event::LockReleased { id, at_epoch_ms } => {
            if let Some(lock) = state.locks.get_mut(id.as_str()) {
                if lock.status == LockStatus::Active {
                    lock.status = LockStatus::Released;
                    lock.released_at_epoch_ms = Some(*at_epoch_ms);
                }
            }
        }

        Event::LockExpired { id, at_epoch_ms, .. } => {
            if let Some(lock) = state.locks.get_mut(id.as_str()) {
                if lock.status == LockStatus::Active {
                    lock.status = LockStatus::Expired;
                    lock.released_at_epoch_ms = Some(*at_epoch_ms);
                }
            }
        }

        Event::LockForceReleased { id, at_epoch_ms } => {
            if let Some(lock) = state.locks.get_mut(id.as_str()) {
                if lock.status == LockStatus::Active {
                    lock.status = LockStatus::ForceReleased;
                    lock.released_at_epoch_ms = Some(*at_epoch_ms);
                }
            }
        }

        _ => {}
    }
}
