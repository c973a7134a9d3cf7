// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Specialist registry event handlers.

use super::FleetState;
use sqk_core::{Event, SpecialistStatus};

pub(crate) fn apply(state: &mut FleetState, event: &Event) {
    match event {
        Event::SpecialistRegistered { specialist } => {
            if !state.specialists.contains_key(specialist.id.as_str()) {
                state.specialists.insert(specialist.id.to_string(), (**specialist).clone());
            }
        }

        Event::SpecialistHeartbeat { id, at_epoch_ms } => {
            if let Some(specialist) = state.specialists.get_mut(id.as_str()) {
                // Assignment, not max(): replay applies beats in log order
                specialist.last_seen_epoch_ms = *at_epoch_ms;
                specialist.unhealthy = false;
            }
        }

        Event::SpecialistMissedHeartbeat { id, .. } => {
            if let Some(specialist) = state.specialists.get_mut(id.as_str()) {
                specialist.unhealthy = true;
            }
        }

        Event::SpecialistStatusChanged { id, status } => {
            if let Some(specialist) = state.specialists.get_mut(id.as_str()) {
                specialist.status = *status;
            }
        }

        Event::SpecialistTerminated { id, .. } => {
            if let Some(specialist) = state.specialists.get_mut(id.as_str()) {
                specialist.status = SpecialistStatus::Inactive;
                specialist.current_sortie = None;
                specialist.current_task = None;
            }
        }

        _ => {}
    }
}
