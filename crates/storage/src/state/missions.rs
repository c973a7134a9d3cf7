// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mission event handlers.

use super::FleetState;
use sqk_core::{Event, MissionStatus};

pub(crate) fn apply(state: &mut FleetState, event: &Event) {
    match event {
        Event::MissionCreated { mission } => {
            // Guarded insert: replay must not clobber later updates
            if !state.missions.contains_key(mission.id.as_str()) {
                state.missions.insert(mission.id.to_string(), (**mission).clone());
            }
        }

        Event::MissionStatusChanged { id, status, at_epoch_ms } => {
            if let Some(mission) = state.missions.get_mut(id.as_str()) {
                // The event is a fact; apply by assignment, stamping the
                // lifecycle timestamps the transition implies.
                match status {
                    MissionStatus::InProgress => {
                        if mission.started_at_epoch_ms.is_none() {
                            mission.started_at_epoch_ms = Some(*at_epoch_ms);
                        }
                    }
                    MissionStatus::Completed | MissionStatus::Cancelled => {
                        if mission.completed_at_epoch_ms.is_none() {
                            mission.completed_at_epoch_ms = Some(*at_epoch_ms);
                        }
                    }
                    _ => {}
                }
                mission.status = *status;
            }
        }

        Event::MissionProgress { id, completed_sorties } => {
            if let Some(mission) = state.missions.get_mut(id.as_str()) {
                // Assignment keeps replay idempotent; clamp to the invariant
                mission.completed_sorties = (*completed_sorties).min(mission.total_sorties);
            }
        }

        _ => {}
    }
}
