// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sortie event handlers, including the mission's derived counters.

use super::FleetState;
use sqk_core::{Event, SortieStatus};

pub(crate) fn apply(state: &mut FleetState, event: &Event) {
    match event {
        Event::SortieCreated { sortie } => {
            if !state.sorties.contains_key(sortie.id.as_str()) {
                state.sorties.insert(sortie.id.to_string(), (**sortie).clone());
            }
            // Recompute rather than increment so replay stays idempotent
            if let Some(mission_id) = sortie.mission_id.as_ref() {
                let total = state
                    .sorties
                    .values()
                    .filter(|s| s.mission_id.as_ref() == Some(mission_id))
                    .count() as u32;
                if let Some(mission) = state.missions.get_mut(mission_id.as_str()) {
                    mission.total_sorties = total.max(mission.total_sorties);
                }
            }
        }

        Event::SortieAssigned { id, specialist_id, .. } => {
            if let Some(sortie) = state.sorties.get_mut(id.as_str()) {
                if !sortie.status.is_terminal() {
                    sortie.assigned_to = Some(*specialist_id);
                    sortie.status = SortieStatus::Assigned;
                    // A blocked sortie that gets assigned is unblocked
                    sortie.blocked_by = None;
                    sortie.blocked_reason = None;
                }
            }
        }

        Event::SortieStatusChanged { id, status, reason, at_epoch_ms } => {
            if let Some(sortie) = state.sorties.get_mut(id.as_str()) {
                if sortie.status.is_terminal() {
                    return;
                }
                if *status == SortieStatus::InProgress && sortie.started_at_epoch_ms.is_none() {
                    sortie.started_at_epoch_ms = Some(*at_epoch_ms);
                }
                if *status == SortieStatus::Blocked {
                    sortie.blocked_reason.clone_from(reason);
                }
                sortie.status = *status;
            }
        }

        Event::SortieProgress { id, progress, note } => {
            if let Some(sortie) = state.sorties.get_mut(id.as_str()) {
                sortie.advance_progress(*progress, note.as_deref());
            }
        }

        Event::SortieCompleted { id, result, at_epoch_ms } => {
            let mission_id = match state.sorties.get_mut(id.as_str()) {
                // Status guard keeps the mission counter idempotent
                Some(sortie) if sortie.status != SortieStatus::Completed => {
                    sortie.status = SortieStatus::Completed;
                    sortie.completed_at_epoch_ms = Some(*at_epoch_ms);
                    sortie.progress = 100;
                    sortie.result.clone_from(result);
                    sortie.mission_id
                }
                _ => None,
            };
            if let Some(mission_id) = mission_id {
                if let Some(mission) = state.missions.get_mut(mission_id.as_str()) {
                    mission.record_sortie_completed();
                }
            }
        }

        Event::SortieFailed { id, error, at_epoch_ms } => {
            if let Some(sortie) = state.sorties.get_mut(id.as_str()) {
                if !sortie.status.is_terminal() {
                    sortie.status = SortieStatus::Failed;
                    sortie.completed_at_epoch_ms = Some(*at_epoch_ms);
                    sortie.result = Some(error.clone());
                }
            }
        }

        _ => {}
    }
}
