// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health summaries derived from live fleet state.

use serde::{Deserialize, Serialize};
use sqk_core::{SpecialistId, SpecialistStatus};
use sqk_storage::FleetState;

/// One specialist's health, as reported by the health endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialistHealth {
    pub id: SpecialistId,
    pub status: SpecialistStatus,
    pub healthy: bool,
    pub last_seen_epoch_ms: u64,
    pub current_sortie: Option<String>,
}

/// Fleet-wide health counters, all taken from real state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemHealth {
    pub specialists_total: usize,
    pub specialists_live: usize,
    pub specialists_unhealthy: usize,
    pub missions_open: usize,
    pub sorties_in_flight: usize,
    pub active_locks: usize,
    pub unresolved_conflicts: usize,
    pub pending_messages: usize,
}

pub fn specialist_health(
    state: &FleetState,
    id: &str,
    now_ms: u64,
    heartbeat_timeout_ms: u64,
) -> Option<SpecialistHealth> {
    state.specialists.get(id).map(|s| SpecialistHealth {
        id: s.id,
        status: s.status,
        healthy: s.is_healthy(now_ms, heartbeat_timeout_ms) && !s.unhealthy,
        last_seen_epoch_ms: s.last_seen_epoch_ms,
        current_sortie: s.current_sortie.map(|id| id.to_string()),
    })
}

pub fn system_health(state: &FleetState, now_ms: u64) -> SystemHealth {
    SystemHealth {
        specialists_total: state.specialists.len(),
        specialists_live: state.live_specialists().len(),
        specialists_unhealthy: state.specialists.values().filter(|s| s.unhealthy).count(),
        missions_open: state.missions.values().filter(|m| !m.status.is_terminal()).count(),
        sorties_in_flight: state
            .sorties
            .values()
            .filter(|s| !s.status.is_terminal())
            .count(),
        active_locks: state.active_locks(now_ms).len(),
        unresolved_conflicts: state.conflicts.values().filter(|c| !c.is_resolved()).count(),
        pending_messages: state.messages.values().filter(|m| m.is_pending()).count(),
    }
}
