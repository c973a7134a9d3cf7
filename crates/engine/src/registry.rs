// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Specialist registry: identity, heartbeat, status.

use crate::bus::FleetBus;
use sqk_core::{
    AgentType, Clock, Event, Specialist, SpecialistId, SpecialistStatus, StreamType,
};
use sqk_storage::LogError;

pub struct SpecialistRegistry<C: Clock> {
    bus: FleetBus<C>,
    clock: C,
    heartbeat_timeout_ms: u64,
}

impl<C: Clock> SpecialistRegistry<C> {
    pub fn new(bus: FleetBus<C>, clock: C, heartbeat_timeout_ms: u64) -> Self {
        Self { bus, clock, heartbeat_timeout_ms }
    }

    pub fn register(
        &self,
        name: &str,
        agent_type: AgentType,
        capabilities: Vec<String>,
    ) -> Result<Specialist, LogError> {
        let mut specialist =
            Specialist::new(SpecialistId::new(), name, agent_type, self.clock.epoch_ms());
        specialist.capabilities = capabilities;
        self.bus.record(
            StreamType::Specialist,
            specialist.id.as_str(),
            Event::SpecialistRegistered { specialist: Box::new(specialist.clone()) },
        )?;
        Ok(specialist)
    }

    /// Record a heartbeat. Returns `false` for an unknown specialist.
    pub fn update_heartbeat(&self, id: &SpecialistId) -> Result<bool, LogError> {
        let known = self.bus.state.lock().specialists.contains_key(id.as_str());
        if !known {
            return Ok(false);
        }
        self.bus.record(
            StreamType::Specialist,
            id.as_str(),
            Event::SpecialistHeartbeat { id: *id, at_epoch_ms: self.clock.epoch_ms() },
        )?;
        Ok(true)
    }

    pub fn set_status(&self, id: &SpecialistId, status: SpecialistStatus) -> Result<bool, LogError> {
        let known = self.bus.state.lock().specialists.contains_key(id.as_str());
        if !known {
            return Ok(false);
        }
        self.bus.record(
            StreamType::Specialist,
            id.as_str(),
            Event::SpecialistStatusChanged { id: *id, status },
        )?;
        Ok(true)
    }

    pub fn terminate(
        &self,
        id: &SpecialistId,
        reason: Option<String>,
        forced: bool,
    ) -> Result<bool, LogError> {
        let known = self.bus.state.lock().specialists.contains_key(id.as_str());
        if !known {
            return Ok(false);
        }
        self.bus.record(
            StreamType::Specialist,
            id.as_str(),
            Event::SpecialistTerminated { id: *id, reason, forced },
        )?;
        Ok(true)
    }

    pub fn get(&self, id: &str) -> Option<Specialist> {
        self.bus.state.lock().specialists.get(id).cloned()
    }

    pub fn list(&self) -> Vec<Specialist> {
        let state = self.bus.state.lock();
        let mut specialists: Vec<Specialist> = state.specialists.values().cloned().collect();
        specialists.sort_by(|a, b| a.registered_at_epoch_ms.cmp(&b.registered_at_epoch_ms));
        specialists
    }

    /// Flag live specialists whose heartbeat went stale. A specialist is
    /// never terminated for silence; it is flagged, an event is emitted,
    /// the next fresh heartbeat clears the flag.
    pub fn sweep_missed_heartbeats(&self) -> Result<Vec<SpecialistId>, LogError> {
        let now_ms = self.clock.epoch_ms();
        let stale: Vec<(SpecialistId, u64)> = {
            let state = self.bus.state.lock();
            state
                .specialists
                .values()
                .filter(|s| {
                    s.status.is_live() && !s.unhealthy && s.is_stale(now_ms, self.heartbeat_timeout_ms)
                })
                .map(|s| (s.id, s.last_seen_epoch_ms))
                .collect()
        };

        let mut flagged = Vec::new();
        for (id, last_seen) in stale {
            self.bus.record(
                StreamType::Specialist,
                id.as_str(),
                Event::SpecialistMissedHeartbeat { id, last_seen_epoch_ms: last_seen },
            )?;
            tracing::warn!(specialist = %id, last_seen, "missed heartbeat");
            flagged.push(id);
        }
        Ok(flagged)
    }

    pub fn heartbeat_timeout_ms(&self) -> u64 {
        self.heartbeat_timeout_ms
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
