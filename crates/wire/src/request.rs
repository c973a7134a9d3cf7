// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Requests accepted by the coordinator, mirroring the `/api/v1` surface.

use serde::{Deserialize, Serialize};
use sqk_core::{
    CheckpointId, CheckpointTrigger, LockPurpose, MessageId, MissionId, Priority, SortieId,
    SpecialistId, SpecialistStatus, Strategy,
};
use std::collections::HashMap;

/// Request from the transport layer to the coordinator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    // -- missions --
    /// `POST /missions/decompose`
    Decompose {
        task_description: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        strategy: Option<Strategy>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context: Option<String>,
        #[serde(default, skip_serializing_if = "HashMap::is_empty")]
        metadata: HashMap<String, serde_json::Value>,
    },

    /// `POST /missions`: decompose and immediately dispatch
    CreateMission {
        task_description: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        strategy: Option<Strategy>,
        #[serde(default)]
        priority: Priority,
    },

    /// `GET /missions`
    ListMissions,

    /// `GET /missions/{id}`
    GetMission { id: MissionId },

    /// `PATCH /missions/{id}/progress`
    MissionProgress { id: MissionId, completed_sorties: u32 },

    // -- specialists (external name: agents) --
    /// `POST /agents/spawn`
    SpawnSpecialist {
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        capabilities: Vec<String>,
    },

    /// `GET /agents`
    ListSpecialists,

    /// `GET /agents/{id}`
    GetSpecialist { id: SpecialistId },

    /// `DELETE /agents/{id}?force=&reason=`
    TerminateSpecialist {
        id: SpecialistId,
        #[serde(default)]
        force: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// `POST /agents/{id}/progress`
    SpecialistProgress {
        id: SpecialistId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<SpecialistStatus>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        progress: Option<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// `POST /agents/{id}/heartbeat`
    Heartbeat { id: SpecialistId },

    /// `GET /agents/{id}/health`
    SpecialistHealth { id: SpecialistId },

    /// `GET /agents/system-health`
    SystemHealth,

    // -- checkpoints --
    /// `POST /checkpoints`
    CreateCheckpoint {
        mission_id: MissionId,
        #[serde(default = "manual_trigger")]
        trigger: CheckpointTrigger,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        trigger_details: Option<String>,
    },

    /// `GET /checkpoints?mission_id=`
    ListCheckpoints { mission_id: MissionId },

    /// `GET /checkpoints/latest/{mission_id}`
    LatestCheckpoint { mission_id: MissionId },

    /// `DELETE /checkpoints/{id}`
    DeleteCheckpoint { id: CheckpointId },

    /// `POST /checkpoints/{id}/resume`
    Resume {
        id: CheckpointId,
        #[serde(default)]
        force: bool,
        #[serde(default)]
        dry_run: bool,
    },

    // -- locks (recovery manager and external orchestration tools) --
    AcquireLock {
        file: String,
        specialist_id: SpecialistId,
        timeout_ms: u64,
        purpose: LockPurpose,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        checksum: Option<String>,
    },

    ReleaseLock { id: sqk_core::LockId },

    // -- messages --
    AckMessage { id: MessageId },

    /// `GET /sorties/{id}` (internal surface used by dashboards)
    GetSortie { id: SortieId },
}

fn manual_trigger() -> CheckpointTrigger {
    CheckpointTrigger::Manual
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
