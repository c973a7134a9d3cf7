// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Responses from the coordinator to the transport layer.

use crate::status::Status;
use serde::{Deserialize, Serialize};
use sqk_core::{
    Checkpoint, FileLock, Mission, Sortie, SortieId, SortieTree, Specialist, SpecialistId,
};

/// Error payload: one `error` string, optional `message`, never a trace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Outcome of a dispatch pass, summarized for the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DispatchSummary {
    pub launched: Vec<SortieId>,
    pub failed: Vec<(SortieId, String)>,
    pub skipped: Vec<(SortieId, String)>,
}

/// Outcome of a recovery run (`POST /checkpoints/{id}/resume`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecoveryOutcome {
    pub attempted: usize,
    pub restored: usize,
    pub errors: Vec<String>,
    pub partial: bool,
    pub dry_run: bool,
}

/// Response from the coordinator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Generic success
    Ok,

    /// Decomposition result
    Decomposition {
        sortie_tree: Box<SortieTree>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<String>,
        strategy_confidence: f64,
    },

    /// Mission created and dispatched
    MissionStarted {
        mission: Box<Mission>,
        dispatch: DispatchSummary,
    },

    Missions { missions: Vec<Mission> },

    Mission { mission: Option<Box<Mission>> },

    Sortie { sortie: Option<Box<Sortie>> },

    Specialists { specialists: Vec<Specialist> },

    Specialist { specialist: Option<Box<Specialist>> },

    SpecialistSpawned { id: SpecialistId },

    /// Health payloads are already JSON-shaped by the engine
    Health { body: serde_json::Value },

    Checkpoint { checkpoint: Option<Box<Checkpoint>> },

    Checkpoints { checkpoints: Vec<Checkpoint> },

    CheckpointCreated { checkpoint: Box<Checkpoint> },

    Recovery { outcome: RecoveryOutcome },

    Lock {
        conflict: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lock: Option<Box<FileLock>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        existing_lock: Option<Box<FileLock>>,
    },

    Released { released: bool },

    /// Failure envelope with the §7 status mapping applied
    Error { status: Status, body: ErrorBody },
}

impl Response {
    /// The transport status this response maps to.
    pub fn status(&self) -> Status {
        match self {
            Response::Error { status, .. } => *status,
            Response::Recovery { outcome } if outcome.partial => Status::PartialContent,
            _ => Status::Ok,
        }
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
