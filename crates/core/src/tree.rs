// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The full decomposition output: mission, sorties, dependency edges, and
//! the parallelization analysis. Immutable once validated.

use crate::mission::Mission;
use crate::sortie::{Sortie, SortieId};
use serde::{Deserialize, Serialize};

/// A dependency edge with a natural-language justification from the planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// The sortie that must wait.
    pub from: SortieId,
    /// The sortie it waits on.
    pub to: SortieId,
    pub reason: String,
}

/// Output of the parallelization analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parallelization {
    /// Layers of sorties that can run concurrently.
    pub parallel_groups: Vec<Vec<SortieId>>,
    /// Longest dependency chain, by sortie count.
    pub critical_path: Vec<SortieId>,
    /// Effort along the critical path, in milliseconds.
    pub estimated_duration_ms: u64,
    /// `max parallel group size / total sorties`, in `[0, 1]`.
    pub parallelization_potential: f64,
    /// `total effort / critical path effort`, at least 1.
    pub estimated_speedup: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bottlenecks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortieTree {
    pub mission: Mission,
    pub sorties: Vec<Sortie>,
    pub dependencies: Vec<DependencyEdge>,
    pub parallelization: Parallelization,
}

impl SortieTree {
    pub fn sortie(&self, id: &SortieId) -> Option<&Sortie> {
        self.sorties.iter().find(|s| s.id == *id)
    }

    pub fn total_effort_hours(&self) -> f64 {
        self.sorties.iter().map(|s| s.estimated_effort_hours).sum()
    }
}
