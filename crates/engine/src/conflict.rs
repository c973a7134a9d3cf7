// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conflict detection and resolution over the live specialist set.
//!
//! Detectors run over a snapshot of the registry. Resolution never mutates
//! specialist state directly: each strategy produces a textual plan and
//! action strings, emitted as events for other components to act on.

use crate::bus::FleetBus;
use sqk_core::{
    Clock, Conflict, ConflictId, ConflictKind, Event, Metadata, ResolutionStrategy, Severity,
    Specialist, SpecialistId, StreamType,
};
use sqk_storage::LogError;
use std::collections::HashMap;

/// `(kind, severity) → strategy`, highest priority wins. `None` matches any
/// kind and serves as the floor.
const STRATEGY_TABLE: &[(Option<ConflictKind>, Severity, ResolutionStrategy, u8)] = &[
    (Some(ConflictKind::Resource), Severity::Critical, ResolutionStrategy::Arbitration, 100),
    (Some(ConflictKind::Data), Severity::Critical, ResolutionStrategy::Arbitration, 95),
    (Some(ConflictKind::Task), Severity::Critical, ResolutionStrategy::Arbitration, 90),
    (Some(ConflictKind::Task), Severity::High, ResolutionStrategy::TaskSplitting, 80),
    (Some(ConflictKind::Resource), Severity::High, ResolutionStrategy::PriorityBased, 75),
    (Some(ConflictKind::Data), Severity::High, ResolutionStrategy::PriorityBased, 70),
    (Some(ConflictKind::Resource), Severity::Medium, ResolutionStrategy::ResourceSharing, 60),
    (Some(ConflictKind::Data), Severity::Medium, ResolutionStrategy::ResourceSharing, 55),
    (Some(ConflictKind::Task), Severity::Medium, ResolutionStrategy::AgentCooperation, 50),
    (None, Severity::Low, ResolutionStrategy::FirstComeFirstServe, 10),
];

/// A resolution: the chosen strategy, a narrative plan, and action strings.
#[derive(Debug, Clone)]
pub struct ResolutionPlan {
    pub strategy: ResolutionStrategy,
    pub plan: String,
    pub actions: Vec<String>,
}

pub struct ConflictResolver<C: Clock> {
    bus: FleetBus<C>,
    clock: C,
    /// Conflicts at or below this severity resolve automatically.
    autoresolve_threshold: Severity,
}

impl<C: Clock> ConflictResolver<C> {
    pub fn new(bus: FleetBus<C>, clock: C, autoresolve_threshold: Severity) -> Self {
        Self { bus, clock, autoresolve_threshold }
    }

    /// One background sweep: detect over the live registry, record fresh
    /// conflicts, auto-resolve those under the threshold. Returns the ids
    /// of newly detected conflicts.
    pub fn sweep(&self) -> Result<Vec<ConflictId>, LogError> {
        let specialists: Vec<Specialist> = {
            let state = self.bus.state.lock();
            state.live_specialists().into_iter().cloned().collect()
        };

        let detected = detect(&specialists, self.clock.epoch_ms());
        let mut recorded = Vec::new();

        for conflict in detected {
            let duplicate = {
                let state = self.bus.state.lock();
                state.conflicts.values().any(|existing| {
                    !existing.is_resolved()
                        && existing.kind == conflict.kind
                        && existing.specialists == conflict.specialists
                })
            };
            if duplicate {
                continue;
            }

            self.bus.record(
                StreamType::Fleet,
                conflict.id.as_str(),
                Event::ConflictDetected { conflict: Box::new(conflict.clone()) },
            )?;
            tracing::warn!(
                conflict = %conflict.id,
                kind = %conflict.kind,
                severity = %conflict.severity,
                "conflict detected"
            );

            if conflict.severity <= self.autoresolve_threshold {
                let plan = resolve(&conflict);
                self.bus.record(
                    StreamType::Fleet,
                    conflict.id.as_str(),
                    Event::ConflictResolved {
                        id: conflict.id,
                        strategy: plan.strategy,
                        details: plan.plan,
                        at_epoch_ms: self.clock.epoch_ms(),
                    },
                )?;
            }
            recorded.push(conflict.id);
        }
        Ok(recorded)
    }

    /// Compact resolved conflicts older than the retention window out of
    /// the materialized state. Replay resurrects them; the next sweep
    /// prunes again. Returns how many rows were dropped.
    pub fn prune_resolved(&self, retention_ms: u64) -> usize {
        let now_ms = self.clock.epoch_ms();
        let mut state = self.bus.state.lock();
        let before = state.conflicts.len();
        state.conflicts.retain(|_, c| {
            c.resolved_at_epoch_ms
                .map(|at| now_ms.saturating_sub(at) <= retention_ms)
                .unwrap_or(true)
        });
        before - state.conflicts.len()
    }

    /// Resolve one conflict explicitly (operator or policy call).
    pub fn resolve_conflict(&self, id: &ConflictId) -> Result<Option<ResolutionPlan>, LogError> {
        let conflict = {
            let state = self.bus.state.lock();
            state.conflicts.get(id.as_str()).cloned()
        };
        let Some(conflict) = conflict else {
            return Ok(None);
        };
        if conflict.is_resolved() {
            return Ok(None);
        }
        let plan = resolve(&conflict);
        self.bus.record(
            StreamType::Fleet,
            id.as_str(),
            Event::ConflictResolved {
                id: *id,
                strategy: plan.strategy,
                details: plan.plan.clone(),
                at_epoch_ms: self.clock.epoch_ms(),
            },
        )?;
        Ok(Some(plan))
    }
}

/// Run all three detectors over a registry snapshot.
pub fn detect(specialists: &[Specialist], now_ms: u64) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    conflicts.extend(detect_resource(specialists, now_ms));
    conflicts.extend(detect_task(specialists, now_ms));
    conflicts.extend(detect_data(specialists, now_ms));
    conflicts
}

fn detect_resource(specialists: &[Specialist], now_ms: u64) -> Vec<Conflict> {
    let mut by_resource: HashMap<&str, Vec<SpecialistId>> = HashMap::new();
    for specialist in specialists {
        for resource in &specialist.resources {
            by_resource.entry(resource.as_str()).or_default().push(specialist.id);
        }
    }

    let mut conflicts = Vec::new();
    for (resource, mut holders) in by_resource {
        if holders.len() < 2 {
            continue;
        }
        holders.sort();
        let severity = resource_severity(resource, holders.len());
        conflicts.push(new_conflict(
            ConflictKind::Resource,
            holders,
            format!("resource {resource} is used by multiple specialists"),
            severity,
            now_ms,
        ));
    }
    conflicts
}

fn resource_severity(resource: &str, holders: usize) -> Severity {
    let lower = resource.to_lowercase();
    if lower.contains("critical") || lower.contains("system") {
        Severity::Critical
    } else if lower.contains("database") || lower.contains("auth") || holders > 3 {
        Severity::High
    } else {
        Severity::Medium
    }
}

fn detect_task(specialists: &[Specialist], now_ms: u64) -> Vec<Conflict> {
    let mut by_task: HashMap<&str, Vec<SpecialistId>> = HashMap::new();
    for specialist in specialists {
        if let Some(task) = specialist.current_task.as_deref() {
            by_task.entry(task).or_default().push(specialist.id);
        }
    }

    let mut conflicts = Vec::new();
    for (task, mut workers) in by_task {
        if workers.len() < 2 {
            continue;
        }
        workers.sort();
        conflicts.push(new_conflict(
            ConflictKind::Task,
            workers,
            format!("multiple specialists are working the same task: {task}"),
            Severity::High,
            now_ms,
        ));
    }
    conflicts
}

fn detect_data(specialists: &[Specialist], now_ms: u64) -> Vec<Conflict> {
    let mut by_item: HashMap<String, Vec<SpecialistId>> = HashMap::new();
    for specialist in specialists {
        for item in specialist.data_items() {
            by_item.entry(item).or_default().push(specialist.id);
        }
    }

    let mut conflicts = Vec::new();
    for (item, mut users) in by_item {
        if users.len() < 2 {
            continue;
        }
        users.sort();
        let lower = item.to_lowercase();
        let severity = if lower.contains("sensitive") || lower.contains("critical") {
            Severity::Critical
        } else if users.len() > 2 {
            Severity::High
        } else {
            Severity::Medium
        };
        conflicts.push(new_conflict(
            ConflictKind::Data,
            users,
            format!("data item {item} is touched by multiple specialists"),
            severity,
            now_ms,
        ));
    }
    conflicts
}

fn new_conflict(
    kind: ConflictKind,
    specialists: Vec<SpecialistId>,
    description: String,
    severity: Severity,
    now_ms: u64,
) -> Conflict {
    Conflict {
        id: ConflictId::new(),
        kind,
        specialists,
        description,
        severity,
        detected_at_epoch_ms: now_ms,
        resolved_at_epoch_ms: None,
        resolution: None,
        resolution_details: None,
        metadata: Metadata::new(),
    }
}

/// Pick a strategy from the priority table and produce its plan.
pub fn resolve(conflict: &Conflict) -> ResolutionPlan {
    let strategy = STRATEGY_TABLE
        .iter()
        .filter(|(kind, severity, _, _)| {
            kind.is_none_or(|k| k == conflict.kind) && *severity == conflict.severity
        })
        .max_by_key(|(_, _, _, priority)| *priority)
        .map(|(_, _, strategy, _)| *strategy)
        .unwrap_or(ResolutionStrategy::FirstComeFirstServe);

    let agents: Vec<String> = conflict.specialists.iter().map(ToString::to_string).collect();
    let first = agents.first().cloned().unwrap_or_default();
    let rest = agents.iter().skip(1).cloned().collect::<Vec<_>>().join(", ");
    let (plan, actions) = match strategy {
        ResolutionStrategy::FirstComeFirstServe => (
            format!("{first} keeps the claim; later arrivals wait"),
            vec![format!("queue {rest} behind {first}")],
        ),
        ResolutionStrategy::PriorityBased => (
            "the highest-priority specialist proceeds; the rest yield".to_string(),
            agents.iter().map(|a| format!("re-rank {a} by sortie priority")).collect(),
        ),
        ResolutionStrategy::ResourceSharing => (
            "specialists take timed turns on the contested resource".to_string(),
            vec![format!("grant rotating reservations to {}", agents.join(", "))],
        ),
        ResolutionStrategy::TaskSplitting => (
            "split the duplicated task into disjoint scopes".to_string(),
            agents.iter().map(|a| format!("assign a disjoint scope to {a}")).collect(),
        ),
        ResolutionStrategy::AgentCooperation => (
            "specialists coordinate directly via their mailboxes".to_string(),
            vec![format!("open a coordination thread between {}", agents.join(", "))],
        ),
        ResolutionStrategy::Arbitration => (
            "escalate to the coordinator for a binding decision".to_string(),
            vec![format!("suspend {} pending arbitration", agents.join(", "))],
        ),
    };

    ResolutionPlan { strategy, plan, actions }
}

#[cfg(test)]
#[path = "conflict_tests.rs"]
mod tests;
