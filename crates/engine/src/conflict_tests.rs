// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::test_bus;
use sqk_core::test_support::specialist;
use yare::parameterized;

fn with_resources(id: &str, resources: &[&str]) -> Specialist {
    let mut s = specialist(id, "backend-worker");
    s.resources = resources.iter().map(|r| r.to_string()).collect();
    s
}

fn with_task(id: &str, task: &str) -> Specialist {
    let mut s = specialist(id, "backend-worker");
    s.current_task = Some(task.to_string());
    s
}

fn with_files(id: &str, files: &[&str]) -> Specialist {
    let mut s = specialist(id, "backend-worker");
    s.metadata.insert("files".to_string(), serde_json::json!(files));
    s
}

#[test]
fn shared_resource_detected() {
    let specialists =
        vec![with_resources("spc-a", &["cache"]), with_resources("spc-b", &["cache"])];

    let conflicts = detect(&specialists, 1_000);

    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].kind, ConflictKind::Resource);
    assert_eq!(conflicts[0].severity, Severity::Medium);
    assert_eq!(conflicts[0].specialists.len(), 2);
}

#[parameterized(
    critical_name = { "critical-store", 2, Severity::Critical },
    system_name = { "system-bus", 2, Severity::Critical },
    database_name = { "database-users", 2, Severity::High },
    auth_name = { "auth-tokens", 2, Severity::High },
    crowd = { "cache", 4, Severity::High },
    plain = { "cache", 2, Severity::Medium },
)]
fn resource_severity_rules(resource: &str, agents: usize, expected: Severity) {
    let specialists: Vec<Specialist> = (0..agents)
        .map(|i| with_resources(&format!("spc-{i}"), &[resource]))
        .collect();

    let conflicts = detect(&specialists, 1_000);
    assert_eq!(conflicts[0].severity, expected);
}

#[test]
fn duplicate_task_is_high() {
    let specialists =
        vec![with_task("spc-a", "rewrite auth"), with_task("spc-b", "rewrite auth")];

    let conflicts = detect(&specialists, 1_000);

    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].kind, ConflictKind::Task);
    assert_eq!(conflicts[0].severity, Severity::High);
}

#[parameterized(
    sensitive = { &["sensitive-users.db"][..], 2, Severity::Critical },
    crowd = { &["shared.db"][..], 3, Severity::High },
    plain = { &["shared.db"][..], 2, Severity::Medium },
)]
fn data_severity_rules(files: &[&str], agents: usize, expected: Severity) {
    let specialists: Vec<Specialist> =
        (0..agents).map(|i| with_files(&format!("spc-{i}"), files)).collect();

    let conflicts = detect(&specialists, 1_000);

    assert_eq!(conflicts[0].kind, ConflictKind::Data);
    assert_eq!(conflicts[0].severity, expected);
}

#[test]
fn disjoint_specialists_do_not_conflict() {
    let specialists = vec![
        with_resources("spc-a", &["cache"]),
        with_resources("spc-b", &["queue"]),
        with_task("spc-c", "one thing"),
        with_task("spc-d", "another thing"),
    ];

    assert!(detect(&specialists, 1_000).is_empty());
}

#[parameterized(
    resource_critical = { ConflictKind::Resource, Severity::Critical, ResolutionStrategy::Arbitration },
    task_high = { ConflictKind::Task, Severity::High, ResolutionStrategy::TaskSplitting },
    resource_high = { ConflictKind::Resource, Severity::High, ResolutionStrategy::PriorityBased },
    resource_medium = { ConflictKind::Resource, Severity::Medium, ResolutionStrategy::ResourceSharing },
    task_medium = { ConflictKind::Task, Severity::Medium, ResolutionStrategy::AgentCooperation },
    anything_low = { ConflictKind::Data, Severity::Low, ResolutionStrategy::FirstComeFirstServe },
)]
fn strategy_table_selection(kind: ConflictKind, severity: Severity, expected: ResolutionStrategy) {
    let mut conflict = detect(
        &[with_resources("spc-a", &["cache"]), with_resources("spc-b", &["cache"])],
        1_000,
    )
    .remove(0);
    conflict.kind = kind;
    conflict.severity = severity;

    let plan = resolve(&conflict);
    assert_eq!(plan.strategy, expected);
    assert!(!plan.plan.is_empty());
    assert!(!plan.actions.is_empty());
}

#[test]
fn sweep_records_and_autoresolves_medium() {
    let t = test_bus();
    let resolver = ConflictResolver::new(t.bus.clone(), t.clock.clone(), Severity::Medium);

    for id in ["spc-a", "spc-b"] {
        let mut s = with_resources(id, &["cache"]);
        s.current_task = None;
        t.bus
            .record(
                StreamType::Specialist,
                id,
                Event::SpecialistRegistered { specialist: Box::new(s) },
            )
            .unwrap();
    }

    let detected = resolver.sweep().unwrap();
    assert_eq!(detected.len(), 1);

    // Medium is at the threshold: auto-resolved in the same sweep
    let state = t.bus.state.lock();
    let conflict = state.conflicts.values().next().unwrap();
    assert!(conflict.is_resolved());
    assert_eq!(conflict.resolution, Some(ResolutionStrategy::ResourceSharing));
}

#[test]
fn sweep_leaves_high_severity_for_operators() {
    let t = test_bus();
    let resolver = ConflictResolver::new(t.bus.clone(), t.clock.clone(), Severity::Medium);

    for id in ["spc-a", "spc-b"] {
        t.bus
            .record(
                StreamType::Specialist,
                id,
                Event::SpecialistRegistered {
                    specialist: Box::new(with_task(id, "rewrite auth")),
                },
            )
            .unwrap();
    }

    resolver.sweep().unwrap();

    let unresolved: Vec<ConflictId> = {
        let state = t.bus.state.lock();
        state.conflicts.values().filter(|c| !c.is_resolved()).map(|c| c.id).collect()
    };
    assert_eq!(unresolved.len(), 1);

    // Explicit resolution closes it
    let plan = resolver.resolve_conflict(&unresolved[0]).unwrap().unwrap();
    assert_eq!(plan.strategy, ResolutionStrategy::TaskSplitting);
    assert!(resolver.resolve_conflict(&unresolved[0]).unwrap().is_none());
}

#[test]
fn sweep_skips_duplicate_unresolved_conflicts() {
    let t = test_bus();
    let resolver = ConflictResolver::new(t.bus.clone(), t.clock.clone(), Severity::Low);

    for id in ["spc-a", "spc-b"] {
        t.bus
            .record(
                StreamType::Specialist,
                id,
                Event::SpecialistRegistered {
                    specialist: Box::new(with_task(id, "rewrite auth")),
                },
            )
            .unwrap();
    }

    assert_eq!(resolver.sweep().unwrap().len(), 1);
    assert_eq!(resolver.sweep().unwrap().len(), 0);
}
