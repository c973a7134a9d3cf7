// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::locks::LockManager;
use crate::test_helpers::{test_bus, TestBus};
use sqk_core::test_support;
use sqk_core::{Checkpoint, FakeClock, LockPurpose};

fn manager() -> (TestBus, RecoveryManager<FakeClock>, Arc<LockManager<FakeClock>>) {
    let t = test_bus();
    let locks = Arc::new(LockManager::new(t.bus.clone(), t.clock.clone()));
    let manager = RecoveryManager::new(
        t.bus.clone(),
        Arc::clone(&locks),
        t.clock.clone(),
        t.dir.path().join("recovery.log"),
    );
    (t, manager, locks)
}

/// Two in-progress sorties (frontend and backend) and one active lock on
/// `src/x.ts` held by the frontend specialist.
fn checkpoint_fixture(now_ms: u64) -> Checkpoint {
    let sorties = vec![
        test_support::sortie("srt-1", "ui work")
            .mission("msn-a")
            .files(&["src/x.ts"])
            .status(SortieStatus::InProgress)
            .assigned_to("spc-frontend-x")
            .progress(40)
            .build(),
        test_support::sortie("srt-2", "api work")
            .mission("msn-a")
            .files(&["src/api.ts"])
            .status(SortieStatus::InProgress)
            .assigned_to("spc-backend-y")
            .progress(10)
            .build(),
    ];
    let locks = vec![test_support::active_lock(
        "lock-1",
        "src/x.ts",
        "spc-frontend-x",
        now_ms + 60_000,
    )];
    test_support::checkpoint("chk-1", "msn-a", now_ms, sorties, locks, Vec::new())
}

#[test]
fn plan_restores_agents_tasks_and_locks() {
    let (t, manager, _locks) = manager();
    // Specialist names drive the agent-type derivation
    for (id, name) in [("spc-frontend-x", "frontend-x"), ("spc-backend-y", "backend-y")] {
        let mut s = test_support::specialist(id, name);
        s.status = sqk_core::SpecialistStatus::Inactive;
        t.bus
            .record(
                StreamType::Specialist,
                id,
                Event::SpecialistRegistered { specialist: Box::new(s) },
            )
            .unwrap();
    }
    let checkpoint = checkpoint_fixture(t.clock.epoch_ms());

    let plan = manager.create_plan(&checkpoint, false);

    assert_eq!(plan.agents_to_restore.len(), 2);
    let mut types: Vec<AgentType> =
        plan.agents_to_restore.iter().map(|a| a.agent_type).collect();
    types.sort_by_key(|t| format!("{t}"));
    assert_eq!(types, vec![AgentType::Backend, AgentType::Frontend]);

    assert_eq!(plan.tasks_to_resume.len(), 2);
    assert_eq!(plan.locks_to_restore.len(), 1);
    assert_eq!(plan.locks_to_restore[0].file, "src/x.ts");
    assert!(plan.locks_to_restore[0].conflict_check);

    assert!(plan.risks.iter().any(|r| r == "Active locks may conflict with current state"));
}

#[test]
fn stale_checkpoint_and_crowds_raise_risks() {
    let (t, manager, _locks) = manager();
    t.clock.set_epoch_ms(48 * 60 * 60 * 1000);
    let checkpoint = checkpoint_fixture(1_000); // nearly two days old

    let plan = manager.create_plan(&checkpoint, false);
    assert!(plan.risks.iter().any(|r| r.contains("older than 24 hours")));
}

#[test]
fn force_suppresses_active_agent_risk() {
    let (t, manager, _locks) = manager();
    t.bus
        .record(
            StreamType::Specialist,
            "spc-live",
            Event::SpecialistRegistered {
                specialist: Box::new(test_support::specialist("spc-live", "backend-live")),
            },
        )
        .unwrap();
    let checkpoint = checkpoint_fixture(t.clock.epoch_ms());

    let without_force = manager.create_plan(&checkpoint, false);
    assert!(without_force.risks.iter().any(|r| r.contains("already active")));

    let with_force = manager.create_plan(&checkpoint, true);
    assert!(!with_force.risks.iter().any(|r| r.contains("already active")));
}

#[test]
fn dry_run_plans_are_identical_and_side_effect_free() {
    let (t, manager, _locks) = manager();
    let checkpoint = checkpoint_fixture(t.clock.epoch_ms());

    let first = manager.create_plan(&checkpoint, false);
    let second = manager.create_plan(&checkpoint, false);
    assert_eq!(first, second);

    let events_before = t.bus.store.len();
    let report = manager.execute(&checkpoint, &first, true).unwrap();
    assert!(report.success);
    assert_eq!(report.restored, 0);
    assert_eq!(t.bus.store.len(), events_before);
}

#[test]
fn replan_after_execution_is_strict_subset() {
    let (t, manager, _locks) = manager();
    let checkpoint = checkpoint_fixture(t.clock.epoch_ms());

    let initial = manager.create_plan(&checkpoint, true);
    assert!(!initial.locks_to_restore.is_empty());
    manager.execute(&checkpoint, &initial, false).unwrap();

    let replanned = manager.create_plan(&checkpoint, true);

    // Locks already held are not re-planned; restored work shrank the plan
    assert!(replanned.locks_to_restore.is_empty());
    assert!(replanned.agents_to_restore.len() <= initial.agents_to_restore.len());
    assert!(replanned.tasks_to_resume.len() <= initial.tasks_to_resume.len());
    assert!(replanned.tasks_to_resume.is_empty());
}

#[test]
fn execute_restores_in_three_phases() {
    let (t, manager, locks) = manager();
    let checkpoint = checkpoint_fixture(t.clock.epoch_ms());
    // Seed the sorties so task resumption has rows to act on
    for sortie in &checkpoint.sorties {
        let mut pending = sortie.clone();
        pending.status = SortieStatus::Pending;
        pending.progress = 0;
        pending.assigned_to = None;
        t.bus
            .record(
                StreamType::Sortie,
                sortie.id.as_str(),
                Event::SortieCreated { sortie: Box::new(pending) },
            )
            .unwrap();
    }

    let plan = manager.create_plan(&checkpoint, true);
    let report = manager.execute(&checkpoint, &plan, false).unwrap();

    assert!(report.success);
    assert!(!report.partial);
    assert_eq!(report.errors.len(), 0);
    assert_eq!(report.restored, plan.attempted_items());

    let state = t.bus.state.lock();
    assert_eq!(state.live_specialists().len(), 2);
    assert_eq!(state.get_sortie("srt-1").unwrap().status, SortieStatus::InProgress);
    assert_eq!(state.get_sortie("srt-1").unwrap().progress, 40);
    drop(state);
    assert!(locks.get_by_file("src/x.ts").is_some());

    // The checkpoint is consumed by a real run
    let consumed = t.bus.store.query_by_type("checkpoint:consumed");
    assert_eq!(consumed.len(), 1);
}

#[test]
fn conflicting_lock_counts_against_error_budget() {
    let (t, manager, locks) = manager();
    let checkpoint = checkpoint_fixture(t.clock.epoch_ms());
    locks
        .acquire(
            "src/x.ts",
            sqk_core::SpecialistId::from_string("spc-squatter"),
            600_000,
            LockPurpose::Edit,
            None,
        )
        .unwrap();

    let plan = manager.create_plan(&checkpoint, true);
    let report = manager.execute(&checkpoint, &plan, false).unwrap();

    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("spc-squatter"));
    // 1 error out of 5 items blows the 10% budget
    assert!(!report.success);
}

#[test]
fn recovery_attempts_append_to_log_file() {
    let (t, manager, _locks) = manager();
    let checkpoint = checkpoint_fixture(t.clock.epoch_ms());
    let plan = manager.create_plan(&checkpoint, false);

    manager.execute(&checkpoint, &plan, true).unwrap();
    manager.execute(&checkpoint, &plan, false).unwrap();

    let log = std::fs::read_to_string(t.dir.path().join("recovery.log")).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("\"dry_run\":true"));
    assert!(lines[1].contains("\"dry_run\":false"));
}
