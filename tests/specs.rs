// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level behavior specs: the documented end-to-end scenarios,
//! driven through the public crate APIs with fake external capabilities.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use async_trait::async_trait;
use parking_lot::Mutex;
use sqk_core::test_support;
use sqk_core::{
    Clock, FakeClock, LockPurpose, Priority, Sortie, SortieStatus, Specialist, SpecialistId,
};
use sqk_daemon::{startup, Coordinator, CoordinatorConfig};
use sqk_engine::{FleetBus, LaunchError, LockManager, RecoveryManager, SpecialistLauncher};
use sqk_planner::{select_strategy, validate, CannedPlanner, FileWalker};
use sqk_storage::{EventStore, FleetState};
use sqk_wire::{Request, Response, Status};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

struct EmptyWalker;

impl FileWalker for EmptyWalker {
    fn list_files(&self, _root: &Path) -> io::Result<Vec<PathBuf>> {
        Ok(Vec::new())
    }
}

fn plan_json() -> String {
    serde_json::json!({
        "mission": {
            "title": "Refit error handling",
            "description": "Move every handler onto the shared error helper",
            "estimated_effort_hours": 6.0
        },
        "sorties": [
            {
                "title": "Convert user handlers",
                "description": "Adopt the helper in user routes",
                "scope": {"files": ["/w/users.rs"]},
                "complexity": "low",
                "estimated_effort_hours": 2.0,
                "dependencies": []
            },
            {
                "title": "Convert billing handlers",
                "description": "Adopt the helper in billing routes",
                "scope": {"files": ["/w/billing.rs"]},
                "complexity": "medium",
                "estimated_effort_hours": 3.0,
                "dependencies": []
            },
            {
                "title": "Remove the legacy helper",
                "description": "Delete old error plumbing",
                "scope": {"files": ["/w/errors.rs"]},
                "complexity": "low",
                "estimated_effort_hours": 1.0,
                "dependencies": [0, 1]
            }
        ]
    })
    .to_string()
}

/// S1: a refactor task selects the file-based strategy with confidence.
#[test]
fn s1_strategy_selection() {
    let choice = select_strategy("refactor all API handlers to use the new error helper");

    assert_eq!(choice.strategy, sqk_core::Strategy::FileBased);
    assert!(choice.matched_keywords.contains(&"refactor".to_string()));
    assert!(choice.confidence >= 0.3);
}

/// S2: two sorties sharing a file without an ordering produce exactly one
/// file-overlap error.
#[test]
fn s2_file_overlap() {
    let sorties = vec![
        test_support::sortie("srt-a", "A").files(&["a.ts"]).build(),
        test_support::sortie("srt-b", "B").files(&["a.ts"]).build(),
    ];

    let report = validate::validate_tree(&sorties);

    assert!(!report.valid);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].kind, validate::ValidationErrorKind::FileOverlap);
    assert_eq!(report.errors[0].files, vec!["a.ts".to_string()]);
}

/// S3: a three-sortie cycle is reported with the closed path.
#[test]
fn s3_cycle_detection() {
    let sorties = vec![
        test_support::sortie("srt-x", "X").files(&["x.rs"]).depends_on(&["srt-y"]).build(),
        test_support::sortie("srt-y", "Y").files(&["y.rs"]).depends_on(&["srt-z"]).build(),
        test_support::sortie("srt-z", "Z").files(&["z.rs"]).depends_on(&["srt-x"]).build(),
    ];

    let report = validate::validate_tree(&sorties);

    let cycles: Vec<_> = report
        .errors
        .iter()
        .filter(|e| e.kind == validate::ValidationErrorKind::CircularDependency)
        .collect();
    assert_eq!(cycles.len(), 1);
    let path: Vec<&str> = cycles[0].sorties.iter().map(|id| id.as_str()).collect();
    assert_eq!(path, vec!["srt-x", "srt-y", "srt-z", "srt-x"]);
}

/// S4 + end-to-end: the parallel phase launches the independent sorties,
/// the dependent one parks as blocked, and it launches only after every
/// dependency's specialist has reported completion.
#[tokio::test]
async fn s4_coordinated_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let daemon = startup(
        CoordinatorConfig { datadir: dir.path().to_path_buf(), ..CoordinatorConfig::default() },
        CannedPlanner::new(plan_json()),
        EmptyWalker,
        NoopLauncher,
        clock.clone(),
    )
    .unwrap();
    let coordinator: &Coordinator<_, _, _, _> = &daemon.coordinator;

    let response = coordinator
        .handle(Request::CreateMission {
            task_description: "refactor all API handlers".to_string(),
            strategy: None,
            priority: Priority::Medium,
        })
        .await;

    let (mission, dispatch) = match response {
        Response::MissionStarted { mission, dispatch } => (mission, dispatch),
        other => panic!("unexpected response: {other:?}"),
    };
    // The launch hand-off returns before any real work finishes, so only
    // the two independent sorties launch; the dependent one is parked
    assert_eq!(dispatch.launched.len(), 2);
    assert!(dispatch.failed.is_empty());
    assert_eq!(dispatch.skipped.len(), 1);

    let (dependent_id, workers) = {
        let state = coordinator.bus.state.lock();
        let dependent = state
            .sorties
            .values()
            .find(|s| !s.dependencies.is_empty())
            .unwrap();
        assert_eq!(dependent.status, SortieStatus::Blocked);
        let workers: Vec<(SpecialistId, String)> = state
            .sorties
            .values()
            .filter(|s| s.status == SortieStatus::Assigned)
            .map(|s| (s.assigned_to.unwrap(), s.id.to_string()))
            .collect();
        (dependent.id, workers)
    };
    assert_eq!(workers.len(), 2);

    // First specialist finishes; one dependency is still outstanding
    let complete = |id: SpecialistId| Request::SpecialistProgress {
        id,
        status: None,
        progress: Some(100),
        message: None,
    };
    coordinator.handle(complete(workers[0].0)).await;
    assert_eq!(
        coordinator.bus.state.lock().get_sortie(dependent_id.as_str()).unwrap().status,
        SortieStatus::Blocked
    );

    // Second specialist finishes; the dependent sortie launches now
    coordinator.handle(complete(workers[1].0)).await;
    let assigned = coordinator.bus.store.query_by_type("sortie:assigned");
    assert_eq!(assigned.len(), 3);
    assert_eq!(assigned[2].stream_id, dependent_id.as_str());

    // Its own specialist reports completion and the mission closes out
    let last_worker = coordinator
        .bus
        .state
        .lock()
        .get_sortie(dependent_id.as_str())
        .unwrap()
        .assigned_to
        .unwrap();
    coordinator.handle(complete(last_worker)).await;

    let state = coordinator.bus.state.lock();
    let mission = state.get_mission(mission.id.as_str()).unwrap();
    assert_eq!(mission.completed_sorties, 3);
    assert_eq!(mission.status, sqk_core::MissionStatus::Completed);
    drop(state);
    daemon.shutdown().await;
}

/// S5: lock timeout semantics across three instants.
#[test]
fn s5_lock_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let store =
        Arc::new(EventStore::open(dir.path().join("events.log"), clock.clone()).unwrap());
    let bus = FleetBus::new(store, Arc::new(Mutex::new(FleetState::default())));
    let locks = LockManager::new(bus, clock.clone());

    let a = SpecialistId::from_string("spc-a");
    let b = SpecialistId::from_string("spc-b");

    // t=0: A wins
    let first = locks.acquire("/w/f", a, 100, LockPurpose::Edit, None).unwrap();
    assert!(!first.conflict);

    // t=50ms: B conflicts and sees A as the holder
    clock.advance(Duration::from_millis(50));
    let second = locks.acquire("/w/f", b, 100, LockPurpose::Edit, None).unwrap();
    assert!(second.conflict);
    assert_eq!(second.existing_lock.unwrap().reserved_by, a);

    // t=200ms: the reservation lapsed; B succeeds
    clock.advance(Duration::from_millis(150));
    let third = locks.acquire("/w/f", b, 100, LockPurpose::Edit, None).unwrap();
    assert!(!third.conflict);
}

/// S6: a checkpoint with two in-progress sorties and one active lock plans
/// two typed agent restores, two task resumes, one lock restore, and the
/// lock-conflict risk.
#[test]
fn s6_recovery_plan() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let store =
        Arc::new(EventStore::open(dir.path().join("events.log"), clock.clone()).unwrap());
    let bus = FleetBus::new(store, Arc::new(Mutex::new(FleetState::default())));
    let locks = Arc::new(LockManager::new(bus.clone(), clock.clone()));
    let manager = RecoveryManager::new(
        bus,
        locks,
        clock.clone(),
        dir.path().join("recovery.log"),
    );

    let sorties = vec![
        test_support::sortie("srt-ui", "frontend-x work")
            .mission("msn-a")
            .files(&["src/x.ts"])
            .status(SortieStatus::InProgress)
            .assigned_to("spc-frontend-x")
            .build(),
        test_support::sortie("srt-api", "backend-y work")
            .mission("msn-a")
            .files(&["src/api.ts"])
            .status(SortieStatus::InProgress)
            .assigned_to("spc-backend-y")
            .build(),
    ];
    let active_locks = vec![test_support::active_lock(
        "lock-1",
        "src/x.ts",
        "spc-frontend-x",
        clock.epoch_ms() + 60_000,
    )];
    let checkpoint = test_support::checkpoint(
        "chk-1",
        "msn-a",
        clock.epoch_ms(),
        sorties,
        active_locks,
        Vec::new(),
    );

    let plan = manager.create_plan(&checkpoint, false);

    assert_eq!(plan.agents_to_restore.len(), 2);
    let mut types: Vec<String> =
        plan.agents_to_restore.iter().map(|a| a.agent_type.to_string()).collect();
    types.sort();
    assert_eq!(types, vec!["backend".to_string(), "frontend".to_string()]);
    assert_eq!(plan.tasks_to_resume.len(), 2);
    assert_eq!(plan.locks_to_restore.len(), 1);
    assert!(plan.risks.iter().any(|r| r == "Active locks may conflict with current state"));
}

/// Full circle: dispatch, checkpoint, dry-plan twice, recover for real,
/// and verify the second plan shrank to what was left.
#[tokio::test]
async fn checkpoint_recovery_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let daemon = startup(
        CoordinatorConfig { datadir: dir.path().to_path_buf(), ..CoordinatorConfig::default() },
        CannedPlanner::new(plan_json()),
        EmptyWalker,
        NoopLauncher,
        clock.clone(),
    )
    .unwrap();
    let coordinator = &daemon.coordinator;

    let mission_id = match coordinator
        .handle(Request::CreateMission {
            task_description: "refactor the handlers".to_string(),
            strategy: None,
            priority: Priority::Medium,
        })
        .await
    {
        Response::MissionStarted { mission, .. } => mission.id,
        other => panic!("unexpected response: {other:?}"),
    };

    let checkpoint = match coordinator
        .handle(Request::CreateCheckpoint {
            mission_id,
            trigger: sqk_core::CheckpointTrigger::Progress,
            trigger_details: Some("mid-flight".to_string()),
        })
        .await
    {
        Response::CheckpointCreated { checkpoint } => checkpoint,
        other => panic!("unexpected response: {other:?}"),
    };

    // Property 5: the latest checkpoint is this one until something newer
    match coordinator.handle(Request::LatestCheckpoint { mission_id }).await {
        Response::Checkpoint { checkpoint: Some(latest) } => {
            assert_eq!(latest.id, checkpoint.id)
        }
        other => panic!("unexpected response: {other:?}"),
    }

    // Property 6: two dry runs agree
    let first = dry_run_resume(coordinator, checkpoint.id).await;
    let second = dry_run_resume(coordinator, checkpoint.id).await;
    assert_eq!(first.attempted, second.attempted);

    // Real run, then a dry run again: already-restored work is not re-planned
    let real = match coordinator
        .handle(Request::Resume { id: checkpoint.id, force: true, dry_run: false })
        .await
    {
        Response::Recovery { outcome } => outcome,
        other => panic!("unexpected response: {other:?}"),
    };
    assert!(!real.dry_run);

    let after = dry_run_resume(coordinator, checkpoint.id).await;
    assert!(after.attempted <= first.attempted);

    daemon.shutdown().await;
}

async fn dry_run_resume(
    coordinator: &Coordinator<CannedPlanner, EmptyWalker, NoopLauncher, FakeClock>,
    id: sqk_core::CheckpointId,
) -> sqk_wire::RecoveryOutcome {
    match coordinator.handle(Request::Resume { id, force: true, dry_run: true }).await {
        Response::Recovery { outcome } => outcome,
        other => panic!("unexpected response: {other:?}"),
    }
}

/// Missing entities surface as 404s with a single error string.
#[tokio::test]
async fn error_envelope_shape() {
    let dir = tempfile::tempdir().unwrap();
    let daemon = startup(
        CoordinatorConfig { datadir: dir.path().to_path_buf(), ..CoordinatorConfig::default() },
        CannedPlanner::new(plan_json()),
        EmptyWalker,
        NoopLauncher,
        FakeClock::new(),
    )
    .unwrap();

    let response = daemon
        .coordinator
        .handle(Request::GetMission { id: sqk_core::MissionId::from_string("msn-ghost") })
        .await;

    assert_eq!(response.status(), Status::NotFound);
    let json = serde_json::to_value(&response).unwrap();
    assert!(json["body"]["error"].is_string());
    daemon.shutdown().await;
}

/// Launcher that accepts spawns without completing anything.
struct NoopLauncher;

#[async_trait]
impl SpecialistLauncher for NoopLauncher {
    async fn launch(&self, _sortie: &Sortie, _specialist: &Specialist) -> Result<(), LaunchError> {
        Ok(())
    }
}

