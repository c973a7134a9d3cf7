// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{test_bus, TestBus};
use parking_lot::Mutex as PlMutex;
use sqk_core::test_support;
use sqk_core::{FakeClock, Parallelization, SortieStatus};

/// Launcher that records launch order and immediately completes each
/// sortie through the bus, standing in for a cooperative specialist.
struct CompletingLauncher {
    bus: FleetBus<FakeClock>,
    clock: FakeClock,
    launched: PlMutex<Vec<String>>,
    /// Sortie ids that should fail to spawn.
    fail: Vec<String>,
}

#[async_trait]
impl SpecialistLauncher for CompletingLauncher {
    async fn launch(&self, sortie: &Sortie, _specialist: &Specialist) -> Result<(), LaunchError> {
        self.launched.lock().push(sortie.id.to_string());
        if self.fail.contains(&sortie.id.to_string()) {
            return Err(LaunchError("simulated spawn failure".to_string()));
        }
        self.bus
            .record(
                StreamType::Sortie,
                sortie.id.as_str(),
                Event::SortieCompleted {
                    id: sortie.id,
                    result: None,
                    at_epoch_ms: self.clock.epoch_ms(),
                },
            )
            .map_err(|e| LaunchError(e.to_string()))?;
        Ok(())
    }
}

struct Fixture {
    t: TestBus,
    scheduler: Scheduler<CompletingLauncher, FakeClock>,
    launcher: Arc<CompletingLauncher>,
}

fn fixture(fail: Vec<&str>) -> Fixture {
    let t = test_bus();
    let locks = Arc::new(crate::locks::LockManager::new(t.bus.clone(), t.clock.clone()));
    let launcher = Arc::new(CompletingLauncher {
        bus: t.bus.clone(),
        clock: t.clock.clone(),
        launched: PlMutex::new(Vec::new()),
        fail: fail.into_iter().map(str::to_string).collect(),
    });
    let scheduler = Scheduler::new(
        t.bus.clone(),
        locks,
        Arc::clone(&launcher),
        t.clock.clone(),
        60_000,
    );
    Fixture { t, scheduler, launcher }
}

fn tree(sorties: Vec<Sortie>) -> sqk_core::SortieTree {
    let mut mission = test_support::mission("msn-a", "Refit");
    mission.total_sorties = sorties.len() as u32;
    sqk_core::SortieTree {
        mission,
        sorties,
        dependencies: Vec::new(),
        parallelization: Parallelization {
            parallel_groups: Vec::new(),
            critical_path: Vec::new(),
            estimated_duration_ms: 0,
            parallelization_potential: 0.0,
            estimated_speedup: 1.0,
            recommendations: Vec::new(),
            bottlenecks: Vec::new(),
        },
    }
}

fn seed(t: &TestBus, tree: &sqk_core::SortieTree) {
    t.bus
        .record(
            StreamType::Mission,
            tree.mission.id.as_str(),
            Event::MissionCreated { mission: Box::new(tree.mission.clone()) },
        )
        .unwrap();
    for sortie in &tree.sorties {
        t.bus
            .record(
                StreamType::Sortie,
                sortie.id.as_str(),
                Event::SortieCreated { sortie: Box::new(sortie.clone()) },
            )
            .unwrap();
    }
}

#[tokio::test]
async fn parallel_then_sequential_respects_dependencies() {
    let fx = fixture(vec![]);
    let tree = tree(vec![
        test_support::sortie("srt-p1", "P1").mission("msn-a").files(&["/w/p1.rs"]).build(),
        test_support::sortie("srt-p2", "P2").mission("msn-a").files(&["/w/p2.rs"]).build(),
        test_support::sortie("srt-s1", "S1")
            .mission("msn-a")
            .files(&["/w/s1.rs"])
            .depends_on(&["srt-p1"])
            .build(),
    ]);
    seed(&fx.t, &tree);

    let report = fx.scheduler.dispatch(&tree).await.unwrap();

    assert_eq!(report.launched.len(), 3);
    assert!(report.failed.is_empty());
    assert!(report.skipped.is_empty());

    // S1 launched only after both parallel launches
    let launched = fx.launcher.launched.lock();
    assert_eq!(launched.len(), 3);
    assert_eq!(launched[2], "srt-s1");

    // Assignment events: two for the parallel phase before the dependent one
    let assigned = fx.t.bus.store.query_by_type("sortie:assigned");
    assert_eq!(assigned.len(), 3);
    assert_eq!(assigned[2].stream_id, "srt-s1");

    // Mission moved along with its sorties
    let state = fx.t.bus.state.lock();
    assert_eq!(state.get_mission("msn-a").unwrap().completed_sorties, 3);
}

#[tokio::test]
async fn dependent_sortie_skipped_when_dependency_failed() {
    let fx = fixture(vec!["srt-p1"]);
    let tree = tree(vec![
        test_support::sortie("srt-p1", "P1").mission("msn-a").files(&["/w/p1.rs"]).build(),
        test_support::sortie("srt-s1", "S1")
            .mission("msn-a")
            .files(&["/w/s1.rs"])
            .depends_on(&["srt-p1"])
            .build(),
    ]);
    seed(&fx.t, &tree);

    let report = fx.scheduler.dispatch(&tree).await.unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].1.contains("srt-p1"));

    let state = fx.t.bus.state.lock();
    assert_eq!(state.get_sortie("srt-p1").unwrap().status, SortieStatus::Failed);
    assert_eq!(state.get_sortie("srt-s1").unwrap().status, SortieStatus::Blocked);
}

#[tokio::test]
async fn spawn_failure_does_not_cancel_siblings() {
    let fx = fixture(vec!["srt-p2"]);
    let tree = tree(vec![
        test_support::sortie("srt-p1", "P1").mission("msn-a").files(&["/w/p1.rs"]).build(),
        test_support::sortie("srt-p2", "P2").mission("msn-a").files(&["/w/p2.rs"]).build(),
        test_support::sortie("srt-p3", "P3").mission("msn-a").files(&["/w/p3.rs"]).build(),
    ]);
    seed(&fx.t, &tree);

    let report = fx.scheduler.dispatch(&tree).await.unwrap();

    assert_eq!(report.launched.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "srt-p2");
}

#[tokio::test]
async fn failed_spawn_releases_its_reservations() {
    let fx = fixture(vec!["srt-p1"]);
    let tree = tree(vec![test_support::sortie("srt-p1", "P1")
        .mission("msn-a")
        .files(&["/w/p1.rs"])
        .build()]);
    seed(&fx.t, &tree);

    fx.scheduler.dispatch(&tree).await.unwrap();

    let state = fx.t.bus.state.lock();
    assert!(state.active_locks(fx.t.clock.epoch_ms()).is_empty());
}

#[tokio::test]
async fn launch_reserves_files_and_creates_mailbox() {
    let fx = fixture(vec![]);
    let tree = tree(vec![test_support::sortie("srt-p1", "P1")
        .mission("msn-a")
        .files(&["/w/p1.rs"])
        .build()]);
    seed(&fx.t, &tree);

    fx.scheduler.dispatch(&tree).await.unwrap();

    assert_eq!(fx.t.bus.store.query_by_type("lock:acquired").len(), 1);
    assert_eq!(fx.t.bus.store.query_by_type("mailbox:created").len(), 1);
    assert_eq!(fx.t.bus.store.query_by_type("specialist:registered").len(), 1);
}

/// Launcher that only records the hand-off, like a real process spawn:
/// the sortie's work finishes long after `launch` returns.
struct RecordingLauncher {
    launched: PlMutex<Vec<String>>,
}

#[async_trait]
impl SpecialistLauncher for RecordingLauncher {
    async fn launch(&self, sortie: &Sortie, _specialist: &Specialist) -> Result<(), LaunchError> {
        self.launched.lock().push(sortie.id.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn blocked_sortie_relaunches_once_dependency_completes() {
    let t = test_bus();
    let locks = Arc::new(crate::locks::LockManager::new(t.bus.clone(), t.clock.clone()));
    let launcher = Arc::new(RecordingLauncher { launched: PlMutex::new(Vec::new()) });
    let scheduler = Scheduler::new(
        t.bus.clone(),
        locks,
        Arc::clone(&launcher),
        t.clock.clone(),
        60_000,
    );

    let tree = tree(vec![
        test_support::sortie("srt-p1", "P1").mission("msn-a").files(&["/w/p1.rs"]).build(),
        test_support::sortie("srt-s1", "S1")
            .mission("msn-a")
            .files(&["/w/s1.rs"])
            .depends_on(&["srt-p1"])
            .build(),
    ]);
    seed(&t, &tree);

    // The hand-off returns before P1's real work finishes, so the
    // sequential phase parks S1 as blocked
    let report = scheduler.dispatch(&tree).await.unwrap();
    assert_eq!(report.launched, vec![sqk_core::SortieId::from_string("srt-p1")]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(
        t.bus.state.lock().get_sortie("srt-s1").unwrap().status,
        SortieStatus::Blocked
    );

    // A retry while the dependency is still in flight launches nothing
    let mission_id = tree.mission.id;
    let early = scheduler.retry_blocked(&mission_id).await.unwrap();
    assert!(early.launched.is_empty());

    // P1's specialist reports completion later
    t.bus
        .record(
            StreamType::Sortie,
            "srt-p1",
            Event::SortieCompleted {
                id: sqk_core::SortieId::from_string("srt-p1"),
                result: None,
                at_epoch_ms: t.clock.epoch_ms(),
            },
        )
        .unwrap();

    let retried = scheduler.retry_blocked(&mission_id).await.unwrap();
    assert_eq!(retried.launched, vec![sqk_core::SortieId::from_string("srt-s1")]);

    let state = t.bus.state.lock();
    let unblocked = state.get_sortie("srt-s1").unwrap();
    assert_eq!(unblocked.status, SortieStatus::Assigned);
    assert!(unblocked.blocked_reason.is_none());
    drop(state);
    assert_eq!(launcher.launched.lock().as_slice(), ["srt-p1", "srt-s1"]);

    // Nothing left to re-dispatch
    assert!(scheduler.retry_blocked(&mission_id).await.unwrap().launched.is_empty());
}

#[tokio::test]
async fn held_file_fails_the_launch() {
    let fx = fixture(vec![]);
    let locks = crate::locks::LockManager::new(fx.t.bus.clone(), fx.t.clock.clone());
    locks
        .acquire("/w/p1.rs", sqk_core::SpecialistId::from_string("spc-other"), 60_000, LockPurpose::Edit, None)
        .unwrap();

    let tree = tree(vec![test_support::sortie("srt-p1", "P1")
        .mission("msn-a")
        .files(&["/w/p1.rs"])
        .build()]);
    seed(&fx.t, &tree);

    let report = fx.scheduler.dispatch(&tree).await.unwrap();

    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].1.contains("spc-other"));
    assert!(fx.launcher.launched.lock().is_empty());
}
