// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn mission() -> Mission {
    Mission::new(
        MissionId::from_string("msn-test"),
        "Test mission",
        "A mission for transition tests",
        Strategy::FeatureBased,
        Priority::Medium,
        1_000,
    )
}

#[parameterized(
    pending_to_in_progress = { MissionStatus::Pending, MissionStatus::InProgress, true },
    pending_to_review = { MissionStatus::Pending, MissionStatus::Review, true },
    in_progress_to_completed = { MissionStatus::InProgress, MissionStatus::Completed, true },
    review_to_in_progress = { MissionStatus::Review, MissionStatus::InProgress, false },
    completed_to_cancelled = { MissionStatus::Completed, MissionStatus::Cancelled, false },
    in_progress_to_cancelled = { MissionStatus::InProgress, MissionStatus::Cancelled, true },
    cancelled_to_in_progress = { MissionStatus::Cancelled, MissionStatus::InProgress, false },
)]
fn transition_rules(from: MissionStatus, to: MissionStatus, allowed: bool) {
    let mut m = mission();
    m.status = from;
    assert_eq!(m.can_transition(to), allowed);
}

#[test]
fn transition_stamps_timestamps() {
    let mut m = mission();
    m.transition(MissionStatus::InProgress, 2_000).unwrap();
    assert_eq!(m.started_at_epoch_ms, Some(2_000));

    m.transition(MissionStatus::Completed, 3_000).unwrap();
    assert_eq!(m.completed_at_epoch_ms, Some(3_000));
}

#[test]
fn rejected_transition_reports_states() {
    let mut m = mission();
    m.status = MissionStatus::Completed;
    let err = m.transition(MissionStatus::InProgress, 2_000).unwrap_err();
    assert_eq!(err, TransitionError { from: MissionStatus::Completed, to: MissionStatus::InProgress });
}

#[test]
fn completed_counter_never_exceeds_total() {
    let mut m = mission();
    m.total_sorties = 2;
    m.record_sortie_completed();
    m.record_sortie_completed();
    m.record_sortie_completed();
    assert_eq!(m.completed_sorties, 2);
}

#[parameterized(
    empty = { 0, 0, 0 },
    half = { 4, 2, 50 },
    third = { 3, 1, 33 },
    done = { 5, 5, 100 },
)]
fn progress_percent(total: u32, completed: u32, expected: u8) {
    let mut m = mission();
    m.total_sorties = total;
    m.completed_sorties = completed;
    assert_eq!(m.progress_percent(), expected);
}

#[test]
fn strategy_serializes_kebab_case() {
    assert_eq!(serde_json::to_string(&Strategy::FileBased).unwrap(), "\"file-based\"");
    assert_eq!(serde_json::to_string(&Strategy::ResearchBased).unwrap(), "\"research-based\"");
}

#[test]
fn priority_orders_by_urgency() {
    assert!(Priority::Critical > Priority::High);
    assert!(Priority::High > Priority::Medium);
    assert!(Priority::Medium > Priority::Low);
}
