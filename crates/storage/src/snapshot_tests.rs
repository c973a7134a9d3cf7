// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sqk_core::test_support;
use tempfile::tempdir;

fn checkpoint(id: &str, mission: &str, ts: u64) -> Checkpoint {
    test_support::checkpoint(id, mission, ts, Vec::new(), Vec::new(), Vec::new())
}

#[test]
fn write_then_read_round_trips() {
    let dir = tempdir().unwrap();
    let files = CheckpointFiles::new(dir.path().join("checkpoints"));

    let original = checkpoint("chk-1", "msn-a", 5_000);
    files.write(&original).unwrap();

    let loaded = files.read(&original.id).unwrap().unwrap();
    assert_eq!(loaded, original);
}

#[test]
fn read_missing_returns_none() {
    let dir = tempdir().unwrap();
    let files = CheckpointFiles::new(dir.path().join("checkpoints"));
    assert!(files.read(&CheckpointId::from_string("chk-none")).unwrap().is_none());
}

#[test]
fn latest_pointer_follows_writes() {
    let dir = tempdir().unwrap();
    let files = CheckpointFiles::new(dir.path().join("checkpoints"));

    files.write(&checkpoint("chk-1", "msn-a", 5_000)).unwrap();
    files.write(&checkpoint("chk-2", "msn-a", 9_000)).unwrap();

    let latest = files.latest().unwrap().unwrap();
    assert_eq!(latest.id, "chk-2");
}

#[test]
fn latest_for_scans_by_mission_and_timestamp() {
    let dir = tempdir().unwrap();
    let files = CheckpointFiles::new(dir.path().join("checkpoints"));

    files.write(&checkpoint("chk-1", "msn-a", 5_000)).unwrap();
    files.write(&checkpoint("chk-2", "msn-b", 9_000)).unwrap();
    files.write(&checkpoint("chk-3", "msn-a", 7_000)).unwrap();

    let latest = files.latest_for("msn-a").unwrap().unwrap();
    assert_eq!(latest.id, "chk-3");
    assert!(files.latest_for("msn-missing").unwrap().is_none());
}

#[test]
fn delete_repoints_latest_at_newest_remaining() {
    let dir = tempdir().unwrap();
    let files = CheckpointFiles::new(dir.path().join("checkpoints"));

    files.write(&checkpoint("chk-1", "msn-a", 5_000)).unwrap();
    let newest = checkpoint("chk-2", "msn-a", 9_000);
    files.write(&newest).unwrap();

    assert!(files.delete(&newest.id).unwrap());
    assert_eq!(files.latest().unwrap().unwrap().id, "chk-1");

    assert!(files.delete(&CheckpointId::from_string("chk-1")).unwrap());
    assert!(files.latest().unwrap().is_none());
}

#[test]
fn delete_of_missing_returns_false() {
    let dir = tempdir().unwrap();
    let files = CheckpointFiles::new(dir.path().join("checkpoints"));
    assert!(!files.delete(&CheckpointId::from_string("chk-none")).unwrap());
}

#[test]
fn schema_validation_rejects_out_of_range_progress() {
    let dir = tempdir().unwrap();
    let files = CheckpointFiles::new(dir.path().join("checkpoints"));

    let mut bad = checkpoint("chk-1", "msn-a", 5_000);
    bad.progress_percent = 150;
    files.write(&bad).unwrap();

    let err = files.read(&bad.id).unwrap_err();
    assert!(matches!(err, SnapshotError::Schema(_)));
}

#[test]
fn schema_validation_rejects_missing_fields() {
    let dir = tempdir().unwrap();
    let files = CheckpointFiles::new(dir.path().join("checkpoints"));
    std::fs::create_dir_all(files.dir()).unwrap();
    std::fs::write(files.dir().join("chk-bad.json"), br#"{"id": "chk-bad"}"#).unwrap();

    let err = files.read(&CheckpointId::from_string("chk-bad")).unwrap_err();
    assert!(matches!(err, SnapshotError::Json(_)));
}

#[test]
fn scan_skips_unreadable_files() {
    let dir = tempdir().unwrap();
    let files = CheckpointFiles::new(dir.path().join("checkpoints"));

    files.write(&checkpoint("chk-1", "msn-a", 5_000)).unwrap();
    std::fs::write(files.dir().join("chk-junk.json"), b"{ nope").unwrap();

    let scanned = files.scan().unwrap();
    assert_eq!(scanned.len(), 1);
    assert_eq!(scanned[0].id, "chk-1");
}

#[test]
fn prune_removes_expired_and_stale() {
    let dir = tempdir().unwrap();
    let files = CheckpointFiles::new(dir.path().join("checkpoints"));

    let mut expiring = checkpoint("chk-1", "msn-a", 5_000);
    expiring.expires_at_epoch_ms = Some(6_000);
    files.write(&expiring).unwrap();
    files.write(&checkpoint("chk-2", "msn-a", 10_000)).unwrap();

    // now=7_000: chk-1 expired; retention window keeps chk-2
    let pruned = files.prune_expired(7_000, 100_000).unwrap();
    assert_eq!(pruned, 1);
    assert!(files.read(&expiring.id).unwrap().is_none());
    assert_eq!(files.latest().unwrap().unwrap().id, "chk-2");
}
