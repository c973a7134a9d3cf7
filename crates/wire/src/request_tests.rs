// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn decompose_round_trips() {
    let request = Request::Decompose {
        task_description: "refactor the handlers".to_string(),
        strategy: Some(Strategy::FileBased),
        context: None,
        metadata: HashMap::new(),
    };

    let json = serde_json::to_string(&request).unwrap();
    let back: Request = serde_json::from_str(&json).unwrap();
    assert_eq!(back, request);
}

#[test]
fn resume_defaults_are_conservative() {
    let request: Request = serde_json::from_str(
        r#"{"type": "Resume", "id": "chk-abc"}"#,
    )
    .unwrap();

    match request {
        Request::Resume { force, dry_run, .. } => {
            assert!(!force);
            assert!(!dry_run);
        }
        other => panic!("unexpected request: {other:?}"),
    }
}

#[test]
fn checkpoint_trigger_defaults_to_manual() {
    let request: Request = serde_json::from_str(
        r#"{"type": "CreateCheckpoint", "mission_id": "msn-abc"}"#,
    )
    .unwrap();

    match request {
        Request::CreateCheckpoint { trigger, .. } => {
            assert_eq!(trigger, CheckpointTrigger::Manual);
        }
        other => panic!("unexpected request: {other:?}"),
    }
}
