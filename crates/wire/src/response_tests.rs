// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn error_body_carries_no_trace() {
    let response = Response::Error {
        status: Status::BadRequest,
        body: ErrorBody { error: "task description is empty".to_string(), message: None },
    };

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["status"], "bad_request");
    assert_eq!(json["body"]["error"], "task description is empty");
    assert!(json["body"].get("message").is_none());
}

#[test]
fn partial_recovery_maps_to_207() {
    let response = Response::Recovery {
        outcome: RecoveryOutcome {
            attempted: 10,
            restored: 9,
            errors: vec!["one lock conflicted".to_string()],
            partial: true,
            dry_run: false,
        },
    };
    assert_eq!(response.status(), Status::PartialContent);

    let full = Response::Recovery {
        outcome: RecoveryOutcome {
            attempted: 10,
            restored: 10,
            errors: Vec::new(),
            partial: false,
            dry_run: false,
        },
    };
    assert_eq!(full.status(), Status::Ok);
}

#[test]
fn ok_responses_map_to_200() {
    assert_eq!(Response::Ok.status(), Status::Ok);
    assert_eq!(Response::Released { released: true }.status(), Status::Ok);
}
