// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicU32, Ordering};

fn fast_backoff(attempts: u32) -> Backoff {
    Backoff { initial: Duration::from_millis(1), max: Duration::from_millis(4), attempts }
}

#[tokio::test]
async fn first_success_returns_immediately() {
    let calls = AtomicU32::new(0);
    let result: Result<u32, String> = fast_backoff(3)
        .run(|| {
            let calls = &calls;
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            }
        })
        .await;

    assert_eq!(result.unwrap(), 7);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn retries_until_success() {
    let calls = AtomicU32::new(0);
    let result: Result<u32, String> = fast_backoff(3)
        .run(|| {
            let calls = &calls;
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err("busy".to_string())
                } else {
                    Ok(n)
                }
            }
        })
        .await;

    assert_eq!(result.unwrap(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn exhausted_attempts_surface_last_error() {
    let calls = AtomicU32::new(0);
    let result: Result<u32, String> = fast_backoff(3)
        .run(|| {
            let calls = &calls;
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("still busy".to_string())
            }
        })
        .await;

    assert_eq!(result.unwrap_err(), "still busy");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}
