// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error classification shared across the workspace.
//!
//! Every fallible subsystem keeps its own `thiserror` enum; each error maps
//! into one of these kinds, which drives retry behavior and the wire status.

use serde::{Deserialize, Serialize};

/// Kind of failure, independent of which subsystem produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Malformed input, missing fields, out-of-range numbers. Never retried.
    Validation,
    /// Lock contention, file overlap, cycles, duplicates. Recoverable.
    Conflict,
    /// Store busy, filesystem transient, rate limits. Retried with backoff.
    TransientIo,
    /// LLM, wall-clock, or lock expiry deadlines. Recorded, not retried.
    Timeout,
    /// Schema violations, sequence gaps, double releases. Logged; primary store wins.
    Integrity,
    /// Corrupt or missing primary state. Abort with non-zero exit.
    Fatal,
}

impl ErrorClass {
    /// Whether an internal retry with backoff is appropriate.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorClass::TransientIo)
    }
}

crate::simple_display! {
    ErrorClass {
        Validation => "validation",
        Conflict => "conflict",
        TransientIo => "transient_io",
        Timeout => "timeout",
        Integrity => "integrity",
        Fatal => "fatal",
    }
}
