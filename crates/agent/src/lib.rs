// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sqk-agent: the long-lived loop inside a spawned specialist.
//!
//! Heartbeats, keyword-templated progress steps with simulated delays, an
//! idle loop when no task is given, and graceful shutdown on signal.

pub mod runner;
pub mod steps;

pub use runner::{
    Heartbeat, ProgressUpdate, ReportSink, RunOutcome, Runner, RunnerConfig, RunnerError,
    RunnerState, TracingSink,
};
pub use steps::{idle_activity, steps_for};
