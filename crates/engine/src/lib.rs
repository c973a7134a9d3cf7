// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sqk-engine: the coordination engines.
//!
//! Lock manager, scheduler, specialist registry, message bus, conflict
//! resolver, checkpoint engine, and recovery manager. Every engine records
//! facts through the shared [`FleetBus`]; none holds private mutable state
//! beyond what the event log can rebuild.

pub mod bus;
pub mod checkpoint;
pub mod conflict;
pub mod health;
pub mod locks;
pub mod mailbox;
pub mod recovery;
pub mod registry;
pub mod retry;
pub mod scheduler;

#[cfg(test)]
mod test_helpers;

pub use bus::FleetBus;
pub use checkpoint::{CheckpointEngine, CheckpointError};
pub use conflict::{ConflictResolver, ResolutionPlan};
pub use health::{SpecialistHealth, SystemHealth};
pub use locks::{AcquireOutcome, LockError, LockManager};
pub use mailbox::{MailboxError, MessageBus};
pub use recovery::{RecoveryManager, RecoveryPlan, RecoveryReport};
pub use registry::SpecialistRegistry;
pub use retry::Backoff;
pub use scheduler::{DispatchReport, LaunchError, Scheduler, SpecialistLauncher};
