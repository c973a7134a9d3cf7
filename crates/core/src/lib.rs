// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sqk-core: domain types for the Squawk fleet coordination runtime

pub mod macros;

pub mod checkpoint;
pub mod clock;
pub mod conflict;
pub mod error;
pub mod event;
pub mod id;
pub mod lock;
pub mod message;
pub mod mission;
pub mod rng;
pub mod sortie;
pub mod specialist;
pub mod tree;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use checkpoint::{
    Checkpoint, CheckpointId, CheckpointTrigger, RecoveryContext, CHECKPOINT_VERSION,
};
pub use clock::{Clock, FakeClock, SystemClock};
pub use conflict::{Conflict, ConflictId, ConflictKind, ResolutionStrategy, Severity};
pub use error::ErrorClass;
pub use event::{Event, StreamType};
pub use id::EventId;
pub use lock::{FileLock, LockId, LockPurpose, LockStatus};
pub use message::{Mailbox, MailboxId, Message, MessageId, MessageStatus};
pub use mission::{Mission, MissionId, MissionStatus, Priority, Strategy, TransitionError};
pub use rng::{FakeRng, Rng, SystemRng};
pub use sortie::{Complexity, Sortie, SortieId, SortieStatus};
pub use specialist::{AgentType, Specialist, SpecialistId, SpecialistStatus};
pub use tree::{DependencyEdge, Parallelization, SortieTree};

/// Opaque per-entity metadata, validated only at the boundary.
pub type Metadata = serde_json::Map<String, serde_json::Value>;
