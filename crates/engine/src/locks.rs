// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-granularity advisory locks with timeout-based expiry.
//!
//! The lock manager is the only component that mutates locks. A single
//! guard serializes every mutation, which makes acquisition linearizable
//! per normalized path. `Acquire` never blocks the caller on a held lock;
//! it reports the conflict and returns.

use crate::bus::FleetBus;
use parking_lot::Mutex;
use sqk_core::{
    Clock, ErrorClass, Event, FileLock, LockId, LockPurpose, LockStatus, Metadata, SpecialistId,
    StreamType,
};
use sqk_storage::LogError;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error(transparent)]
    Log(#[from] LogError),
}

impl LockError {
    pub fn class(&self) -> ErrorClass {
        match self {
            LockError::Log(err) => err.class(),
        }
    }
}

/// Result of an acquire attempt. `conflict` is not an error: callers
/// implementing retry do so with their own backoff.
#[derive(Debug, Clone)]
pub struct AcquireOutcome {
    pub conflict: bool,
    pub lock: Option<FileLock>,
    pub existing_lock: Option<FileLock>,
}

pub struct LockManager<C: Clock> {
    bus: FleetBus<C>,
    clock: C,
    /// Serializes all lock mutation (check-then-insert atomicity).
    guard: Mutex<()>,
}

impl<C: Clock> LockManager<C> {
    pub fn new(bus: FleetBus<C>, clock: C) -> Self {
        Self { bus, clock, guard: Mutex::new(()) }
    }

    /// Reserve a file for a specialist.
    ///
    /// All purposes currently resolve as mutually exclusive (documented
    /// behavior; a purpose-aware mode would relax `read`/`read` pairs).
    pub fn acquire(
        &self,
        file: &str,
        specialist_id: SpecialistId,
        timeout_ms: u64,
        purpose: LockPurpose,
        checksum: Option<String>,
    ) -> Result<AcquireOutcome, LockError> {
        let _guard = self.guard.lock();
        let normalized = normalize_path(file);
        let now_ms = self.clock.epoch_ms();

        let existing = {
            let state = self.bus.state.lock();
            state
                .locks
                .values()
                .find(|l| l.normalized_path == normalized && l.is_active(now_ms))
                .cloned()
        };
        if let Some(existing) = existing {
            tracing::debug!(file, holder = %existing.reserved_by, "lock conflict");
            return Ok(AcquireOutcome { conflict: true, lock: None, existing_lock: Some(existing) });
        }

        let lock = FileLock {
            id: LockId::new(),
            file: file.to_string(),
            normalized_path: normalized,
            reserved_by: specialist_id,
            purpose,
            reserved_at_epoch_ms: now_ms,
            expires_at_epoch_ms: now_ms + timeout_ms,
            released_at_epoch_ms: None,
            checksum,
            status: LockStatus::Active,
            metadata: Metadata::new(),
        };
        self.bus.record(
            StreamType::Ctk,
            lock.id.as_str(),
            Event::LockAcquired { lock: Box::new(lock.clone()) },
        )?;
        Ok(AcquireOutcome { conflict: false, lock: Some(lock), existing_lock: None })
    }

    /// Release a lock. Unknown ids return `false`; releasing an already
    /// expired or released lock succeeds idempotently.
    pub fn release(&self, id: &LockId) -> Result<bool, LockError> {
        let _guard = self.guard.lock();
        let status = {
            let state = self.bus.state.lock();
            state.locks.get(id.as_str()).map(|l| l.status)
        };
        match status {
            None => Ok(false),
            Some(LockStatus::Active) => {
                self.bus.record(
                    StreamType::Ctk,
                    id.as_str(),
                    Event::LockReleased { id: *id, at_epoch_ms: self.clock.epoch_ms() },
                )?;
                Ok(true)
            }
            Some(_) => Ok(true),
        }
    }

    /// Forcibly release a lock regardless of holder intent.
    pub fn force_release(&self, id: &LockId) -> Result<bool, LockError> {
        let _guard = self.guard.lock();
        let status = {
            let state = self.bus.state.lock();
            state.locks.get(id.as_str()).map(|l| l.status)
        };
        match status {
            None => Ok(false),
            Some(LockStatus::Active) => {
                self.bus.record(
                    StreamType::Ctk,
                    id.as_str(),
                    Event::LockForceReleased { id: *id, at_epoch_ms: self.clock.epoch_ms() },
                )?;
                Ok(true)
            }
            Some(_) => Ok(true),
        }
    }

    /// The active lock on a file, if any.
    pub fn get_by_file(&self, file: &str) -> Option<FileLock> {
        let normalized = normalize_path(file);
        let now_ms = self.clock.epoch_ms();
        let state = self.bus.state.lock();
        state
            .locks
            .values()
            .find(|l| l.normalized_path == normalized && l.is_active(now_ms))
            .cloned()
    }

    pub fn get_active(&self) -> Vec<FileLock> {
        let now_ms = self.clock.epoch_ms();
        let state = self.bus.state.lock();
        state.active_locks(now_ms).into_iter().cloned().collect()
    }

    /// Expire every active lock past its deadline; the holder learns via
    /// the `lock:expired` event. Returns how many were expired.
    pub fn release_expired(&self) -> Result<usize, LockError> {
        let _guard = self.guard.lock();
        let now_ms = self.clock.epoch_ms();
        let expired: Vec<FileLock> = {
            let state = self.bus.state.lock();
            state.locks.values().filter(|l| l.is_expired(now_ms)).cloned().collect()
        };

        for lock in &expired {
            self.bus.record(
                StreamType::Ctk,
                lock.id.as_str(),
                Event::LockExpired {
                    id: lock.id,
                    file: lock.file.clone(),
                    reserved_by: lock.reserved_by,
                    at_epoch_ms: now_ms,
                },
            )?;
            tracing::info!(file = %lock.file, holder = %lock.reserved_by, "lock expired");
        }
        Ok(expired.len())
    }
}

/// Normalize to an absolute, symlink-resolved path.
///
/// Falls back to lexical normalization when the file does not exist yet
/// (locks are routinely taken on files about to be created).
pub fn normalize_path(file: &str) -> String {
    let path = Path::new(file);
    if let Ok(canonical) = path.canonicalize() {
        return canonical.to_string_lossy().into_owned();
    }

    let absolute: PathBuf = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/")).join(path)
    };

    let mut clean = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                clean.pop();
            }
            other => clean.push(other),
        }
    }
    clean.to_string_lossy().into_owned()
}

#[cfg(test)]
#[path = "locks_tests.rs"]
mod tests;
