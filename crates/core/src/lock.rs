// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timed advisory file reservations.

use crate::specialist::SpecialistId;
use crate::Metadata;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a file lock.
    pub struct LockId("lock-");
}

/// Stated purpose of a reservation.
///
/// All purposes currently resolve as mutually exclusive; the distinction is
/// kept in the data model so a shared-read mode can be added later without a
/// format change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockPurpose {
    Edit,
    Read,
    Delete,
}

crate::simple_display! {
    LockPurpose {
        Edit => "edit",
        Read => "read",
        Delete => "delete",
    }
}

/// `Active` transitions to exactly one of the terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockStatus {
    Active,
    Released,
    Expired,
    ForceReleased,
}

crate::simple_display! {
    LockStatus {
        Active => "active",
        Released => "released",
        Expired => "expired",
        ForceReleased => "force_released",
    }
}

/// A timed advisory reservation of a file by a specialist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileLock {
    pub id: LockId,
    /// File path as given by the caller.
    pub file: String,
    /// Absolute, symlink-resolved path; the exclusivity key.
    pub normalized_path: String,
    pub reserved_by: SpecialistId,
    pub purpose: LockPurpose,
    pub reserved_at_epoch_ms: u64,
    pub expires_at_epoch_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released_at_epoch_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    pub status: LockStatus,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl FileLock {
    /// Active and not yet past its deadline.
    pub fn is_active(&self, now_ms: u64) -> bool {
        self.status == LockStatus::Active && self.expires_at_epoch_ms > now_ms
    }

    /// Active but past its deadline; the reaper will expire it.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.status == LockStatus::Active && self.expires_at_epoch_ms <= now_ms
    }
}
