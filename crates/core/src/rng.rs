// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Randomness abstraction for deterministic tests.
//!
//! Simulated delays and activity selection in the agent runner draw from
//! this capability instead of ambient thread-local randomness.

use parking_lot::Mutex;
use std::sync::Arc;

/// A source of randomness
pub trait Rng: Clone + Send + Sync + 'static {
    /// Uniform value in `[lo, hi)`. `hi` must be greater than `lo`.
    fn range_u64(&self, lo: u64, hi: u64) -> u64;

    /// Uniform index into a slice of the given length (length must be > 0).
    fn pick(&self, len: usize) -> usize {
        self.range_u64(0, len as u64) as usize
    }
}

/// Real randomness from the thread-local generator
#[derive(Clone, Default)]
pub struct SystemRng;

impl Rng for SystemRng {
    fn range_u64(&self, lo: u64, hi: u64) -> u64 {
        use rand::Rng as _;
        rand::thread_rng().gen_range(lo..hi)
    }
}

/// Fake rng replaying a fixed script of values, for tests.
///
/// Each call pops the next scripted value and clamps it into the requested
/// range; an exhausted script repeats the last value (or `lo` if empty).
#[derive(Clone)]
pub struct FakeRng {
    script: Arc<Mutex<Vec<u64>>>,
    last: Arc<Mutex<u64>>,
}

impl FakeRng {
    pub fn new(script: Vec<u64>) -> Self {
        Self { script: Arc::new(Mutex::new(script)), last: Arc::new(Mutex::new(0)) }
    }
}

impl Default for FakeRng {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Rng for FakeRng {
    fn range_u64(&self, lo: u64, hi: u64) -> u64 {
        let mut script = self.script.lock();
        let raw = if script.is_empty() {
            *self.last.lock()
        } else {
            let v = script.remove(0);
            *self.last.lock() = v;
            v
        };
        lo + raw % (hi - lo)
    }
}
