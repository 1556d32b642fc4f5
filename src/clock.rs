//! Injected time source.
//!
//! Every timestamp the engine records comes from a [`Clock`], so tests can
//! replace wall-clock time with a [`ManualClock`] and get reproducible traces.

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of timestamps in milliseconds since the UNIX epoch.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Deterministic clock: starts at a fixed instant and advances by a fixed
/// step every time it is read.
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicU64,
    step: u64,
}

impl ManualClock {
    pub fn new(start: u64, step: u64) -> Self {
        Self {
            now: AtomicU64::new(start),
            step,
        }
    }

    /// A clock frozen at `start`.
    pub fn frozen(start: u64) -> Self {
        Self::new(start, 0)
    }

    /// Move the clock forward without reading it.
    pub fn advance(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.fetch_add(self.step, Ordering::Relaxed)
    }
}
