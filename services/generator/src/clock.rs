//! Timestamp sources for generated records
//!
//! Records carry nanoseconds since the Unix epoch. Reading the wall clock per
//! record is both slow and non-monotonic, so [`MonotonicClock`] anchors the
//! epoch once and advances it with quanta's TSC-backed counter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of record timestamps in nanoseconds
pub trait TimeSource {
    fn now_ns(&self) -> u64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now_ns(&self) -> u64 {
        (**self).now_ns()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for std::sync::Arc<T> {
    fn now_ns(&self) -> u64 {
        (**self).now_ns()
    }
}

/// Monotonic high-resolution clock anchored to the Unix epoch
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    clock: quanta::Clock,
    anchor_raw: u64,
    epoch_ns: u64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        let clock = quanta::Clock::new();
        let anchor_raw = clock.raw();
        let epoch_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self {
            clock,
            anchor_raw,
            epoch_ns,
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicClock {
    #[inline]
    fn now_ns(&self) -> u64 {
        self.epoch_ns + self.clock.delta_as_nanos(self.anchor_raw, self.clock.raw())
    }
}

/// Clock that only moves when told to. Used for replays and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ns: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ns: u64) -> Self {
        Self {
            now_ns: AtomicU64::new(start_ns),
        }
    }

    pub fn set(&self, now_ns: u64) {
        self.now_ns.store(now_ns, Ordering::Release);
    }

    pub fn advance(&self, delta_ns: u64) {
        self.now_ns.fetch_add(delta_ns, Ordering::AcqRel);
    }
}

impl TimeSource for ManualClock {
    fn now_ns(&self) -> u64 {
        self.now_ns.load(Ordering::Acquire)
    }
}
