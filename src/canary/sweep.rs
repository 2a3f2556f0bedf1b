//! Scheduling of replay-record sweeps.
//!
//! Consumed `(token, nonce)` records only need to outlive the freshness
//! window, so the verifier prunes the replay store opportunistically after
//! successful verifications instead of running a background task. The
//! schedule decides when a prune is worth the storage round trip.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

/// Default number of verifications between sweeps.
pub const DEFAULT_SWEEP_EVERY: u32 = 256;

/// Default maximum wall-clock gap between sweeps.
pub const DEFAULT_SWEEP_MAX_AGE: Duration = Duration::from_secs(60);

/// Decides when the verifier prunes expired replay records.
///
/// A sweep becomes due after a fixed number of successful verifications or
/// once the previous sweep is older than `max_age`, whichever happens
/// first. On a quiet verifier the count threshold may never fire; the age
/// threshold caps how long expired records linger regardless of traffic.
///
/// Timestamps come from the verifier's clock, so tests drive the schedule
/// with a fixed time provider and never sleep.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use kanariya_sign::sweep::SweepSchedule;
///
/// // Prune every 100 verifications, or at least once a minute
/// let schedule = SweepSchedule::new(100, Duration::from_secs(60));
/// assert!(!schedule.after_verification(1_700_000_000));
/// ```
pub struct SweepSchedule {
    every: u32,
    max_age: Duration,
    verified: AtomicU32,
    swept_at: AtomicU64,
}

impl SweepSchedule {
    /// Creates a schedule that sweeps after `every` verifications or when
    /// the last sweep is older than `max_age`.
    pub fn new(every: u32, max_age: Duration) -> Self {
        Self {
            every,
            max_age,
            verified: AtomicU32::new(0),
            swept_at: AtomicU64::new(0),
        }
    }

    /// Records one successful verification at `now` (Unix seconds) and
    /// reports whether a sweep is due.
    pub fn after_verification(&self, now: u64) -> bool {
        let seen = self.verified.fetch_add(1, Ordering::Relaxed) + 1;
        if seen >= self.every {
            return true;
        }

        let last = self.swept_at.load(Ordering::Relaxed);
        if last == 0 {
            // First verification anchors the age interval
            self.swept_at.store(now, Ordering::Relaxed);
            return false;
        }
        now.saturating_sub(last) >= self.max_age.as_secs()
    }

    /// Records that a sweep completed at `now`, resetting both thresholds.
    pub fn record_sweep(&self, now: u64) {
        self.verified.store(0, Ordering::Relaxed);
        self.swept_at.store(now, Ordering::Relaxed);
    }
}

impl Default for SweepSchedule {
    fn default() -> Self {
        Self::new(DEFAULT_SWEEP_EVERY, DEFAULT_SWEEP_MAX_AGE)
    }
}
