//! Time model.
//!
//! # Design
//!
//! Every time-dependent decision in the engine (snap window, recalculation
//! cooldown, ETA) takes an explicit `now: Timestamp` argument instead of
//! reading the system clock.  The session actor obtains `now` from a
//! [`Clock`], which tests and the replay tool replace with a [`ManualClock`].
//!
//! Timestamps are integer milliseconds since the Unix epoch so comparisons and
//! window arithmetic are exact.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

// ── Timestamp ─────────────────────────────────────────────────────────────────

/// Wall-clock instant in milliseconds since the Unix epoch.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    #[inline]
    pub fn from_secs(secs: i64) -> Self {
        Timestamp(secs * 1_000)
    }

    /// The timestamp `ms` milliseconds after `self`.
    #[inline]
    pub fn offset_ms(self, ms: i64) -> Timestamp {
        Timestamp(self.0.saturating_add(ms))
    }

    /// The timestamp `secs` (fractional) seconds after `self`.
    ///
    /// Non-finite input leaves the timestamp unchanged.
    #[inline]
    pub fn offset_secs(self, secs: f64) -> Timestamp {
        if !secs.is_finite() {
            return self;
        }
        self.offset_ms((secs * 1_000.0).round() as i64)
    }

    /// Milliseconds elapsed from `earlier` to `self`; negative if `earlier`
    /// is in the future.
    #[inline]
    pub fn millis_since(self, earlier: Timestamp) -> i64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Seconds elapsed from `earlier` to `self`.
    #[inline]
    pub fn secs_since(self, earlier: Timestamp) -> f64 {
        self.millis_since(earlier) as f64 / 1_000.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}s", self.0.div_euclid(1_000), self.0.rem_euclid(1_000))
    }
}

// ── Clocks ────────────────────────────────────────────────────────────────────

/// Source of "now" for the session actor.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Timestamp;
}

/// Reads the operating-system wall clock.
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        Timestamp(ms)
    }
}

/// A clock that only moves when told to.
///
/// Cheap to clone; all clones share the same instant.
#[derive(Clone, Debug, Default)]
pub struct ManualClock(Arc<AtomicI64>);

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        ManualClock(Arc::new(AtomicI64::new(start.0)))
    }

    pub fn set(&self, t: Timestamp) {
        self.0.store(t.0, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, ms: i64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.0.load(Ordering::SeqCst))
    }
}
