//! Simulation time.
//!
//! Time only moves when the host calls [`TriggerClock::tick`] (or passes an
//! absolute `now` to the dispatcher). Nothing in the crate reads the wall
//! clock, so replays with identical tick sequences are identical.
//!
//! `SimTime` wraps a [`Duration`] measured from simulation start. Durations
//! are exact, so two telegrams scheduled for "now + 10s" compare equal and
//! fall back to insertion order.

use std::ops::{Add, AddAssign, Sub};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A point in simulation time, measured from simulation start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SimTime(Duration);

impl SimTime {
    /// Simulation start.
    pub const ZERO: SimTime = SimTime(Duration::ZERO);

    /// Create a time point at `elapsed` since simulation start.
    #[must_use]
    pub const fn new(elapsed: Duration) -> Self {
        Self(elapsed)
    }

    /// Create a time point from whole seconds.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    /// Create a time point from milliseconds.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    /// Create a time point from fractional seconds (typical frame `tpf`).
    ///
    /// Negative or NaN values clamp to zero; values too large for a
    /// `Duration` saturate.
    #[must_use]
    pub fn from_secs_f64(secs: f64) -> Self {
        if secs.is_nan() || secs <= 0.0 {
            return Self::ZERO;
        }
        Self(Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX))
    }

    /// Time elapsed since simulation start.
    #[must_use]
    pub const fn elapsed(self) -> Duration {
        self.0
    }

    /// Time in fractional seconds.
    #[must_use]
    pub fn as_secs_f64(self) -> f64 {
        self.0.as_secs_f64()
    }

    /// Absolute distance between two time points.
    #[must_use]
    pub fn abs_diff(self, other: SimTime) -> Duration {
        if self >= other {
            self.0 - other.0
        } else {
            other.0 - self.0
        }
    }
}

impl Add<Duration> for SimTime {
    type Output = SimTime;

    fn add(self, rhs: Duration) -> SimTime {
        SimTime(self.0.saturating_add(rhs))
    }
}

impl AddAssign<Duration> for SimTime {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 = self.0.saturating_add(rhs);
    }
}

impl Sub for SimTime {
    type Output = Duration;

    /// Saturates at zero when `rhs` is later than `self`.
    fn sub(self, rhs: SimTime) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

impl From<Duration> for SimTime {
    fn from(elapsed: Duration) -> Self {
        Self(elapsed)
    }
}

impl std::fmt::Display for SimTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t={:.3}s", self.0.as_secs_f64())
    }
}

/// Monotonic simulation clock advanced once per update tick.
///
/// ```
/// use std::time::Duration;
/// use rust_gamebus::core::{SimTime, TriggerClock};
///
/// let mut clock = TriggerClock::new();
/// clock.tick(Duration::from_millis(16));
/// clock.tick(Duration::from_millis(16));
///
/// assert_eq!(clock.now(), SimTime::from_millis(32));
/// assert_eq!(clock.ticks(), 2);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerClock {
    now: SimTime,
    ticks: u64,
}

impl TriggerClock {
    /// Create a clock at simulation start.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by `dt` and count one tick.
    pub fn tick(&mut self, dt: Duration) {
        self.now += dt;
        self.ticks += 1;
    }

    /// Current simulation time.
    #[must_use]
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Number of ticks since the last reset.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Back to simulation start.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
