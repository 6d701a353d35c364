//! Event triggers: "fire event E after delay D, optionally repeating".
//!
//! A trigger owns its countdown. Each [`advance`](EventTrigger::advance)
//! adds the tick's `dt` to `elapsed` (clamped to `delay`); once `elapsed`
//! reaches `delay` the trigger fires, `elapsed` resets to zero and the fire
//! count goes up. A trigger fires at most once per advance, even when `dt`
//! spans several delay intervals.
//!
//! ```text
//!            dt (elapsed < delay)
//!           ┌──────┐
//!           ▼      │
//!        Waiting ──┘ ──elapsed == delay──▶ Fired ──fired < limit──▶ Waiting
//!                                            │
//!                                            └──fired == limit──▶ Expired (terminal)
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::events::Event;

/// Builds the event a trigger fires. Called once per firing.
pub type EventFactory = Arc<dyn Fn() -> Event + Send + Sync>;

/// How many times a trigger may fire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerLimit {
    /// Fire this many times, then expire. Must be at least 1.
    Times(u32),
    /// Fire forever; never leaves the registry on its own.
    Unlimited,
}

impl TriggerLimit {
    /// Is `fired` enough to exhaust this limit?
    #[must_use]
    pub fn is_reached(self, fired: u32) -> bool {
        match self {
            TriggerLimit::Times(n) => fired >= n,
            TriggerLimit::Unlimited => false,
        }
    }
}

/// Outcome of advancing a trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerState {
    /// Still counting down.
    Waiting,
    /// Fired this tick and will fire again.
    Fired,
    /// Fired for the last time (or was already exhausted).
    Expired,
}

impl TriggerState {
    /// Did the trigger produce an event?
    #[must_use]
    pub fn fired(self) -> bool {
        !matches!(self, TriggerState::Waiting)
    }
}

/// A timer that produces an event when its countdown elapses.
#[derive(Clone)]
pub struct EventTrigger {
    name: String,
    factory: EventFactory,
    delay: Duration,
    limit: TriggerLimit,
    elapsed: Duration,
    fired: u32,
}

impl EventTrigger {
    /// Create a trigger.
    ///
    /// Fails if `delay` is zero or `limit` is `Times(0)`.
    pub fn new<F>(factory: F, delay: Duration, limit: TriggerLimit) -> Result<Self, ConfigError>
    where
        F: Fn() -> Event + Send + Sync + 'static,
    {
        if delay.is_zero() {
            return Err(ConfigError::ZeroDelay);
        }
        if limit == TriggerLimit::Times(0) {
            return Err(ConfigError::ZeroLimit);
        }

        Ok(Self {
            name: String::new(),
            factory: Arc::new(factory),
            delay,
            limit,
            elapsed: Duration::ZERO,
            fired: 0,
        })
    }

    /// Fire once after `delay`.
    pub fn once<F>(factory: F, delay: Duration) -> Result<Self, ConfigError>
    where
        F: Fn() -> Event + Send + Sync + 'static,
    {
        Self::new(factory, delay, TriggerLimit::Times(1))
    }

    /// Fire every `delay`, `times` times in total.
    pub fn repeating<F>(factory: F, delay: Duration, times: u32) -> Result<Self, ConfigError>
    where
        F: Fn() -> Event + Send + Sync + 'static,
    {
        Self::new(factory, delay, TriggerLimit::Times(times))
    }

    /// Fire every `delay`, forever.
    pub fn forever<F>(factory: F, delay: Duration) -> Result<Self, ConfigError>
    where
        F: Fn() -> Event + Send + Sync + 'static,
    {
        Self::new(factory, delay, TriggerLimit::Unlimited)
    }

    /// Fire copies of a fixed event.
    pub fn for_event(event: Event, delay: Duration, limit: TriggerLimit) -> Result<Self, ConfigError> {
        Self::new(move || event.clone(), delay, limit)
    }

    /// Set a name used in logs (builder pattern).
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Advance the countdown by `dt`.
    ///
    /// An exhausted trigger does nothing and reports `Expired`.
    pub fn advance(&mut self, dt: Duration) -> TriggerState {
        if self.is_expired() {
            return TriggerState::Expired;
        }

        self.elapsed = (self.elapsed + dt).min(self.delay);
        if self.elapsed < self.delay {
            return TriggerState::Waiting;
        }

        self.elapsed = Duration::ZERO;
        self.fired += 1;

        if self.is_expired() {
            TriggerState::Expired
        } else {
            TriggerState::Fired
        }
    }

    /// Add `dt` to the countdown without firing.
    ///
    /// A trigger that comes due this way fires on its next
    /// [`advance`](Self::advance), whatever that call's `dt`.
    pub fn accrue(&mut self, dt: Duration) {
        if !self.is_expired() {
            self.elapsed = (self.elapsed + dt).min(self.delay);
        }
    }

    /// Build the event this trigger fires.
    #[must_use]
    pub fn make_event(&self) -> Event {
        (self.factory)()
    }

    /// Has the trigger used up its limit?
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.limit.is_reached(self.fired)
    }

    /// Remaining firings, `None` when unlimited.
    #[must_use]
    pub fn remaining(&self) -> Option<u32> {
        match self.limit {
            TriggerLimit::Times(n) => Some(n.saturating_sub(self.fired)),
            TriggerLimit::Unlimited => None,
        }
    }

    /// Name used in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Interval between firings.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Repeat limit.
    #[must_use]
    pub fn limit(&self) -> TriggerLimit {
        self.limit
    }

    /// Time accumulated towards the next firing.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// How many times the trigger has fired.
    #[must_use]
    pub fn fired_count(&self) -> u32 {
        self.fired
    }
}

impl std::fmt::Debug for EventTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventTrigger")
            .field("name", &self.name)
            .field("delay", &self.delay)
            .field("limit", &self.limit)
            .field("elapsed", &self.elapsed)
            .field("fired", &self.fired)
            .finish_non_exhaustive()
    }
}
