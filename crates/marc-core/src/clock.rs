//! Time source for message, topic and briefing stamps.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

use crate::message::Timestamp;

/// Source of timestamps for the engine.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since the Unix epoch.
    fn now(&self) -> Timestamp;

    /// Note a stamp seen elsewhere (e.g. loaded from disk).
    ///
    /// Clocks that must never go backward relative to stored data advance
    /// past `ts`; the default does nothing.
    fn observe(&self, _ts: Timestamp) {}
}

/// Wall clock that never repeats a value.
///
/// Every call returns a stamp strictly greater than the previous one, even
/// when several calls land in the same millisecond or the wall clock steps
/// backward. Sync cursors compare stamps with `>`, so two items sharing a
/// stamp could otherwise hide one another.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: AtomicI64,
}

impl SystemClock {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: AtomicI64::new(0),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let wall = Utc::now().timestamp_millis();
        let mut prev = self.last.load(Ordering::Acquire);
        loop {
            let next = wall.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }

    fn observe(&self, ts: Timestamp) {
        self.last.fetch_max(ts, Ordering::AcqRel);
    }
}

/// Hand-driven clock for tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    #[must_use]
    pub const fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    pub fn set(&self, ts: Timestamp) {
        self.now.store(ts, Ordering::Release);
    }

    /// Move the clock forward and return the new time.
    pub fn advance(&self, ms: i64) -> Timestamp {
        self.now.fetch_add(ms, Ordering::AcqRel) + ms
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::Acquire)
    }
}
