// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Time sources for the frame loop.
//!
//! The loop never reads a platform clock directly. It asks a [`Clock`] for
//! the current [`HostTime`] once per cadence check, which lets tests and
//! headless runs substitute a [`ManualClock`] and advance time explicitly.

use alloc::rc::Rc;
use core::cell::Cell;

use crate::time::{Duration, HostTime, Timebase};

/// A monotonic time source.
pub trait Clock {
    /// Returns the current time.
    fn now(&self) -> HostTime;

    /// Returns the timebase of the ticks returned by [`now`](Self::now).
    fn timebase(&self) -> Timebase {
        Timebase::NANOS
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying time, so a test can keep one handle
/// while the loop owns another.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
    timebase: Option<Timebase>,
}

impl ManualClock {
    /// Creates a nanosecond clock at tick zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock whose ticks use the given timebase.
    #[must_use]
    pub fn with_timebase(timebase: Timebase) -> Self {
        Self {
            now: Rc::default(),
            timebase: Some(timebase),
        }
    }

    /// Moves the clock forward by `d`, saturating at the maximum tick.
    pub fn advance(&self, d: Duration) {
        self.now.set(self.now.get().saturating_add(d.ticks()));
    }

    /// Sets the clock to an absolute time.
    ///
    /// Moving backwards is allowed; elapsed-time computations saturate at
    /// zero.
    pub fn set(&self, t: HostTime) {
        self.now.set(t.ticks());
    }
}

impl Clock for ManualClock {
    fn now(&self) -> HostTime {
        HostTime(self.now.get())
    }

    fn timebase(&self) -> Timebase {
        self.timebase.unwrap_or(Timebase::NANOS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_time() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        handle.advance(Duration(250));
        assert_eq!(clock.now(), HostTime(250), "advance visible through clone");
        clock.set(HostTime(1_000));
        assert_eq!(handle.now(), HostTime(1_000), "set visible through clone");
    }

    #[test]
    fn advance_saturates() {
        let clock = ManualClock::new();
        clock.set(HostTime(u64::MAX - 1));
        clock.advance(Duration(10));
        assert_eq!(clock.now(), HostTime(u64::MAX), "saturated at max");
    }

    #[test]
    fn timebase_defaults_to_nanos() {
        assert_eq!(ManualClock::new().timebase(), Timebase::NANOS, "default");
        let tb = Timebase::new(125, 3);
        assert_eq!(ManualClock::with_timebase(tb).timebase(), tb, "custom");
    }
}
