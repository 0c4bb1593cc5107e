// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host time in clock ticks.
//!
//! A [`Clock`](crate::clock::Clock) reports [`HostTime`] in its own ticks
//! together with the [`Timebase`] that converts them to nanoseconds. Cadence
//! intervals are configured in seconds, converted once into a [`Duration`],
//! and compared against elapsed ticks with integer arithmetic.

use core::fmt;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// A monotonic point in time, in clock ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// Raw tick value.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Ticks elapsed since `earlier`; zero when the clock went backwards.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({})", self.0)
    }
}

/// Ticks-to-nanoseconds ratio: `nanos = ticks * numer / denom`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timebase {
    /// Numerator.
    pub numer: u32,
    /// Denominator, never zero.
    pub denom: u32,
}

impl Timebase {
    /// Ticks are nanoseconds.
    pub const NANOS: Self = Self { numer: 1, denom: 1 };

    /// Creates a timebase.
    ///
    /// # Panics
    ///
    /// Panics if `denom` is zero.
    #[inline]
    #[must_use]
    pub const fn new(numer: u32, denom: u32) -> Self {
        assert!(denom != 0, "timebase denominator must not be zero");
        Self { numer, denom }
    }

    /// Converts ticks to nanoseconds, saturating at `u64::MAX`.
    #[inline]
    #[must_use]
    pub fn ticks_to_nanos(self, ticks: u64) -> u64 {
        let wide = u128::from(ticks) * u128::from(self.numer) / u128::from(self.denom);
        u64::try_from(wide).unwrap_or(u64::MAX)
    }

    /// Converts nanoseconds to ticks, flooring. A zero numerator yields zero.
    #[inline]
    #[must_use]
    fn nanos_to_ticks(self, nanos: u64) -> u64 {
        if self.numer == 0 {
            return 0;
        }
        let wide = u128::from(nanos) * u128::from(self.denom) / u128::from(self.numer);
        u64::try_from(wide).unwrap_or(u64::MAX)
    }
}

impl fmt::Debug for Timebase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timebase({}/{})", self.numer, self.denom)
    }
}

/// A span of clock ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// Zero ticks.
    pub const ZERO: Self = Self(0);

    /// Raw tick value.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Length in nanoseconds.
    #[inline]
    #[must_use]
    pub fn to_nanos(self, timebase: Timebase) -> u64 {
        timebase.ticks_to_nanos(self.0)
    }

    /// A duration of `nanos` nanoseconds in `timebase` ticks.
    #[inline]
    #[must_use]
    pub fn from_nanos(nanos: u64, timebase: Timebase) -> Self {
        Self(timebase.nanos_to_ticks(nanos))
    }

    /// Length in fractional seconds, the unit of frame deltas.
    #[inline]
    #[must_use]
    pub fn as_secs_f64(self, timebase: Timebase) -> f64 {
        self.to_nanos(timebase) as f64 / NANOS_PER_SEC
    }

    /// A duration of `secs` seconds, floored to whole nanoseconds.
    ///
    /// Negative, zero and NaN inputs yield [`Duration::ZERO`].
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "flooring to whole nanoseconds is the intended rounding"
    )]
    pub fn from_secs_f64(secs: f64, timebase: Timebase) -> Self {
        if secs > 0.0 {
            Self::from_nanos((secs * NANOS_PER_SEC) as u64, timebase)
        } else {
            Self::ZERO
        }
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({})", self.0)
    }
}
