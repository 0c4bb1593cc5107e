// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Independent step cadences.
//!
//! Each [`Cadence`] fires when at least `speed_scale / frame_rate` seconds
//! have passed since its previous step, measured in host ticks after
//! converting the interval to whole nanoseconds (floored). A step reports the
//! elapsed time scaled by `time_scale` as its delta.
//!
//! A cadence never catches up: after a long stall it fires once and measures
//! the next interval from that step.

use subduction_core::time::{Duration, HostTime, Timebase};
use subduction_core::trace::CadenceKind;

use crate::config::CadenceConfig;

/// Timing state of one cadence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cadence {
    kind: CadenceKind,
    frame_rate: f64,
    time_scale: f64,
    speed_scale: f64,
    paused: bool,
    previous_step: HostTime,
    delta: f64,
    step_count: u64,
}

impl Cadence {
    /// Creates a cadence from its configuration.
    #[must_use]
    pub fn new(kind: CadenceKind, config: CadenceConfig) -> Self {
        Self {
            kind,
            frame_rate: config.frame_rate,
            time_scale: config.time_scale,
            speed_scale: config.speed_scale,
            paused: config.paused,
            previous_step: HostTime(0),
            delta: 0.0,
            step_count: 0,
        }
    }

    /// Which cadence this is.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> CadenceKind {
        self.kind
    }

    /// Target steps per second.
    #[inline]
    #[must_use]
    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Delta multiplier.
    #[inline]
    #[must_use]
    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Interval multiplier.
    #[inline]
    #[must_use]
    pub fn speed_scale(&self) -> f64 {
        self.speed_scale
    }

    /// Whether the cadence is paused.
    #[inline]
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Scaled delta of the most recent step, in seconds.
    #[inline]
    #[must_use]
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Steps fired so far.
    #[inline]
    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Time of the most recent step (or of [`stamp`](Self::stamp)).
    #[inline]
    #[must_use]
    pub fn previous_step(&self) -> HostTime {
        self.previous_step
    }

    pub(crate) fn set_frame_rate(&mut self, frame_rate: f64) {
        self.frame_rate = frame_rate;
    }

    pub(crate) fn set_time_scale(&mut self, time_scale: f64) {
        self.time_scale = time_scale;
    }

    pub(crate) fn set_speed_scale(&mut self, speed_scale: f64) {
        self.speed_scale = speed_scale;
    }

    pub(crate) fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Restarts interval measurement at `now`.
    pub(crate) fn stamp(&mut self, now: HostTime) {
        self.previous_step = now;
    }

    /// Step interval, or `None` if the cadence can never fire.
    #[must_use]
    pub fn interval(&self, timebase: Timebase) -> Option<Duration> {
        let runnable = self.frame_rate > 0.0 && self.speed_scale >= 0.0;
        if !runnable {
            return None;
        }
        Some(Duration::from_secs_f64(
            self.speed_scale / self.frame_rate,
            timebase,
        ))
    }

    /// Fires the cadence if its interval has elapsed at `now`.
    ///
    /// On a step, returns the unscaled elapsed time and records the scaled
    /// delta, the step time, and the step count.
    pub fn try_step(&mut self, now: HostTime, timebase: Timebase) -> Option<Duration> {
        if self.paused {
            return None;
        }
        let interval = self.interval(timebase)?;
        let elapsed = now.saturating_duration_since(self.previous_step);
        if elapsed < interval {
            return None;
        }
        self.delta = elapsed.as_secs_f64(timebase) * self.time_scale;
        self.previous_step = now;
        self.step_count += 1;
        Some(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn at(ns: u64) -> HostTime {
        HostTime(ns)
    }

    #[test]
    fn fires_on_whole_intervals() {
        let mut c = Cadence::new(CadenceKind::Process, CadenceConfig::at(10.0));
        let tb = Timebase::NANOS;
        assert_eq!(c.interval(tb), Some(Duration(100_000_000)), "100ms");
        assert!(c.try_step(at(99_999_999), tb).is_none(), "too early");
        assert_eq!(c.try_step(at(100_000_000), tb), Some(Duration(100_000_000)), "on time");
        assert!((c.delta() - 0.1).abs() < EPS, "delta in seconds");
        assert_eq!(c.step_count(), 1, "counted");
        assert!(c.try_step(at(150_000_000), tb).is_none(), "measured from last step");
    }

    #[test]
    fn interval_is_floored_to_nanoseconds() {
        let c = Cadence::new(CadenceKind::Render, CadenceConfig::at(30.0));
        assert_eq!(c.interval(Timebase::NANOS), Some(Duration(33_333_333)), "floored");
    }

    #[test]
    fn scales_apply_to_interval_and_delta() {
        let config = CadenceConfig {
            frame_rate: 10.0,
            time_scale: 0.5,
            speed_scale: 2.0,
            paused: false,
        };
        let mut c = Cadence::new(CadenceKind::Process, config);
        let tb = Timebase::NANOS;
        assert!(c.try_step(at(100_000_000), tb).is_none(), "speed scale doubles interval");
        assert!(c.try_step(at(200_000_000), tb).is_some(), "fires at 200ms");
        assert!((c.delta() - 0.1).abs() < EPS, "time scale halves delta");
    }

    #[test]
    fn disabled_and_paused_never_fire() {
        let tb = Timebase::NANOS;
        let mut zero = Cadence::new(CadenceKind::Physics, CadenceConfig::at(0.0));
        assert_eq!(zero.interval(tb), None, "no interval");
        assert!(zero.try_step(at(u64::MAX), tb).is_none(), "zero rate");

        let mut paused = Cadence::new(CadenceKind::Physics, CadenceConfig::at(60.0));
        paused.set_paused(true);
        assert!(paused.try_step(at(1_000_000_000), tb).is_none(), "paused");
        paused.set_paused(false);
        assert!(paused.try_step(at(1_000_000_000), tb).is_some(), "resumed");
    }

    #[test]
    fn stall_fires_once() {
        let mut c = Cadence::new(CadenceKind::Process, CadenceConfig::at(10.0));
        let tb = Timebase::NANOS;
        assert!(c.try_step(at(1_000_000_000), tb).is_some(), "fires after stall");
        assert!((c.delta() - 1.0).abs() < EPS, "whole stall in delta");
        assert!(c.try_step(at(1_000_000_001), tb).is_none(), "no catch-up");
    }
}
