// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Platform collaborators of the frame loop.
//!
//! The loop talks to the window system through [`Surface`] and to an
//! optional physics engine through [`PhysicsBridge`]. Time comes from a
//! [`Clock`]. [`HeadlessSurface`] and [`SystemClock`] are the stock
//! implementations for tests and headless runs.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Instant;

use kurbo::Size;
use subduction_core::clock::Clock;
use subduction_core::time::{HostTime, Timebase};

use crate::input::PlatformEvent;

/// Failure to bring up the render surface.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    /// The platform refused to create the window or context.
    #[error("surface creation failed: {0}")]
    Create(String),
    /// No display is available.
    #[error("no display available")]
    NoDisplay,
}

/// The window (or offscreen target) the loop renders into.
pub trait Surface {
    /// Creates the platform resources. Called once, before the renderer is
    /// built.
    fn create(&mut self) -> Result<(), SurfaceError>;

    /// Drawable size in pixels.
    fn size(&self) -> Size;

    /// Display refresh rate in hertz, if known.
    fn refresh_rate(&self) -> Option<f64> {
        None
    }

    /// Returns the next pending event, if any.
    fn poll_event(&mut self) -> Option<PlatformEvent>;
}

/// Steps an external physics simulation.
pub trait PhysicsBridge {
    /// Advances the simulation by `delta` scaled seconds.
    fn step(&mut self, delta: f64);
}

/// A surface with a fixed size and a scripted event queue.
///
/// Clones share the queue, so a test can keep a handle and push events while
/// the loop owns the surface.
#[derive(Clone, Debug)]
pub struct HeadlessSurface {
    size: Size,
    refresh_rate: Option<f64>,
    events: Rc<RefCell<VecDeque<PlatformEvent>>>,
    failure: Option<SurfaceError>,
}

impl HeadlessSurface {
    /// Creates a surface of the given size.
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self {
            size,
            refresh_rate: None,
            events: Rc::default(),
            failure: None,
        }
    }

    /// Reports `hz` as the display refresh rate.
    #[must_use]
    pub fn with_refresh_rate(mut self, hz: f64) -> Self {
        self.refresh_rate = Some(hz);
        self
    }

    /// Makes [`Surface::create`] fail with `error`.
    #[must_use]
    pub fn failing(mut self, error: SurfaceError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Queues an event for the loop to poll.
    pub fn push_event(&self, event: PlatformEvent) {
        self.events.borrow_mut().push_back(event);
    }

    /// Number of events not yet polled.
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.events.borrow().len()
    }
}

impl Surface for HeadlessSurface {
    fn create(&mut self) -> Result<(), SurfaceError> {
        match self.failure.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn size(&self) -> Size {
        self.size
    }

    fn refresh_rate(&self) -> Option<f64> {
        self.refresh_rate
    }

    fn poll_event(&mut self) -> Option<PlatformEvent> {
        let event = self.events.borrow_mut().pop_front();
        if let Some(PlatformEvent::Resized { width, height }) = event {
            self.size = Size::new(f64::from(width), f64::from(height));
        }
        event
    }
}

/// Monotonic wall clock in nanoseconds since its creation.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Starts a clock at tick zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> HostTime {
        let nanos = self.origin.elapsed().as_nanos();
        HostTime(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    fn timebase(&self) -> Timebase {
        Timebase::NANOS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_events_are_shared_between_clones() {
        let handle = HeadlessSurface::new(Size::new(64.0, 32.0));
        let mut surface = handle.clone();
        handle.push_event(PlatformEvent::Quit);
        assert_eq!(surface.pending_events(), 1, "shared queue");
        assert_eq!(surface.poll_event(), Some(PlatformEvent::Quit), "fifo");
        assert_eq!(surface.poll_event(), None, "drained");
    }

    #[test]
    fn resize_updates_the_reported_size() {
        let mut surface = HeadlessSurface::new(Size::new(64.0, 32.0));
        surface.push_event(PlatformEvent::Resized {
            width: 100,
            height: 50,
        });
        surface.poll_event();
        assert_eq!(surface.size(), Size::new(100.0, 50.0), "resized");
    }

    #[test]
    fn failing_surface_reports_its_error() {
        let mut surface =
            HeadlessSurface::new(Size::ZERO).failing(SurfaceError::NoDisplay);
        assert_eq!(surface.create(), Err(SurfaceError::NoDisplay), "error kept");
        assert_eq!(
            SurfaceError::Create("gl".to_owned()).to_string(),
            "surface creation failed: gl",
            "display text"
        );
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a, "monotonic");
    }
}
