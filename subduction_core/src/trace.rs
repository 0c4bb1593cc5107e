// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the frame loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! frame loop calls as it drains events and runs cadence sub-steps. All method
//! bodies default to no-ops, so implementing only the events you care about is
//! fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).

use crate::time::{Duration, HostTime};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which independently-timed sub-loop a step belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CadenceKind {
    /// Render notification followed by a renderer pass.
    Render,
    /// Process notification followed by the deferred flush.
    Process,
    /// Physics bridge step followed by the physics notification.
    Physics,
}

impl CadenceKind {
    /// All cadences, in the fixed order the loop checks them.
    pub const ALL: [Self; 3] = [Self::Render, Self::Process, Self::Physics];

    /// Returns the position of this cadence in [`ALL`](Self::ALL).
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Render => 0,
            Self::Process => 1,
            Self::Physics => 2,
        }
    }

    /// Returns a short lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Render => "render",
            Self::Process => "process",
            Self::Physics => "physics",
        }
    }
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted after the loop drains platform events for one iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventsDrainedEvent {
    /// Loop iteration counter.
    pub iteration: u64,
    /// Host time when draining finished.
    pub timestamp: HostTime,
    /// Number of platform events pulled from the surface.
    pub platform_events: u32,
    /// Number of those that mapped to an action and were propagated.
    pub action_events: u32,
}

/// Marks the beginning of a cadence sub-step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepBeginEvent {
    /// Which cadence is stepping.
    pub cadence: CadenceKind,
    /// Step counter of that cadence before this step.
    pub step_index: u64,
    /// Host time at the start of the step.
    pub timestamp: HostTime,
}

/// Marks the end of a cadence sub-step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepEndEvent {
    /// Which cadence stepped.
    pub cadence: CadenceKind,
    /// Step counter of that cadence before this step.
    pub step_index: u64,
    /// Host time at the end of the step.
    pub timestamp: HostTime,
    /// Elapsed time since the previous step of this cadence, unscaled.
    pub elapsed: Duration,
}

/// Emitted after the process cadence flushes the deferred queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlushEvent {
    /// Process step counter.
    pub step_index: u64,
    /// Host time when the flush finished.
    pub timestamp: HostTime,
    /// Deferred actions (calls, redraws) executed.
    pub actions_run: u32,
    /// Nodes deleted.
    pub nodes_freed: u32,
}

/// Emitted after each renderer pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderPassEvent {
    /// Render step counter.
    pub step_index: u64,
    /// Canvas items visited in z order.
    pub items_visited: u32,
    /// Items skipped because they were invisible or empty.
    pub items_skipped: u32,
    /// Drawing items issued to the backend.
    pub draws_issued: u32,
    /// Drawing items rejected by viewport culling.
    pub draws_culled: u32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the frame loop.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called after platform events are drained.
    fn on_events_drained(&mut self, e: &EventsDrainedEvent) {
        _ = e;
    }

    /// Called at the beginning of a cadence sub-step.
    fn on_step_begin(&mut self, e: &StepBeginEvent) {
        _ = e;
    }

    /// Called at the end of a cadence sub-step.
    fn on_step_end(&mut self, e: &StepEndEvent) {
        _ = e;
    }

    /// Called after the deferred queue is flushed.
    fn on_flush(&mut self, e: &FlushEvent) {
        _ = e;
    }

    /// Called after a renderer pass.
    fn on_render_pass(&mut self, e: &RenderPassEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer from an optional sink.
    #[inline]
    #[must_use]
    pub fn from_option(sink: Option<&'a mut dyn TraceSink>) -> Self {
        match sink {
            Some(s) => Self::new(s),
            None => Self::none(),
        }
    }

    /// Emits an [`EventsDrainedEvent`].
    #[inline]
    pub fn events_drained(&mut self, e: &EventsDrainedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_events_drained(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`StepBeginEvent`].
    #[inline]
    pub fn step_begin(&mut self, e: &StepBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_step_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`StepEndEvent`].
    #[inline]
    pub fn step_end(&mut self, e: &StepEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_step_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FlushEvent`].
    #[inline]
    pub fn flush(&mut self, e: &FlushEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_flush(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RenderPassEvent`].
    #[inline]
    pub fn render_pass(&mut self, e: &RenderPassEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_render_pass(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_begin() -> StepBeginEvent {
        StepBeginEvent {
            cadence: CadenceKind::Process,
            step_index: 3,
            timestamp: HostTime(1_000_000),
        }
    }

    #[test]
    fn cadence_order_is_render_process_physics() {
        assert_eq!(
            CadenceKind::ALL,
            [CadenceKind::Render, CadenceKind::Process, CadenceKind::Physics],
            "fixed check order"
        );
        for (i, c) in CadenceKind::ALL.iter().enumerate() {
            assert_eq!(c.index(), i, "index matches position for {c:?}");
        }
        assert_eq!(CadenceKind::Physics.name(), "physics", "short name");
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_step_begin(&sample_begin());
        sink.on_render_pass(&RenderPassEvent::default());
        sink.on_flush(&FlushEvent {
            step_index: 0,
            timestamp: HostTime(0),
            actions_run: 0,
            nodes_freed: 0,
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.step_begin(&sample_begin());
        tracer.render_pass(&RenderPassEvent::default());
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            begins: Vec<(CadenceKind, u64)>,
        }
        impl TraceSink for RecordingSink {
            fn on_step_begin(&mut self, e: &StepBeginEvent) {
                self.begins.push((e.cadence, e.step_index));
            }
        }

        let mut sink = RecordingSink { begins: Vec::new() };
        let mut tracer = Tracer::from_option(Some(&mut sink));
        tracer.step_begin(&sample_begin());
        // Access sink after tracer is dropped.
        drop(tracer);
        assert_eq!(sink.begins, &[(CadenceKind::Process, 3)], "one begin recorded");
    }
}
