// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are converted to microseconds using a [`Timebase`].

use std::io::Write;

use subduction_core::time::{HostTime, Timebase};
use subduction_core::trace::{
    EventsDrainedEvent, FlushEvent, RenderPassEvent, StepBeginEvent, StepEndEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    timebase: Timebase,
    quiet_drains: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .field("quiet_drains", &self.quiet_drains)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self::with_writer(Box::new(std::io::stderr()), timebase)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W, timebase: Timebase) -> Self {
        Self {
            writer,
            timebase,
            quiet_drains: true,
        }
    }

    /// Also print event drains that saw no platform events.
    #[must_use]
    pub fn verbose(mut self) -> Self {
        self.quiet_drains = false;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn ticks_to_us(&self, ticks: u64) -> f64 {
        self.timebase.ticks_to_nanos(ticks) as f64 / 1000.0
    }

    fn host_us(&self, t: HostTime) -> f64 {
        self.ticks_to_us(t.ticks())
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_events_drained(&mut self, e: &EventsDrainedEvent) {
        if self.quiet_drains && e.platform_events == 0 {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[events] iteration={} platform={} actions={} at {:.1}µs",
            e.iteration,
            e.platform_events,
            e.action_events,
            self.host_us(e.timestamp),
        );
    }

    fn on_step_begin(&mut self, e: &StepBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[{}:begin] step={} at {:.1}µs",
            e.cadence.name(),
            e.step_index,
            self.host_us(e.timestamp),
        );
    }

    fn on_step_end(&mut self, e: &StepEndEvent) {
        let _ = writeln!(
            self.writer,
            "[{}:end] step={} at {:.1}µs elapsed={:.1}µs",
            e.cadence.name(),
            e.step_index,
            self.host_us(e.timestamp),
            self.ticks_to_us(e.elapsed.ticks()),
        );
    }

    fn on_flush(&mut self, e: &FlushEvent) {
        let _ = writeln!(
            self.writer,
            "[flush] step={} actions={} freed={}",
            e.step_index, e.actions_run, e.nodes_freed,
        );
    }

    fn on_render_pass(&mut self, e: &RenderPassEvent) {
        let _ = writeln!(
            self.writer,
            "[draw] step={} items={} skipped={} issued={} culled={}",
            e.step_index, e.items_visited, e.items_skipped, e.draws_issued, e.draws_culled,
        );
    }
}
