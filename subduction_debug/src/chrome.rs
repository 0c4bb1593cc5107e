// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Each cadence gets its own track (`tid`) and its sub-steps become duration
//! slices. Flushes are instant events on the process track; render passes
//! are counter samples.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use subduction_core::time::Timebase;
use subduction_core::trace::CadenceKind;

use crate::recorder::{RecordedEvent, decode};

/// Track used for event-drain instants.
const EVENTS_TID: usize = CadenceKind::ALL.len();

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Timestamps are converted to microseconds using the provided [`Timebase`].
/// Render-pass records carry no timestamp and are placed at the most recent
/// timestamp seen in the stream.
pub fn export(bytes: &[u8], timebase: Timebase, writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut last_us = 0.0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::EventsDrained(e) => {
                last_us = ticks_to_us(e.timestamp.ticks(), timebase);
                if e.platform_events == 0 {
                    continue;
                }
                events.push(json!({
                    "ph": "i",
                    "name": "Events",
                    "cat": "Input",
                    "ts": last_us,
                    "pid": 0,
                    "tid": EVENTS_TID,
                    "s": "t",
                    "args": {
                        "iteration": e.iteration,
                        "platform_events": e.platform_events,
                        "action_events": e.action_events,
                    }
                }));
            }
            RecordedEvent::StepBegin(e) => {
                last_us = ticks_to_us(e.timestamp.ticks(), timebase);
                events.push(json!({
                    "ph": "B",
                    "name": e.cadence.name(),
                    "cat": "Cadence",
                    "ts": last_us,
                    "pid": 0,
                    "tid": e.cadence.index(),
                    "args": {
                        "step_index": e.step_index,
                    }
                }));
            }
            RecordedEvent::StepEnd(e) => {
                last_us = ticks_to_us(e.timestamp.ticks(), timebase);
                events.push(json!({
                    "ph": "E",
                    "name": e.cadence.name(),
                    "cat": "Cadence",
                    "ts": last_us,
                    "pid": 0,
                    "tid": e.cadence.index(),
                    "args": {
                        "step_index": e.step_index,
                        "elapsed_us": ticks_to_us(e.elapsed.ticks(), timebase),
                    }
                }));
            }
            RecordedEvent::Flush(e) => {
                last_us = ticks_to_us(e.timestamp.ticks(), timebase);
                events.push(json!({
                    "ph": "i",
                    "name": "Flush",
                    "cat": "Deferred",
                    "ts": last_us,
                    "pid": 0,
                    "tid": CadenceKind::Process.index(),
                    "s": "t",
                    "args": {
                        "step_index": e.step_index,
                        "actions_run": e.actions_run,
                        "nodes_freed": e.nodes_freed,
                    }
                }));
            }
            RecordedEvent::RenderPass(e) => {
                events.push(json!({
                    "ph": "C",
                    "name": "RenderPass",
                    "cat": "Renderer",
                    "ts": last_us,
                    "pid": 0,
                    "tid": CadenceKind::Render.index(),
                    "args": {
                        "items_visited": e.items_visited,
                        "items_skipped": e.items_skipped,
                        "draws_issued": e.draws_issued,
                        "draws_culled": e.draws_culled,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn ticks_to_us(ticks: u64, timebase: Timebase) -> f64 {
    timebase.ticks_to_nanos(ticks) as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use subduction_core::time::{Duration, HostTime};
    use subduction_core::trace::{
        EventsDrainedEvent, RenderPassEvent, StepBeginEvent, StepEndEvent, TraceSink,
    };

    fn export_to_json(rec: &RecorderSink) -> Vec<Value> {
        let mut out = Vec::new();
        export(rec.as_bytes(), Timebase::NANOS, &mut out).unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    fn steps_become_slices_on_their_cadence_track() {
        let mut rec = RecorderSink::new();
        rec.on_events_drained(&EventsDrainedEvent {
            iteration: 1,
            timestamp: HostTime(500),
            platform_events: 0,
            action_events: 0,
        });
        rec.on_step_begin(&StepBeginEvent {
            cadence: CadenceKind::Render,
            step_index: 0,
            timestamp: HostTime(1_000),
        });
        rec.on_render_pass(&RenderPassEvent {
            step_index: 0,
            draws_issued: 2,
            ..RenderPassEvent::default()
        });
        rec.on_step_end(&StepEndEvent {
            cadence: CadenceKind::Render,
            step_index: 0,
            timestamp: HostTime(3_000),
            elapsed: Duration(33_333_333),
        });

        let parsed = export_to_json(&rec);
        assert_eq!(parsed.len(), 3, "empty drain omitted");
        assert_eq!(parsed[0]["ph"], "B", "slice begins");
        assert_eq!(parsed[0]["name"], "render", "named after the cadence");
        assert_eq!(parsed[0]["tid"], 0, "render track");
        assert_eq!(parsed[1]["ph"], "C", "counter sample");
        assert_eq!(parsed[1]["ts"], 1.0, "placed at the last timestamp");
        assert_eq!(parsed[1]["args"]["draws_issued"], 2, "counter value");
        assert_eq!(parsed[2]["ph"], "E", "slice ends");
    }

    #[test]
    fn export_empty_recording() {
        let parsed = export_to_json(&RecorderSink::new());
        assert!(parsed.is_empty(), "no events");
    }
}
