// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as tagged, fixed-size little-endian records. [`decode`] reads
//! them back as an iterator of [`RecordedEvent`].

use subduction_core::time::{Duration, HostTime};
use subduction_core::trace::{
    CadenceKind, EventsDrainedEvent, FlushEvent, RenderPassEvent, StepBeginEvent, StepEndEvent,
    TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_EVENTS_DRAINED: u8 = 1;
const TAG_STEP_BEGIN: u8 = 2;
const TAG_STEP_END: u8 = 3;
const TAG_FLUSH: u8 = 4;
const TAG_RENDER_PASS: u8 = 5;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_cadence(&mut self, c: CadenceKind) {
        self.write_u8(match c {
            CadenceKind::Render => 0,
            CadenceKind::Process => 1,
            CadenceKind::Physics => 2,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_events_drained(&mut self, e: &EventsDrainedEvent) {
        self.write_u8(TAG_EVENTS_DRAINED);
        self.write_u64(e.iteration);
        self.write_u64(e.timestamp.ticks());
        self.write_u32(e.platform_events);
        self.write_u32(e.action_events);
    }

    fn on_step_begin(&mut self, e: &StepBeginEvent) {
        self.write_u8(TAG_STEP_BEGIN);
        self.write_cadence(e.cadence);
        self.write_u64(e.step_index);
        self.write_u64(e.timestamp.ticks());
    }

    fn on_step_end(&mut self, e: &StepEndEvent) {
        self.write_u8(TAG_STEP_END);
        self.write_cadence(e.cadence);
        self.write_u64(e.step_index);
        self.write_u64(e.timestamp.ticks());
        self.write_u64(e.elapsed.ticks());
    }

    fn on_flush(&mut self, e: &FlushEvent) {
        self.write_u8(TAG_FLUSH);
        self.write_u64(e.step_index);
        self.write_u64(e.timestamp.ticks());
        self.write_u32(e.actions_run);
        self.write_u32(e.nodes_freed);
    }

    fn on_render_pass(&mut self, e: &RenderPassEvent) {
        self.write_u8(TAG_RENDER_PASS);
        self.write_u64(e.step_index);
        self.write_u32(e.items_visited);
        self.write_u32(e.items_skipped);
        self.write_u32(e.draws_issued);
        self.write_u32(e.draws_culled);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// An [`EventsDrainedEvent`].
    EventsDrained(EventsDrainedEvent),
    /// A [`StepBeginEvent`].
    StepBegin(StepBeginEvent),
    /// A [`StepEndEvent`].
    StepEnd(StepEndEvent),
    /// A [`FlushEvent`].
    Flush(FlushEvent),
    /// A [`RenderPassEvent`].
    RenderPass(RenderPassEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first unknown tag or truncated record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let end = self.pos.checked_add(N)?;
        let bytes = self.data.get(self.pos..end)?.try_into().ok()?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.read_array::<1>().map(|[b]| b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.read_array().map(u64::from_le_bytes)
    }

    fn read_cadence(&mut self) -> Option<CadenceKind> {
        match self.read_u8()? {
            0 => Some(CadenceKind::Render),
            1 => Some(CadenceKind::Process),
            2 => Some(CadenceKind::Physics),
            _ => None,
        }
    }

    fn decode_events_drained(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::EventsDrained(EventsDrainedEvent {
            iteration: self.read_u64()?,
            timestamp: HostTime(self.read_u64()?),
            platform_events: self.read_u32()?,
            action_events: self.read_u32()?,
        }))
    }

    fn decode_step_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::StepBegin(StepBeginEvent {
            cadence: self.read_cadence()?,
            step_index: self.read_u64()?,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_step_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::StepEnd(StepEndEvent {
            cadence: self.read_cadence()?,
            step_index: self.read_u64()?,
            timestamp: HostTime(self.read_u64()?),
            elapsed: Duration(self.read_u64()?),
        }))
    }

    fn decode_flush(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Flush(FlushEvent {
            step_index: self.read_u64()?,
            timestamp: HostTime(self.read_u64()?),
            actions_run: self.read_u32()?,
            nodes_freed: self.read_u32()?,
        }))
    }

    fn decode_render_pass(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::RenderPass(RenderPassEvent {
            step_index: self.read_u64()?,
            items_visited: self.read_u32()?,
            items_skipped: self.read_u32()?,
            draws_issued: self.read_u32()?,
            draws_culled: self.read_u32()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_EVENTS_DRAINED => self.decode_events_drained(),
            TAG_STEP_BEGIN => self.decode_step_begin(),
            TAG_STEP_END => self.decode_step_end(),
            TAG_FLUSH => self.decode_flush(),
            TAG_RENDER_PASS => self.decode_render_pass(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn record_one_process_step(rec: &mut RecorderSink) {
        rec.on_events_drained(&EventsDrainedEvent {
            iteration: 3,
            timestamp: HostTime(100),
            platform_events: 2,
            action_events: 1,
        });
        rec.on_step_begin(&StepBeginEvent {
            cadence: CadenceKind::Process,
            step_index: 9,
            timestamp: HostTime(110),
        });
        rec.on_flush(&FlushEvent {
            step_index: 9,
            timestamp: HostTime(150),
            actions_run: 4,
            nodes_freed: 2,
        });
        rec.on_step_end(&StepEndEvent {
            cadence: CadenceKind::Process,
            step_index: 9,
            timestamp: HostTime(160),
            elapsed: Duration(100_000_000),
        });
    }

    #[test]
    fn a_process_step_decodes_in_order() {
        let mut rec = RecorderSink::new();
        record_one_process_step(&mut rec);
        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 4, "four records");
        assert!(
            matches!(&events[0], RecordedEvent::EventsDrained(e) if e.platform_events == 2),
            "drain first"
        );
        assert!(
            matches!(&events[1], RecordedEvent::StepBegin(e) if e.cadence == CadenceKind::Process),
            "step begins"
        );
        assert_eq!(
            events[2],
            RecordedEvent::Flush(FlushEvent {
                step_index: 9,
                timestamp: HostTime(150),
                actions_run: 4,
                nodes_freed: 2,
            }),
            "flush counters kept"
        );
        assert!(
            matches!(&events[3], RecordedEvent::StepEnd(e) if e.elapsed == Duration(100_000_000)),
            "elapsed kept"
        );
    }

    #[test]
    fn render_pass_stats_survive() {
        let mut rec = RecorderSink::new();
        let stats = RenderPassEvent {
            step_index: 1,
            items_visited: 5,
            items_skipped: 1,
            draws_issued: 7,
            draws_culled: 3,
        };
        rec.on_render_pass(&stats);
        let events: Vec<_> = decode(&rec.into_bytes()).collect();
        assert_eq!(events, [RecordedEvent::RenderPass(stats)], "stats decoded");
    }

    #[test]
    fn truncated_and_unknown_records_stop_decoding() {
        let mut rec = RecorderSink::new();
        record_one_process_step(&mut rec);
        let bytes = rec.into_bytes();
        let truncated = &bytes[..bytes.len() - 1];
        assert_eq!(decode(truncated).count(), 3, "partial record dropped");
        assert_eq!(decode(&[0xff, 0, 0]).count(), 0, "unknown tag");
        assert_eq!(decode(&[]).count(), 0, "empty");
    }
}
