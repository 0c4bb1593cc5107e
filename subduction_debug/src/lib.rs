// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for the frame loop's
//! trace events.
//!
//! This crate provides [`TraceSink`](subduction_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: one human-readable line per event.
//! - [`recorder::RecorderSink`]: compact binary recording, with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`]: Chrome Trace Event Format JSON from recorded bytes,
//!   one track per cadence.
//!
//! Events only reach a sink when `subduction_scene` is built with its
//! `trace` feature.

pub mod chrome;
pub mod pretty;
pub mod recorder;
