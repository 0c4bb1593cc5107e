// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Handles, geometry, time and tracing primitives for a retained 2D scene
//! runtime.
//!
//! `subduction_core` holds the small, dependency-light types that both the
//! renderer and the scene tree build on. It is `no_std` compatible (with
//! `alloc`).
//!
//! # Architecture
//!
//! ```text
//!   Clock ──► HostTime ──► cadence gates (subduction_scene)
//!
//!   UidAllocator ──► Uid ──► renderer tables (subduction_render)
//!
//!   Transform2d / Color ──► global resolution along a parent chain
//! ```
//!
//! **[`uid`]**: Non-zero wrapping handles naming renderer-owned objects.
//!
//! **[`geometry`]**: Decomposed [`Transform2d`](geometry::Transform2d),
//! [`Color`](geometry::Color), and rectangle overlap tests built on `kurbo`.
//!
//! **[`time`]**: Monotonic [`HostTime`](time::HostTime), tick
//! [`Duration`](time::Duration), and rational
//! [`Timebase`](time::Timebase) conversion.
//!
//! **[`clock`]**: The [`Clock`](clock::Clock) trait the frame loop reads
//! time from, plus a deterministic [`ManualClock`](clock::ManualClock).
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! frame-loop instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod clock;
pub mod geometry;
pub mod time;
pub mod trace;
pub mod uid;

pub use kurbo;
