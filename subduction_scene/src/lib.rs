// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node tree, signals, canvas nodes, and the cooperative frame loop.
//!
//! This crate is the logical half of the scene runtime:
//!
//! - [`SceneTree`]: an arena of nodes addressed by generational [`NodeId`]s,
//!   with lifecycle [`Notification`]s, per-node [signals](signal), and canvas
//!   nodes mirrored into a [`Renderer`](subduction_render::Renderer)
//! - [`Behavior`]: the per-node callback hook
//! - [`MainLoop`]: the frame scheduler running the render, process, and
//!   physics cadences over a [`Surface`] and a [`Clock`](subduction_core::clock::Clock)
//! - [`ActionMap`] and [`InputState`]: the input action model
//!
//! # Example
//!
//! ```
//! use kurbo::{Rect, Size};
//! use subduction_core::clock::ManualClock;
//! use subduction_core::geometry::Color;
//! use subduction_core::time::HostTime;
//! use subduction_render::RecordingBackend;
//! use subduction_scene::{Behavior, HeadlessSurface, LoopConfig, MainLoop, NodeContext};
//!
//! struct Square;
//!
//! impl Behavior for Square {
//!     fn draw(&mut self, ctx: &mut NodeContext<'_>) {
//!         ctx.draw_rect(Rect::new(0.0, 0.0, 16.0, 16.0), Color::WHITE, true);
//!     }
//! }
//!
//! let backend = RecordingBackend::new();
//! let clock = ManualClock::new();
//! let mut main = MainLoop::new(
//!     LoopConfig::headless(),
//!     HeadlessSurface::new(Size::new(64.0, 64.0)),
//!     backend.clone(),
//!     clock.clone(),
//! );
//!
//! let tree = main.tree_mut();
//! let root = tree.root();
//! let square = tree.create_canvas_node("square");
//! tree.set_behavior(square, Square);
//! tree.add_child(root, square);
//!
//! main.begin();
//! for step in 1..=2 {
//!     clock.set(HostTime(step * 100_000_000));
//!     main.iterate();
//! }
//! assert_eq!(backend.draw_count(), 1);
//! ```

mod cadence;
mod canvas;
mod config;
mod deferred;
mod input;
mod main_loop;
mod node;
mod notification;
mod platform;
pub mod signal;
mod tree;

pub use cadence::Cadence;
pub use config::{CadenceConfig, LoopConfig};
pub use deferred::FlushStats;
pub use input::{
    ActionEvent, ActionMap, ActionStatus, Binding, DEFAULT_DEADZONE, InputDecoder, InputEvent,
    InputState, PlatformEvent,
};
pub use main_loop::{LoopState, MainLoop};
pub use node::{Behavior, NodeContext, NodeId};
pub use notification::Notification;
pub use platform::{HeadlessSurface, PhysicsBridge, Surface, SurfaceError, SystemClock};
pub use signal::{Callable, ConnectFlags, ConnectionId, Value};
pub use tree::{DEFAULT_NODE_NAME, ROOT_NAME, SceneTree};
