// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node identity, per-node storage, and the behavior hook.
//!
//! Nodes live in the [`SceneTree`]'s slot arena and are addressed by
//! [`NodeId`], a slot index plus a generation counter. Freeing a node bumps
//! its slot's generation, so every `NodeId` still pointing at it becomes
//! stale and every operation through it becomes a no-op.
//!
//! Custom per-node logic is attached as a [`Behavior`]. The tree takes the
//! behavior out of its slot for the duration of a callback, hands it a
//! [`NodeContext`] with full mutable access to the tree, and puts it back
//! afterwards. Notifications the node receives in the meantime are held and
//! delivered as soon as the running callback returns.

use core::fmt;

use kurbo::{Point, Rect};
use subduction_core::geometry::{Color, Transform2d};
use subduction_core::uid::Uid;
use subduction_render::{Flip, PixelRect};

use crate::canvas::CanvasState;
use crate::input::ActionEvent;
use crate::notification::Notification;
use crate::signal::SignalTable;
use crate::tree::SceneTree;

/// A handle to a node in a [`SceneTree`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    /// Slot index into the tree's arena.
    pub(crate) idx: u32,
    /// Generation counter; must match the slot's generation.
    pub(crate) generation: u32,
}

impl NodeId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}@gen{})", self.idx, self.generation)
    }
}

/// Per-node storage.
pub(crate) struct NodeData {
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) inside_tree: bool,
    pub(crate) ready: bool,
    pub(crate) queued_for_deletion: bool,
    pub(crate) behavior: Option<Box<dyn Behavior>>,
    pub(crate) signals: SignalTable,
    pub(crate) canvas: Option<CanvasState>,
}

impl NodeData {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            parent: None,
            children: Vec::new(),
            inside_tree: false,
            ready: false,
            queued_for_deletion: false,
            behavior: None,
            signals: SignalTable::default(),
            canvas: None,
        }
    }
}

impl fmt::Debug for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeData")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("inside_tree", &self.inside_tree)
            .field("ready", &self.ready)
            .field("queued_for_deletion", &self.queued_for_deletion)
            .field("has_behavior", &self.behavior.is_some())
            .field("canvas", &self.canvas)
            .finish_non_exhaustive()
    }
}

/// Custom logic attached to a node.
///
/// Every method has an empty default. The typed callbacks run before the
/// catch-all [`notification`](Self::notification), which sees every
/// notification the node receives.
pub trait Behavior {
    /// The node and its subtree entered the tree for the first time.
    fn ready(&mut self, ctx: &mut NodeContext<'_>) {
        _ = ctx;
    }

    /// Process cadence step; `delta` is the scaled elapsed seconds.
    fn process(&mut self, ctx: &mut NodeContext<'_>, delta: f64) {
        _ = (ctx, delta);
    }

    /// Render cadence step, before the renderer pass.
    fn render(&mut self, ctx: &mut NodeContext<'_>, delta: f64) {
        _ = (ctx, delta);
    }

    /// Physics cadence step, after the physics bridge has stepped.
    fn physics_process(&mut self, ctx: &mut NodeContext<'_>, delta: f64) {
        _ = (ctx, delta);
    }

    /// An input action was triggered.
    fn input(&mut self, ctx: &mut NodeContext<'_>, event: &ActionEvent) {
        _ = (ctx, event);
    }

    /// A canvas node's drawing items were cleared; resubmit them through
    /// the context's drawing calls.
    fn draw(&mut self, ctx: &mut NodeContext<'_>) {
        _ = ctx;
    }

    /// Any notification, after the typed callback.
    fn notification(&mut self, ctx: &mut NodeContext<'_>, what: &Notification) {
        _ = (ctx, what);
    }
}

/// Access handed to a [`Behavior`] callback.
pub struct NodeContext<'a> {
    /// The whole tree. The node's behavior is detached while the callback
    /// runs.
    pub tree: &'a mut SceneTree,
    /// The node receiving the callback.
    pub id: NodeId,
}

impl fmt::Debug for NodeContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeContext")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl NodeContext<'_> {
    /// Schedules this node for deletion at the next deferred flush.
    pub fn queue_free(&mut self) {
        self.tree.queue_free(self.id);
    }

    /// Returns this node's canvas item handle, if it has one.
    #[must_use]
    pub fn canvas_item(&self) -> Option<Uid> {
        self.tree.canvas_item(self.id)
    }

    /// Draws a whole texture through this node's canvas item.
    pub fn draw_texture(
        &mut self,
        texture: Uid,
        flip: Flip,
        tint: Color,
        transform: Transform2d,
    ) -> bool {
        self.tree.draw_texture(self.id, texture, flip, tint, transform)
    }

    /// Draws a texture region through this node's canvas item.
    pub fn draw_texture_region(
        &mut self,
        texture: Uid,
        src: PixelRect,
        flip: Flip,
        tint: Color,
        transform: Transform2d,
    ) -> bool {
        self.tree
            .draw_texture_region(self.id, texture, src, flip, tint, transform)
    }

    /// Draws a line through this node's canvas item.
    pub fn draw_line(&mut self, from: Point, to: Point, tint: Color) -> bool {
        self.tree.draw_line(self.id, from, to, tint)
    }

    /// Draws a polyline through this node's canvas item.
    pub fn draw_lines(&mut self, points: &[Point], tint: Color) -> bool {
        self.tree.draw_lines(self.id, points, tint)
    }

    /// Draws a rectangle through this node's canvas item.
    pub fn draw_rect(&mut self, rect: Rect, tint: Color, filled: bool) -> bool {
        self.tree.draw_rect(self.id, rect, tint, filled)
    }

    /// Draws several rectangles through this node's canvas item.
    pub fn draw_rects(&mut self, rects: &[Rect], tint: Color, filled: bool) -> bool {
        self.tree.draw_rects(self.id, rects, tint, filled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_debug_format() {
        let id = NodeId {
            idx: 3,
            generation: 2,
        };
        assert_eq!(format!("{id:?}"), "NodeId(3@gen2)", "debug format");
        assert_eq!((id.index(), id.generation()), (3, 2), "accessors");
    }
}
