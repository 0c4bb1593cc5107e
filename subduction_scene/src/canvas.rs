// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canvas nodes: nodes mirrored into the renderer.
//!
//! A canvas node owns one canvas item for as long as it is inside the tree.
//! Its local attributes live in [`CanvasState`] and are pushed to the item by
//! a deferred redraw, which also clears the item's drawing items and sends
//! [`Notification::Draw`] so the behavior can resubmit them.
//!
//! The renderer's parent link always follows the logical parent: an item is
//! parented to the canvas item of the node's parent, or to nothing when the
//! parent is not a canvas node.

use kurbo::{Point, Rect, Vec2};
use subduction_core::geometry::{Color, Transform2d};
use subduction_core::uid::Uid;
use subduction_render::{BlendMode, Flip, PixelRect, ScaleMode};

use crate::deferred::DeferredAction;
use crate::node::NodeId;
use crate::notification::Notification;
use crate::tree::SceneTree;

/// Local attributes of a canvas node.
#[derive(Clone, Debug)]
pub(crate) struct CanvasState {
    pub(crate) item: Option<Uid>,
    pub(crate) transform: Transform2d,
    pub(crate) modulate: Color,
    pub(crate) visible: bool,
    pub(crate) z_index: i32,
    pub(crate) z_relative: bool,
    pub(crate) blend: BlendMode,
    pub(crate) scale_mode: ScaleMode,
    pub(crate) redraw_pending: bool,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            item: None,
            transform: Transform2d::IDENTITY,
            modulate: Color::WHITE,
            visible: true,
            z_index: 0,
            z_relative: true,
            blend: BlendMode::default(),
            scale_mode: ScaleMode::default(),
            redraw_pending: false,
        }
    }
}

impl SceneTree {
    /// Creates a detached canvas node.
    pub fn create_canvas_node(&mut self, name: &str) -> NodeId {
        let id = self.create_node(name);
        if let Some(node) = self.node_mut(id) {
            node.canvas = Some(CanvasState::default());
        }
        id
    }

    /// Returns `true` if `id` is a canvas node.
    #[must_use]
    pub fn is_canvas(&self, id: NodeId) -> bool {
        self.canvas(id).is_some()
    }

    /// Returns the node's canvas item, present while a canvas node is inside
    /// the tree.
    #[must_use]
    pub fn canvas_item(&self, id: NodeId) -> Option<Uid> {
        self.canvas(id).and_then(|c| c.item)
    }

    fn canvas(&self, id: NodeId) -> Option<&CanvasState> {
        self.node(id).and_then(|n| n.canvas.as_ref())
    }

    fn canvas_mut(&mut self, id: NodeId) -> Option<&mut CanvasState> {
        self.node_mut(id).and_then(|n| n.canvas.as_mut())
    }

    fn update_canvas(&mut self, id: NodeId, f: impl FnOnce(&mut CanvasState)) {
        if let Some(canvas) = self.canvas_mut(id) {
            f(canvas);
            self.queue_redraw(id);
        }
    }

    // -- Setters --

    /// Sets the local transform.
    pub fn set_transform(&mut self, id: NodeId, transform: Transform2d) {
        self.update_canvas(id, |c| c.transform = transform);
    }

    /// Sets the local origin.
    pub fn set_position(&mut self, id: NodeId, position: Vec2) {
        self.update_canvas(id, |c| c.transform.origin = position);
    }

    /// Sets the local rotation in radians.
    pub fn set_rotation(&mut self, id: NodeId, rotation: f64) {
        self.update_canvas(id, |c| c.transform.rotation = rotation);
    }

    /// Sets the local scale.
    pub fn set_scale(&mut self, id: NodeId, scale: Vec2) {
        self.update_canvas(id, |c| c.transform.scale = scale);
    }

    /// Sets the local tint.
    pub fn set_modulate(&mut self, id: NodeId, modulate: Color) {
        self.update_canvas(id, |c| c.modulate = modulate);
    }

    /// Shows or hides the node and its canvas descendants.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        self.update_canvas(id, |c| c.visible = visible);
    }

    /// Sets the local z-index.
    pub fn set_z_index(&mut self, id: NodeId, z: i32) {
        self.update_canvas(id, |c| c.z_index = z);
    }

    /// Sets whether the z-index adds to the parent's.
    pub fn set_z_relative(&mut self, id: NodeId, relative: bool) {
        self.update_canvas(id, |c| c.z_relative = relative);
    }

    /// Sets the blend mode.
    pub fn set_blend_mode(&mut self, id: NodeId, mode: BlendMode) {
        self.update_canvas(id, |c| c.blend = mode);
    }

    /// Sets the texture sampling mode.
    pub fn set_scale_mode(&mut self, id: NodeId, mode: ScaleMode) {
        self.update_canvas(id, |c| c.scale_mode = mode);
    }

    // -- Local getters --

    /// Local transform; identity for non-canvas nodes.
    #[must_use]
    pub fn transform(&self, id: NodeId) -> Transform2d {
        self.canvas(id).map_or(Transform2d::IDENTITY, |c| c.transform)
    }

    /// Local tint; white for non-canvas nodes.
    #[must_use]
    pub fn modulate(&self, id: NodeId) -> Color {
        self.canvas(id).map_or(Color::WHITE, |c| c.modulate)
    }

    /// Local visibility flag.
    #[must_use]
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.canvas(id).is_none_or(|c| c.visible)
    }

    /// Local z-index.
    #[must_use]
    pub fn z_index(&self, id: NodeId) -> i32 {
        self.canvas(id).map_or(0, |c| c.z_index)
    }

    // -- Global getters --

    /// Composed transform of the node's canvas item chain, or the local
    /// transform when the node has no item.
    #[must_use]
    pub fn global_transform(&self, id: NodeId) -> Transform2d {
        match self.canvas_item(id) {
            Some(uid) => self.renderer().global_transform(uid),
            None => self.transform(id),
        }
    }

    /// Product of the chain's tints, or the local tint without an item.
    #[must_use]
    pub fn global_modulate(&self, id: NodeId) -> Color {
        match self.canvas_item(id) {
            Some(uid) => self.renderer().global_modulate(uid),
            None => self.modulate(id),
        }
    }

    /// `true` if the node and every canvas ancestor are visible.
    #[must_use]
    pub fn is_visible_in_tree(&self, id: NodeId) -> bool {
        match self.canvas_item(id) {
            Some(uid) => self.renderer().is_visible_in_tree(uid),
            None => self.is_visible(id),
        }
    }

    /// Effective z-index, or the local one without an item.
    #[must_use]
    pub fn global_z_index(&self, id: NodeId) -> i32 {
        match self.canvas_item(id) {
            Some(uid) => self.renderer().global_z_index(uid),
            None => self.z_index(id),
        }
    }

    // -- Redraw --

    /// Schedules a redraw at the next deferred flush.
    ///
    /// No-op outside the tree or while a redraw is already pending.
    pub fn queue_redraw(&mut self, id: NodeId) {
        if !self.is_inside_tree(id) {
            return;
        }
        match self.canvas_mut(id) {
            Some(canvas) if !canvas.redraw_pending => canvas.redraw_pending = true,
            _ => return,
        }
        self.push_deferred(DeferredAction::Redraw(id));
    }

    pub(crate) fn run_redraw(&mut self, id: NodeId) {
        let Some(canvas) = self.canvas_mut(id) else {
            return;
        };
        canvas.redraw_pending = false;
        let Some(uid) = canvas.item else {
            return;
        };
        let state = canvas.clone();
        let renderer = self.renderer_mut();
        renderer.canvas_item_set_transform(uid, state.transform);
        renderer.canvas_item_set_modulate(uid, state.modulate);
        renderer.canvas_item_set_visible(uid, state.visible);
        renderer.canvas_item_set_z_index(uid, state.z_index);
        renderer.canvas_item_set_z_index_relative(uid, state.z_relative);
        renderer.canvas_item_set_blend_mode(uid, state.blend);
        renderer.canvas_item_set_scale_mode(uid, state.scale_mode);
        renderer.canvas_item_clear(uid);
        self.notification(id, &Notification::Draw);
    }

    // -- Built-in notification handling --

    pub(crate) fn canvas_notification(&mut self, id: NodeId, what: &Notification) {
        if !self.is_canvas(id) {
            return;
        }
        match what {
            Notification::EnterTree => {
                let uid = self.renderer_mut().create_canvas_item();
                if let Some(canvas) = self.canvas_mut(id) {
                    canvas.item = Some(uid);
                }
                self.link_parent_item(id);
                self.queue_redraw(id);
            }
            Notification::ExitTree => {
                let item = self.canvas_mut(id).and_then(|c| c.item.take());
                if let Some(uid) = item {
                    self.renderer_mut().remove_uid(uid);
                }
            }
            Notification::Parented => self.link_parent_item(id),
            Notification::Unparented => {
                if let Some(uid) = self.canvas_item(id) {
                    self.renderer_mut().canvas_item_set_parent(uid, None);
                }
            }
            _ => {}
        }
    }

    fn link_parent_item(&mut self, id: NodeId) {
        let Some(uid) = self.canvas_item(id) else {
            return;
        };
        let parent_item = self.parent(id).and_then(|p| self.canvas_item(p));
        self.renderer_mut().canvas_item_set_parent(uid, parent_item);
    }

    // -- Drawing --

    /// Draws a whole texture through the node's canvas item.
    pub fn draw_texture(
        &mut self,
        id: NodeId,
        texture: Uid,
        flip: Flip,
        tint: Color,
        transform: Transform2d,
    ) -> bool {
        let Some(uid) = self.canvas_item(id) else {
            return false;
        };
        self.renderer_mut()
            .canvas_item_add_texture(uid, texture, flip, tint, transform)
    }

    /// Draws a texture region through the node's canvas item.
    pub fn draw_texture_region(
        &mut self,
        id: NodeId,
        texture: Uid,
        src: PixelRect,
        flip: Flip,
        tint: Color,
        transform: Transform2d,
    ) -> bool {
        let Some(uid) = self.canvas_item(id) else {
            return false;
        };
        self.renderer_mut()
            .canvas_item_add_texture_region(uid, texture, src, flip, tint, transform)
    }

    /// Draws a line through the node's canvas item.
    pub fn draw_line(&mut self, id: NodeId, from: Point, to: Point, tint: Color) -> bool {
        let Some(uid) = self.canvas_item(id) else {
            return false;
        };
        self.renderer_mut().canvas_item_add_line(uid, from, to, tint)
    }

    /// Draws a polyline through the node's canvas item.
    pub fn draw_lines(&mut self, id: NodeId, points: &[Point], tint: Color) -> bool {
        let Some(uid) = self.canvas_item(id) else {
            return false;
        };
        self.renderer_mut().canvas_item_add_lines(uid, points, tint)
    }

    /// Draws a rectangle through the node's canvas item.
    pub fn draw_rect(&mut self, id: NodeId, rect: Rect, tint: Color, filled: bool) -> bool {
        let Some(uid) = self.canvas_item(id) else {
            return false;
        };
        self.renderer_mut().canvas_item_add_rect(uid, rect, tint, filled)
    }

    /// Draws several rectangles through the node's canvas item.
    pub fn draw_rects(&mut self, id: NodeId, rects: &[Rect], tint: Color, filled: bool) -> bool {
        let Some(uid) = self.canvas_item(id) else {
            return false;
        };
        self.renderer_mut().canvas_item_add_rects(uid, rects, tint, filled)
    }
}
