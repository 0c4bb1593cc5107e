// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The handle-indexed renderer.
//!
//! [`Renderer`] owns two tables keyed by [`Uid`]: canvas items and textures.
//! Everything outside the renderer refers to these objects by handle only and
//! re-resolves on every call, so a handle that outlives its entry is harmless:
//! mutations through it are silent no-ops and queries return a default.
//!
//! # Global resolution
//!
//! A canvas item's effective transform, tint, visibility and z-index are
//! computed on demand by walking its parent chain (see [`Ancestors`]). There
//! is no cache; every query re-walks the live chain, and the walk stops at the
//! first parent handle that no longer resolves.
//!
//! - **transform**: ancestor locals composed root → parent → child.
//! - **tint**: component-wise product.
//! - **visibility**: logical AND, stopping at the first hidden item.
//! - **z-index**: local z plus each ancestor's z for as long as the current
//!   level is parent-relative.
//!
//! # Render pass
//!
//! [`Renderer::render`] clears the target, orders every item by resolved
//! z-index (ties broken by creation order), skips hidden or empty items,
//! culls each drawing item's destination rectangle against the viewport, and
//! issues the survivors to the [`GraphicsBackend`].

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Point, Rect, Size};
use subduction_core::geometry::{Color, Transform2d, rects_overlap};
use subduction_core::uid::{Uid, UidAllocator};

use crate::backend::GraphicsBackend;
use crate::canvas_item::CanvasItem;
use crate::drawing::{DrawingItem, Resolved, TextureTable};
use crate::paint::{BlendMode, Flip, ScaleMode};
use crate::resource::{PixelRect, Texture};

/// Counters from one [`Renderer::render`] pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Canvas items visited in z order.
    pub items_visited: u32,
    /// Items skipped because they were hidden in the tree or had nothing to
    /// draw.
    pub items_skipped: u32,
    /// Drawing items issued to the backend.
    pub draws_issued: u32,
    /// Drawing items whose destination missed the viewport.
    pub draws_culled: u32,
}

/// Handle-indexed store of canvas items and textures, plus the render pass.
pub struct Renderer {
    backend: Box<dyn GraphicsBackend>,
    uids: UidAllocator,
    items: BTreeMap<Uid, CanvasItem>,
    textures: TextureTable,
    next_seq: u64,
    canvas_transform: Transform2d,
    viewport: Size,
    clear_color: Color,
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("canvas_items", &self.items.len())
            .field("textures", &self.textures.len())
            .field("viewport", &self.viewport)
            .field("canvas_transform", &self.canvas_transform)
            .finish_non_exhaustive()
    }
}

impl Renderer {
    /// Creates an empty renderer drawing through `backend`.
    #[must_use]
    pub fn new(backend: Box<dyn GraphicsBackend>) -> Self {
        Self::with_allocator(backend, UidAllocator::new())
    }

    /// Creates an empty renderer that issues handles from `uids`.
    #[must_use]
    pub fn with_allocator(backend: Box<dyn GraphicsBackend>, uids: UidAllocator) -> Self {
        Self {
            backend,
            uids,
            items: BTreeMap::new(),
            textures: TextureTable::new(),
            next_seq: 0,
            canvas_transform: Transform2d::IDENTITY,
            viewport: Size::ZERO,
            clear_color: Color::BLACK,
        }
    }

    // -- Target state --

    /// Sets the viewport size used for culling.
    pub fn set_viewport_size(&mut self, size: Size) {
        self.viewport = size;
    }

    /// Returns the viewport size.
    #[must_use]
    pub fn viewport_size(&self) -> Size {
        self.viewport
    }

    /// Returns the viewport rectangle, anchored at the origin.
    #[must_use]
    pub fn viewport(&self) -> Rect {
        Rect::from_origin_size(Point::ORIGIN, self.viewport)
    }

    /// Sets the camera transform applied on top of every global transform.
    pub fn set_canvas_transform(&mut self, transform: Transform2d) {
        self.canvas_transform = transform;
    }

    /// Returns the camera transform.
    #[must_use]
    pub fn canvas_transform(&self) -> Transform2d {
        self.canvas_transform
    }

    /// Sets the color the target is cleared to at the start of each pass.
    pub fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    // -- Creation and removal --

    /// Creates a canvas item with default attributes and returns its handle.
    pub fn create_canvas_item(&mut self) -> Uid {
        let uid = self.uids.assign();
        let seq = self.next_seq;
        self.next_seq += 1;
        self.items.insert(uid, CanvasItem::new(seq));
        log::debug!("created canvas item {uid:?}");
        uid
    }

    /// Loads a texture through the backend.
    ///
    /// Returns `None` if the backend could not open or decode `path`.
    pub fn load_texture_from_path(&mut self, path: &str) -> Option<Uid> {
        match self.backend.load_texture(path) {
            Ok(loaded) => {
                let uid = self.uids.assign();
                self.textures.insert(
                    uid,
                    Texture {
                        key: loaded.key,
                        width: loaded.width,
                        height: loaded.height,
                        format: loaded.format,
                    },
                );
                log::debug!(
                    "loaded texture {uid:?} from {path} ({}x{})",
                    loaded.width,
                    loaded.height
                );
                Some(uid)
            }
            Err(err) => {
                log::warn!("texture load failed: {err}");
                None
            }
        }
    }

    /// Removes whichever object `uid` names.
    ///
    /// Removing a texture releases its backend resource. Drawing items that
    /// still reference it become inert. Items parented to a removed canvas
    /// item keep their stale link and resolve as roots. Returns `false` if
    /// nothing was removed.
    pub fn remove_uid(&mut self, uid: Uid) -> bool {
        if self.items.remove(&uid).is_some() {
            log::debug!("removed canvas item {uid:?}");
            return true;
        }
        if let Some(tex) = self.textures.remove(&uid) {
            self.backend.release_texture(tex.key);
            log::debug!("removed texture {uid:?}");
            return true;
        }
        log::trace!("remove_uid: {uid:?} not found");
        false
    }

    // -- Canvas item attributes --

    fn item_mut(&mut self, uid: Uid, op: &str) -> Option<&mut CanvasItem> {
        let item = self.items.get_mut(&uid);
        if item.is_none() {
            log::trace!("{op}: stale canvas item {uid:?}");
        }
        item
    }

    /// Sets the local transform.
    pub fn canvas_item_set_transform(&mut self, uid: Uid, transform: Transform2d) {
        if let Some(item) = self.item_mut(uid, "canvas_item_set_transform") {
            item.transform = transform;
        }
    }

    /// Links `uid` under `parent`, or unlinks it with `None`.
    ///
    /// A parent that does not resolve unlinks the item. A link to itself or
    /// to one of its own descendants is refused.
    pub fn canvas_item_set_parent(&mut self, uid: Uid, parent: Option<Uid>) {
        if !self.items.contains_key(&uid) {
            log::trace!("canvas_item_set_parent: stale canvas item {uid:?}");
            return;
        }
        let parent = parent.filter(|p| self.items.contains_key(p));
        if let Some(p) = parent
            && self.ancestors(p).any(|(a, _)| a == uid)
        {
            log::warn!("refusing to parent {uid:?} under {p:?}: would create a cycle");
            return;
        }
        if let Some(item) = self.items.get_mut(&uid) {
            item.parent = parent;
        }
    }

    /// Sets the local tint.
    pub fn canvas_item_set_modulate(&mut self, uid: Uid, modulate: Color) {
        if let Some(item) = self.item_mut(uid, "canvas_item_set_modulate") {
            item.modulate = modulate;
        }
    }

    /// Sets the blend mode.
    pub fn canvas_item_set_blend_mode(&mut self, uid: Uid, mode: BlendMode) {
        if let Some(item) = self.item_mut(uid, "canvas_item_set_blend_mode") {
            item.blend_mode = mode;
        }
    }

    /// Sets the scale mode.
    pub fn canvas_item_set_scale_mode(&mut self, uid: Uid, mode: ScaleMode) {
        if let Some(item) = self.item_mut(uid, "canvas_item_set_scale_mode") {
            item.scale_mode = mode;
        }
    }

    /// Sets the local visibility flag.
    pub fn canvas_item_set_visible(&mut self, uid: Uid, visible: bool) {
        if let Some(item) = self.item_mut(uid, "canvas_item_set_visible") {
            item.visible = visible;
        }
    }

    /// Sets the local z-index.
    pub fn canvas_item_set_z_index(&mut self, uid: Uid, z: i32) {
        if let Some(item) = self.item_mut(uid, "canvas_item_set_z_index") {
            item.z_index = z;
        }
    }

    /// Sets whether the z-index is relative to the parent's.
    pub fn canvas_item_set_z_index_relative(&mut self, uid: Uid, relative: bool) {
        if let Some(item) = self.item_mut(uid, "canvas_item_set_z_index_relative") {
            item.z_relative = relative;
        }
    }

    /// Drops every drawing item.
    pub fn canvas_item_clear(&mut self, uid: Uid) {
        if let Some(item) = self.item_mut(uid, "canvas_item_clear") {
            item.drawing_items.clear();
        }
    }

    // -- Drawing submission --

    fn push(&mut self, uid: Uid, op: &str, drawing: DrawingItem) -> bool {
        if let Some(tex) = drawing.texture()
            && !self.textures.contains_key(&tex)
        {
            log::trace!("{op}: stale texture {tex:?}");
            return false;
        }
        if drawing.is_degenerate() {
            log::trace!("{op}: skipped degenerate geometry");
            return false;
        }
        match self.item_mut(uid, op) {
            Some(item) => {
                item.drawing_items.push(drawing);
                true
            }
            None => false,
        }
    }

    /// Appends a whole-texture quad. Returns `false` if either handle is
    /// stale.
    pub fn canvas_item_add_texture(
        &mut self,
        uid: Uid,
        texture: Uid,
        flip: Flip,
        tint: Color,
        transform: Transform2d,
    ) -> bool {
        self.push(
            uid,
            "canvas_item_add_texture",
            DrawingItem::Texture {
                texture,
                flip,
                tint,
                transform,
            },
        )
    }

    /// Appends a texture-region quad. Returns `false` if either handle is
    /// stale or the region is empty.
    pub fn canvas_item_add_texture_region(
        &mut self,
        uid: Uid,
        texture: Uid,
        src: PixelRect,
        flip: Flip,
        tint: Color,
        transform: Transform2d,
    ) -> bool {
        self.push(
            uid,
            "canvas_item_add_texture_region",
            DrawingItem::TextureRegion {
                texture,
                src,
                flip,
                tint,
                transform,
            },
        )
    }

    /// Appends a line segment. Zero-length lines are skipped.
    pub fn canvas_item_add_line(&mut self, uid: Uid, from: Point, to: Point, tint: Color) -> bool {
        self.push(uid, "canvas_item_add_line", DrawingItem::Line { from, to, tint })
    }

    /// Appends a polyline. Fewer than two points are skipped.
    pub fn canvas_item_add_lines(&mut self, uid: Uid, points: &[Point], tint: Color) -> bool {
        self.push(
            uid,
            "canvas_item_add_lines",
            DrawingItem::Polyline {
                points: points.to_vec(),
                tint,
            },
        )
    }

    /// Appends a rectangle. Zero-area rectangles are skipped.
    pub fn canvas_item_add_rect(&mut self, uid: Uid, rect: Rect, tint: Color, filled: bool) -> bool {
        self.push(
            uid,
            "canvas_item_add_rect",
            DrawingItem::Rect { rect, tint, filled },
        )
    }

    /// Appends several rectangles. An empty list is skipped.
    pub fn canvas_item_add_rects(
        &mut self,
        uid: Uid,
        rects: &[Rect],
        tint: Color,
        filled: bool,
    ) -> bool {
        self.push(
            uid,
            "canvas_item_add_rects",
            DrawingItem::Rects {
                rects: rects.to_vec(),
                tint,
                filled,
            },
        )
    }

    // -- Queries --

    /// Returns the canvas item `uid` names.
    #[must_use]
    pub fn canvas_item(&self, uid: Uid) -> Option<&CanvasItem> {
        self.items.get(&uid)
    }

    /// Returns the texture `uid` names.
    #[must_use]
    pub fn texture(&self, uid: Uid) -> Option<&Texture> {
        self.textures.get(&uid)
    }

    /// Returns `true` if `uid` names a live object in either table.
    #[must_use]
    pub fn contains(&self, uid: Uid) -> bool {
        self.items.contains_key(&uid) || self.textures.contains_key(&uid)
    }

    /// Number of live canvas items.
    #[must_use]
    pub fn canvas_item_count(&self) -> usize {
        self.items.len()
    }

    /// Number of live textures.
    #[must_use]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Walks `uid` and then its live ancestors.
    #[must_use]
    pub fn ancestors(&self, uid: Uid) -> Ancestors<'_> {
        Ancestors {
            items: &self.items,
            next: Some(uid),
            remaining: self.items.len(),
        }
    }

    /// Returns the composed transform, or identity for a stale handle.
    #[must_use]
    pub fn global_transform(&self, uid: Uid) -> Transform2d {
        self.ancestors(uid)
            .fold(Transform2d::IDENTITY, |acc, (_, item)| item.transform * acc)
    }

    /// Returns the multiplied tint, or white for a stale handle.
    #[must_use]
    pub fn global_modulate(&self, uid: Uid) -> Color {
        self.ancestors(uid)
            .fold(Color::WHITE, |acc, (_, item)| item.modulate * acc)
    }

    /// Returns `true` if the item and every live ancestor are visible.
    ///
    /// A stale handle is not visible.
    #[must_use]
    pub fn is_visible_in_tree(&self, uid: Uid) -> bool {
        if !self.items.contains_key(&uid) {
            return false;
        }
        self.ancestors(uid).all(|(_, item)| item.visible)
    }

    /// Returns the resolved z-index, or zero for a stale handle.
    #[must_use]
    pub fn global_z_index(&self, uid: Uid) -> i32 {
        let mut chain = self.ancestors(uid);
        let Some((_, item)) = chain.next() else {
            return 0;
        };
        let mut z = item.z_index;
        let mut relative = item.z_relative;
        for (_, ancestor) in chain {
            if !relative {
                break;
            }
            z = z.saturating_add(ancestor.z_index);
            relative = ancestor.z_relative;
        }
        z
    }

    /// Returns every canvas item handle in draw order: ascending resolved
    /// z-index, ties in creation order.
    #[must_use]
    pub fn draw_order(&self) -> Vec<Uid> {
        let mut keyed: Vec<(i32, u64, Uid)> = self
            .items
            .iter()
            .map(|(uid, item)| (self.global_z_index(*uid), item.seq, *uid))
            .collect();
        keyed.sort_by_key(|&(z, seq, _)| (z, seq));
        keyed.into_iter().map(|(_, _, uid)| uid).collect()
    }

    // -- Render pass --

    /// Draws every visible item to the backend and presents.
    pub fn render(&mut self) -> RenderStats {
        let mut stats = RenderStats::default();
        self.backend.clear(self.clear_color);
        let viewport = self.viewport();

        for uid in self.draw_order() {
            let Some(item) = self.items.get(&uid) else {
                continue;
            };
            stats.items_visited += 1;
            if item.drawing_items.is_empty() || !self.is_visible_in_tree(uid) {
                stats.items_skipped += 1;
                continue;
            }
            let resolved = Resolved {
                transform: self.canvas_transform * self.global_transform(uid),
                modulate: self.global_modulate(uid),
                blend: item.blend_mode,
                scale_mode: item.scale_mode,
            };
            for drawing in &item.drawing_items {
                let Some(dst) = drawing.draw_rect(&resolved, &self.textures) else {
                    continue;
                };
                if rects_overlap(dst, viewport) {
                    drawing.draw(&resolved, dst, &self.textures, self.backend.as_mut());
                    stats.draws_issued += 1;
                } else {
                    stats.draws_culled += 1;
                }
            }
        }

        self.backend.present();
        log::trace!("render pass: {stats:?}");
        stats
    }
}

/// Iterator over a canvas item and its live ancestors, nearest first.
///
/// Stops at the first parent handle that no longer resolves. The walk is
/// bounded by the table size, so even a corrupted chain terminates.
#[derive(Clone, Debug)]
pub struct Ancestors<'a> {
    items: &'a BTreeMap<Uid, CanvasItem>,
    next: Option<Uid>,
    remaining: usize,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = (Uid, &'a CanvasItem);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let uid = self.next?;
        let item = self.items.get(&uid)?;
        self.remaining -= 1;
        self.next = item.parent;
        Some((uid, item))
    }
}
