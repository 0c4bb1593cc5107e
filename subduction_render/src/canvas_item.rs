// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render-side canvas items.

use alloc::vec::Vec;

use subduction_core::geometry::{Color, Transform2d};
use subduction_core::uid::Uid;

use crate::drawing::DrawingItem;
use crate::paint::{BlendMode, ScaleMode};

/// A drawable node owned by the [`Renderer`](crate::Renderer)'s table.
///
/// The parent link is a handle, not a reference: it never keeps the parent
/// alive, and a parent that has been removed simply ends the chain when
/// global attributes are resolved.
#[derive(Clone, Debug)]
pub struct CanvasItem {
    pub(crate) transform: Transform2d,
    pub(crate) modulate: Color,
    pub(crate) visible: bool,
    pub(crate) z_index: i32,
    pub(crate) z_relative: bool,
    pub(crate) blend_mode: BlendMode,
    pub(crate) scale_mode: ScaleMode,
    pub(crate) parent: Option<Uid>,
    /// Creation order, used to break z-index ties.
    pub(crate) seq: u64,
    pub(crate) drawing_items: Vec<DrawingItem>,
}

impl CanvasItem {
    pub(crate) fn new(seq: u64) -> Self {
        Self {
            transform: Transform2d::IDENTITY,
            modulate: Color::WHITE,
            visible: true,
            z_index: 0,
            z_relative: true,
            blend_mode: BlendMode::default(),
            scale_mode: ScaleMode::default(),
            parent: None,
            seq,
            drawing_items: Vec::new(),
        }
    }

    /// Local transform.
    #[inline]
    #[must_use]
    pub fn transform(&self) -> Transform2d {
        self.transform
    }

    /// Local tint.
    #[inline]
    #[must_use]
    pub fn modulate(&self) -> Color {
        self.modulate
    }

    /// Local visibility flag.
    #[inline]
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Local z-index.
    #[inline]
    #[must_use]
    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    /// Whether the z-index is added to the parent's.
    #[inline]
    #[must_use]
    pub fn is_z_relative(&self) -> bool {
        self.z_relative
    }

    /// Blend mode applied to every drawing item.
    #[inline]
    #[must_use]
    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    /// Scale mode applied to every textured drawing item.
    #[inline]
    #[must_use]
    pub fn scale_mode(&self) -> ScaleMode {
        self.scale_mode
    }

    /// Parent handle, if linked. The parent may no longer exist.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Uid> {
        self.parent
    }

    /// Drawing items in submission order.
    #[inline]
    #[must_use]
    pub fn drawing_items(&self) -> &[DrawingItem] {
        &self.drawing_items
    }
}
