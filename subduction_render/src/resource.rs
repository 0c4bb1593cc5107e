// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend resource keys and the renderer's texture entries.

use core::fmt;

use kurbo::Size;

/// An opaque handle to a backend-managed resource (texture, buffer, etc.).
///
/// Resource keys are assigned by backends and passed back to them without
/// interpretation by the renderer.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceKey(pub u64);

impl fmt::Debug for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceKey({})", self.0)
    }
}

/// Pixel layout of a loaded texture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8-bit RGBA, straight alpha.
    #[default]
    Rgba8,
    /// 8-bit BGRA, straight alpha.
    Bgra8,
    /// 8-bit RGB, opaque.
    Rgb8,
    /// 8-bit single-channel alpha.
    A8,
}

/// An integer source rectangle in texture pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PixelRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

impl PixelRect {
    /// Creates a source rectangle.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns the rectangle's size as floating-point pixels.
    #[inline]
    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }

    /// Returns `true` if the rectangle covers no pixels.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A texture entry in the renderer's table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Texture {
    /// Backend handle.
    pub key: ResourceKey,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel layout.
    pub format: PixelFormat,
}

impl Texture {
    /// Returns the full-texture source rectangle.
    #[inline]
    #[must_use]
    pub const fn bounds(&self) -> PixelRect {
        PixelRect::new(0, 0, self.width, self.height)
    }

    /// Returns the texture size as floating-point pixels.
    #[inline]
    #[must_use]
    pub fn size(&self) -> Size {
        self.bounds().size()
    }
}
