// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The graphics backend contract.
//!
//! The [`Renderer`](crate::Renderer) never talks to a GPU or a windowing
//! library directly. It resolves each drawing item into device-space
//! geometry and hands the result to a [`GraphicsBackend`], which may batch
//! it, rasterize it, or simply record it.
//!
//! Textured quads come in two flavors: [`copy`](GraphicsBackend::copy) for the
//! axis-aligned case, and [`copy_rotated`](GraphicsBackend::copy_rotated) when
//! the resolved rotation is non-zero. The renderer only ever takes the rotated
//! path when it has to.
//!
//! [`RecordingBackend`] is an in-memory implementation that records every
//! call. It is used by tests and headless runs.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;

use kurbo::{Point, Rect};
use subduction_core::geometry::Color;

use crate::paint::{BlendMode, Flip, ScaleMode};
use crate::resource::{PixelFormat, PixelRect, ResourceKey};

/// A texture the backend has decoded and uploaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadedTexture {
    /// Backend handle for later blits and release.
    pub key: ResourceKey,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel layout.
    pub format: PixelFormat,
}

/// Why a texture could not be loaded.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// Nothing exists at the path.
    #[error("texture not found: {path}")]
    NotFound {
        /// The requested path.
        path: String,
    },
    /// The file exists but could not be decoded.
    #[error("could not decode texture `{path}`: {reason}")]
    Decode {
        /// The requested path.
        path: String,
        /// Decoder message.
        reason: String,
    },
    /// The backend cannot hold textures at all.
    #[error("backend does not support textures")]
    Unsupported,
}

/// One textured-quad blit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Blit {
    /// Texture to sample.
    pub texture: ResourceKey,
    /// Source rectangle in texture pixels.
    pub src: PixelRect,
    /// Destination rectangle in target pixels.
    pub dst: Rect,
    /// Composite tint.
    pub tint: Color,
    /// Mirroring.
    pub flip: Flip,
    /// Compositing mode.
    pub blend: BlendMode,
    /// Sampling filter.
    pub scale: ScaleMode,
}

/// Implemented by whatever actually puts pixels on the surface.
pub trait GraphicsBackend {
    /// Clears the whole target to `color`.
    fn clear(&mut self, color: Color);

    /// Blits an axis-aligned textured quad.
    fn copy(&mut self, blit: &Blit);

    /// Blits a textured quad rotated by `rotation` radians about the center
    /// of its destination rectangle.
    fn copy_rotated(&mut self, blit: &Blit, rotation: f64);

    /// Strokes a single line segment.
    fn line(&mut self, from: Point, to: Point, color: Color, blend: BlendMode);

    /// Strokes connected line segments through `points`.
    fn polyline(&mut self, points: &[Point], color: Color, blend: BlendMode);

    /// Fills or strokes an axis-aligned rectangle.
    fn rect(&mut self, rect: Rect, color: Color, blend: BlendMode, filled: bool);

    /// Fills or strokes several axis-aligned rectangles.
    fn rects(&mut self, rects: &[Rect], color: Color, blend: BlendMode, filled: bool) {
        for r in rects {
            self.rect(*r, color, blend, filled);
        }
    }

    /// Shows the finished frame.
    fn present(&mut self) {}

    /// Loads and uploads the texture at `path`.
    fn load_texture(&mut self, path: &str) -> Result<LoadedTexture, LoadError>;

    /// Frees a texture previously returned by
    /// [`load_texture`](Self::load_texture).
    fn release_texture(&mut self, key: ResourceKey);
}

// ---------------------------------------------------------------------------
// RecordingBackend
// ---------------------------------------------------------------------------

/// A backend call captured by [`RecordingBackend`].
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCall {
    /// [`GraphicsBackend::clear`].
    Clear(Color),
    /// [`GraphicsBackend::copy`].
    Copy(Blit),
    /// [`GraphicsBackend::copy_rotated`].
    CopyRotated {
        /// The blit.
        blit: Blit,
        /// Rotation in radians.
        rotation: f64,
    },
    /// [`GraphicsBackend::line`].
    Line {
        /// Start point.
        from: Point,
        /// End point.
        to: Point,
        /// Stroke color.
        color: Color,
        /// Compositing mode.
        blend: BlendMode,
    },
    /// [`GraphicsBackend::polyline`].
    Polyline {
        /// Vertices.
        points: Vec<Point>,
        /// Stroke color.
        color: Color,
        /// Compositing mode.
        blend: BlendMode,
    },
    /// [`GraphicsBackend::rect`].
    Rect {
        /// Rectangle in target pixels.
        rect: Rect,
        /// Paint color.
        color: Color,
        /// Compositing mode.
        blend: BlendMode,
        /// Fill instead of stroke.
        filled: bool,
    },
    /// [`GraphicsBackend::rects`].
    Rects {
        /// Rectangles in target pixels.
        rects: Vec<Rect>,
        /// Paint color.
        color: Color,
        /// Compositing mode.
        blend: BlendMode,
        /// Fill instead of stroke.
        filled: bool,
    },
    /// [`GraphicsBackend::present`].
    Present,
}

impl DrawCall {
    /// Returns `true` for calls that put content on the target (everything
    /// except clear and present).
    #[must_use]
    pub const fn is_draw(&self) -> bool {
        !matches!(self, Self::Clear(_) | Self::Present)
    }
}

#[derive(Debug, Default)]
struct Recording {
    calls: Vec<DrawCall>,
    files: BTreeMap<String, (u32, u32, PixelFormat)>,
    live: BTreeMap<ResourceKey, String>,
    released: Vec<ResourceKey>,
    next_key: u64,
}

/// A [`GraphicsBackend`] that records calls in memory.
///
/// Clones share one recording, so a test can keep a handle while the
/// renderer owns the boxed backend. Texture loads succeed only for paths
/// registered with [`with_texture`](Self::with_texture).
///
/// The call log grows with every frame until drained; long runs should call
/// [`take_calls`](Self::take_calls) once per frame.
#[derive(Clone, Debug, Default)]
pub struct RecordingBackend {
    inner: Rc<RefCell<Recording>>,
}

impl RecordingBackend {
    /// Creates an empty recorder with no loadable textures.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a loadable texture at `path`.
    #[must_use]
    pub fn with_texture(self, path: &str, width: u32, height: u32) -> Self {
        self.inner
            .borrow_mut()
            .files
            .insert(path.to_string(), (width, height, PixelFormat::Rgba8));
        self
    }

    /// Returns a copy of every call recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<DrawCall> {
        self.inner.borrow().calls.clone()
    }

    /// Returns and clears the recorded calls.
    pub fn take_calls(&self) -> Vec<DrawCall> {
        core::mem::take(&mut self.inner.borrow_mut().calls)
    }

    /// Returns the number of content-producing calls recorded so far.
    #[must_use]
    pub fn draw_count(&self) -> usize {
        self.inner.borrow().calls.iter().filter(|c| c.is_draw()).count()
    }

    /// Returns the number of frames presented so far.
    #[must_use]
    pub fn presented(&self) -> usize {
        self.inner
            .borrow()
            .calls
            .iter()
            .filter(|c| matches!(c, DrawCall::Present))
            .count()
    }

    /// Returns the texture keys released so far, in release order.
    #[must_use]
    pub fn released(&self) -> Vec<ResourceKey> {
        self.inner.borrow().released.clone()
    }

    /// Returns the number of textures currently loaded.
    #[must_use]
    pub fn live_textures(&self) -> usize {
        self.inner.borrow().live.len()
    }

    fn push(&self, call: DrawCall) {
        self.inner.borrow_mut().calls.push(call);
    }
}

impl GraphicsBackend for RecordingBackend {
    fn clear(&mut self, color: Color) {
        self.push(DrawCall::Clear(color));
    }

    fn copy(&mut self, blit: &Blit) {
        self.push(DrawCall::Copy(*blit));
    }

    fn copy_rotated(&mut self, blit: &Blit, rotation: f64) {
        self.push(DrawCall::CopyRotated {
            blit: *blit,
            rotation,
        });
    }

    fn line(&mut self, from: Point, to: Point, color: Color, blend: BlendMode) {
        self.push(DrawCall::Line {
            from,
            to,
            color,
            blend,
        });
    }

    fn polyline(&mut self, points: &[Point], color: Color, blend: BlendMode) {
        self.push(DrawCall::Polyline {
            points: points.to_vec(),
            color,
            blend,
        });
    }

    fn rect(&mut self, rect: Rect, color: Color, blend: BlendMode, filled: bool) {
        self.push(DrawCall::Rect {
            rect,
            color,
            blend,
            filled,
        });
    }

    fn rects(&mut self, rects: &[Rect], color: Color, blend: BlendMode, filled: bool) {
        self.push(DrawCall::Rects {
            rects: rects.to_vec(),
            color,
            blend,
            filled,
        });
    }

    fn present(&mut self) {
        self.push(DrawCall::Present);
    }

    fn load_texture(&mut self, path: &str) -> Result<LoadedTexture, LoadError> {
        let mut rec = self.inner.borrow_mut();
        let Some(&(width, height, format)) = rec.files.get(path) else {
            return Err(LoadError::NotFound {
                path: path.to_string(),
            });
        };
        rec.next_key += 1;
        let key = ResourceKey(rec.next_key);
        rec.live.insert(key, path.to_string());
        Ok(LoadedTexture {
            key,
            width,
            height,
            format,
        })
    }

    fn release_texture(&mut self, key: ResourceKey) {
        let mut rec = self.inner.borrow_mut();
        if rec.live.remove(&key).is_some() {
            rec.released.push(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_recording() {
        let recording = RecordingBackend::new();
        let mut backend = recording.clone();
        backend.clear(Color::BLACK);
        backend.line(Point::ZERO, Point::new(1.0, 1.0), Color::WHITE, BlendMode::default());
        backend.present();
        assert_eq!(recording.calls().len(), 3, "all calls visible through clone");
        assert_eq!(recording.draw_count(), 1, "only the line is a draw");
        assert_eq!(recording.presented(), 1, "one frame presented");
        assert_eq!(recording.take_calls().len(), 3, "take drains");
        assert!(recording.calls().is_empty(), "drained");
    }

    #[test]
    fn texture_load_and_release() {
        let mut backend = RecordingBackend::new().with_texture("hero.png", 32, 16);
        let tex = backend.load_texture("hero.png").unwrap();
        assert_eq!((tex.width, tex.height), (32, 16), "registered size");
        assert_eq!(backend.live_textures(), 1, "one live texture");

        let err = backend.load_texture("missing.png").unwrap_err();
        assert_eq!(
            err,
            LoadError::NotFound {
                path: "missing.png".to_string()
            },
            "unknown path fails"
        );

        backend.release_texture(tex.key);
        backend.release_texture(tex.key);
        assert_eq!(backend.released(), [tex.key], "released once");
        assert_eq!(backend.live_textures(), 0, "nothing live");
    }

    #[test]
    fn load_error_display() {
        let err = LoadError::Decode {
            path: "a.png".to_string(),
            reason: "bad header".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "could not decode texture `a.png`: bad header",
            "display message"
        );
    }

    #[test]
    fn default_rects_forwards_to_rect() {
        struct Counting(usize);
        impl GraphicsBackend for Counting {
            fn clear(&mut self, _: Color) {}
            fn copy(&mut self, _: &Blit) {}
            fn copy_rotated(&mut self, _: &Blit, _: f64) {}
            fn line(&mut self, _: Point, _: Point, _: Color, _: BlendMode) {}
            fn polyline(&mut self, _: &[Point], _: Color, _: BlendMode) {}
            fn rect(&mut self, _: Rect, _: Color, _: BlendMode, _: bool) {
                self.0 += 1;
            }
            fn load_texture(&mut self, _: &str) -> Result<LoadedTexture, LoadError> {
                Err(LoadError::Unsupported)
            }
            fn release_texture(&mut self, _: ResourceKey) {}
        }
        let mut b = Counting(0);
        b.rects(
            &[Rect::new(0.0, 0.0, 1.0, 1.0), Rect::new(2.0, 2.0, 3.0, 3.0)],
            Color::WHITE,
            BlendMode::None,
            true,
        );
        assert_eq!(b.0, 2, "one rect call per rectangle");
    }
}
