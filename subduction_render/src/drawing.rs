// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawing items: the individual draw instructions a canvas item owns.
//!
//! A [`DrawingItem`] is appended to a canvas item's list and never mutated
//! afterwards; the owning node clears the list and resubmits on every redraw.
//! Each variant knows two things:
//!
//! - its **draw rectangle** under a [`Resolved`] context, used for viewport
//!   culling, and
//! - how to **issue** itself against a [`GraphicsBackend`].
//!
//! Texture variants hold the texture's [`Uid`], not the texture. The handle is
//! looked up in the renderer's table on every pass, and a texture removed in
//! the meantime makes the item inert rather than dangling.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use kurbo::{Point, Rect, Size, Vec2};
use subduction_core::geometry::{Color, Transform2d, bounding_box};
use subduction_core::uid::Uid;

use crate::backend::{Blit, GraphicsBackend};
use crate::paint::{BlendMode, Flip, ScaleMode};
use crate::resource::{PixelRect, Texture};

/// The renderer's texture table.
pub type TextureTable = BTreeMap<Uid, Texture>;

/// Owning-item state resolved once per render pass and shared by all of that
/// item's drawing items.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resolved {
    /// Canvas transform composed with the item's global transform.
    pub transform: Transform2d,
    /// Global tint.
    pub modulate: Color,
    /// Blend mode of the owning item.
    pub blend: BlendMode,
    /// Scale mode of the owning item.
    pub scale_mode: ScaleMode,
}

impl Default for Resolved {
    fn default() -> Self {
        Self {
            transform: Transform2d::IDENTITY,
            modulate: Color::WHITE,
            blend: BlendMode::default(),
            scale_mode: ScaleMode::default(),
        }
    }
}

/// One draw instruction.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawingItem {
    /// A whole texture.
    Texture {
        /// Texture handle (weak).
        texture: Uid,
        /// Mirroring.
        flip: Flip,
        /// Per-draw tint, multiplied with the item's global tint.
        tint: Color,
        /// Placement relative to the owning item.
        transform: Transform2d,
    },
    /// A sub-rectangle of a texture.
    TextureRegion {
        /// Texture handle (weak).
        texture: Uid,
        /// Source rectangle in texture pixels.
        src: PixelRect,
        /// Mirroring.
        flip: Flip,
        /// Per-draw tint, multiplied with the item's global tint.
        tint: Color,
        /// Placement relative to the owning item.
        transform: Transform2d,
    },
    /// A single line segment.
    Line {
        /// Start point.
        from: Point,
        /// End point.
        to: Point,
        /// Stroke color.
        tint: Color,
    },
    /// Connected line segments.
    Polyline {
        /// Vertices, at least two.
        points: Vec<Point>,
        /// Stroke color.
        tint: Color,
    },
    /// An axis-aligned rectangle.
    Rect {
        /// Rectangle in item space.
        rect: Rect,
        /// Paint color.
        tint: Color,
        /// Fill instead of stroke.
        filled: bool,
    },
    /// Several axis-aligned rectangles sharing one paint.
    Rects {
        /// Rectangles in item space, at least one.
        rects: Vec<Rect>,
        /// Paint color.
        tint: Color,
        /// Fill instead of stroke.
        filled: bool,
    },
}

impl DrawingItem {
    /// Returns the item's destination rectangle in target space, or `None`
    /// if it references a texture that no longer exists.
    #[must_use]
    pub fn draw_rect(&self, resolved: &Resolved, textures: &TextureTable) -> Option<Rect> {
        let global = &resolved.transform;
        match self {
            Self::Texture {
                texture, transform, ..
            } => {
                let size = textures.get(texture)?.size();
                Some(texture_rect(global, transform, size))
            }
            Self::TextureRegion {
                texture,
                src,
                transform,
                ..
            } => {
                textures.get(texture)?;
                Some(texture_rect(global, transform, src.size()))
            }
            Self::Line { from, to, .. } => {
                Some(global.transform_rect(Rect::from_points(*from, *to)))
            }
            Self::Polyline { points, .. } => {
                bounding_box(points).map(|bb| global.transform_rect(bb))
            }
            Self::Rect { rect, .. } => Some(global.transform_rect(*rect)),
            Self::Rects { rects, .. } => rects
                .iter()
                .map(|r| r.abs())
                .reduce(|a, b| a.union(b))
                .map(|bb| global.transform_rect(bb)),
        }
    }

    /// Issues this item to `backend`.
    ///
    /// `dst` is the rectangle [`draw_rect`](Self::draw_rect) returned for the
    /// same `resolved` context; texture variants blit into it.
    pub fn draw(
        &self,
        resolved: &Resolved,
        dst: Rect,
        textures: &TextureTable,
        backend: &mut dyn GraphicsBackend,
    ) {
        let global = &resolved.transform;
        match self {
            Self::Texture {
                texture,
                flip,
                tint,
                transform,
            } => {
                let Some(tex) = textures.get(texture) else {
                    return;
                };
                blit(resolved, tex, tex.bounds(), dst, *flip, *tint, transform, backend);
            }
            Self::TextureRegion {
                texture,
                src,
                flip,
                tint,
                transform,
            } => {
                let Some(tex) = textures.get(texture) else {
                    return;
                };
                blit(resolved, tex, *src, dst, *flip, *tint, transform, backend);
            }
            Self::Line { from, to, tint } => {
                let a = global.to_affine();
                backend.line(
                    a * *from,
                    a * *to,
                    *tint * resolved.modulate,
                    resolved.blend,
                );
            }
            Self::Polyline { points, tint } => {
                let a = global.to_affine();
                let pts: Vec<Point> = points.iter().map(|p| a * *p).collect();
                backend.polyline(&pts, *tint * resolved.modulate, resolved.blend);
            }
            Self::Rect { tint, filled, .. } => {
                backend.rect(dst, *tint * resolved.modulate, resolved.blend, *filled);
            }
            Self::Rects {
                rects,
                tint,
                filled,
            } => {
                // Rotated rectangles are drawn as their bounding boxes.
                let out: Vec<Rect> = rects.iter().map(|r| global.transform_rect(*r)).collect();
                backend.rects(&out, *tint * resolved.modulate, resolved.blend, *filled);
            }
        }
    }

    /// Returns the texture handle this item references, if any.
    #[must_use]
    pub fn texture(&self) -> Option<Uid> {
        match self {
            Self::Texture { texture, .. } | Self::TextureRegion { texture, .. } => Some(*texture),
            _ => None,
        }
    }

    /// Returns `true` if the geometry would draw nothing.
    ///
    /// Texture variants are never degenerate here; a zero-size region is
    /// caught when the region is appended.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        match self {
            Self::Texture { .. } => false,
            Self::TextureRegion { src, .. } => src.is_empty(),
            Self::Line { from, to, .. } => from == to,
            Self::Polyline { points, .. } => points.len() < 2,
            Self::Rect { rect, .. } => rect.area() == 0.0,
            Self::Rects { rects, .. } => rects.is_empty() || rects.iter().all(|r| r.area() == 0.0),
        }
    }
}

/// Destination rectangle of a textured quad.
///
/// The top-left corner is the global origin offset by the local origin scaled
/// by the global scale; the extent is global scale × local scale × size.
fn texture_rect(global: &Transform2d, local: &Transform2d, size: Size) -> Rect {
    let origin = global.origin
        + Vec2::new(
            local.origin.x * global.scale.x,
            local.origin.y * global.scale.y,
        );
    let extent = Size::new(
        global.scale.x * local.scale.x * size.width,
        global.scale.y * local.scale.y * size.height,
    );
    Rect::from_origin_size(origin.to_point(), extent).abs()
}

fn blit(
    resolved: &Resolved,
    tex: &Texture,
    src: PixelRect,
    dst: Rect,
    flip: Flip,
    tint: Color,
    local: &Transform2d,
    backend: &mut dyn GraphicsBackend,
) {
    let b = Blit {
        texture: tex.key,
        src,
        dst,
        tint: tint * resolved.modulate,
        flip,
        blend: resolved.blend,
        scale: resolved.scale_mode,
    };
    let combined = resolved.transform * *local;
    if combined.is_rotated() {
        backend.copy_rotated(&b, combined.rotation);
    } else {
        backend.copy(&b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DrawCall, RecordingBackend};
    use crate::resource::{PixelFormat, ResourceKey};
    use alloc::vec;

    const EPS: f64 = 1e-6;

    fn rect_approx(a: Rect, b: Rect) -> bool {
        (a.x0 - b.x0).abs() < EPS
            && (a.y0 - b.y0).abs() < EPS
            && (a.x1 - b.x1).abs() < EPS
            && (a.y1 - b.y1).abs() < EPS
    }

    fn one_texture() -> (Uid, TextureTable) {
        let uid = Uid::from_raw(9).unwrap();
        let mut table = TextureTable::new();
        table.insert(
            uid,
            Texture {
                key: ResourceKey(1),
                width: 16,
                height: 8,
                format: PixelFormat::Rgba8,
            },
        );
        (uid, table)
    }

    fn resolved_at(x: f64, y: f64, scale: f64) -> Resolved {
        Resolved {
            transform: Transform2d::from_origin(x, y).with_scale(Vec2::new(scale, scale)),
            ..Resolved::default()
        }
    }

    #[test]
    fn texture_rect_uses_global_origin_and_scale() {
        let (uid, textures) = one_texture();
        let item = DrawingItem::Texture {
            texture: uid,
            flip: Flip::None,
            tint: Color::WHITE,
            transform: Transform2d::from_origin(2.0, 3.0).with_scale(Vec2::new(0.5, 2.0)),
        };
        let r = item.draw_rect(&resolved_at(100.0, 50.0, 2.0), &textures).unwrap();
        // origin = (100, 50) + (2, 3) * 2; size = 2 * (0.5, 2) * (16, 8)
        assert!(
            rect_approx(r, Rect::new(104.0, 56.0, 120.0, 88.0)),
            "texture rect: {r:?}"
        );
    }

    #[test]
    fn region_rect_uses_region_size() {
        let (uid, textures) = one_texture();
        let item = DrawingItem::TextureRegion {
            texture: uid,
            src: PixelRect::new(4, 0, 4, 4),
            flip: Flip::Horizontal,
            tint: Color::WHITE,
            transform: Transform2d::IDENTITY,
        };
        let r = item.draw_rect(&resolved_at(0.0, 0.0, 3.0), &textures).unwrap();
        assert!(rect_approx(r, Rect::new(0.0, 0.0, 12.0, 12.0)), "region rect: {r:?}");
    }

    #[test]
    fn missing_texture_is_inert() {
        let (_, textures) = one_texture();
        let gone = Uid::from_raw(77).unwrap();
        let item = DrawingItem::Texture {
            texture: gone,
            flip: Flip::None,
            tint: Color::WHITE,
            transform: Transform2d::IDENTITY,
        };
        assert!(
            item.draw_rect(&Resolved::default(), &textures).is_none(),
            "no rect for a missing texture"
        );
        let recording = RecordingBackend::new();
        let mut backend = recording.clone();
        item.draw(&Resolved::default(), Rect::ZERO, &textures, &mut backend);
        assert!(recording.calls().is_empty(), "nothing issued");
    }

    #[test]
    fn unrotated_texture_takes_the_plain_copy_path() {
        let (uid, textures) = one_texture();
        let item = DrawingItem::Texture {
            texture: uid,
            flip: Flip::Vertical,
            tint: Color::rgba(1.0, 0.5, 1.0, 1.0),
            transform: Transform2d::IDENTITY,
        };
        let resolved = Resolved {
            modulate: Color::rgba(0.5, 1.0, 1.0, 0.5),
            blend: BlendMode::Additive,
            scale_mode: ScaleMode::Nearest,
            ..Resolved::default()
        };
        let recording = RecordingBackend::new();
        let mut backend = recording.clone();
        let dst = item.draw_rect(&resolved, &textures).unwrap();
        item.draw(&resolved, dst, &textures, &mut backend);
        match recording.calls().as_slice() {
            [DrawCall::Copy(b)] => {
                assert_eq!(b.tint, Color::rgba(0.5, 0.5, 1.0, 0.5), "tints multiply");
                assert_eq!(b.blend, BlendMode::Additive, "item blend mode");
                assert_eq!(b.scale, ScaleMode::Nearest, "item scale mode");
                assert_eq!(b.flip, Flip::Vertical, "draw flip");
                assert_eq!(b.src, PixelRect::new(0, 0, 16, 8), "whole texture");
            }
            other => panic!("expected one plain copy, got {other:?}"),
        }
    }

    #[test]
    fn rotated_texture_takes_the_rotated_path() {
        let (uid, textures) = one_texture();
        let item = DrawingItem::Texture {
            texture: uid,
            flip: Flip::None,
            tint: Color::WHITE,
            transform: Transform2d::IDENTITY.with_rotation(0.25),
        };
        let resolved = Resolved {
            transform: Transform2d::IDENTITY.with_rotation(0.5),
            ..Resolved::default()
        };
        let recording = RecordingBackend::new();
        let mut backend = recording.clone();
        item.draw(&resolved, Rect::ZERO, &textures, &mut backend);
        match recording.calls().as_slice() {
            [DrawCall::CopyRotated { rotation, .. }] => {
                assert!((rotation - 0.75).abs() < EPS, "rotation = {rotation}");
            }
            other => panic!("expected one rotated copy, got {other:?}"),
        }
    }

    #[test]
    fn cancelling_rotations_take_the_plain_path() {
        let (uid, textures) = one_texture();
        let item = DrawingItem::Texture {
            texture: uid,
            flip: Flip::None,
            tint: Color::WHITE,
            transform: Transform2d::IDENTITY.with_rotation(-0.5),
        };
        let resolved = Resolved {
            transform: Transform2d::IDENTITY.with_rotation(0.5),
            ..Resolved::default()
        };
        let recording = RecordingBackend::new();
        let mut backend = recording.clone();
        item.draw(&resolved, Rect::ZERO, &textures, &mut backend);
        assert!(
            matches!(recording.calls().as_slice(), [DrawCall::Copy(_)]),
            "net zero rotation is a plain copy"
        );
    }

    #[test]
    fn geometry_rects_follow_the_global_transform() {
        let resolved = resolved_at(10.0, 10.0, 2.0);
        let textures = TextureTable::new();
        let line = DrawingItem::Line {
            from: Point::new(0.0, 0.0),
            to: Point::new(5.0, 0.0),
            tint: Color::WHITE,
        };
        let r = line.draw_rect(&resolved, &textures).unwrap();
        assert!(rect_approx(r, Rect::new(10.0, 10.0, 20.0, 10.0)), "line bounds: {r:?}");

        let rects = DrawingItem::Rects {
            rects: vec![Rect::new(0.0, 0.0, 1.0, 1.0), Rect::new(4.0, 4.0, 5.0, 6.0)],
            tint: Color::WHITE,
            filled: true,
        };
        let r = rects.draw_rect(&resolved, &textures).unwrap();
        assert!(rect_approx(r, Rect::new(10.0, 10.0, 20.0, 22.0)), "rects bounds: {r:?}");
    }

    #[test]
    fn line_draw_maps_points_and_tints() {
        let resolved = Resolved {
            transform: Transform2d::from_origin(1.0, 2.0),
            modulate: Color::rgba(0.5, 0.5, 0.5, 1.0),
            ..Resolved::default()
        };
        let item = DrawingItem::Line {
            from: Point::new(0.0, 0.0),
            to: Point::new(3.0, 4.0),
            tint: Color::rgba(1.0, 0.0, 1.0, 1.0),
        };
        let recording = RecordingBackend::new();
        let mut backend = recording.clone();
        item.draw(&resolved, Rect::ZERO, &TextureTable::new(), &mut backend);
        assert_eq!(
            recording.calls(),
            vec![DrawCall::Line {
                from: Point::new(1.0, 2.0),
                to: Point::new(4.0, 6.0),
                color: Color::rgba(0.5, 0.0, 0.5, 1.0),
                blend: BlendMode::SourceOver,
            }],
            "line issued in target space"
        );
    }

    #[test]
    fn degenerate_geometry() {
        let p = Point::new(1.0, 1.0);
        assert!(
            DrawingItem::Line { from: p, to: p, tint: Color::WHITE }.is_degenerate(),
            "zero-length line"
        );
        assert!(
            DrawingItem::Polyline { points: vec![p], tint: Color::WHITE }.is_degenerate(),
            "single point"
        );
        assert!(
            DrawingItem::Rect {
                rect: Rect::new(0.0, 0.0, 0.0, 5.0),
                tint: Color::WHITE,
                filled: false
            }
            .is_degenerate(),
            "zero-area rect"
        );
        assert!(
            DrawingItem::Rects { rects: vec![], tint: Color::WHITE, filled: true }.is_degenerate(),
            "empty rect list"
        );
        assert!(
            !DrawingItem::Polyline { points: vec![p, Point::ZERO], tint: Color::WHITE }
                .is_degenerate(),
            "two points draw"
        );
    }
}
