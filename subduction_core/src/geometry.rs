// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 2D transform, color, and rectangle helpers shared by the scene and the
//! renderer.
//!
//! [`Transform2d`] is a decomposed 2D transform: an origin, a rotation in
//! radians, and a per-axis scale. Composition is component-wise: origins sum,
//! scales multiply and rotations add. This is the rule global resolution uses
//! when walking a parent chain, and it keeps every intermediate value
//! decomposed so that the renderer can tell a rotated blit from an
//! axis-aligned one without factoring a matrix.
//!
//! When a full matrix is needed (for example to bound rotated geometry),
//! [`Transform2d::to_affine`] produces the equivalent `kurbo::Affine`.

use core::fmt;
use core::ops::{Mul, MulAssign};

use kurbo::{Affine, Point, Rect, Vec2};

/// A decomposed 2D transform.
#[derive(Clone, Copy, PartialEq)]
pub struct Transform2d {
    /// Translation.
    pub origin: Vec2,
    /// Rotation in radians.
    pub rotation: f64,
    /// Per-axis scale.
    pub scale: Vec2,
}

impl Default for Transform2d {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform2d {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        origin: Vec2::ZERO,
        rotation: 0.0,
        scale: Vec2::new(1.0, 1.0),
    };

    /// Creates a transform from its parts.
    #[inline]
    #[must_use]
    pub const fn new(origin: Vec2, rotation: f64, scale: Vec2) -> Self {
        Self {
            origin,
            rotation,
            scale,
        }
    }

    /// A pure translation.
    #[inline]
    #[must_use]
    pub const fn from_origin(x: f64, y: f64) -> Self {
        Self {
            origin: Vec2::new(x, y),
            ..Self::IDENTITY
        }
    }

    /// Returns a copy with the given origin.
    #[inline]
    #[must_use]
    pub const fn with_origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
        self
    }

    /// Returns a copy with the given rotation.
    #[inline]
    #[must_use]
    pub const fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    /// Returns a copy with the given scale.
    #[inline]
    #[must_use]
    pub const fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    /// Returns `true` if this transform has a non-zero rotation.
    #[inline]
    #[must_use]
    pub fn is_rotated(&self) -> bool {
        self.rotation != 0.0
    }

    /// Returns the equivalent matrix: translate, then rotate, then scale.
    #[must_use]
    pub fn to_affine(&self) -> Affine {
        Affine::translate(self.origin)
            * Affine::rotate(self.rotation)
            * Affine::scale_non_uniform(self.scale.x, self.scale.y)
    }

    /// Returns the axis-aligned bounding box of `rect` under this transform.
    #[must_use]
    pub fn transform_rect(&self, rect: Rect) -> Rect {
        self.to_affine().transform_rect_bbox(rect.abs())
    }
}

impl Mul for Transform2d {
    type Output = Self;

    /// Composes `self` (outer) with `rhs` (inner).
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self {
            origin: self.origin + rhs.origin,
            rotation: self.rotation + rhs.rotation,
            scale: Vec2::new(self.scale.x * rhs.scale.x, self.scale.y * rhs.scale.y),
        }
    }
}

impl MulAssign for Transform2d {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl fmt::Debug for Transform2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transform2d(origin=({}, {}), rot={}, scale=({}, {}))",
            self.origin.x, self.origin.y, self.rotation, self.scale.x, self.scale.y
        )
    }
}

/// A straight-alpha RGBA color with `f32` components in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color {
    /// Opaque white, the multiplicative identity.
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);

    /// Creates a color from its components.
    #[inline]
    #[must_use]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color.
    #[inline]
    #[must_use]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }
}

impl Mul for Color {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self {
            r: self.r * rhs.r,
            g: self.g * rhs.g,
            b: self.b * rhs.b,
            a: self.a * rhs.a,
        }
    }
}

impl MulAssign for Color {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

/// Returns `true` if the two rectangles share any point, edges included.
///
/// Both rectangles are normalized first, so a zero-width rectangle (such as
/// the bounds of a vertical line) still overlaps anything it touches.
#[must_use]
pub fn rects_overlap(a: Rect, b: Rect) -> bool {
    let a = a.abs();
    let b = b.abs();
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Returns the bounding box of a point set, or `None` if it is empty.
#[must_use]
pub fn bounding_box(points: &[Point]) -> Option<Rect> {
    let (first, rest) = points.split_first()?;
    Some(
        rest.iter()
            .fold(Rect::from_points(*first, *first), |acc, p| {
                acc.union_pt(*p)
            }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn composition_sums_origin_multiplies_scale_adds_rotation() {
        let parent = Transform2d::new(Vec2::new(10.0, 20.0), 0.5, Vec2::new(2.0, 3.0));
        let child = Transform2d::new(Vec2::new(1.0, 2.0), 0.25, Vec2::new(0.5, 2.0));
        let global = parent * child;
        assert!(approx(global.origin.x, 11.0), "origin x sums");
        assert!(approx(global.origin.y, 22.0), "origin y sums");
        assert!(approx(global.rotation, 0.75), "rotations add");
        assert!(approx(global.scale.x, 1.0), "scale x multiplies");
        assert!(approx(global.scale.y, 6.0), "scale y multiplies");
    }

    #[test]
    fn identity_is_neutral() {
        let t = Transform2d::new(Vec2::new(3.0, 4.0), 1.0, Vec2::new(2.0, 2.0));
        assert_eq!(Transform2d::IDENTITY * t, t, "left identity");
        assert_eq!(t * Transform2d::IDENTITY, t, "right identity");
        assert_eq!(Transform2d::default(), Transform2d::IDENTITY, "default");
    }

    #[test]
    fn transform_rect_translates_and_scales() {
        let t = Transform2d::from_origin(5.0, 5.0).with_scale(Vec2::new(2.0, 2.0));
        let r = t.transform_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(approx(r.x0, 5.0) && approx(r.y0, 5.0), "origin applied: {r:?}");
        assert!(approx(r.x1, 25.0) && approx(r.y1, 25.0), "scale applied: {r:?}");
    }

    #[test]
    fn transform_rect_rotated_bounds() {
        let t = Transform2d::IDENTITY.with_rotation(core::f64::consts::FRAC_PI_2);
        let r = t.transform_rect(Rect::new(0.0, 0.0, 10.0, 4.0));
        assert!(approx(r.width(), 4.0), "width swapped with height: {r:?}");
        assert!(approx(r.height(), 10.0), "height swapped with width: {r:?}");
    }

    #[test]
    fn color_multiplies_component_wise() {
        let c = Color::rgba(0.5, 1.0, 0.25, 1.0) * Color::rgba(0.5, 0.5, 1.0, 0.5);
        assert_eq!(c, Color::rgba(0.25, 0.5, 0.25, 0.5), "component-wise product");
        assert_eq!(Color::WHITE * c, c, "white is neutral");
    }

    #[test]
    fn overlap_includes_edges() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rects_overlap(a, Rect::new(10.0, 10.0, 20.0, 20.0)), "corner touch");
        assert!(rects_overlap(a, Rect::new(5.0, -5.0, 5.0, 5.0)), "zero-width line");
        assert!(!rects_overlap(a, Rect::new(10.5, 0.0, 20.0, 10.0)), "disjoint");
        assert!(rects_overlap(a, Rect::new(20.0, 20.0, 5.0, 5.0)), "unnormalized");
    }

    #[test]
    fn bounding_box_of_points() {
        assert!(bounding_box(&[]).is_none(), "empty set has no bounds");
        let bb = bounding_box(&[
            Point::new(3.0, 1.0),
            Point::new(-2.0, 4.0),
            Point::new(0.0, -1.0),
        ])
        .unwrap();
        assert_eq!(bb, Rect::new(-2.0, -1.0, 3.0, 4.0), "bounds enclose all points");
    }
}
