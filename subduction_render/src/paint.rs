// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositing parameters carried by canvas items and forwarded to the
//! backend with every draw.

/// How a draw is composited onto the target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Overwrite the destination, ignoring alpha.
    None,
    /// Standard source-over alpha compositing.
    #[default]
    SourceOver,
    /// Additive blend.
    Additive,
    /// Multiply blend.
    Multiply,
    /// Screen blend.
    Screen,
}

/// Texture sampling filter used when a blit is scaled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScaleMode {
    /// Bilinear filtering.
    #[default]
    Linear,
    /// Nearest-neighbor sampling.
    Nearest,
}

/// Mirroring applied to a textured quad.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Flip {
    /// No mirroring.
    #[default]
    None,
    /// Mirror left-right.
    Horizontal,
    /// Mirror top-bottom.
    Vertical,
    /// Mirror on both axes.
    Both,
}

impl Flip {
    /// Returns `true` if the quad is mirrored left-right.
    #[inline]
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Horizontal | Self::Both)
    }

    /// Returns `true` if the quad is mirrored top-bottom.
    #[inline]
    #[must_use]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::Vertical | Self::Both)
    }
}
