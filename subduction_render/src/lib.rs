// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Handle-indexed retained renderer for subduction.
//!
//! This crate owns everything on the render side of the scene runtime:
//!
//! - [`Renderer`]: two [`Uid`](subduction_core::uid::Uid)-keyed tables
//!   (canvas items, textures), the imperative mutation API, on-demand global
//!   resolution, and the sorted, culled render pass
//! - [`CanvasItem`]: a render-side node with a weak parent link and an owned
//!   list of drawing items
//! - [`DrawingItem`]: one closed-set draw instruction (texture, region, line,
//!   polyline, rect, rects)
//! - [`GraphicsBackend`]: the contract a concrete backend implements, plus
//!   [`RecordingBackend`] for tests and headless runs
//! - [`ResourceKey`]: opaque handle for backend-managed resources
//!
//! Logical scene code never holds a reference into the renderer. It keeps a
//! handle and goes back through the [`Renderer`] for every read and write.

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod backend;
mod canvas_item;
mod drawing;
mod paint;
mod renderer;
mod resource;

pub use backend::{Blit, DrawCall, GraphicsBackend, LoadError, LoadedTexture, RecordingBackend};
pub use canvas_item::CanvasItem;
pub use drawing::{DrawingItem, Resolved, TextureTable};
pub use paint::{BlendMode, Flip, ScaleMode};
pub use renderer::{Ancestors, RenderStats, Renderer};
pub use resource::{PixelFormat, PixelRect, ResourceKey, Texture};
