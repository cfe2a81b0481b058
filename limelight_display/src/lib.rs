// Copyright 2026 the Limelight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Limelight Display: a retained display list with pixel-accurate hit
//! testing.
//!
//! Limelight Display is a reusable building block for canvas-style UIs,
//! interactive diagrams, and 2D editors.
//!
//! - Represents a hierarchy of display objects with local transforms,
//!   alpha, masks, and render flags, composed front-to-back.
//! - Routes pointer input through the hierarchy as capturing/bubbling
//!   events, with per-pointer press tracking and hover aggregation.
//! - Hit-tests by rasterizing a single probe pixel, so irregular shapes,
//!   transparency, and masks all behave exactly as drawn.
//! - Caches subtrees into offscreen bitmaps with an extensible filter
//!   contract.
//!
//! Rendering targets the [`Surface`] trait; the bundled [`SoftwareSurface`]
//! rasterizes into an RGBA [`Pixmap`] and backs the hit-test probe, while a
//! host can bridge the same trait onto a GPU canvas or a window.
//!
//! ## API overview
//!
//! - [`DisplayList`]: arena of display nodes; structure, transforms,
//!   events, caching, and hit testing all live here.
//! - [`DisplayObject`]: per-node data (transform properties, flags, a
//!   [`NodeKind`] payload, mask/hit-area references).
//! - [`NodeId`]: generational handle of a node.
//! - [`Stage`]: a display list bound to a surface, driving draw/tick
//!   passes and translating host pointer input into events.
//! - [`StageChain`]: several stages layered over one input region.
//! - [`BitmapCache`] and [`Filter`]: offscreen caching of subtrees.
//!
//! Key operations:
//! - [`DisplayList::insert`] → [`NodeId`], then [`DisplayList::add_child`].
//! - [`DisplayList::add_listener`] / [`DisplayList::dispatch`].
//! - [`DisplayList::hit_test`] and [`DisplayList::objects_under_point`].
//! - [`Stage::update`] to draw a frame; [`Stage::pointer_down`] and
//!   friends to feed input.
//!
//! ## Minimal usage
//!
//! ```
//! use kurbo::Rect;
//! use limelight_display::{DisplayObject, FillPath, Rgba, SoftwareSurface, Stage};
//!
//! let mut stage = Stage::new(SoftwareSurface::new(64, 64));
//!
//! // A 20x20 red square at (10, 10).
//! let mut path = FillPath::new();
//! path.fill_rect(Rect::new(0.0, 0.0, 20.0, 20.0), Rgba::rgb(200, 40, 40));
//! let square = stage.tree_mut().insert(DisplayObject::shape(path));
//! stage.tree_mut().obj_mut(square).x = 10.0;
//! stage.tree_mut().obj_mut(square).y = 10.0;
//! let root = stage.root();
//! stage.tree_mut().add_child(root, square);
//!
//! stage.update(None);
//! assert_eq!(
//!     stage.surface().pixmap().pixel(15, 15),
//!     Some(Rgba::rgb(200, 40, 40)),
//! );
//!
//! // Hit testing is pixel-accurate in the node's local space.
//! assert!(stage.tree_mut().hit_test(square, 5.0, 5.0));
//! assert!(!stage.tree_mut().hit_test(square, 25.0, 25.0));
//! ```
//!
//! ## Pointer events
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use kurbo::Rect;
//! use limelight_display::{
//!     DisplayObject, EventKind, FillPath, PointerId, Rgba, SoftwareSurface, Stage,
//! };
//!
//! let mut stage = Stage::new(SoftwareSurface::new(64, 64));
//! let mut path = FillPath::new();
//! path.fill_rect(Rect::new(0.0, 0.0, 20.0, 20.0), Rgba::BLACK);
//! let button = stage.tree_mut().insert(DisplayObject::shape(path));
//! let root = stage.root();
//! stage.tree_mut().add_child(root, button);
//!
//! let clicks = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&clicks);
//! stage.tree_mut().add_listener(button, EventKind::Click, move |_| {
//!     counter.set(counter.get() + 1);
//! });
//!
//! stage.pointer_down(PointerId::MOUSE, 5.0, 5.0);
//! stage.pointer_up(PointerId::MOUSE, false);
//! assert_eq!(clicks.get(), 1);
//! ```
//!
//! This crate is `no_std` with the default `std` feature disabled, and
//! uses `alloc`.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod cache;
mod common;
mod draw;
mod hit;
mod node;
mod pixmap;
mod stage;
mod surface;
mod tree;

pub use cache::{BitmapCache, Filter};
pub use hit::{HIT_ALPHA_THRESHOLD, HitMode};
pub use node::{
    BitmapData, BitmapTextData, DisplayObject, FillPath, NodeFlags, NodeId, NodeKind, SpriteData,
    TextData,
};
pub use pixmap::{Pixmap, SoftwareSurface};
pub use stage::{Stage, StageChain};
pub use surface::{Surface, SurfaceError};
pub use tree::DisplayList;

// Event and geometry vocabulary used throughout the public API.
pub use limelight_events::{
    Event, EventDispatcher, EventKind, Handler, ListenerId, Phase, Pointer, PointerId, Tick,
};
pub use limelight_geom::{CompositeOperation, DisplayProps, Matrix2D, Rgba, Shadow};
