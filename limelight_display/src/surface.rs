// Copyright 2026 the Limelight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The drawing-surface contract the display list renders through.

use core::fmt;

use kurbo::Rect;

use limelight_geom::{CompositeOperation, Matrix2D, Rgba, Shadow};

use crate::pixmap::Pixmap;

/// Failure reading pixels back from a surface.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SurfaceError {
    /// The backend cannot provide pixel data (e.g. protected or foreign
    /// content).
    PixelsUnavailable,
    /// The requested pixel lies outside the surface.
    OutOfBounds,
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PixelsUnavailable => write!(f, "surface pixels are unavailable"),
            Self::OutOfBounds => write!(f, "pixel coordinates outside the surface"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SurfaceError {}

/// A canvas-like rasterization target with a saved/restored state machine.
///
/// The state is: current transform, global alpha, compositing mode, shadow,
/// and clip region. Drawing operations apply the full state. Clips are
/// conservative axis-aligned regions; a backend may clip more precisely but
/// never less.
///
/// [`SoftwareSurface`](crate::SoftwareSurface) is the reference
/// implementation; hosts can implement this trait over their own raster
/// backend to present a stage elsewhere.
pub trait Surface {
    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// Pushes the current state onto the stack.
    fn save(&mut self);

    /// Pops the most recent saved state; no-op on an empty stack.
    fn restore(&mut self);

    /// Replaces the current transform.
    fn set_transform(&mut self, m: &Matrix2D);

    /// Appends `m` to the current transform.
    fn transform(&mut self, m: &Matrix2D);

    /// The current global alpha.
    fn global_alpha(&self) -> f64;

    /// Replaces the global alpha.
    fn set_global_alpha(&mut self, alpha: f64);

    /// Replaces the compositing mode.
    fn set_composite_operation(&mut self, op: CompositeOperation);

    /// Sets or clears the shadow state.
    fn set_shadow(&mut self, shadow: Option<Shadow>);

    /// Intersects the clip region with the union of `rects`, interpreted
    /// under the current transform.
    fn clip_rects(&mut self, rects: &[Rect]);

    /// Fills `rect` (in current-transform coordinates) with `color`.
    fn fill_rect(&mut self, rect: Rect, color: Rgba);

    /// Draws the `src` region of `pixmap` into the `dst` rect (in
    /// current-transform coordinates).
    fn draw_pixmap(&mut self, pixmap: &Pixmap, src: Rect, dst: Rect);

    /// Clears `rect` (in current-transform coordinates) to transparent,
    /// ignoring alpha and compositing state.
    fn clear_rect(&mut self, rect: Rect);

    /// Clears the whole surface to transparent.
    fn clear(&mut self);

    /// Reads one pixel in device coordinates.
    fn read_pixel(&self, x: u32, y: u32) -> Result<Rgba, SurfaceError>;
}
