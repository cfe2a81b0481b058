// Copyright 2026 the Limelight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Owned RGBA raster storage and the software [`Surface`] implementation.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Point, Rect};

use limelight_geom::rect::transform_rect_bbox;
use limelight_geom::{CompositeOperation, Matrix2D, Rgba, Shadow};

#[cfg(not(feature = "std"))]
#[allow(unused_imports, reason = "FloatExt is the no_std math fallback")]
use crate::common::FloatExt;

use crate::surface::{Surface, SurfaceError};

/// A width × height grid of RGBA pixels with straight (non-premultiplied)
/// alpha.
#[derive(Clone, PartialEq, Eq)]
pub struct Pixmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl fmt::Debug for Pixmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pixmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Pixmap {
    /// A transparent pixmap.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    /// A pixmap filled with `color`.
    pub fn solid(width: u32, height: u32, color: Rgba) -> Self {
        let mut pm = Self::new(width, height);
        pm.fill(color);
        pm
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The raw RGBA bytes, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }

    /// The pixel at `(x, y)`, or `None` outside the pixmap.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.index(x, y);
        Some(Rgba::new(self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]))
    }

    /// Overwrites the pixel at `(x, y)`; out-of-bounds writes are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = self.index(x, y);
        self.data[i] = color.r;
        self.data[i + 1] = color.g;
        self.data[i + 2] = color.b;
        self.data[i + 3] = color.a;
    }

    /// Sets every pixel to `color`.
    pub fn fill(&mut self, color: Rgba) {
        for px in self.data.chunks_exact_mut(4) {
            px[0] = color.r;
            px[1] = color.g;
            px[2] = color.b;
            px[3] = color.a;
        }
    }

    /// Sets every pixel to transparent.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Reallocates to the new size; all content is dropped.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.data = vec![0; (width as usize) * (height as usize) * 4];
    }
}

/// One saved level of surface state.
#[derive(Clone, Debug)]
struct GState {
    transform: Matrix2D,
    alpha: f64,
    composite: CompositeOperation,
    shadow: Option<Shadow>,
    /// Device-space clip region as a union of rects; `None` is unclipped,
    /// an empty list clips everything.
    clip: Option<Vec<Rect>>,
}

impl Default for GState {
    fn default() -> Self {
        Self {
            transform: Matrix2D::IDENTITY,
            alpha: 1.0,
            composite: CompositeOperation::SourceOver,
            shadow: None,
            clip: None,
        }
    }
}

/// The reference [`Surface`]: a CPU rasterizer over an owned [`Pixmap`].
///
/// Fills scan the device bounding box of the transformed shape and test
/// each pixel center through the inverse transform, so rotated and sheared
/// transforms rasterize correctly. Pixmap draws use nearest-neighbor
/// sampling. Shadows render as offset silhouettes; the blur radius is
/// carried but not applied.
pub struct SoftwareSurface {
    pixmap: Pixmap,
    state: GState,
    stack: Vec<GState>,
}

impl fmt::Debug for SoftwareSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftwareSurface")
            .field("pixmap", &self.pixmap)
            .field("saved_states", &self.stack.len())
            .finish_non_exhaustive()
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "blend results are clamped to 0..=255 before narrowing"
)]
fn to_channel(v: f64) -> u8 {
    (v * 255.0 + 0.5).clamp(0.0, 255.0) as u8
}

fn blend(dst: Rgba, src: Rgba, alpha: f64, op: CompositeOperation) -> Rgba {
    let sa = (f64::from(src.a) / 255.0 * alpha).clamp(0.0, 1.0);
    let da = f64::from(dst.a) / 255.0;
    let s = [
        f64::from(src.r) / 255.0 * sa,
        f64::from(src.g) / 255.0 * sa,
        f64::from(src.b) / 255.0 * sa,
    ];
    let d = [
        f64::from(dst.r) / 255.0 * da,
        f64::from(dst.g) / 255.0 * da,
        f64::from(dst.b) / 255.0 * da,
    ];

    let (out, out_a) = match op {
        CompositeOperation::SourceOver => (
            [
                s[0] + d[0] * (1.0 - sa),
                s[1] + d[1] * (1.0 - sa),
                s[2] + d[2] * (1.0 - sa),
            ],
            sa + da * (1.0 - sa),
        ),
        CompositeOperation::DestinationOver => (
            [
                d[0] + s[0] * (1.0 - da),
                d[1] + s[1] * (1.0 - da),
                d[2] + s[2] * (1.0 - da),
            ],
            da + sa * (1.0 - da),
        ),
        CompositeOperation::DestinationOut => (
            [
                d[0] * (1.0 - sa),
                d[1] * (1.0 - sa),
                d[2] * (1.0 - sa),
            ],
            da * (1.0 - sa),
        ),
        CompositeOperation::Lighter => (
            [
                (s[0] + d[0]).min(1.0),
                (s[1] + d[1]).min(1.0),
                (s[2] + d[2]).min(1.0),
            ],
            (sa + da).min(1.0),
        ),
        CompositeOperation::Copy => (s, sa),
    };

    if out_a <= 0.0 {
        return Rgba::TRANSPARENT;
    }
    Rgba::new(
        to_channel(out[0] / out_a),
        to_channel(out[1] / out_a),
        to_channel(out[2] / out_a),
        to_channel(out_a),
    )
}

impl SoftwareSurface {
    /// A transparent surface of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixmap: Pixmap::new(width, height),
            state: GState::default(),
            stack: Vec::new(),
        }
    }

    /// The backing pixels.
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Mutable access to the backing pixels, e.g. for filter passes.
    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// Reallocates the backing pixmap; content and saved states are
    /// dropped, the current state resets.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.pixmap.resize(width, height);
        self.reset_state();
    }

    /// Resets transform, alpha, compositing, shadow, and clip, and clears
    /// the save stack.
    pub fn reset_state(&mut self) {
        self.state = GState::default();
        self.stack.clear();
    }

    fn clip_contains(&self, x: f64, y: f64) -> bool {
        match &self.state.clip {
            None => true,
            Some(rects) => rects
                .iter()
                .any(|r| x >= r.x0 && x < r.x1 && y >= r.y0 && y < r.y1),
        }
    }

    /// Device-space pixel range covered by `bbox`, clamped to the surface.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "bounds are clamped to the surface size before narrowing"
    )]
    fn pixel_span(&self, bbox: Rect) -> Option<(u32, u32, u32, u32)> {
        if !(bbox.x0.is_finite() && bbox.y0.is_finite() && bbox.x1.is_finite() && bbox.y1.is_finite())
        {
            return None;
        }
        let x0 = bbox.x0.floor().max(0.0) as u32;
        let y0 = bbox.y0.floor().max(0.0) as u32;
        let x1 = (bbox.x1.ceil().max(0.0) as u64).min(u64::from(self.pixmap.width)) as u32;
        let y1 = (bbox.y1.ceil().max(0.0) as u64).min(u64::from(self.pixmap.height)) as u32;
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0, y0, x1, y1))
    }

    /// Scans the device footprint of `rect` shifted by `offset`, blending
    /// `color` wherever the inverse-transformed pixel center lands inside.
    fn scan_fill(&mut self, rect: Rect, color: Rgba, offset: (f64, f64), alpha: f64) {
        let inv = self.state.transform.inverted();
        if !inv.a.is_finite() || !inv.tx.is_finite() {
            return;
        }
        let dev = transform_rect_bbox(&self.state.transform, rect);
        let dev = Rect::new(
            dev.x0 + offset.0,
            dev.y0 + offset.1,
            dev.x1 + offset.0,
            dev.y1 + offset.1,
        );
        let Some((x0, y0, x1, y1)) = self.pixel_span(dev) else {
            return;
        };
        let op = self.state.composite;
        for py in y0..y1 {
            for px in x0..x1 {
                let cx = f64::from(px) + 0.5;
                let cy = f64::from(py) + 0.5;
                if !self.clip_contains(cx, cy) {
                    continue;
                }
                let local = inv.transform_point(Point::new(cx - offset.0, cy - offset.1));
                if local.x >= rect.x0 && local.x < rect.x1 && local.y >= rect.y0 && local.y < rect.y1
                {
                    let dst = self.pixmap.pixel(px, py).unwrap_or(Rgba::TRANSPARENT);
                    self.pixmap.set_pixel(px, py, blend(dst, color, alpha, op));
                }
            }
        }
    }

    /// Like [`SoftwareSurface::scan_fill`] but sampling `pixmap` through
    /// the `src`→`dst` mapping. With `silhouette` set, only the sampled
    /// alpha is used (for shadow passes).
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "sample coordinates are clamped to the source rect before narrowing"
    )]
    fn scan_pixmap(
        &mut self,
        pixmap: &Pixmap,
        src: Rect,
        dst: Rect,
        offset: (f64, f64),
        silhouette: Option<Rgba>,
    ) {
        if src.width() <= 0.0 || src.height() <= 0.0 || dst.width() <= 0.0 || dst.height() <= 0.0 {
            return;
        }
        let inv = self.state.transform.inverted();
        if !inv.a.is_finite() || !inv.tx.is_finite() {
            return;
        }
        let dev = transform_rect_bbox(&self.state.transform, dst);
        let dev = Rect::new(
            dev.x0 + offset.0,
            dev.y0 + offset.1,
            dev.x1 + offset.0,
            dev.y1 + offset.1,
        );
        let Some((x0, y0, x1, y1)) = self.pixel_span(dev) else {
            return;
        };
        let op = self.state.composite;
        let alpha = self.state.alpha;
        let sx = src.width() / dst.width();
        let sy = src.height() / dst.height();
        for py in y0..y1 {
            for px in x0..x1 {
                let cx = f64::from(px) + 0.5;
                let cy = f64::from(py) + 0.5;
                if !self.clip_contains(cx, cy) {
                    continue;
                }
                let local = inv.transform_point(Point::new(cx - offset.0, cy - offset.1));
                if local.x < dst.x0 || local.x >= dst.x1 || local.y < dst.y0 || local.y >= dst.y1 {
                    continue;
                }
                let u = src.x0 + (local.x - dst.x0) * sx;
                let v = src.y0 + (local.y - dst.y0) * sy;
                if u < 0.0 || v < 0.0 {
                    continue;
                }
                let Some(sample) = pixmap.pixel(u.floor() as u32, v.floor() as u32) else {
                    continue;
                };
                if sample.a == 0 {
                    continue;
                }
                let color = match silhouette {
                    Some(shadow_color) => {
                        Rgba::new(shadow_color.r, shadow_color.g, shadow_color.b, shadow_color.a)
                    }
                    None => sample,
                };
                let src_alpha = match silhouette {
                    // Shadow opacity follows the sampled coverage.
                    Some(_) => alpha * f64::from(sample.a) / 255.0,
                    None => alpha,
                };
                let dst_px = self.pixmap.pixel(px, py).unwrap_or(Rgba::TRANSPARENT);
                self.pixmap.set_pixel(px, py, blend(dst_px, color, src_alpha, op));
            }
        }
    }
}

impl Surface for SoftwareSurface {
    fn width(&self) -> u32 {
        self.pixmap.width
    }

    fn height(&self) -> u32 {
        self.pixmap.height
    }

    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn set_transform(&mut self, m: &Matrix2D) {
        self.state.transform = *m;
    }

    fn transform(&mut self, m: &Matrix2D) {
        self.state.transform.append_matrix(m);
    }

    fn global_alpha(&self) -> f64 {
        self.state.alpha
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.state.alpha = alpha;
    }

    fn set_composite_operation(&mut self, op: CompositeOperation) {
        self.state.composite = op;
    }

    fn set_shadow(&mut self, shadow: Option<Shadow>) {
        self.state.shadow = shadow;
    }

    fn clip_rects(&mut self, rects: &[Rect]) {
        let incoming: Vec<Rect> = rects
            .iter()
            .map(|r| transform_rect_bbox(&self.state.transform, *r))
            .collect();
        let next = match self.state.clip.take() {
            None => incoming,
            Some(existing) => {
                let mut out = Vec::new();
                for a in &existing {
                    for b in &incoming {
                        if let Some(overlap) = limelight_geom::rect::intersection(*a, *b) {
                            out.push(overlap);
                        }
                    }
                }
                out
            }
        };
        self.state.clip = Some(next);
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        if let Some(shadow) = self.state.shadow
            && shadow.color.a > 0
        {
            let alpha = self.state.alpha;
            self.scan_fill(rect, shadow.color, (shadow.offset_x, shadow.offset_y), alpha);
        }
        let alpha = self.state.alpha;
        self.scan_fill(rect, color, (0.0, 0.0), alpha);
    }

    fn draw_pixmap(&mut self, pixmap: &Pixmap, src: Rect, dst: Rect) {
        if let Some(shadow) = self.state.shadow
            && shadow.color.a > 0
        {
            self.scan_pixmap(
                pixmap,
                src,
                dst,
                (shadow.offset_x, shadow.offset_y),
                Some(shadow.color),
            );
        }
        self.scan_pixmap(pixmap, src, dst, (0.0, 0.0), None);
    }

    fn clear_rect(&mut self, rect: Rect) {
        let inv = self.state.transform.inverted();
        if !inv.a.is_finite() || !inv.tx.is_finite() {
            return;
        }
        let dev = transform_rect_bbox(&self.state.transform, rect);
        let Some((x0, y0, x1, y1)) = self.pixel_span(dev) else {
            return;
        };
        for py in y0..y1 {
            for px in x0..x1 {
                let cx = f64::from(px) + 0.5;
                let cy = f64::from(py) + 0.5;
                if !self.clip_contains(cx, cy) {
                    continue;
                }
                let local = inv.transform_point(Point::new(cx, cy));
                if local.x >= rect.x0 && local.x < rect.x1 && local.y >= rect.y0 && local.y < rect.y1
                {
                    self.pixmap.set_pixel(px, py, Rgba::TRANSPARENT);
                }
            }
        }
    }

    fn clear(&mut self) {
        self.pixmap.clear();
    }

    fn read_pixel(&self, x: u32, y: u32) -> Result<Rgba, SurfaceError> {
        self.pixmap.pixel(x, y).ok_or(SurfaceError::OutOfBounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_covers_exact_pixels() {
        let mut s = SoftwareSurface::new(8, 8);
        s.fill_rect(Rect::new(1.0, 1.0, 3.0, 3.0), Rgba::rgb(255, 0, 0));
        assert_eq!(s.read_pixel(1, 1), Ok(Rgba::rgb(255, 0, 0)), "inside the rect");
        assert_eq!(s.read_pixel(2, 2), Ok(Rgba::rgb(255, 0, 0)), "inside the rect");
        assert_eq!(s.read_pixel(3, 3), Ok(Rgba::TRANSPARENT), "outside the rect");
        assert_eq!(s.read_pixel(0, 0), Ok(Rgba::TRANSPARENT), "outside the rect");
    }

    #[test]
    fn transform_moves_the_fill() {
        let mut s = SoftwareSurface::new(8, 8);
        let mut m = Matrix2D::IDENTITY;
        m.translate(4.0, 4.0);
        s.set_transform(&m);
        s.fill_rect(Rect::new(0.0, 0.0, 2.0, 2.0), Rgba::BLACK);
        assert_eq!(s.read_pixel(4, 4), Ok(Rgba::BLACK), "translated fill");
        assert_eq!(s.read_pixel(1, 1), Ok(Rgba::TRANSPARENT), "origin untouched");
    }

    #[test]
    fn global_alpha_scales_coverage() {
        let mut s = SoftwareSurface::new(2, 2);
        s.set_global_alpha(0.5);
        s.fill_rect(Rect::new(0.0, 0.0, 2.0, 2.0), Rgba::BLACK);
        let px = s.read_pixel(0, 0).unwrap();
        assert!((126..=129).contains(&px.a), "half-alpha fill, got {}", px.a);
    }

    #[test]
    fn save_restore_round_trips_state() {
        let mut s = SoftwareSurface::new(4, 4);
        s.save();
        s.set_global_alpha(0.25);
        let mut m = Matrix2D::IDENTITY;
        m.scale(2.0, 2.0);
        s.transform(&m);
        s.restore();
        assert_eq!(s.global_alpha(), 1.0, "alpha restored");
        s.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Rgba::BLACK);
        assert_eq!(s.read_pixel(0, 0), Ok(Rgba::BLACK), "transform restored to identity");
        assert_eq!(s.read_pixel(1, 1), Ok(Rgba::TRANSPARENT), "scale no longer applies");
    }

    #[test]
    fn clip_restricts_fills() {
        let mut s = SoftwareSurface::new(8, 8);
        s.clip_rects(&[Rect::new(0.0, 0.0, 2.0, 2.0)]);
        s.fill_rect(Rect::new(0.0, 0.0, 8.0, 8.0), Rgba::BLACK);
        assert_eq!(s.read_pixel(1, 1), Ok(Rgba::BLACK), "inside clip");
        assert_eq!(s.read_pixel(4, 4), Ok(Rgba::TRANSPARENT), "outside clip");
        // A second clip intersects rather than replaces.
        s.clip_rects(&[Rect::new(1.0, 1.0, 8.0, 8.0)]);
        s.fill_rect(Rect::new(0.0, 0.0, 8.0, 8.0), Rgba::rgb(0, 255, 0));
        assert_eq!(s.read_pixel(0, 0), Ok(Rgba::BLACK), "outside the narrowed clip");
        assert_eq!(s.read_pixel(1, 1), Ok(Rgba::rgb(0, 255, 0)), "inside both clips");
    }

    #[test]
    fn destination_out_erases() {
        let mut s = SoftwareSurface::new(2, 2);
        s.fill_rect(Rect::new(0.0, 0.0, 2.0, 2.0), Rgba::BLACK);
        s.set_composite_operation(CompositeOperation::DestinationOut);
        s.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Rgba::WHITE);
        assert_eq!(s.read_pixel(0, 0).unwrap().a, 0, "erased where drawn");
        assert_eq!(s.read_pixel(1, 1), Ok(Rgba::BLACK), "untouched elsewhere");
    }

    #[test]
    fn pixmap_blit_scales() {
        let src = Pixmap::solid(2, 2, Rgba::rgb(0, 0, 255));
        let mut s = SoftwareSurface::new(8, 8);
        s.draw_pixmap(&src, Rect::new(0.0, 0.0, 2.0, 2.0), Rect::new(0.0, 0.0, 4.0, 4.0));
        assert_eq!(s.read_pixel(3, 3), Ok(Rgba::rgb(0, 0, 255)), "2x upscale covers 4x4");
        assert_eq!(s.read_pixel(4, 4), Ok(Rgba::TRANSPARENT), "nothing past dst");
    }

    #[test]
    fn shadow_draws_offset_silhouette() {
        let mut s = SoftwareSurface::new(8, 8);
        s.set_shadow(Some(Shadow::new(Rgba::rgb(0, 255, 0), 2.0, 2.0, 0.0)));
        s.fill_rect(Rect::new(0.0, 0.0, 2.0, 2.0), Rgba::BLACK);
        assert_eq!(s.read_pixel(0, 0), Ok(Rgba::BLACK), "fill on top");
        assert_eq!(s.read_pixel(3, 3), Ok(Rgba::rgb(0, 255, 0)), "shadow offset by (2, 2)");
    }

    #[test]
    fn read_pixel_out_of_bounds_errors() {
        let s = SoftwareSurface::new(2, 2);
        assert_eq!(s.read_pixel(2, 0), Err(SurfaceError::OutOfBounds), "x out of range");
    }

    #[test]
    fn clear_rect_ignores_alpha_state() {
        let mut s = SoftwareSurface::new(4, 4);
        s.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0), Rgba::BLACK);
        s.set_global_alpha(0.1);
        s.clear_rect(Rect::new(0.0, 0.0, 2.0, 2.0));
        assert_eq!(s.read_pixel(0, 0), Ok(Rgba::TRANSPARENT), "cleared outright");
        assert_eq!(s.read_pixel(2, 2), Ok(Rgba::BLACK), "rest untouched");
    }
}
