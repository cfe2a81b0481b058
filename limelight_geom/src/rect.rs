// Copyright 2026 the Limelight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangle helpers with display-list semantics over [`kurbo::Rect`].
//!
//! A rectangle is empty when its width or height is not positive;
//! intersection reports emptiness as `None` rather than a degenerate rect.

use kurbo::{Point, Rect};

use crate::matrix::Matrix2D;

/// Whether the rectangle has no area (`width <= 0 || height <= 0`).
pub fn is_empty(r: Rect) -> bool {
    r.width() <= 0.0 || r.height() <= 0.0
}

/// Grows `r` to include the rectangle at `(x, y)` with size `(w, h)`.
pub fn extend(r: Rect, x: f64, y: f64, w: f64, h: f64) -> Rect {
    Rect::new(r.x0.min(x), r.y0.min(y), r.x1.max(x + w), r.y1.max(y + h))
}

/// The union of two rectangles.
pub fn union(a: Rect, b: Rect) -> Rect {
    extend(a, b.x0, b.y0, b.width(), b.height())
}

/// Grows each edge of `r` outward by the given amount.
pub fn pad(r: Rect, top: f64, left: f64, bottom: f64, right: f64) -> Rect {
    Rect::new(r.x0 - left, r.y0 - top, r.x1 + right, r.y1 + bottom)
}

/// The overlap of two rectangles, or `None` when they do not overlap.
///
/// Edge-touching rectangles have no area and report `None`.
pub fn intersection(a: Rect, b: Rect) -> Option<Rect> {
    let x1 = a.x0.max(b.x0);
    let y1 = a.y0.max(b.y0);
    let x2 = a.x1.min(b.x1);
    let y2 = a.y1.min(b.y1);
    if x2 <= x1 || y2 <= y1 {
        None
    } else {
        Some(Rect::new(x1, y1, x2, y2))
    }
}

/// Whether two rectangles overlap or touch.
pub fn intersects(a: Rect, b: Rect) -> bool {
    b.x0 <= a.x1 && a.x0 <= b.x1 && b.y0 <= a.y1 && a.y0 <= b.y1
}

/// Whether `r` contains the rectangle at `(x, y)` with size `(w, h)`.
pub fn contains(r: Rect, x: f64, y: f64, w: f64, h: f64) -> bool {
    x >= r.x0 && x + w <= r.x1 && y >= r.y0 && y + h <= r.y1
}

/// The axis-aligned bounding box of `r` transformed by `m`.
///
/// Conservative for rotated or sheared transforms: the result covers the
/// transformed corners, not the exact transformed shape.
pub fn transform_rect_bbox(m: &Matrix2D, r: Rect) -> Rect {
    let pts = [
        m.transform_point(Point::new(r.x0, r.y0)),
        m.transform_point(Point::new(r.x1, r.y0)),
        m.transform_point(Point::new(r.x0, r.y1)),
        m.transform_point(Point::new(r.x1, r.y1)),
    ];
    let mut min_x = pts[0].x;
    let mut min_y = pts[0].y;
    let mut max_x = pts[0].x;
    let mut max_y = pts[0].y;
    for p in &pts[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Rect::new(min_x, min_y, max_x, max_y)
}
