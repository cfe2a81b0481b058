// Copyright 2026 the Limelight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rasterized node caches and the filter contract.

use alloc::sync::Arc;
use core::fmt;

use kurbo::Rect;

use limelight_geom::rect::union;
use limelight_geom::{CompositeOperation, Matrix2D};

#[cfg(not(feature = "std"))]
#[allow(unused_imports, reason = "FloatExt is the no_std math fallback")]
use crate::common::FloatExt;

use crate::node::NodeId;
use crate::pixmap::{Pixmap, SoftwareSurface};
use crate::surface::{Surface, SurfaceError};
use crate::tree::DisplayList;

/// A raster effect applied to a node's cached pixels.
///
/// Filters only run through the cache pass: cache a node to apply its
/// filters, and update the cache to re-apply them after a change.
pub trait Filter {
    /// Extra margin the filter needs around the source, in pre-scale
    /// pixels. `None` means the filter stays within the source bounds.
    fn bounds(&self) -> Option<Rect> {
        None
    }

    /// Transforms the cached pixels in place.
    fn apply(&self, pixmap: &mut Pixmap) -> Result<(), SurfaceError>;
}

/// An offscreen rasterization of one node.
///
/// The cache covers the region `(x, y, width, height)` of the node's local
/// space at `scale` device pixels per unit, padded by the union of the
/// node's filter margins. While present, drawing the node blits this
/// raster instead of re-rendering, and stays stale across content changes
/// until [`DisplayList::update_cache`] runs.
pub struct BitmapCache {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    scale: f64,
    cache_id: u64,
    filter_off_x: f64,
    filter_off_y: f64,
    draw_width: f64,
    draw_height: f64,
    surface: SoftwareSurface,
    snapshot: Option<(u64, Arc<Pixmap>)>,
}

impl fmt::Debug for BitmapCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitmapCache")
            .field("region", &self.region())
            .field("scale", &self.scale)
            .field("cache_id", &self.cache_id)
            .finish_non_exhaustive()
    }
}

impl BitmapCache {
    fn new(x: f64, y: f64, width: f64, height: f64, scale: f64) -> Self {
        // Degenerate regions collapse to a single unit rather than failing.
        let width = if width > 0.0 { width } else { 1.0 };
        let height = if height > 0.0 { height } else { 1.0 };
        let scale = if scale > 0.0 { scale } else { 1.0 };
        Self {
            x,
            y,
            width,
            height,
            scale,
            cache_id: 0,
            filter_off_x: 0.0,
            filter_off_y: 0.0,
            draw_width: 0.0,
            draw_height: 0.0,
            surface: SoftwareSurface::new(0, 0),
            snapshot: None,
        }
    }

    /// The cached region in the node's local space.
    pub fn region(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Device pixels per local unit.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Counter incremented on every cache fill; compare across calls to
    /// detect refreshes.
    pub fn cache_id(&self) -> u64 {
        self.cache_id
    }

    /// The cached raster.
    pub fn pixmap(&self) -> &Pixmap {
        self.surface.pixmap()
    }

    /// An immutable shared copy of the cached raster, memoized until the
    /// next cache fill.
    pub fn snapshot(&mut self) -> Arc<Pixmap> {
        match &self.snapshot {
            Some((id, pm)) if *id == self.cache_id => Arc::clone(pm),
            _ => {
                let pm = Arc::new(self.surface.pixmap().clone());
                self.snapshot = Some((self.cache_id, Arc::clone(&pm)));
                pm
            }
        }
    }

    /// Blits the cache into `surface` in the node's local space,
    /// compensating for scale and filter padding.
    pub(crate) fn draw(&self, surface: &mut dyn Surface) {
        if self.cache_id == 0 {
            return;
        }
        let dst_x = self.x + self.filter_off_x / self.scale;
        let dst_y = self.y + self.filter_off_y / self.scale;
        surface.draw_pixmap(
            self.surface.pixmap(),
            Rect::new(0.0, 0.0, self.draw_width, self.draw_height),
            Rect::new(
                dst_x,
                dst_y,
                dst_x + self.draw_width / self.scale,
                dst_y + self.draw_height / self.scale,
            ),
        );
    }
}

impl DisplayList {
    /// Caches the node: rasterizes the region `(x, y, width, height)` of
    /// its local space at `scale` and blits that raster on subsequent
    /// draws instead of re-rendering.
    ///
    /// Filters on the node are applied to the raster. The raster goes
    /// stale when the node's content changes; call
    /// [`DisplayList::update_cache`] to refresh it. Re-caching replaces
    /// any existing cache.
    pub fn cache(
        &mut self,
        id: NodeId,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        scale: f64,
    ) -> Result<(), SurfaceError> {
        let mut cache = BitmapCache::new(x, y, width, height, scale);
        self.fill_cache(id, &mut cache, None)?;
        self.node_mut(id).cache = Some(cache);
        Ok(())
    }

    /// Re-rasterizes an existing cache in place.
    ///
    /// With `composite` set, the fresh render composites over the previous
    /// raster with that mode instead of clearing first, which accumulates
    /// content across updates (e.g. `SourceOver` for motion trails).
    ///
    /// Panics if the node was never cached.
    pub fn update_cache(
        &mut self,
        id: NodeId,
        composite: Option<CompositeOperation>,
    ) -> Result<(), SurfaceError> {
        let mut cache = self
            .node_mut(id)
            .cache
            .take()
            .expect("cache() must be called before update_cache()");
        let result = self.fill_cache(id, &mut cache, composite);
        self.node_mut(id).cache = Some(cache);
        result
    }

    /// Drops the node's cache; the node renders live again.
    pub fn uncache(&mut self, id: NodeId) {
        self.node_mut(id).cache = None;
    }

    /// The node's cache, if present.
    pub fn bitmap_cache(&self, id: NodeId) -> Option<&BitmapCache> {
        self.node(id).cache.as_ref()
    }

    /// A shared snapshot of the node's cached raster, if cached.
    pub fn cache_snapshot(&mut self, id: NodeId) -> Option<Arc<Pixmap>> {
        self.node_mut(id).cache.as_mut().map(BitmapCache::snapshot)
    }

    fn filter_bounds(&self, id: NodeId) -> Rect {
        let mut acc = Rect::ZERO;
        for f in &self.node(id).obj.filters {
            if let Some(b) = f.bounds() {
                acc = union(acc, b);
            }
        }
        acc
    }

    fn fill_cache(
        &mut self,
        id: NodeId,
        cache: &mut BitmapCache,
        composite: Option<CompositeOperation>,
    ) -> Result<(), SurfaceError> {
        let fb = self.filter_bounds(id);
        cache.filter_off_x = fb.x0;
        cache.filter_off_y = fb.y0;
        let draw_w = (cache.width * cache.scale).ceil() + fb.width();
        let draw_h = (cache.height * cache.scale).ceil() + fb.height();
        if draw_w != cache.draw_width || draw_h != cache.draw_height {
            cache.draw_width = draw_w;
            cache.draw_height = draw_h;
            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                reason = "raster dimensions are non-negative and far below u32::MAX"
            )]
            cache.surface.resize(draw_w.ceil() as u32, draw_h.ceil() as u32);
        } else if composite.is_none() {
            cache.surface.clear();
        }

        cache.surface.reset_state();
        cache.surface.set_transform(&Matrix2D::new(
            cache.scale,
            0.0,
            0.0,
            cache.scale,
            -cache.filter_off_x,
            -cache.filter_off_y,
        ));
        let mut shift = Matrix2D::IDENTITY;
        shift.translate(-cache.x, -cache.y);
        cache.surface.transform(&shift);
        if let Some(op) = composite {
            cache.surface.set_composite_operation(op);
        }
        self.draw_node(id, &mut cache.surface, true);

        let filters = self.node(id).obj.filters.clone();
        for f in &filters {
            f.apply(cache.surface.pixmap_mut())?;
        }
        cache.cache_id += 1;
        cache.snapshot = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;

    use limelight_geom::Rgba;

    use crate::node::{DisplayObject, FillPath};

    fn rect_shape(w: f64, h: f64, color: Rgba) -> DisplayObject {
        let mut path = FillPath::new();
        path.fill_rect(Rect::new(0.0, 0.0, w, h), color);
        DisplayObject::shape(path)
    }

    fn set_fill(tree: &mut DisplayList, id: NodeId, rect: Rect, color: Rgba) {
        if let crate::node::NodeKind::Shape(path) = &mut tree.obj_mut(id).kind {
            path.clear();
            path.fill_rect(rect, color);
        }
    }

    /// Inverts RGB, growing the raster footprint by `margin` on each side.
    struct Invert {
        margin: f64,
    }

    impl Filter for Invert {
        fn bounds(&self) -> Option<Rect> {
            Some(Rect::new(-self.margin, -self.margin, self.margin, self.margin))
        }

        fn apply(&self, pixmap: &mut Pixmap) -> Result<(), SurfaceError> {
            for y in 0..pixmap.height() {
                for x in 0..pixmap.width() {
                    if let Some(px) = pixmap.pixel(x, y) {
                        pixmap.set_pixel(
                            x,
                            y,
                            Rgba::new(255 - px.r, 255 - px.g, 255 - px.b, px.a),
                        );
                    }
                }
            }
            Ok(())
        }
    }

    #[test]
    fn cached_node_stays_stale_until_update() {
        let mut tree = DisplayList::new();
        let shape = tree.insert(rect_shape(4.0, 4.0, Rgba::BLACK));
        tree.cache(shape, 0.0, 0.0, 4.0, 4.0, 1.0).unwrap();

        set_fill(&mut tree, shape, Rect::new(0.0, 0.0, 4.0, 4.0), Rgba::rgb(255, 0, 0));
        let mut surface = SoftwareSurface::new(8, 8);
        tree.draw_node(shape, &mut surface, false);
        assert_eq!(surface.read_pixel(1, 1), Ok(Rgba::BLACK), "stale cache blits old pixels");

        tree.update_cache(shape, None).unwrap();
        surface.clear();
        tree.draw_node(shape, &mut surface, false);
        assert_eq!(
            surface.read_pixel(1, 1),
            Ok(Rgba::rgb(255, 0, 0)),
            "update re-rasterizes the content"
        );
    }

    #[test]
    fn ignore_cache_draws_live_content() {
        let mut tree = DisplayList::new();
        let shape = tree.insert(rect_shape(4.0, 4.0, Rgba::BLACK));
        tree.cache(shape, 0.0, 0.0, 4.0, 4.0, 1.0).unwrap();
        set_fill(&mut tree, shape, Rect::new(0.0, 0.0, 4.0, 4.0), Rgba::rgb(0, 0, 255));
        let mut surface = SoftwareSurface::new(8, 8);
        tree.draw_node(shape, &mut surface, true);
        assert_eq!(
            surface.read_pixel(1, 1),
            Ok(Rgba::rgb(0, 0, 255)),
            "bypassing the cache renders live pixels"
        );
    }

    #[test]
    fn update_without_clear_accumulates_content() {
        let mut tree = DisplayList::new();
        let shape = tree.insert(rect_shape(2.0, 2.0, Rgba::BLACK));
        tree.cache(shape, 0.0, 0.0, 8.0, 8.0, 1.0).unwrap();

        // Move the fill and composite over the previous raster.
        set_fill(&mut tree, shape, Rect::new(4.0, 4.0, 6.0, 6.0), Rgba::BLACK);
        tree.update_cache(shape, Some(CompositeOperation::SourceOver)).unwrap();

        let mut surface = SoftwareSurface::new(8, 8);
        tree.draw_node(shape, &mut surface, false);
        assert_eq!(surface.read_pixel(0, 0), Ok(Rgba::BLACK), "first pass survives");
        assert_eq!(surface.read_pixel(5, 5), Ok(Rgba::BLACK), "second pass lands");
    }

    #[test]
    fn update_with_clear_drops_previous_content() {
        let mut tree = DisplayList::new();
        let shape = tree.insert(rect_shape(2.0, 2.0, Rgba::BLACK));
        tree.cache(shape, 0.0, 0.0, 8.0, 8.0, 1.0).unwrap();
        set_fill(&mut tree, shape, Rect::new(4.0, 4.0, 6.0, 6.0), Rgba::BLACK);
        tree.update_cache(shape, None).unwrap();

        let mut surface = SoftwareSurface::new(8, 8);
        tree.draw_node(shape, &mut surface, false);
        assert_eq!(surface.read_pixel(0, 0), Ok(Rgba::TRANSPARENT), "old pixels cleared");
        assert_eq!(surface.read_pixel(5, 5), Ok(Rgba::BLACK), "new pixels present");
    }

    #[test]
    #[should_panic(expected = "cache() must be called before update_cache()")]
    fn update_without_cache_panics() {
        let mut tree = DisplayList::new();
        let shape = tree.insert(rect_shape(2.0, 2.0, Rgba::BLACK));
        let _ = tree.update_cache(shape, None);
    }

    #[test]
    fn filters_run_through_the_cache_pass() {
        let mut tree = DisplayList::new();
        let shape = tree.insert(rect_shape(4.0, 4.0, Rgba::BLACK));
        tree.obj_mut(shape).filters.push(Rc::new(Invert { margin: 0.0 }));
        tree.cache(shape, 0.0, 0.0, 4.0, 4.0, 1.0).unwrap();

        let mut surface = SoftwareSurface::new(8, 8);
        tree.draw_node(shape, &mut surface, false);
        assert_eq!(surface.read_pixel(1, 1), Ok(Rgba::WHITE), "black inverted to white");

        let mut live = SoftwareSurface::new(8, 8);
        tree.draw_node(shape, &mut live, true);
        assert_eq!(live.read_pixel(1, 1), Ok(Rgba::BLACK), "live draw skips filters");
    }

    #[test]
    fn filter_margin_pads_the_raster_and_offsets_the_blit() {
        let mut tree = DisplayList::new();
        let shape = tree.insert(rect_shape(4.0, 4.0, Rgba::BLACK));
        tree.obj_mut(shape).filters.push(Rc::new(Invert { margin: 2.0 }));
        tree.cache(shape, 0.0, 0.0, 4.0, 4.0, 1.0).unwrap();

        let cache = tree.bitmap_cache(shape).unwrap();
        assert_eq!(cache.pixmap().width(), 8, "4 + 2 margin each side");

        // Blit lands back at the original local position despite padding;
        // the margin pixels carry the filter's output (inverted
        // transparent black).
        let mut surface = SoftwareSurface::new(12, 12);
        let mut shift = Matrix2D::IDENTITY;
        shift.translate(2.0, 2.0);
        surface.set_transform(&shift);
        tree.draw_node(shape, &mut surface, false);
        assert_eq!(surface.read_pixel(2, 2), Ok(Rgba::WHITE), "content at local origin");
        assert_eq!(surface.read_pixel(9, 9), Ok(Rgba::TRANSPARENT), "past the padded region");
    }

    #[test]
    fn scaled_cache_renders_at_higher_resolution() {
        let mut tree = DisplayList::new();
        let shape = tree.insert(rect_shape(4.0, 4.0, Rgba::BLACK));
        tree.cache(shape, 0.0, 0.0, 4.0, 4.0, 2.0).unwrap();
        let cache = tree.bitmap_cache(shape).unwrap();
        assert_eq!(cache.pixmap().width(), 8, "raster doubled");

        let mut surface = SoftwareSurface::new(8, 8);
        tree.draw_node(shape, &mut surface, false);
        assert_eq!(surface.read_pixel(3, 3), Ok(Rgba::BLACK), "blit back at logical size");
        assert_eq!(surface.read_pixel(4, 4), Ok(Rgba::TRANSPARENT), "still 4x4 on screen");
    }

    #[test]
    fn snapshot_is_memoized_per_fill() {
        let mut tree = DisplayList::new();
        let shape = tree.insert(rect_shape(4.0, 4.0, Rgba::BLACK));
        tree.cache(shape, 0.0, 0.0, 4.0, 4.0, 1.0).unwrap();
        let a = tree.cache_snapshot(shape).unwrap();
        let b = tree.cache_snapshot(shape).unwrap();
        assert!(Arc::ptr_eq(&a, &b), "repeated snapshots share one allocation");

        tree.update_cache(shape, None).unwrap();
        let c = tree.cache_snapshot(shape).unwrap();
        assert!(!Arc::ptr_eq(&a, &c), "a cache fill invalidates the snapshot");
        let uncached = tree.insert(rect_shape(1.0, 1.0, Rgba::BLACK));
        assert!(tree.cache_snapshot(uncached).is_none());
    }

    #[test]
    fn cache_region_becomes_the_node_bounds() {
        let mut tree = DisplayList::new();
        let shape = tree.insert(rect_shape(4.0, 4.0, Rgba::BLACK));
        assert_eq!(tree.bounds(shape), None, "no bounds before caching");
        tree.cache(shape, -1.0, -1.0, 6.0, 6.0, 1.0).unwrap();
        assert_eq!(
            tree.bounds(shape),
            Some(Rect::new(-1.0, -1.0, 5.0, 5.0)),
            "cache region reported as bounds"
        );
        tree.uncache(shape);
        assert_eq!(tree.bounds(shape), None, "bounds gone after uncache");
    }
}
