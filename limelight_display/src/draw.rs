// Copyright 2026 the Limelight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rendering the display list onto a [`Surface`].

use alloc::vec::Vec;

use kurbo::Rect;

use limelight_geom::Matrix2D;

#[cfg(not(feature = "std"))]
#[allow(unused_imports, reason = "FloatExt is the no_std math fallback")]
use crate::common::FloatExt;

use crate::node::{NodeFlags, NodeId, NodeKind};
use crate::surface::Surface;
use crate::tree::DisplayList;

impl DisplayList {
    /// Applies the node's state to the surface ahead of drawing it:
    /// mask clip, local transform (snapped when enabled), alpha, and any
    /// explicit compositing mode or shadow.
    ///
    /// Callers bracket this with [`Surface::save`] and
    /// [`Surface::restore`].
    pub fn update_context(&self, id: NodeId, surface: &mut dyn Surface) {
        let mask_clip: Option<(Matrix2D, Vec<Rect>)> = self.node(id).obj.mask.and_then(|m| {
            let mask = &self.node(m).obj;
            match &mask.kind {
                NodeKind::Shape(path) if !path.is_empty() => {
                    Some((mask.matrix(), path.rects().collect()))
                }
                _ => None,
            }
        });
        if let Some((mask_mtx, rects)) = mask_clip {
            // The clip is declared in the mask's own space, then the
            // transform is unwound so it does not leak into the node.
            surface.transform(&mask_mtx);
            surface.clip_rects(&rects);
            surface.transform(&mask_mtx.inverted());
        }

        let obj = &self.node(id).obj;
        let mut mtx = obj.matrix();
        if self.env.snap_to_pixel_enabled && obj.flags.contains(NodeFlags::SNAP_TO_PIXEL) {
            mtx.tx = (mtx.tx + if mtx.tx < 0.0 { -0.5 } else { 0.5 }).trunc();
            mtx.ty = (mtx.ty + if mtx.ty < 0.0 { -0.5 } else { 0.5 }).trunc();
        }
        surface.transform(&mtx);
        surface.set_global_alpha(surface.global_alpha() * obj.alpha);
        if let Some(op) = obj.composite_operation {
            surface.set_composite_operation(op);
        }
        if let Some(shadow) = obj.shadow {
            surface.set_shadow(Some(shadow));
        }
    }

    /// Draws the node's content in its local space.
    ///
    /// The surface state (transform, alpha, clip) must already be set up,
    /// normally by [`DisplayList::update_context`]. A cached node blits its
    /// cache instead of redrawing unless `ignore_cache` is set; the cache
    /// update pass itself draws with `ignore_cache` to re-render the
    /// source content.
    pub fn draw_node(&self, id: NodeId, surface: &mut dyn Surface, ignore_cache: bool) {
        if !ignore_cache
            && let Some(cache) = &self.node(id).cache
        {
            cache.draw(surface);
            return;
        }
        match &self.node(id).obj.kind {
            NodeKind::Container => {
                for &child in self.children(id) {
                    if !self.is_visible(child) {
                        continue;
                    }
                    surface.save();
                    self.update_context(child, surface);
                    self.draw_node(child, surface, false);
                    surface.restore();
                }
            }
            NodeKind::Shape(path) => {
                for &(rect, color) in path.fills() {
                    surface.fill_rect(rect, color);
                }
            }
            NodeKind::Bitmap(data) => {
                if let Some(image) = &data.image {
                    let src = data.source_rect.unwrap_or_else(|| {
                        Rect::new(0.0, 0.0, f64::from(image.width()), f64::from(image.height()))
                    });
                    let dst = Rect::new(0.0, 0.0, src.width(), src.height());
                    surface.draw_pixmap(image, src, dst);
                }
            }
            NodeKind::Sprite(data) => {
                if let Some(frame) = data.current_frame() {
                    let size =
                        Rect::new(0.0, 0.0, f64::from(frame.width()), f64::from(frame.height()));
                    surface.draw_pixmap(frame, size, size);
                }
            }
            NodeKind::Text(data) => {
                for (i, ch) in data.text.chars().enumerate() {
                    if ch.is_whitespace() {
                        continue;
                    }
                    let x = i as f64 * data.char_width;
                    surface.fill_rect(
                        Rect::new(x, 0.0, x + data.char_width, data.line_height),
                        data.color,
                    );
                }
            }
            NodeKind::BitmapText(data) => {
                if let Some(sheet) = &data.sheet {
                    for (i, ch) in data.text.chars().enumerate() {
                        if ch.is_whitespace() {
                            continue;
                        }
                        let x = i as f64 * data.glyph_width;
                        surface.draw_pixmap(
                            sheet,
                            data.glyph_rect(ch),
                            Rect::new(x, 0.0, x + data.glyph_width, data.glyph_height),
                        );
                    }
                }
            }
            NodeKind::DomElement => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use alloc::sync::Arc;

    use limelight_geom::Rgba;

    use crate::node::{BitmapData, DisplayObject, FillPath, TextData};
    use crate::pixmap::{Pixmap, SoftwareSurface};

    fn rect_shape(w: f64, h: f64, color: Rgba) -> DisplayObject {
        let mut path = FillPath::new();
        path.fill_rect(Rect::new(0.0, 0.0, w, h), color);
        DisplayObject::shape(path)
    }

    #[test]
    fn transforms_compose_down_the_tree() {
        let mut tree = DisplayList::new();
        let root = tree.insert(DisplayObject::container());
        let inner = tree.insert(DisplayObject::container());
        let shape = tree.insert(rect_shape(2.0, 2.0, Rgba::BLACK));
        tree.add_child(root, inner);
        tree.add_child(inner, shape);
        tree.obj_mut(inner).x = 4.0;
        tree.obj_mut(shape).y = 2.0;

        let mut surface = SoftwareSurface::new(16, 16);
        tree.draw_node(root, &mut surface, false);
        assert_eq!(surface.read_pixel(4, 2), Ok(Rgba::BLACK), "fill lands at (4, 2)");
        assert_eq!(surface.read_pixel(0, 0), Ok(Rgba::TRANSPARENT), "origin empty");
    }

    #[test]
    fn invisible_children_are_skipped() {
        let mut tree = DisplayList::new();
        let root = tree.insert(DisplayObject::container());
        let shape = tree.insert(rect_shape(4.0, 4.0, Rgba::BLACK));
        tree.add_child(root, shape);
        tree.obj_mut(shape).set_visible(false);
        let mut surface = SoftwareSurface::new(8, 8);
        tree.draw_node(root, &mut surface, false);
        assert_eq!(surface.read_pixel(0, 0), Ok(Rgba::TRANSPARENT), "nothing drawn");
    }

    #[test]
    fn alpha_multiplies_through_containers() {
        let mut tree = DisplayList::new();
        let root = tree.insert(DisplayObject::container());
        let inner = tree.insert(DisplayObject::container());
        let shape = tree.insert(rect_shape(2.0, 2.0, Rgba::BLACK));
        tree.add_child(root, inner);
        tree.add_child(inner, shape);
        tree.obj_mut(root).alpha = 0.5;
        tree.obj_mut(inner).alpha = 0.5;
        tree.obj_mut(shape).alpha = 0.5;

        let mut surface = SoftwareSurface::new(4, 4);
        tree.update_context(root, &mut surface);
        tree.draw_node(root, &mut surface, false);
        let px = surface.read_pixel(0, 0).unwrap();
        assert!((28..=36).contains(&px.a), "0.125 concatenated alpha, got {}", px.a);
    }

    #[test]
    fn mask_clips_rendering() {
        let mut tree = DisplayList::new();
        let root = tree.insert(DisplayObject::container());
        let shape = tree.insert(rect_shape(8.0, 8.0, Rgba::BLACK));
        tree.add_child(root, shape);
        let mut mask_path = FillPath::new();
        mask_path.fill_rect(Rect::new(0.0, 0.0, 2.0, 2.0), Rgba::BLACK);
        let mask = tree.insert(DisplayObject::shape(mask_path));
        tree.obj_mut(mask).x = 2.0;
        tree.obj_mut(shape).mask = Some(mask);

        let mut surface = SoftwareSurface::new(8, 8);
        tree.draw_node(root, &mut surface, false);
        assert_eq!(surface.read_pixel(2, 0), Ok(Rgba::BLACK), "inside the mask");
        assert_eq!(surface.read_pixel(0, 0), Ok(Rgba::TRANSPARENT), "left of the mask");
        assert_eq!(surface.read_pixel(5, 0), Ok(Rgba::TRANSPARENT), "right of the mask");
    }

    #[test]
    fn snapping_rounds_translation_when_enabled() {
        let mut tree = DisplayList::new();
        let root = tree.insert(DisplayObject::container());
        let shape = tree.insert(rect_shape(2.0, 2.0, Rgba::BLACK));
        tree.add_child(root, shape);
        tree.obj_mut(shape).x = 2.5;
        tree.set_snap_to_pixel_enabled(true);

        let mut surface = SoftwareSurface::new(8, 8);
        tree.draw_node(root, &mut surface, false);
        assert_eq!(surface.read_pixel(4, 0), Ok(Rgba::BLACK), "2.5 snaps to 3, span 3..5");
        assert_eq!(surface.read_pixel(2, 0), Ok(Rgba::TRANSPARENT), "pixel 2 left empty");

        surface.clear();
        tree.obj_mut(shape).flags.remove(NodeFlags::SNAP_TO_PIXEL);
        tree.draw_node(root, &mut surface, false);
        assert_eq!(surface.read_pixel(2, 0), Ok(Rgba::BLACK), "unsnapped span covers pixel 2");
        assert_eq!(surface.read_pixel(4, 0), Ok(Rgba::TRANSPARENT), "and stops before pixel 4");
    }

    #[test]
    fn bitmap_draws_its_source_window() {
        let mut image = Pixmap::solid(4, 4, Rgba::rgb(255, 0, 0));
        image.set_pixel(3, 3, Rgba::rgb(0, 255, 0));
        let mut tree = DisplayList::new();
        let root = tree.insert(DisplayObject::container());
        let bitmap = tree.insert(DisplayObject::bitmap(BitmapData {
            image: Some(Arc::new(image)),
            source_rect: Some(Rect::new(3.0, 3.0, 4.0, 4.0)),
        }));
        tree.add_child(root, bitmap);
        let mut surface = SoftwareSurface::new(4, 4);
        tree.draw_node(root, &mut surface, false);
        assert_eq!(
            surface.read_pixel(0, 0),
            Ok(Rgba::rgb(0, 255, 0)),
            "windowed pixel drawn at the origin"
        );
        assert_eq!(surface.read_pixel(1, 0), Ok(Rgba::TRANSPARENT), "window is 1x1");
    }

    #[test]
    fn text_fills_character_cells() {
        let mut tree = DisplayList::new();
        let root = tree.insert(DisplayObject::container());
        let text = tree.insert(DisplayObject::text(TextData {
            text: String::from("a b"),
            char_width: 2.0,
            line_height: 4.0,
            color: Rgba::BLACK,
        }));
        tree.add_child(root, text);
        let mut surface = SoftwareSurface::new(8, 8);
        tree.draw_node(root, &mut surface, false);
        assert_eq!(surface.read_pixel(0, 0), Ok(Rgba::BLACK), "first cell filled");
        assert_eq!(surface.read_pixel(2, 0), Ok(Rgba::TRANSPARENT), "space cell empty");
        assert_eq!(surface.read_pixel(4, 0), Ok(Rgba::BLACK), "third cell filled");
    }
}
