// Copyright 2026 the Limelight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel-accurate hit testing.
//!
//! A candidate node is drawn onto a small scratch raster positioned so the
//! query point lands on pixel `(0, 0)`, and the hit is decided by reading
//! that pixel's alpha back. This makes hits exact for any content the
//! node can draw, at the cost of a raster pass per candidate.

use alloc::vec::Vec;

use limelight_geom::Matrix2D;

use crate::node::{NodeId, NodeKind};
use crate::pixmap::SoftwareSurface;
use crate::surface::Surface;
use crate::tree::DisplayList;

/// Alpha at the probed pixel must exceed this for a hit.
///
/// The threshold is deliberately above zero so blend residue at fully
/// transparent edges never registers.
pub const HIT_ALPHA_THRESHOLD: u8 = 1;

/// Which nodes an under-point query considers.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HitMode {
    /// Every visible node.
    All,
    /// Only nodes with [`MOUSE_ENABLED`](crate::NodeFlags::MOUSE_ENABLED)
    /// set, honoring `MOUSE_CHILDREN` substitution.
    MouseEnabled,
    /// Like `MouseEnabled`, but a node must also be an active pointer
    /// target (a pointer listener on it or an ancestor, or a cursor).
    /// This is the mode stage input picking uses.
    MousePick,
}

impl DisplayList {
    /// Whether the point `(x, y)` in the node's local space lands on an
    /// opaque-enough pixel of its content.
    pub fn hit_test(&mut self, id: NodeId, x: f64, y: f64) -> bool {
        self.probe(id, Matrix2D::IDENTITY, 1.0, x, y)
    }

    /// All nodes under the point, front-most first.
    ///
    /// `(x, y)` is in `container`'s local space. Containers themselves are
    /// never returned (except via `MOUSE_CHILDREN` substitution in
    /// [`DisplayList::object_under_point`]); the list holds the leaves and
    /// hit-area-carrying nodes whose pixels cover the point.
    pub fn objects_under_point(
        &mut self,
        container: NodeId,
        x: f64,
        y: f64,
        mode: HitMode,
    ) -> Vec<NodeId> {
        let pt = self.local_to_global(container, x, y);
        let mut found = Vec::new();
        let mouse = mode != HitMode::All;
        let active = mode == HitMode::MouseEnabled;
        self.walk_under_point(container, pt.x, pt.y, Some(&mut found), mouse, active, 0);
        found
    }

    /// The front-most node under the point, if any.
    ///
    /// When a container on the path has `MOUSE_CHILDREN` cleared (and the
    /// mode is pointer-aware), the container substitutes for the hit
    /// descendant.
    pub fn object_under_point(
        &mut self,
        container: NodeId,
        x: f64,
        y: f64,
        mode: HitMode,
    ) -> Option<NodeId> {
        let pt = self.local_to_global(container, x, y);
        let mouse = mode != HitMode::All;
        let active = mode == HitMode::MouseEnabled;
        self.walk_under_point(container, pt.x, pt.y, None, mouse, active, 0)
    }

    /// Stage-space picking entry point for pointer input.
    pub(crate) fn pick(&mut self, root: NodeId, x: f64, y: f64) -> Option<NodeId> {
        self.walk_under_point(root, x, y, None, true, false, 0)
    }

    fn walk_under_point(
        &mut self,
        container: NodeId,
        x: f64,
        y: f64,
        mut found: Option<&mut Vec<NodeId>>,
        mouse: bool,
        active_listener: bool,
        depth: u32,
    ) -> Option<NodeId> {
        if depth == 0 && !self.test_mask(container, x, y) {
            return None;
        }
        let active_listener =
            active_listener || (mouse && self.is_pointer_target(container));
        let children = self.node(container).children.clone();
        for &child in children.iter().rev() {
            let hit_area = self.node(child).obj.hit_area;
            if !self.node(child).obj.visible()
                || (hit_area.is_none() && !self.is_visible(child))
                || (mouse && !self.node(child).obj.mouse_enabled())
            {
                continue;
            }
            if hit_area.is_none() && !self.test_mask(child, x, y) {
                continue;
            }
            if hit_area.is_none() && self.node(child).obj.kind.is_container() {
                let result = self.walk_under_point(
                    child,
                    x,
                    y,
                    found.as_deref_mut(),
                    mouse,
                    active_listener,
                    depth + 1,
                );
                if found.is_none()
                    && let Some(hit) = result
                {
                    return if mouse && !self.node(container).obj.mouse_children() {
                        Some(container)
                    } else {
                        Some(hit)
                    };
                }
            } else {
                if mouse && !active_listener && !self.is_pointer_target(child) {
                    continue;
                }
                let mut props = self.concatenated_display_props(child);
                let mut mtx = props.matrix;
                let mut draw_id = child;
                if let Some(area) = hit_area {
                    mtx.append_matrix(&self.node(area).obj.matrix());
                    props.alpha = self.node(area).obj.alpha;
                    draw_id = area;
                }
                if !self.probe(draw_id, mtx, props.alpha, x, y) {
                    continue;
                }
                match found.as_deref_mut() {
                    Some(list) => list.push(child),
                    None => {
                        return if mouse && !self.node(container).obj.mouse_children() {
                            Some(container)
                        } else {
                            Some(child)
                        };
                    }
                }
            }
        }
        None
    }

    /// Whether the point clears the node's mask (trivially true without
    /// one). The mask is positioned in the node's parent space.
    fn test_mask(&mut self, id: NodeId, x: f64, y: f64) -> bool {
        let Some(mask) = self.node(id).obj.mask else {
            return true;
        };
        match &self.node(mask).obj.kind {
            NodeKind::Shape(path) if !path.is_empty() => {}
            _ => return true,
        }
        let mut mtx = self.node(mask).obj.matrix();
        if let Some(parent) = self.node(id).parent {
            mtx.prepend_matrix(&self.concatenated_matrix(parent));
        }
        self.probe(mask, mtx, 1.0, x, y)
    }

    /// Draws `id` at full pixel accuracy with the query point mapped onto
    /// scratch pixel `(0, 0)` and reads the alpha back.
    fn probe(&mut self, id: NodeId, mtx: Matrix2D, alpha: f64, x: f64, y: f64) -> bool {
        let mut scratch = self
            .env
            .scratch
            .take()
            .unwrap_or_else(|| SoftwareSurface::new(2, 2));
        scratch.reset_state();
        scratch.clear();
        let mut m = mtx;
        m.tx -= x;
        m.ty -= y;
        scratch.set_transform(&m);
        scratch.set_global_alpha(alpha);
        self.draw_node(id, &mut scratch, false);
        let hit = scratch
            .read_pixel(0, 0)
            .is_ok_and(|px| px.a > HIT_ALPHA_THRESHOLD);
        self.env.scratch = Some(scratch);
        hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;

    use limelight_events::EventKind;
    use limelight_geom::Rgba;

    use crate::node::{DisplayObject, FillPath};

    fn rect_shape(w: f64, h: f64) -> DisplayObject {
        rect_shape_at(0.0, 0.0, w, h, Rgba::BLACK)
    }

    fn rect_shape_at(x: f64, y: f64, w: f64, h: f64, color: Rgba) -> DisplayObject {
        let mut path = FillPath::new();
        path.fill_rect(Rect::new(x, y, x + w, y + h), color);
        DisplayObject::shape(path)
    }

    #[test]
    fn hit_test_is_pixel_exact() {
        let mut tree = DisplayList::new();
        let shape = tree.insert(rect_shape(10.0, 10.0));
        assert!(tree.hit_test(shape, 5.0, 5.0), "inside the fill");
        assert!(!tree.hit_test(shape, 10.5, 5.0), "just past the right edge");
        // Sampling happens at the pixel center, so points within half a pixel
        // of a filled edge still cover part of the probe and register as hits.
        assert!(tree.hit_test(shape, -0.5, -0.5), "half-pixel halo on the origin side");
        assert!(!tree.hit_test(shape, -1.5, -1.5), "outside on the origin side");
    }

    #[test]
    fn overlapping_shapes_report_front_to_back() {
        let mut tree = DisplayList::new();
        let root = tree.insert(DisplayObject::container());
        let back = tree.insert(rect_shape(150.0, 150.0));
        tree.add_child(root, back);
        let mut small = Vec::new();
        for _ in 0..3 {
            let s = tree.insert(rect_shape(20.0, 20.0));
            tree.obj_mut(s).x = 152.0;
            tree.obj_mut(s).y = 152.0;
            tree.add_child(root, s);
            small.push(s);
        }
        // The probe point covers only the three small squares.
        let hits = tree.objects_under_point(root, 160.0, 160.0, HitMode::All);
        assert_eq!(
            hits,
            alloc::vec![small[2], small[1], small[0]],
            "three overlapping squares, front-most first"
        );
        // A point over the big square alone reports just it.
        let hits = tree.objects_under_point(root, 10.0, 10.0, HitMode::All);
        assert_eq!(hits, alloc::vec![back], "only the large square under (10, 10)");
    }

    #[test]
    fn low_alpha_rasterization_still_hits_above_threshold() {
        let mut tree = DisplayList::new();
        let shape = tree.insert(rect_shape(10.0, 10.0));
        // Alpha that rasterizes to exactly the threshold must miss.
        let mut probe_tree_alpha = |alpha: f64| {
            tree.obj_mut(shape).alpha = alpha;
            let props = tree.concatenated_display_props(shape);
            tree.probe(shape, props.matrix, props.alpha, 5.0, 5.0)
        };
        assert!(!probe_tree_alpha(1.0 / 255.0), "alpha 1 is at the threshold, not above");
        assert!(probe_tree_alpha(2.0 / 255.0), "alpha 2 clears the threshold");
    }

    #[test]
    fn mask_gates_hits() {
        let mut tree = DisplayList::new();
        let root = tree.insert(DisplayObject::container());
        let shape = tree.insert(rect_shape(100.0, 100.0));
        tree.add_child(root, shape);
        let mut mask_path = FillPath::new();
        mask_path.fill_rect(Rect::new(0.0, 0.0, 15.0, 15.0), Rgba::BLACK);
        let mask = tree.insert(DisplayObject::shape(mask_path));
        tree.obj_mut(mask).x = 10.0;
        tree.obj_mut(mask).y = 10.0;
        tree.obj_mut(shape).mask = Some(mask);

        assert_eq!(
            tree.object_under_point(root, 12.0, 12.0, HitMode::All),
            Some(shape),
            "point inside the 15x15 mask window"
        );
        assert_eq!(
            tree.object_under_point(root, 50.0, 50.0, HitMode::All),
            None,
            "point on the shape but outside its mask"
        );
    }

    #[test]
    fn container_mask_gates_the_whole_query() {
        let mut tree = DisplayList::new();
        let group = tree.insert(DisplayObject::container());
        let mut mask_path = FillPath::new();
        mask_path.fill_rect(Rect::new(0.0, 0.0, 15.0, 15.0), Rgba::BLACK);
        let mask = tree.insert(DisplayObject::shape(mask_path));
        tree.obj_mut(group).mask = Some(mask);
        let mut shapes = Vec::new();
        for _ in 0..4 {
            let s = tree.insert(rect_shape(100.0, 100.0));
            tree.add_child(group, s);
            shapes.push(s);
        }

        assert_eq!(
            tree.objects_under_point(group, 50.0, 50.0, HitMode::All),
            Vec::new(),
            "the queried container's own mask rejects the point outright"
        );
        shapes.reverse();
        assert_eq!(
            tree.objects_under_point(group, 5.0, 5.0, HitMode::All),
            shapes,
            "inside the mask window every child reports, front to back"
        );
    }

    #[test]
    fn hit_area_substitutes_geometry() {
        let mut tree = DisplayList::new();
        let root = tree.insert(DisplayObject::container());
        let shape = tree.insert(rect_shape(4.0, 4.0));
        tree.add_child(root, shape);
        // A larger, translated stand-in; it is combined with the node's
        // own transform.
        let area = tree.insert(rect_shape(20.0, 20.0));
        tree.obj_mut(area).x = -8.0;
        tree.obj_mut(area).y = -8.0;
        tree.obj_mut(shape).hit_area = Some(area);

        assert_eq!(
            tree.object_under_point(root, 10.0, 10.0, HitMode::All),
            Some(shape),
            "inside the hit area, outside the real fill"
        );
        assert_eq!(
            tree.object_under_point(root, -4.0, -4.0, HitMode::All),
            Some(shape),
            "hit area extends into negative space"
        );
        assert_eq!(
            tree.object_under_point(root, 14.0, 14.0, HitMode::All),
            None,
            "outside the hit area misses even where nothing else draws"
        );
    }

    #[test]
    fn mouse_modes_filter_targets() {
        let mut tree = DisplayList::new();
        let root = tree.insert(DisplayObject::container());
        let plain = tree.insert(rect_shape(10.0, 10.0));
        let listening = tree.insert(rect_shape(10.0, 10.0));
        tree.obj_mut(listening).x = 20.0;
        tree.add_child(root, plain);
        tree.add_child(root, listening);
        tree.add_listener(listening, EventKind::Click, |_| {});

        assert_eq!(
            tree.object_under_point(root, 5.0, 5.0, HitMode::All),
            Some(plain),
            "mode All sees every node"
        );
        assert_eq!(
            tree.object_under_point(root, 5.0, 5.0, HitMode::MouseEnabled),
            Some(plain),
            "MouseEnabled does not require listeners"
        );
        assert_eq!(
            tree.object_under_point(root, 5.0, 5.0, HitMode::MousePick),
            None,
            "MousePick skips nodes with no pointer listener"
        );
        assert_eq!(
            tree.object_under_point(root, 25.0, 5.0, HitMode::MousePick),
            Some(listening),
            "a click listener makes the node pickable"
        );

        tree.obj_mut(plain).cursor = Some("pointer".into());
        assert_eq!(
            tree.object_under_point(root, 5.0, 5.0, HitMode::MousePick),
            Some(plain),
            "a cursor also makes the node pickable"
        );

        tree.obj_mut(listening).set_mouse_enabled(false);
        assert_eq!(
            tree.object_under_point(root, 25.0, 5.0, HitMode::MousePick),
            None,
            "mouse-disabled nodes are invisible to pointer modes"
        );
    }

    #[test]
    fn mouse_children_substitution() {
        let mut tree = DisplayList::new();
        let root = tree.insert(DisplayObject::container());
        let group = tree.insert(DisplayObject::container());
        let leaf = tree.insert(rect_shape(10.0, 10.0));
        tree.add_child(root, group);
        tree.add_child(group, leaf);
        tree.add_listener(leaf, EventKind::Click, |_| {});

        assert_eq!(
            tree.object_under_point(root, 5.0, 5.0, HitMode::MousePick),
            Some(leaf),
            "descendants report themselves by default"
        );
        tree.obj_mut(group).set_mouse_children(false);
        assert_eq!(
            tree.object_under_point(root, 5.0, 5.0, HitMode::MousePick),
            Some(group),
            "the container substitutes when MOUSE_CHILDREN is off"
        );
        assert_eq!(
            tree.objects_under_point(root, 5.0, 5.0, HitMode::MousePick),
            alloc::vec![leaf],
            "list mode reports the leaves regardless"
        );
    }

    #[test]
    fn ancestor_listener_activates_plain_leaves() {
        let mut tree = DisplayList::new();
        let root = tree.insert(DisplayObject::container());
        let group = tree.insert(DisplayObject::container());
        let leaf = tree.insert(rect_shape(10.0, 10.0));
        tree.add_child(root, group);
        tree.add_child(group, leaf);

        assert_eq!(
            tree.object_under_point(root, 5.0, 5.0, HitMode::MousePick),
            None,
            "no pointer listener anywhere"
        );
        tree.add_listener(group, EventKind::MouseDown, |_| {});
        assert_eq!(
            tree.object_under_point(root, 5.0, 5.0, HitMode::MousePick),
            Some(leaf),
            "a listening ancestor activates its subtree"
        );
    }

    #[test]
    fn cached_content_hits_through_the_cache() {
        let mut tree = DisplayList::new();
        let root = tree.insert(DisplayObject::container());
        let shape = tree.insert(rect_shape(10.0, 10.0));
        tree.add_child(root, shape);
        tree.cache(shape, 0.0, 0.0, 10.0, 10.0, 1.0).unwrap();
        if let crate::node::NodeKind::Shape(path) = &mut tree.obj_mut(shape).kind {
            path.clear();
        }
        assert_eq!(
            tree.object_under_point(root, 5.0, 5.0, HitMode::All),
            Some(shape),
            "the stale cache still registers hits"
        );
    }
}
