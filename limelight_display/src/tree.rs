// Copyright 2026 the Limelight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The display list: a generational arena of display nodes with parent and
//! child links, transform concatenation, event dispatch, and ticking.

use alloc::vec::Vec;
use core::cmp::Ordering;
use core::mem;

use kurbo::{Point, Rect};

use limelight_events::{Event, EventDispatcher, EventKind, ListenerId, Phase, Tick};
use limelight_geom::rect::{transform_rect_bbox, union};
use limelight_geom::{DisplayProps, Matrix2D};

use crate::cache::BitmapCache;
use crate::node::{DisplayObject, NodeFlags, NodeId};
use crate::pixmap::SoftwareSurface;

/// Shared drawing environment for a display list.
#[derive(Debug, Default)]
pub(crate) struct RenderEnv {
    /// Whether nodes flagged [`NodeFlags::SNAP_TO_PIXEL`] round their
    /// translation to whole pixels while drawing.
    pub(crate) snap_to_pixel_enabled: bool,
    /// Scratch raster target for pixel-accurate hit tests, allocated
    /// lazily and reused across tests.
    pub(crate) scratch: Option<SoftwareSurface>,
}

pub(crate) struct Node {
    generation: u32,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) obj: DisplayObject,
    pub(crate) dispatcher: EventDispatcher<NodeId>,
    pub(crate) cache: Option<BitmapCache>,
}

impl Node {
    fn new(generation: u32, obj: DisplayObject) -> Self {
        Self {
            generation,
            parent: None,
            children: Vec::new(),
            obj,
            dispatcher: EventDispatcher::new(),
            cache: None,
        }
    }
}

/// A tree of display nodes.
///
/// Nodes are addressed by [`NodeId`]; structure (parent links, child order,
/// listeners, caches) lives here while the user-facing payload is the
/// [`DisplayObject`] returned by [`DisplayList::obj_mut`].
///
/// Child order is paint order: index 0 draws first (bottom), the last child
/// draws on top.
pub struct DisplayList {
    nodes: Vec<Option<Node>>, // slots
    generations: Vec<u32>,    // last generation per slot (persists across frees)
    free_list: Vec<usize>,
    pub(crate) env: RenderEnv,
}

impl core::fmt::Debug for DisplayList {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("DisplayList")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &self.free_list.len())
            .finish_non_exhaustive()
    }
}

impl Default for DisplayList {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayList {
    /// Creates an empty display list.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            env: RenderEnv::default(),
        }
    }

    /// Allocates a detached node holding `obj`.
    pub fn insert(&mut self, obj: DisplayObject) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, obj));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, obj)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        NodeId::new(idx, generation)
    }

    /// Removes a node and frees its whole subtree.
    ///
    /// Fires [`EventKind::Removed`] at `id` if it had a parent; descendants
    /// are freed silently along with it.
    pub fn remove(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        if let Some(parent) = self.node(id).parent {
            self.detach(parent, id);
            self.dispatch_plain(id, EventKind::Removed);
        }
        self.free_subtree(id);
    }

    fn free_subtree(&mut self, id: NodeId) {
        let children = mem::take(&mut self.node_mut(id).children);
        for child in children {
            self.free_subtree(child);
        }
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    /// Whether `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(|slot| slot.as_ref())
            .is_some_and(|n| n.generation == id.generation())
    }

    /// Access a node; panics if `id` is stale.
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.idx()].as_ref().expect("dangling NodeId")
    }

    /// Access a node mutably; panics if `id` is stale.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.idx()].as_mut().expect("dangling NodeId")
    }

    /// The node's payload; panics if `id` is stale.
    pub fn obj(&self, id: NodeId) -> &DisplayObject {
        &self.node(id).obj
    }

    /// The node's payload, mutably; panics if `id` is stale.
    pub fn obj_mut(&mut self, id: NodeId) -> &mut DisplayObject {
        &mut self.node_mut(id).obj
    }

    /// The node's parent, if attached.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// The node's children in paint order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Whether snapped nodes round their translation while drawing.
    pub fn snap_to_pixel_enabled(&self) -> bool {
        self.env.snap_to_pixel_enabled
    }

    /// Enables or disables pixel snapping for flagged nodes.
    pub fn set_snap_to_pixel_enabled(&mut self, enabled: bool) {
        self.env.snap_to_pixel_enabled = enabled;
    }

    // --- Structure ---

    /// Appends `child` to `parent`'s child list (topmost in paint order).
    ///
    /// A child already attached elsewhere is reparented:
    /// [`EventKind::Removed`] fires for the old parent, then
    /// [`EventKind::Added`] for the new one. Moving a child within the same
    /// parent is a silent reorder.
    ///
    /// Panics if `parent` is not a container, or if the move would create a
    /// cycle.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.attach(parent, child, None);
    }

    /// Inserts `child` at `index` in `parent`'s child list.
    ///
    /// Same event policy as [`DisplayList::add_child`]. Panics if `index`
    /// is past the end of the list.
    pub fn add_child_at(&mut self, parent: NodeId, child: NodeId, index: usize) {
        self.attach(parent, child, Some(index));
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) {
        assert!(
            self.node(parent).obj.kind.is_container(),
            "children can only be added to container nodes"
        );
        assert!(
            !self.node(child).obj.flags.contains(NodeFlags::STAGE_ROOT),
            "a stage root cannot be reparented"
        );
        let mut ancestor = Some(parent);
        while let Some(a) = ancestor {
            assert!(a != child, "adding a node under its own descendant would create a cycle");
            ancestor = self.node(a).parent;
        }

        let old_parent = self.node(child).parent;
        if let Some(op) = old_parent {
            self.detach(op, child);
        }
        let len = self.node(parent).children.len();
        let index = index.unwrap_or(len);
        assert!(index <= len, "child index out of range");
        self.node_mut(parent).children.insert(index, child);
        self.node_mut(child).parent = Some(parent);

        if old_parent != Some(parent) {
            if old_parent.is_some() {
                self.dispatch_plain(child, EventKind::Removed);
            }
            self.dispatch_plain(child, EventKind::Added);
        }
    }

    fn detach(&mut self, parent: NodeId, child: NodeId) {
        let children = &mut self.node_mut(parent).children;
        if let Some(pos) = children.iter().position(|&c| c == child) {
            children.remove(pos);
        }
        self.node_mut(child).parent = None;
    }

    /// Detaches `child` from `parent`, firing [`EventKind::Removed`].
    /// Returns whether it was a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.node(child).parent != Some(parent) {
            return false;
        }
        self.detach(parent, child);
        self.dispatch_plain(child, EventKind::Removed);
        true
    }

    /// Detaches the child at `index`, returning it.
    pub fn remove_child_at(&mut self, parent: NodeId, index: usize) -> Option<NodeId> {
        let child = *self.node(parent).children.get(index)?;
        self.detach(parent, child);
        self.dispatch_plain(child, EventKind::Removed);
        Some(child)
    }

    /// Detaches the children at every valid index in `indices`.
    ///
    /// Indices are interpreted against the list as it was on entry; removal
    /// proceeds from the highest index down so earlier ones stay valid.
    /// Returns whether every index was valid.
    pub fn remove_children_at(&mut self, parent: NodeId, indices: &[usize]) -> bool {
        let mut sorted: Vec<usize> = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        let len = self.node(parent).children.len();
        let all_valid = sorted.iter().all(|&i| i < len);
        for &i in sorted.iter().rev() {
            if i < len {
                self.remove_child_at(parent, i);
            }
        }
        all_valid
    }

    /// Detaches every child of `parent`, firing [`EventKind::Removed`] for
    /// each.
    pub fn remove_all_children(&mut self, parent: NodeId) {
        while self.remove_child_at(parent, 0).is_some() {}
    }

    /// The child at `index`, if any.
    pub fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.node(parent).children.get(index).copied()
    }

    /// The first direct child whose payload carries `name`.
    pub fn child_by_name(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.node(parent)
            .children
            .iter()
            .copied()
            .find(|&c| self.node(c).obj.name.as_deref() == Some(name))
    }

    /// Position of `child` in `parent`'s list, if present.
    pub fn child_index(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.node(parent).children.iter().position(|&c| c == child)
    }

    /// Number of direct children.
    pub fn num_children(&self, parent: NodeId) -> usize {
        self.node(parent).children.len()
    }

    /// Whether `descendant` is `container` or lies anywhere beneath it.
    pub fn contains(&self, container: NodeId, descendant: NodeId) -> bool {
        let mut cur = Some(descendant);
        while let Some(id) = cur {
            if id == container {
                return true;
            }
            cur = self.node(id).parent;
        }
        false
    }

    /// Swaps the children at two indices. Panics if either is out of range.
    pub fn swap_children_at(&mut self, parent: NodeId, index1: usize, index2: usize) {
        self.node_mut(parent).children.swap(index1, index2);
    }

    /// Swaps the positions of two children. Returns whether both were
    /// children of `parent`.
    pub fn swap_children(&mut self, parent: NodeId, child1: NodeId, child2: NodeId) -> bool {
        let Some(i1) = self.child_index(parent, child1) else {
            return false;
        };
        let Some(i2) = self.child_index(parent, child2) else {
            return false;
        };
        self.node_mut(parent).children.swap(i1, i2);
        true
    }

    /// Moves `child` to `index` within its current parent. Returns whether
    /// the move happened (the child must belong to `parent` and `index`
    /// must be in range).
    pub fn set_child_index(&mut self, parent: NodeId, child: NodeId, index: usize) -> bool {
        let Some(pos) = self.child_index(parent, child) else {
            return false;
        };
        if index >= self.node(parent).children.len() {
            return false;
        }
        let children = &mut self.node_mut(parent).children;
        children.remove(pos);
        children.insert(index, child);
        true
    }

    /// Sorts `parent`'s children by comparing their payloads.
    pub fn sort_children(
        &mut self,
        parent: NodeId,
        mut cmp: impl FnMut(&DisplayObject, &DisplayObject) -> Ordering,
    ) {
        let mut children = mem::take(&mut self.node_mut(parent).children);
        children.sort_by(|&a, &b| cmp(&self.node(a).obj, &self.node(b).obj));
        self.node_mut(parent).children = children;
    }

    // --- Transforms ---

    /// The node's local transform.
    pub fn matrix(&self, id: NodeId) -> Matrix2D {
        self.node(id).obj.matrix()
    }

    /// The transform from the node's local space to the root's space,
    /// concatenated along the ancestor chain.
    pub fn concatenated_matrix(&self, id: NodeId) -> Matrix2D {
        let mut mtx = self.node(id).obj.matrix();
        let mut cur = self.node(id).parent;
        while let Some(p) = cur {
            mtx.prepend_matrix(&self.node(p).obj.matrix());
            cur = self.node(p).parent;
        }
        mtx
    }

    /// The full inherited display state at the node: concatenated
    /// transform, alpha, visibility, and the nearest explicit shadow and
    /// compositing mode on the chain.
    pub fn concatenated_display_props(&self, id: NodeId) -> DisplayProps {
        let mut props = DisplayProps::new();
        props.matrix = self.node(id).obj.matrix();
        let mut cur = id;
        loop {
            let node = self.node(cur);
            props.prepend(
                node.obj.visible(),
                node.obj.alpha,
                node.obj.shadow,
                node.obj.composite_operation,
                None,
            );
            if cur != id {
                props.matrix.prepend_matrix(&node.obj.matrix());
            }
            match node.parent {
                Some(p) => cur = p,
                None => break,
            }
        }
        props
    }

    /// Maps a point from the node's local space to root (stage) space.
    pub fn local_to_global(&self, id: NodeId, x: f64, y: f64) -> Point {
        self.concatenated_matrix(id).transform_point(Point::new(x, y))
    }

    /// Maps a point from root (stage) space into the node's local space.
    pub fn global_to_local(&self, id: NodeId, x: f64, y: f64) -> Point {
        self.concatenated_matrix(id)
            .inverted()
            .transform_point(Point::new(x, y))
    }

    /// Maps a point from one node's local space into another's.
    pub fn local_to_local(&self, from: NodeId, to: NodeId, x: f64, y: f64) -> Point {
        let global = self.local_to_global(from, x, y);
        self.global_to_local(to, global.x, global.y)
    }

    // --- Visibility and bounds ---

    /// Whether the node would draw anything: the VISIBLE flag is set, alpha
    /// and both scales are nonzero, and the node has content (a cache,
    /// renderable payload, or for containers at least one child).
    pub fn is_visible(&self, id: NodeId) -> bool {
        let node = self.node(id);
        let obj = &node.obj;
        let has_content = node.cache.is_some()
            || obj.kind.has_content()
            || (obj.kind.is_container() && !node.children.is_empty());
        obj.visible()
            && obj.alpha > 0.0
            && obj.scale_x != 0.0
            && obj.scale_y != 0.0
            && has_content
    }

    /// The node's bounds in its own coordinate space.
    ///
    /// Resolution order: a manual [`DisplayObject::bounds`] override, then
    /// the cache region while cached, then intrinsic content bounds, then
    /// for containers the union of transformed child bounds. Shapes have no
    /// intrinsic bounds; set them manually when needed.
    pub fn bounds(&self, id: NodeId) -> Option<Rect> {
        let node = self.node(id);
        if let Some(b) = node.obj.bounds {
            return Some(b);
        }
        if let Some(cache) = &node.cache {
            return Some(cache.region());
        }
        if let Some(b) = node.obj.kind.intrinsic_bounds() {
            return Some(b);
        }
        if node.obj.kind.is_container() {
            let mut acc: Option<Rect> = None;
            for &child in &node.children {
                if !self.node(child).obj.visible() {
                    continue;
                }
                if let Some(b) = self.transformed_bounds(child) {
                    acc = Some(match acc {
                        Some(prev) => union(prev, b),
                        None => b,
                    });
                }
            }
            return acc;
        }
        None
    }

    /// The node's bounds expressed in its parent's coordinate space.
    pub fn transformed_bounds(&self, id: NodeId) -> Option<Rect> {
        let b = self.bounds(id)?;
        Some(transform_rect_bbox(&self.node(id).obj.matrix(), b))
    }

    /// Sets or clears the manual bounds override.
    pub fn set_bounds(&mut self, id: NodeId, bounds: Option<Rect>) {
        self.node_mut(id).obj.bounds = bounds;
    }

    // --- Cloning ---

    /// Copies a node into a fresh detached slot.
    ///
    /// The payload is copied wholesale (filter instances are shared, mask
    /// and hit-area references point at the same nodes); listeners and the
    /// bitmap cache are not carried over. With `recursive`, the whole
    /// subtree is copied and relinked beneath the new node without firing
    /// added events. Panics on a stage root; a stage owns exactly one.
    pub fn clone_node(&mut self, id: NodeId, recursive: bool) -> NodeId {
        assert!(
            !self.node(id).obj.flags.contains(NodeFlags::STAGE_ROOT),
            "a stage root cannot be cloned"
        );
        let obj = self.node(id).obj.clone();
        let copy = self.insert(obj);
        if recursive {
            let children = self.node(id).children.clone();
            for child in children {
                let child_copy = self.clone_node(child, true);
                self.node_mut(copy).children.push(child_copy);
                self.node_mut(child_copy).parent = Some(copy);
            }
        }
        copy
    }

    // --- Events ---

    /// Registers a target/bubble-phase listener on the node.
    pub fn add_listener(
        &mut self,
        id: NodeId,
        kind: EventKind,
        f: impl FnMut(&mut Event<NodeId>) + 'static,
    ) -> ListenerId {
        self.node_mut(id).dispatcher.add(kind, f)
    }

    /// Registers a capture-phase listener on the node.
    pub fn add_capture_listener(
        &mut self,
        id: NodeId,
        kind: EventKind,
        f: impl FnMut(&mut Event<NodeId>) + 'static,
    ) -> ListenerId {
        self.node_mut(id).dispatcher.add_capture(kind, f)
    }

    /// Registers a listener removed automatically after its first call.
    pub fn once_listener(
        &mut self,
        id: NodeId,
        kind: EventKind,
        f: impl FnMut(&mut Event<NodeId>) + 'static,
    ) -> ListenerId {
        self.node_mut(id).dispatcher.once(kind, f)
    }

    /// Removes a listener by token. Returns whether it was present.
    pub fn remove_listener(&mut self, id: NodeId, token: ListenerId) -> bool {
        self.node_mut(id).dispatcher.remove(token)
    }

    /// Removes every listener for `kind` on the node.
    pub fn remove_listeners(&mut self, id: NodeId, kind: EventKind) {
        self.node_mut(id).dispatcher.remove_kind(kind);
    }

    /// Whether the node itself has a listener for `kind` in either phase.
    pub fn has_listener(&self, id: NodeId, kind: EventKind) -> bool {
        self.node(id).dispatcher.has(kind)
    }

    /// Whether dispatching `kind` at the node would reach any listener,
    /// checking the node and every ancestor.
    pub fn will_trigger(&self, id: NodeId, kind: EventKind) -> bool {
        let mut cur = Some(id);
        while let Some(n) = cur {
            if self.node(n).dispatcher.has(kind) {
                return true;
            }
            cur = self.node(n).parent;
        }
        false
    }

    /// Whether the node is an active pointer target: it listens for a
    /// pointer-target event kind or sets a cursor.
    pub(crate) fn is_pointer_target(&self, id: NodeId) -> bool {
        let node = self.node(id);
        node.dispatcher.has_pointer_listener() || node.obj.cursor.is_some()
    }

    /// Dispatches an event at `target`.
    ///
    /// Bubbling events run three phases: capture listeners on the
    /// ancestors root-to-parent, the target's regular listeners, then
    /// regular listeners parent-to-root. Non-bubbling events run the
    /// target phase only. Returns `false` if a listener called
    /// [`Event::prevent_default`].
    pub fn dispatch(&mut self, target: NodeId, event: &mut Event<NodeId>) -> bool {
        event.target = Some(target);
        if event.bubbles && self.node(target).parent.is_some() {
            let mut chain = Vec::new();
            let mut cur = self.node(target).parent;
            while let Some(p) = cur {
                chain.push(p);
                cur = self.node(p).parent;
            }
            // chain is parent..root; capture walks it root-first.
            for &n in chain.iter().rev() {
                if event.propagation_stopped {
                    break;
                }
                event.current_target = Some(n);
                self.node_mut(n).dispatcher.emit(Phase::Capture, event);
            }
            if !event.propagation_stopped {
                event.current_target = Some(target);
                self.node_mut(target).dispatcher.emit(Phase::Target, event);
            }
            for &n in &chain {
                if event.propagation_stopped {
                    break;
                }
                event.current_target = Some(n);
                self.node_mut(n).dispatcher.emit(Phase::Bubble, event);
            }
        } else {
            event.current_target = Some(target);
            self.node_mut(target).dispatcher.emit(Phase::Target, event);
        }
        !event.default_prevented
    }

    /// Dispatches a plain non-bubbling, non-cancelable event at `target`.
    pub fn dispatch_plain(&mut self, target: NodeId, kind: EventKind) {
        if !self.node(target).dispatcher.has(kind) {
            return;
        }
        let mut event = Event::new(kind, false, false);
        self.dispatch(target, &mut event);
    }

    // --- Ticking ---

    /// Advances the node's subtree by one tick.
    ///
    /// Children tick before their parent, iterated topmost-first, each
    /// gated on [`NodeFlags::TICK_ENABLED`]; recursion into a container
    /// requires [`NodeFlags::TICK_CHILDREN`]. Each node's own listeners
    /// receive a non-bubbling [`EventKind::Tick`] carrying `tick`.
    pub fn tick(&mut self, id: NodeId, tick: Tick) {
        let node = self.node(id);
        if node.obj.kind.is_container() && node.obj.flags.contains(NodeFlags::TICK_CHILDREN) {
            let children = node.children.clone();
            for &child in children.iter().rev() {
                if self.node(child).obj.flags.contains(NodeFlags::TICK_ENABLED) {
                    self.tick(child, tick);
                }
            }
        }
        if self.node(id).dispatcher.has(EventKind::Tick) {
            let mut event = Event::new(EventKind::Tick, false, false).with_tick(tick);
            self.dispatch(id, &mut event);
        }
    }
}
