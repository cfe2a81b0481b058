// Copyright 2026 the Limelight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The stage: owns a display list and a surface, drives draw/tick passes,
//! and turns host pointer input into display-list events.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::mem;

use kurbo::Rect;

use limelight_events::{Event, EventKind, Pointer, PointerId, Tick};
use limelight_geom::Matrix2D;

use crate::node::{DisplayObject, NodeFlags, NodeId};
use crate::surface::Surface;
use crate::tree::DisplayList;

/// Per-pointer tracking state.
#[derive(Clone, Debug, Default)]
struct PointerState {
    x: f64,
    y: f64,
    raw_x: f64,
    raw_y: f64,
    in_bounds: bool,
    down: bool,
    target: Option<NodeId>,
}

/// A display list bound to a surface, with pointer input routing.
///
/// The stage's root node is an ordinary container ([`Stage::root`]); stage
/// events (`StageMouseDown`, `DrawStart`, `TickStart`, ...) dispatch
/// there.
///
/// The host feeds input through [`Stage::pointer_move`],
/// [`Stage::pointer_down`], [`Stage::pointer_up`], and
/// [`Stage::double_click`], in surface coordinates unless a viewport
/// mapping is set. Hover events (`MouseOver`/`RollOver` and their out
/// counterparts) are opt-in via [`Stage::enable_mouse_over`] and driven by
/// the host clock through [`Stage::poll_mouse_over`].
pub struct Stage<S: Surface> {
    tree: DisplayList,
    root: NodeId,
    surface: S,
    /// Whether [`Stage::update`] clears the surface before drawing.
    /// Disable to accumulate content across updates.
    pub auto_clear: bool,
    /// Whether [`Stage::update`] ticks the tree first.
    pub tick_on_update: bool,
    /// Master switch for [`Stage::tick`].
    pub tick_enabled: bool,
    /// Track pointer positions past the surface edge, clamped to the
    /// nearest edge pixel.
    pub mouse_move_outside: bool,
    /// When set, drawing clears and clips to this surface-space region.
    pub draw_rect: Option<Rect>,
    viewport: Option<Rect>,
    mouse_x: f64,
    mouse_y: f64,
    mouse_in_bounds: bool,
    pointers: BTreeMap<i32, PointerState>,
    primary_pointer: Option<PointerId>,
    hover_interval: Option<f64>,
    hover_due: f64,
    hover_x: f64,
    hover_y: f64,
    hover_list: Vec<NodeId>,
    cursor: String,
    follower: bool,
}

impl<S: Surface> core::fmt::Debug for Stage<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Stage")
            .field("tree", &self.tree)
            .field("root", &self.root)
            .field("mouse_x", &self.mouse_x)
            .field("mouse_y", &self.mouse_y)
            .field("mouse_in_bounds", &self.mouse_in_bounds)
            .finish_non_exhaustive()
    }
}

impl<S: Surface> Stage<S> {
    /// Creates a stage drawing to `surface`, with an empty root container.
    pub fn new(surface: S) -> Self {
        let mut tree = DisplayList::new();
        let root = tree.insert(DisplayObject::container());
        tree.obj_mut(root).flags.insert(NodeFlags::STAGE_ROOT);
        Self {
            tree,
            root,
            surface,
            auto_clear: true,
            tick_on_update: true,
            tick_enabled: true,
            mouse_move_outside: false,
            draw_rect: None,
            viewport: None,
            mouse_x: 0.0,
            mouse_y: 0.0,
            mouse_in_bounds: false,
            pointers: BTreeMap::new(),
            primary_pointer: None,
            hover_interval: None,
            hover_due: 0.0,
            hover_x: f64::NAN,
            hover_y: f64::NAN,
            hover_list: Vec::new(),
            cursor: String::new(),
            follower: false,
        }
    }

    /// The display list.
    pub fn tree(&self) -> &DisplayList {
        &self.tree
    }

    /// The display list, mutably.
    pub fn tree_mut(&mut self) -> &mut DisplayList {
        &mut self.tree
    }

    /// The root container node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The output surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// The output surface, mutably.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Primary pointer X in surface coordinates.
    pub fn mouse_x(&self) -> f64 {
        self.mouse_x
    }

    /// Primary pointer Y in surface coordinates.
    pub fn mouse_y(&self) -> f64 {
        self.mouse_y
    }

    /// Whether the primary pointer is inside the surface.
    pub fn mouse_in_bounds(&self) -> bool {
        self.mouse_in_bounds
    }

    /// The cursor requested by the hovered node chain, resolved to the
    /// nearest hovered node that sets one; empty when none does.
    pub fn current_cursor(&self) -> &str {
        &self.cursor
    }

    /// Maps host input coordinates onto the surface: input inside `rect`
    /// (host space) scales onto the full surface. `None` treats input as
    /// surface coordinates directly.
    pub fn set_viewport(&mut self, rect: Option<Rect>) {
        self.viewport = rect;
    }

    // --- Draw and tick passes ---

    /// Runs a full frame: optionally ticks, then draws the tree.
    ///
    /// A `DrawStart` listener may cancel the draw with
    /// [`Event::prevent_default`]; `DrawEnd` fires once drawing completes.
    pub fn update(&mut self, tick: Option<Tick>) {
        if self.tick_on_update {
            self.tick(tick);
        }
        if !self.dispatch_stage(EventKind::DrawStart, true) {
            return;
        }
        self.surface.set_transform(&Matrix2D::IDENTITY);
        if self.auto_clear {
            match self.draw_rect {
                Some(r) => self.surface.clear_rect(r),
                None => self.surface.clear(),
            }
        }
        self.surface.save();
        if let Some(r) = self.draw_rect {
            self.surface.clip_rects(&[r]);
        }
        self.tree.update_context(self.root, &mut self.surface);
        self.tree.draw_node(self.root, &mut self.surface, false);
        self.surface.restore();
        self.dispatch_stage(EventKind::DrawEnd, false);
    }

    /// Propagates a tick through the tree, children before parents.
    ///
    /// Skipped entirely when [`Stage::tick_enabled`] is off or a
    /// `TickStart` listener prevents the default; `TickEnd` fires after a
    /// completed pass.
    pub fn tick(&mut self, tick: Option<Tick>) {
        if !self.tick_enabled {
            return;
        }
        if !self.dispatch_stage(EventKind::TickStart, true) {
            return;
        }
        self.tree.tick(self.root, tick.unwrap_or_default());
        self.dispatch_stage(EventKind::TickEnd, false);
    }

    /// Clears the surface outright.
    pub fn clear(&mut self) {
        self.surface.set_transform(&Matrix2D::IDENTITY);
        self.surface.clear();
    }

    fn dispatch_stage(&mut self, kind: EventKind, cancelable: bool) -> bool {
        if !self.tree.has_listener(self.root, kind) {
            return true;
        }
        let mut event = Event::new(kind, false, cancelable);
        self.tree.dispatch(self.root, &mut event)
    }

    // --- Hover ---

    /// Turns hover tracking on at up to `frequency` passes per second
    /// (capped at 50), or off for `frequency <= 0`.
    ///
    /// Hover passes run from [`Stage::poll_mouse_over`]; higher frequency
    /// trades responsiveness of `MouseOver`/`RollOver` events and the
    /// cursor against hit-test cost.
    pub fn enable_mouse_over(&mut self, frequency: f64) {
        if frequency <= 0.0 {
            if self.hover_interval.is_some() {
                // Final pass rolls out of whatever is still hovered.
                self.handle_mouse_over(true, true, false);
                self.hover_interval = None;
            }
            return;
        }
        self.hover_interval = Some(1000.0 / frequency.min(50.0));
        self.hover_due = 0.0;
    }

    /// Runs a hover pass if tracking is enabled and the throttle interval
    /// has elapsed. `now_ms` is any monotonic millisecond clock.
    pub fn poll_mouse_over(&mut self, now_ms: f64) {
        if self.follower {
            return;
        }
        let Some(interval) = self.hover_interval else {
            return;
        };
        if now_ms < self.hover_due {
            return;
        }
        self.hover_due = now_ms + interval;
        self.handle_mouse_over(false, false, true);
    }

    /// Runs a hover pass immediately, bypassing the throttle and the
    /// unchanged-position check.
    pub fn flush_mouse_over(&mut self) {
        if !self.follower && self.hover_interval.is_some() {
            self.handle_mouse_over(true, false, true);
        }
    }

    // --- Pointer input ---

    /// Reports pointer movement. Stages that joined a
    /// [`StageChain`] as followers ignore direct input; feed the chain
    /// instead.
    pub fn pointer_move(&mut self, id: PointerId, x: f64, y: f64) {
        if self.follower {
            return;
        }
        self.handle_pointer_move(id, x, y);
    }

    /// Reports a pointer press.
    pub fn pointer_down(&mut self, id: PointerId, x: f64, y: f64) {
        if self.follower {
            return;
        }
        self.handle_pointer_down(id, x, y, false);
    }

    /// Reports a pointer release. `clear` drops the pointer's tracking
    /// state afterwards (a touch lifting, as opposed to a mouse button).
    pub fn pointer_up(&mut self, id: PointerId, clear: bool) {
        if self.follower {
            return;
        }
        self.handle_pointer_up(id, clear, false, false);
    }

    /// Reports a double click of the mouse at its current position.
    pub fn double_click(&mut self) {
        if self.follower {
            return;
        }
        self.handle_double_click(false);
    }

    fn pointer_snapshot(&self, id: PointerId) -> PointerState {
        self.pointers.get(&id.0).cloned().unwrap_or_default()
    }

    fn pointer_mut(&mut self, id: PointerId) -> &mut PointerState {
        self.pointers.entry(id.0).or_default()
    }

    fn is_primary(&self, id: PointerId) -> bool {
        id == PointerId::MOUSE || Some(id) == self.primary_pointer
    }

    fn update_pointer_position(&mut self, id: PointerId, mut x: f64, mut y: f64) {
        let w = f64::from(self.surface.width());
        let h = f64::from(self.surface.height());
        if let Some(vp) = self.viewport {
            x = (x - vp.x0) / (vp.width() / w);
            y = (y - vp.y0) / (vp.height() / h);
        }
        let in_bounds = x >= 0.0 && y >= 0.0 && x <= w - 1.0 && y <= h - 1.0;
        let track_outside = self.mouse_move_outside;
        let (px, py, pb) = {
            let o = self.pointer_mut(id);
            o.in_bounds = in_bounds;
            if in_bounds {
                o.x = x;
                o.y = y;
            } else if track_outside {
                o.x = x.clamp(0.0, w - 1.0);
                o.y = y.clamp(0.0, h - 1.0);
            }
            o.raw_x = x;
            o.raw_y = y;
            (o.x, o.y, o.in_bounds)
        };
        if self.is_primary(id) {
            self.mouse_x = px;
            self.mouse_y = py;
            self.mouse_in_bounds = pb;
        }
    }

    fn dispatch_pointer(
        &mut self,
        target: Option<NodeId>,
        kind: EventKind,
        bubbles: bool,
        id: PointerId,
        related: Option<NodeId>,
    ) {
        let Some(target) = target else {
            return;
        };
        if !bubbles && !self.tree.has_listener(target, kind) {
            return;
        }
        let o = self.pointer_snapshot(id);
        let pointer = Pointer {
            stage_x: o.x,
            stage_y: o.y,
            raw_x: o.raw_x,
            raw_y: o.raw_y,
            id,
            primary: self.is_primary(id),
            related,
        };
        let mut event = Event::new(kind, bubbles, false).with_pointer(pointer);
        self.tree.dispatch(target, &mut event);
    }

    pub(crate) fn handle_pointer_move(&mut self, id: PointerId, x: f64, y: f64) {
        let was_in_bounds = self.pointer_snapshot(id).in_bounds;
        self.update_pointer_position(id, x, y);
        let o = self.pointer_snapshot(id);
        if was_in_bounds || o.in_bounds || self.mouse_move_outside {
            if id == PointerId::MOUSE && o.in_bounds != was_in_bounds {
                let kind = if was_in_bounds {
                    EventKind::MouseLeave
                } else {
                    EventKind::MouseEnter
                };
                self.dispatch_pointer(Some(self.root), kind, false, id, None);
            }
            self.dispatch_pointer(Some(self.root), EventKind::StageMouseMove, false, id, None);
            self.dispatch_pointer(o.target, EventKind::PressMove, true, id, None);
        }
    }

    /// Returns whether this stage resolved a press target ("claims" the
    /// pointer within a chain).
    pub(crate) fn handle_pointer_down(
        &mut self,
        id: PointerId,
        x: f64,
        y: f64,
        claimed: bool,
    ) -> bool {
        if self.primary_pointer.is_none() || id == PointerId::MOUSE {
            self.primary_pointer = Some(id);
        }
        self.update_pointer_position(id, x, y);
        let mut target = None;
        if !claimed {
            let o = self.pointer_snapshot(id);
            target = self.tree.pick(self.root, o.x, o.y);
            self.pointer_mut(id).target = target;
        }
        if self.pointer_snapshot(id).in_bounds {
            self.dispatch_pointer(Some(self.root), EventKind::StageMouseDown, false, id, target);
            self.pointer_mut(id).down = true;
        }
        self.dispatch_pointer(target, EventKind::MouseDown, true, id, None);
        target.is_some()
    }

    pub(crate) fn handle_pointer_up(
        &mut self,
        id: PointerId,
        clear: bool,
        claimed: bool,
        has_followers: bool,
    ) -> bool {
        let o_target = self.pointer_snapshot(id).target;
        let mut target = None;
        if !claimed && (o_target.is_some() || has_followers) {
            let o = self.pointer_snapshot(id);
            target = self.tree.pick(self.root, o.x, o.y);
        }
        if self.pointer_snapshot(id).down {
            self.dispatch_pointer(Some(self.root), EventKind::StageMouseUp, false, id, target);
            self.pointer_mut(id).down = false;
        }
        if target == o_target {
            self.dispatch_pointer(o_target, EventKind::Click, true, id, None);
        }
        self.dispatch_pointer(o_target, EventKind::PressUp, true, id, None);
        if clear {
            if Some(id) == self.primary_pointer {
                self.primary_pointer = None;
            }
            self.pointers.remove(&id.0);
        } else {
            self.pointer_mut(id).target = None;
        }
        target.is_some()
    }

    pub(crate) fn handle_double_click(&mut self, claimed: bool) -> bool {
        let mut target = None;
        if !claimed {
            let o = self.pointer_snapshot(PointerId::MOUSE);
            target = self.tree.pick(self.root, o.x, o.y);
            self.dispatch_pointer(target, EventKind::DblClick, true, PointerId::MOUSE, None);
        }
        target.is_some()
    }

    /// One hover pass: re-picks under the mouse, diffs the hover chain,
    /// and fires out/over events.
    ///
    /// `RollOut` fires innermost-first on the departed branch, `RollOver`
    /// outermost-first on the entered branch; ancestors shared by both
    /// chains receive neither. `MouseOut`/`MouseOver` bubble from the old
    /// and new leaf targets with the counterpart attached as
    /// [`Pointer::related`].
    pub(crate) fn handle_mouse_over(
        &mut self,
        clear: bool,
        claimed: bool,
        is_event_target: bool,
    ) -> bool {
        if self.hover_interval.is_none() {
            return false;
        }
        if !clear
            && self.mouse_x == self.hover_x
            && self.mouse_y == self.hover_y
            && self.mouse_in_bounds
        {
            return false;
        }

        let mut target = None;
        if !claimed && (clear || (self.mouse_in_bounds && is_event_target)) {
            target = self.tree.pick(self.root, self.mouse_x, self.mouse_y);
            self.hover_x = self.mouse_x;
            self.hover_y = self.mouse_y;
        }

        let old_list = mem::take(&mut self.hover_list);
        let old_target = old_list.last().copied();

        // Hover chain root-first; the cursor comes from the nearest node
        // on the chain that sets one.
        let mut list = Vec::new();
        let mut cursor = String::new();
        let mut t = target;
        while let Some(n) = t {
            list.insert(0, n);
            if cursor.is_empty()
                && let Some(c) = &self.tree.obj(n).cursor
            {
                cursor.clone_from(c);
            }
            t = self.tree.parent(n);
        }
        self.cursor = cursor;

        let mut common: Option<usize> = None;
        for (i, &n) in list.iter().enumerate() {
            if old_list.get(i) != Some(&n) {
                break;
            }
            common = Some(i);
        }
        let first_changed = common.map_or(0, |c| c + 1);

        if old_target != target {
            self.dispatch_pointer(old_target, EventKind::MouseOut, true, PointerId::MOUSE, target);
        }
        for i in (first_changed..old_list.len()).rev() {
            self.dispatch_pointer(
                Some(old_list[i]),
                EventKind::RollOut,
                false,
                PointerId::MOUSE,
                target,
            );
        }
        for i in first_changed..list.len() {
            self.dispatch_pointer(
                Some(list[i]),
                EventKind::RollOver,
                false,
                PointerId::MOUSE,
                old_target,
            );
        }
        if old_target != target {
            self.dispatch_pointer(target, EventKind::MouseOver, true, PointerId::MOUSE, old_target);
        }
        self.hover_list = list;
        target.is_some()
    }
}

/// Several stages layered over the same input region.
///
/// Input enters the chain once and visits each stage front-to-back; the
/// first stage whose hit test resolves a target claims the pointer, and
/// later stages see press/hover passes with the claim already made (their
/// stage-level events still fire, but they resolve no target of their
/// own). Stages pushed after the first become followers: their direct
/// input methods no-op so input cannot arrive twice.
pub struct StageChain<S: Surface> {
    stages: Vec<Stage<S>>,
}

impl<S: Surface> core::fmt::Debug for StageChain<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StageChain").field("stages", &self.stages).finish()
    }
}

impl<S: Surface> Default for StageChain<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Surface> StageChain<S> {
    /// An empty chain.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Appends a stage; every stage after the first becomes a follower.
    pub fn push(&mut self, mut stage: Stage<S>) {
        stage.follower = !self.stages.is_empty();
        self.stages.push(stage);
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// The stage at `index` (0 is front-most).
    pub fn stage(&self, index: usize) -> Option<&Stage<S>> {
        self.stages.get(index)
    }

    /// The stage at `index`, mutably.
    pub fn stage_mut(&mut self, index: usize) -> Option<&mut Stage<S>> {
        self.stages.get_mut(index)
    }

    /// Updates every stage front-to-back.
    pub fn update(&mut self, tick: Option<Tick>) {
        for stage in &mut self.stages {
            stage.update(tick);
        }
    }

    /// Routes pointer movement to every stage.
    pub fn pointer_move(&mut self, id: PointerId, x: f64, y: f64) {
        for stage in &mut self.stages {
            stage.handle_pointer_move(id, x, y);
        }
    }

    /// Routes a press, letting the first resolving stage claim it.
    pub fn pointer_down(&mut self, id: PointerId, x: f64, y: f64) {
        let mut claimed = false;
        for stage in &mut self.stages {
            claimed |= stage.handle_pointer_down(id, x, y, claimed);
        }
    }

    /// Routes a release through the chain.
    pub fn pointer_up(&mut self, id: PointerId, clear: bool) {
        let mut claimed = false;
        let count = self.stages.len();
        for (i, stage) in self.stages.iter_mut().enumerate() {
            claimed |= stage.handle_pointer_up(id, clear, claimed, i + 1 < count);
        }
    }

    /// Routes a mouse double click through the chain.
    pub fn double_click(&mut self) {
        let mut claimed = false;
        for stage in &mut self.stages {
            claimed |= stage.handle_double_click(claimed);
        }
    }

    /// Runs a hover pass across the chain, throttled by the front stage's
    /// interval. Stages that never enabled hover are skipped.
    pub fn poll_mouse_over(&mut self, now_ms: f64) {
        let Some(head) = self.stages.first_mut() else {
            return;
        };
        let Some(interval) = head.hover_interval else {
            return;
        };
        if now_ms < head.hover_due {
            return;
        }
        head.hover_due = now_ms + interval;
        let mut claimed = false;
        for stage in &mut self.stages {
            if stage.hover_interval.is_some() {
                claimed |= stage.handle_mouse_over(false, claimed, true);
            }
        }
    }
}
