// Copyright 2026 the Limelight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core event vocabulary: kinds, phases, and input payloads.

/// The closed set of events the display list emits.
///
/// The set is deliberately an enum rather than open string names: every
/// kind a tree can produce is known at compile time, and listener maps key
/// on it directly.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum EventKind {
    /// A node gained a parent.
    Added,
    /// A node lost its parent.
    Removed,
    /// Per-node advance of the clock, children before own listeners.
    Tick,
    /// Cancelable gate fired on the stage before ticking.
    TickStart,
    /// Fired on the stage after ticking completes.
    TickEnd,
    /// Cancelable gate fired on the stage before drawing.
    DrawStart,
    /// Fired on the stage after drawing completes.
    DrawEnd,
    /// Pointer pressed over a target; bubbles.
    MouseDown,
    /// Pointer pressed anywhere inside the stage; stage only.
    StageMouseDown,
    /// Pointer moved inside the stage; stage only.
    StageMouseMove,
    /// Pointer released after a press; stage only.
    StageMouseUp,
    /// Pointer moved while pressed; bubbles to the press target.
    PressMove,
    /// Pointer released; bubbles to the press target.
    PressUp,
    /// Press and release on the same target; bubbles.
    Click,
    /// Double click on a target; bubbles.
    DblClick,
    /// Pointer entered a target; bubbles.
    MouseOver,
    /// Pointer left a target; bubbles.
    MouseOut,
    /// Pointer entered a target or its subtree; does not bubble.
    RollOver,
    /// Pointer left a target and its subtree; does not bubble.
    RollOut,
    /// Pointer entered the stage bounds; stage only.
    MouseEnter,
    /// Pointer left the stage bounds; stage only.
    MouseLeave,
}

impl EventKind {
    /// Whether a listener for this kind makes a node an active pointer
    /// target during hit testing.
    pub fn is_pointer_target_kind(self) -> bool {
        matches!(
            self,
            Self::Click
                | Self::DblClick
                | Self::MouseDown
                | Self::MouseOut
                | Self::MouseOver
                | Self::PressMove
                | Self::PressUp
                | Self::RollOut
                | Self::RollOver
        )
    }
}

/// Dispatch phase of an in-flight event.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    /// Root-to-target, ancestors only, capture listeners.
    Capture,
    /// At the target, regular listeners.
    Target,
    /// Target-to-root, ancestors only, regular listeners.
    Bubble,
}

/// Identifier of an input pointer.
///
/// Touches and pens carry host-assigned non-negative ids; the mouse is the
/// reserved [`PointerId::MOUSE`] sentinel.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct PointerId(pub i32);

impl PointerId {
    /// The system mouse.
    pub const MOUSE: Self = Self(-1);

    /// Whether this pointer is a touch/pen rather than the mouse.
    pub fn is_touch(self) -> bool {
        self != Self::MOUSE
    }
}

/// Clock payload carried by [`EventKind::Tick`] events.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Tick {
    /// Milliseconds elapsed since the previous tick.
    pub delta: f64,
    /// Total milliseconds elapsed on the caller's clock.
    pub time: f64,
    /// Whether the caller considers the clock paused.
    pub paused: bool,
}

/// Pointer payload carried by mouse and touch events.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Pointer<K> {
    /// X position in stage (surface) coordinates.
    pub stage_x: f64,
    /// Y position in stage coordinates.
    pub stage_y: f64,
    /// X position as reported by the host, before any clamping.
    pub raw_x: f64,
    /// Y position as reported by the host, before any clamping.
    pub raw_y: f64,
    /// Which pointer produced the event.
    pub id: PointerId,
    /// Whether this is the primary pointer.
    pub primary: bool,
    /// The secondary target for over/out pairs, if any.
    pub related: Option<K>,
}
