// Copyright 2026 the Limelight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The event object passed to listeners.

use crate::types::{EventKind, Phase, Pointer, Tick};

/// An event in flight through a display tree, generic over the node key
/// type `K`.
///
/// Listeners receive `&mut Event<K>` and steer dispatch through
/// [`Event::prevent_default`], [`Event::stop_propagation`],
/// [`Event::stop_immediate_propagation`], and [`Event::remove`].
#[derive(Clone, Debug)]
pub struct Event<K> {
    /// What happened.
    pub kind: EventKind,
    /// Whether the event bubbles up the ancestor chain after the target
    /// phase.
    pub bubbles: bool,
    /// Whether [`Event::prevent_default`] has any effect.
    pub cancelable: bool,
    /// Current dispatch phase.
    pub phase: Phase,
    /// The node the event was dispatched at.
    pub target: Option<K>,
    /// The node whose listener is currently running.
    pub current_target: Option<K>,
    /// Clock payload for tick events.
    pub tick: Option<Tick>,
    /// Pointer payload for mouse and touch events.
    pub pointer: Option<Pointer<K>>,
    /// Whether a listener canceled the default behavior.
    pub default_prevented: bool,
    /// Whether dispatch stops after the current node.
    pub propagation_stopped: bool,
    /// Whether dispatch stops after the current listener.
    pub immediate_propagation_stopped: bool,
    /// Whether the current listener asked to be removed.
    pub removed: bool,
}

impl<K> Event<K> {
    /// Constructs an event ready for dispatch.
    pub fn new(kind: EventKind, bubbles: bool, cancelable: bool) -> Self {
        Self {
            kind,
            bubbles,
            cancelable,
            phase: Phase::Target,
            target: None,
            current_target: None,
            tick: None,
            pointer: None,
            default_prevented: false,
            propagation_stopped: false,
            immediate_propagation_stopped: false,
            removed: false,
        }
    }

    /// Attaches a tick payload.
    pub fn with_tick(mut self, tick: Tick) -> Self {
        self.tick = Some(tick);
        self
    }

    /// Attaches a pointer payload.
    pub fn with_pointer(mut self, pointer: Pointer<K>) -> Self {
        self.pointer = Some(pointer);
        self
    }

    /// Cancels the default behavior associated with the event.
    ///
    /// Only effective when the event is cancelable.
    pub fn prevent_default(&mut self) {
        self.default_prevented = self.cancelable;
    }

    /// Stops the event from reaching further nodes; listeners remaining on
    /// the current node still run.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Stops dispatch entirely, including listeners remaining on the
    /// current node.
    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_propagation_stopped = true;
    }

    /// Removes the currently running listener after it returns.
    pub fn remove(&mut self) {
        self.removed = true;
    }

    /// Clears per-dispatch state so the same event value can be dispatched
    /// again at a different target.
    pub fn reset_for_dispatch(&mut self) {
        self.phase = Phase::Target;
        self.target = None;
        self.current_target = None;
        self.default_prevented = false;
        self.propagation_stopped = false;
        self.immediate_propagation_stopped = false;
        self.removed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prevent_default_requires_cancelable() {
        let mut evt: Event<u32> = Event::new(EventKind::Click, true, false);
        evt.prevent_default();
        assert!(!evt.default_prevented, "non-cancelable events cannot be prevented");

        let mut evt: Event<u32> = Event::new(EventKind::DrawStart, false, true);
        evt.prevent_default();
        assert!(evt.default_prevented, "cancelable events honor prevent_default");
    }

    #[test]
    fn immediate_stop_implies_stop() {
        let mut evt: Event<u32> = Event::new(EventKind::Click, true, false);
        evt.stop_immediate_propagation();
        assert!(evt.propagation_stopped, "immediate stop also stops propagation");
        assert!(evt.immediate_propagation_stopped, "immediate flag set");
    }

    #[test]
    fn reset_clears_dispatch_state() {
        let mut evt: Event<u32> = Event::new(EventKind::Click, true, true);
        evt.target = Some(7);
        evt.prevent_default();
        evt.stop_propagation();
        evt.reset_for_dispatch();
        assert!(evt.target.is_none(), "target cleared");
        assert!(!evt.default_prevented, "prevention cleared");
        assert!(!evt.propagation_stopped, "propagation state cleared");
    }
}
