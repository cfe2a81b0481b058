// Copyright 2026 the Limelight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node listener registry and single-node dispatch.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use crate::event::Event;
use crate::types::{EventKind, Phase};

/// A listener callback. Handlers are reference-counted so a dispatch pass
/// can snapshot the list and survive listeners mutating the registry
/// mid-flight.
pub type Handler<K> = Rc<RefCell<dyn FnMut(&mut Event<K>)>>;

/// Token identifying a registered listener for removal.
///
/// Tokens are unique per dispatcher for its lifetime; removing a listener
/// never invalidates other tokens.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ListenerId(u64);

struct Entry<K> {
    id: ListenerId,
    once: bool,
    handler: Handler<K>,
}

/// Listener registry for one node: regular (target/bubble phase) and
/// capture-phase lists per event kind.
///
/// Dispatch through [`EventDispatcher::emit`] runs over a snapshot of the
/// matching list, so a handler may remove itself (or any sibling) without
/// affecting the pass in flight. Once-listeners and handlers that call
/// [`Event::remove`] are unregistered after they run.
pub struct EventDispatcher<K> {
    listeners: BTreeMap<EventKind, Vec<Entry<K>>>,
    capture_listeners: BTreeMap<EventKind, Vec<Entry<K>>>,
    next_id: u64,
}

impl<K> Default for EventDispatcher<K> {
    fn default() -> Self {
        Self {
            listeners: BTreeMap::new(),
            capture_listeners: BTreeMap::new(),
            next_id: 0,
        }
    }
}

impl<K> fmt::Debug for EventDispatcher<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.listeners.len())
            .field("capture_listeners", &self.capture_listeners.len())
            .finish_non_exhaustive()
    }
}

impl<K: 'static> EventDispatcher<K> {
    /// Constructs an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener for the target/bubble phases.
    pub fn add(&mut self, kind: EventKind, f: impl FnMut(&mut Event<K>) + 'static) -> ListenerId {
        self.insert(kind, f, false, false)
    }

    /// Registers a capture-phase listener.
    pub fn add_capture(
        &mut self,
        kind: EventKind,
        f: impl FnMut(&mut Event<K>) + 'static,
    ) -> ListenerId {
        self.insert(kind, f, true, false)
    }

    /// Registers a listener removed automatically after its first call.
    pub fn once(&mut self, kind: EventKind, f: impl FnMut(&mut Event<K>) + 'static) -> ListenerId {
        self.insert(kind, f, false, true)
    }

    /// Registers a capture-phase listener removed after its first call.
    pub fn once_capture(
        &mut self,
        kind: EventKind,
        f: impl FnMut(&mut Event<K>) + 'static,
    ) -> ListenerId {
        self.insert(kind, f, true, true)
    }

    fn insert(
        &mut self,
        kind: EventKind,
        f: impl FnMut(&mut Event<K>) + 'static,
        capture: bool,
        once: bool,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        let map = if capture { &mut self.capture_listeners } else { &mut self.listeners };
        map.entry(kind).or_default().push(Entry {
            id,
            once,
            handler: Rc::new(RefCell::new(f)),
        });
        id
    }

    /// Removes a listener by token. Returns whether it was present.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        for map in [&mut self.listeners, &mut self.capture_listeners] {
            for list in map.values_mut() {
                if let Some(pos) = list.iter().position(|e| e.id == id) {
                    list.remove(pos);
                    return true;
                }
            }
        }
        false
    }

    /// Removes every listener for `kind` in both phase lists.
    pub fn remove_kind(&mut self, kind: EventKind) {
        self.listeners.remove(&kind);
        self.capture_listeners.remove(&kind);
    }

    /// Removes every listener.
    pub fn clear(&mut self) {
        self.listeners.clear();
        self.capture_listeners.clear();
    }

    /// Whether any listener (either phase list) exists for `kind`.
    pub fn has(&self, kind: EventKind) -> bool {
        self.listeners.get(&kind).is_some_and(|l| !l.is_empty())
            || self.capture_listeners.get(&kind).is_some_and(|l| !l.is_empty())
    }

    /// Whether any registered kind makes this node an active pointer
    /// target.
    pub fn has_pointer_listener(&self) -> bool {
        self.listeners
            .keys()
            .chain(self.capture_listeners.keys())
            .any(|k| k.is_pointer_target_kind())
    }

    /// Runs the listeners matching the event's kind for `phase`.
    ///
    /// The caller is responsible for setting `event.current_target` first.
    /// Honors [`Event::stop_immediate_propagation`] and unregisters
    /// once-listeners and listeners that called [`Event::remove`].
    pub fn emit(&mut self, phase: Phase, event: &mut Event<K>) {
        event.phase = phase;
        let map = if phase == Phase::Capture { &self.capture_listeners } else { &self.listeners };
        let Some(list) = map.get(&event.kind) else {
            return;
        };
        // Snapshot so handlers can mutate the registry mid-dispatch.
        let snapshot: Vec<(ListenerId, bool, Handler<K>)> = list
            .iter()
            .map(|e| (e.id, e.once, Rc::clone(&e.handler)))
            .collect();
        for (id, once, handler) in snapshot {
            (handler.borrow_mut())(event);
            if once || event.removed {
                event.removed = false;
                self.remove(id);
            }
            if event.immediate_propagation_stopped {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use core::cell::Cell;

    #[test]
    fn listeners_fire_in_registration_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut d: EventDispatcher<u32> = EventDispatcher::new();
        for i in 0..3 {
            let order = Rc::clone(&order);
            d.add(EventKind::Click, move |_| order.borrow_mut().push(i));
        }
        let mut evt = Event::new(EventKind::Click, false, false);
        d.emit(Phase::Target, &mut evt);
        assert_eq!(*order.borrow(), vec![0, 1, 2], "registration order preserved");
    }

    #[test]
    fn capture_and_bubble_lists_are_separate() {
        let captured = Rc::new(Cell::new(0));
        let bubbled = Rc::new(Cell::new(0));
        let mut d: EventDispatcher<u32> = EventDispatcher::new();
        {
            let captured = Rc::clone(&captured);
            d.add_capture(EventKind::Click, move |_| captured.set(captured.get() + 1));
        }
        {
            let bubbled = Rc::clone(&bubbled);
            d.add(EventKind::Click, move |_| bubbled.set(bubbled.get() + 1));
        }
        let mut evt = Event::new(EventKind::Click, true, false);
        d.emit(Phase::Capture, &mut evt);
        assert_eq!((captured.get(), bubbled.get()), (1, 0), "capture phase");
        d.emit(Phase::Bubble, &mut evt);
        assert_eq!((captured.get(), bubbled.get()), (1, 1), "bubble phase");
    }

    #[test]
    fn once_listeners_unregister_after_first_call() {
        let calls = Rc::new(Cell::new(0));
        let mut d: EventDispatcher<u32> = EventDispatcher::new();
        {
            let calls = Rc::clone(&calls);
            d.once(EventKind::Tick, move |_| calls.set(calls.get() + 1));
        }
        let mut evt = Event::new(EventKind::Tick, false, false);
        d.emit(Phase::Target, &mut evt);
        d.emit(Phase::Target, &mut evt);
        assert_eq!(calls.get(), 1, "once listener ran a single time");
        assert!(!d.has(EventKind::Tick), "once listener unregistered");
    }

    #[test]
    fn listener_can_remove_itself_mid_dispatch() {
        let calls = Rc::new(Cell::new(0));
        let mut d: EventDispatcher<u32> = EventDispatcher::new();
        {
            let calls = Rc::clone(&calls);
            d.add(EventKind::Click, move |evt| {
                calls.set(calls.get() + 1);
                evt.remove();
            });
        }
        let late = Rc::new(Cell::new(0));
        {
            let late = Rc::clone(&late);
            d.add(EventKind::Click, move |_| late.set(late.get() + 1));
        }
        let mut evt = Event::new(EventKind::Click, false, false);
        d.emit(Phase::Target, &mut evt);
        assert_eq!((calls.get(), late.get()), (1, 1), "both listeners ran");
        d.emit(Phase::Target, &mut evt);
        assert_eq!((calls.get(), late.get()), (1, 2), "self-removed listener gone");
    }

    #[test]
    fn immediate_stop_skips_remaining_listeners() {
        let late = Rc::new(Cell::new(0));
        let mut d: EventDispatcher<u32> = EventDispatcher::new();
        d.add(EventKind::Click, |evt| evt.stop_immediate_propagation());
        {
            let late = Rc::clone(&late);
            d.add(EventKind::Click, move |_| late.set(late.get() + 1));
        }
        let mut evt = Event::new(EventKind::Click, false, false);
        d.emit(Phase::Target, &mut evt);
        assert_eq!(late.get(), 0, "second listener skipped");
    }

    #[test]
    fn remove_by_token() {
        let mut d: EventDispatcher<u32> = EventDispatcher::new();
        let id = d.add(EventKind::MouseDown, |_| {});
        assert!(d.has(EventKind::MouseDown), "listener registered");
        assert!(d.has_pointer_listener(), "mousedown is a pointer kind");
        assert!(d.remove(id), "token removal succeeds");
        assert!(!d.remove(id), "double removal reports absence");
        assert!(!d.has(EventKind::MouseDown), "registry empty again");
    }
}
