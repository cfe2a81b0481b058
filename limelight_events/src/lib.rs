// Copyright 2026 the Limelight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Limelight Events: the event model for a retained display tree.
//!
//! This crate is deliberately tree-agnostic. It provides:
//!
//! - [`Event`]: the object listeners receive, generic over the node key
//!   type `K`, with flow control (`prevent_default`, `stop_propagation`,
//!   `stop_immediate_propagation`, `remove`).
//! - [`EventKind`]: the closed set of events a display tree emits, and
//!   [`Phase`]: capture → target → bubble.
//! - [`EventDispatcher`]: a per-node listener registry with capture and
//!   bubble lists, once-listeners, and removal tokens. Dispatch snapshots
//!   the list so handlers can unregister themselves mid-flight.
//! - Input payloads: [`Pointer`], [`PointerId`], [`Tick`].
//!
//! The tree crate owns path construction: it walks root→target emitting the
//! capture phase on ancestors, runs the target phase, then walks
//! target→root emitting the bubble phase, honoring
//! [`Event::propagation_stopped`] between nodes.
//!
//! ```
//! use limelight_events::{Event, EventDispatcher, EventKind, Phase};
//!
//! let mut d: EventDispatcher<u32> = EventDispatcher::new();
//! d.add(EventKind::Click, |evt| evt.prevent_default());
//! let mut evt = Event::new(EventKind::Click, true, true);
//! evt.target = Some(1);
//! evt.current_target = Some(1);
//! d.emit(Phase::Target, &mut evt);
//! assert!(evt.default_prevented);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod dispatcher;
mod event;
mod types;

pub use dispatcher::{EventDispatcher, Handler, ListenerId};
pub use event::Event;
pub use types::{EventKind, Phase, Pointer, PointerId, Tick};
