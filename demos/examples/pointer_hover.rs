// Copyright 2026 the Limelight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer and hover events.
//!
//! Feed synthetic mouse input into a stage and watch press, click, and
//! roll-over/roll-out events flow through the tree.
//!
//! Run:
//! - `cargo run -p limelight_demos --example pointer_hover`

use std::cell::RefCell;
use std::rc::Rc;

use kurbo::Rect;
use limelight_display::{
    DisplayObject, EventKind, FillPath, PointerId, Rgba, SoftwareSurface, Stage,
};

fn main() {
    let mut stage = Stage::new(SoftwareSurface::new(200, 200));
    let root = stage.root();

    let panel = stage.tree_mut().insert(DisplayObject::container());
    stage.tree_mut().add_child(root, panel);

    let mut buttons = Vec::new();
    for (i, label) in ["left", "middle", "right"].iter().enumerate() {
        let mut path = FillPath::new();
        path.fill_rect(Rect::new(0.0, 0.0, 50.0, 30.0), Rgba::rgb(60, 60, 200));
        let id = stage.tree_mut().insert(DisplayObject::shape(path));
        stage.tree_mut().obj_mut(id).x = 10.0 + i as f64 * 60.0;
        stage.tree_mut().obj_mut(id).y = 20.0;
        stage.tree_mut().obj_mut(id).name = Some((*label).into());
        stage.tree_mut().obj_mut(id).cursor = Some("pointer".into());
        stage.tree_mut().add_child(panel, id);
        buttons.push((id, *label));
    }

    let log = Rc::new(RefCell::new(Vec::<String>::new()));
    for &(id, label) in &buttons {
        for kind in [
            EventKind::RollOver,
            EventKind::RollOut,
            EventKind::Click,
            EventKind::PressMove,
        ] {
            let log = Rc::clone(&log);
            stage.tree_mut().add_listener(id, kind, move |evt| {
                log.borrow_mut().push(format!("{label}: {:?}", evt.kind));
            });
        }
    }

    stage.enable_mouse_over(20.0);

    // Hover across the buttons, then press-drag off the middle one.
    let mouse = PointerId::MOUSE;
    let mut clock = 0.0;
    for x in [35.0, 95.0, 155.0] {
        stage.pointer_move(mouse, x, 35.0);
        stage.poll_mouse_over(clock);
        clock += 100.0;
        println!("cursor over x={x}: {:?}", stage.current_cursor());
    }
    stage.pointer_down(mouse, 95.0, 35.0);
    stage.pointer_move(mouse, 95.0, 80.0);
    stage.pointer_up(mouse, false);

    println!("--- event log ---");
    for line in log.borrow().iter() {
        println!("{line}");
    }

    let entries = log.borrow();
    assert!(
        entries.iter().any(|l| l == "middle: PressMove"),
        "drag off the middle button still reports press-move"
    );
    assert!(
        !entries.iter().any(|l| l == "middle: Click"),
        "release away from the press point is not a click"
    );
}
