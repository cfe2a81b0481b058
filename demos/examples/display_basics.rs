// Copyright 2026 the Limelight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display list basics.
//!
//! Build a small scene, draw it to a software surface, and hit-test.
//!
//! Run:
//! - `cargo run -p limelight_demos --example display_basics`

use kurbo::Rect;
use limelight_display::{DisplayObject, FillPath, HitMode, Rgba, SoftwareSurface, Stage};

fn square(size: f64, color: Rgba) -> DisplayObject {
    let mut path = FillPath::new();
    path.fill_rect(Rect::new(0.0, 0.0, size, size), color);
    DisplayObject::shape(path)
}

fn main() {
    let mut stage = Stage::new(SoftwareSurface::new(200, 200));
    let root = stage.root();

    // A rotated group holding two squares.
    let group = stage.tree_mut().insert(DisplayObject::container());
    stage.tree_mut().obj_mut(group).x = 100.0;
    stage.tree_mut().obj_mut(group).y = 100.0;
    stage.tree_mut().obj_mut(group).rotation = 30.0;
    stage.tree_mut().add_child(root, group);

    let red = stage.tree_mut().insert(square(40.0, Rgba::rgb(200, 40, 40)));
    stage.tree_mut().obj_mut(red).x = -50.0;
    stage.tree_mut().obj_mut(red).y = -20.0;
    stage.tree_mut().add_child(group, red);

    let blue = stage.tree_mut().insert(square(40.0, Rgba::rgb(40, 40, 200)));
    stage.tree_mut().obj_mut(blue).x = 10.0;
    stage.tree_mut().obj_mut(blue).y = -20.0;
    stage.tree_mut().obj_mut(blue).alpha = 0.5;
    stage.tree_mut().add_child(group, blue);

    stage.update(None);

    // Project a local corner of the red square into stage space.
    let corner = stage.tree().local_to_global(red, 0.0, 0.0);
    println!("red square's origin lands at {corner:?}");

    // Pixel-accurate picking: rotation and transparency come along for free.
    for (x, y) in [(70.0, 70.0), (100.0, 100.0), (130.0, 130.0)] {
        let hit = stage.tree_mut().object_under_point(root, x, y, HitMode::All);
        let name = match hit {
            Some(id) if id == red => "red",
            Some(id) if id == blue => "blue",
            Some(id) if id == group => "group",
            Some(_) => "other",
            None => "nothing",
        };
        println!("({x:>5}, {y:>5}) -> {name}");
    }

    assert!(
        stage.tree_mut().hit_test(red, 20.0, 20.0),
        "center of the red square should register"
    );
}
