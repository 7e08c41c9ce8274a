//! Session-level behaviour of hovering and placing, exercised without a GPU:
//! the planner and highlight controller operate on projected ground hits, so
//! the whole interaction loop short of drawing can run headless.

use cgmath::{InnerSpace, Point3, Vector3};
use paddock::{
    grid::CellCoord,
    highlight::{FREE_COLOUR, OCCUPIED_COLOUR, PULSE_PERIOD_MILLIS, pulse_opacity},
    pick::Ray,
    placement::Stage,
};

#[test]
fn hover_place_and_hover_again() {
    let mut stage = Stage::new();

    // Hover an empty cell: neutral highlight.
    let hit = Some(Point3::new(0.4, 0.0, 0.7));
    stage.highlight.pointer_moved(hit, stage.planner.occupancy());
    assert_eq!(stage.highlight.state().cell, CellCoord::new(0, 0));
    assert_eq!(stage.highlight.colour(), FREE_COLOUR);

    // Click it: the placement is granted and the indicator, still hovering
    // the same cell, turns to the warning colour.
    let placement = stage.planner.request(hit).expect("free cell");
    assert_eq!(placement.centre, Point3::new(0.5, 0.0, 0.5));
    stage.highlight.refresh(stage.planner.occupancy());
    assert_eq!(stage.highlight.colour(), OCCUPIED_COLOUR);

    // The neighbouring cell is still free.
    stage
        .highlight
        .pointer_moved(Some(Point3::new(1.5, 0.0, 0.5)), stage.planner.occupancy());
    assert_eq!(stage.highlight.state().cell, CellCoord::new(1, 0));
    assert_eq!(stage.highlight.colour(), FREE_COLOUR);
}

#[test]
fn clicking_a_taken_cell_changes_nothing() {
    let mut stage = Stage::new();
    let hit = Some(Point3::new(-2.7, 0.0, 3.1));

    assert!(stage.planner.request(hit).is_some());
    assert!(stage.planner.request(hit).is_none());
    assert_eq!(stage.planner.placed(), 1);
}

#[test]
fn pointer_off_the_grid_keeps_the_indicator_put() {
    let mut stage = Stage::new();
    stage
        .highlight
        .pointer_moved(Some(Point3::new(4.2, 0.0, -3.8)), stage.planner.occupancy());
    let before = stage.highlight.state();

    // A ray over the horizon misses the ground plane entirely.
    let ray = Ray::new(Point3::new(0.0, 6.0, 14.0), Vector3::new(0.0, 0.3, -1.0).normalize());
    let hit = ray.intersect_ground(10.0);
    assert!(hit.is_none());

    stage.highlight.pointer_moved(hit, stage.planner.occupancy());
    assert_eq!(stage.highlight.state(), before);

    // And a click with no intersection places nothing.
    assert!(stage.planner.request(hit).is_none());
    assert!(stage.planner.occupancy().is_empty());
}

#[test]
fn hits_outside_the_grid_extent_do_not_place() {
    let mut stage = Stage::new();
    let ray = Ray::new(Point3::new(30.0, 5.0, 0.0), Vector3::new(0.0, -1.0, 0.0));
    let hit = ray.intersect_ground(10.0);
    assert!(hit.is_none());
    assert!(stage.planner.request(hit).is_none());
}

#[test]
fn indicator_pulse_is_a_pure_function_of_time() {
    // Same value one full period later, and actually varying inside it.
    let a = pulse_opacity(1000.0);
    let b = pulse_opacity(1000.0 + PULSE_PERIOD_MILLIS);
    assert!((a - b).abs() < 1e-3);
    let quarter = pulse_opacity(1000.0 + PULSE_PERIOD_MILLIS / 4.0);
    assert!((a - quarter).abs() > 1e-3);
}
