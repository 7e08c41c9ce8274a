//! The hover indicator: a single quad following the pointer's grid cell.
//!
//! The indicator has two observable states, driven by the occupancy of the
//! hovered cell: free cells show the neutral colour, taken cells the warning
//! colour. A pointer event that projects to nothing leaves the indicator
//! where it was. Independently of pointer events its transparency pulses as a
//! pure function of elapsed time.

use cgmath::Point3;

use crate::grid::{CellCoord, OccupancyIndex, snap};

/// Indicator colour for a free cell.
pub const FREE_COLOUR: [f32; 3] = [1.0, 1.0, 1.0];
/// Indicator colour for an occupied cell.
pub const OCCUPIED_COLOUR: [f32; 3] = [1.0, 0.0, 0.0];

/// Full pulse period in milliseconds.
pub const PULSE_PERIOD_MILLIS: f32 = 240.0;

/// Indicator opacity at `elapsed` milliseconds since session start.
///
/// Oscillates in [0, 2] (clamped by the blend stage) and repeats every
/// [`PULSE_PERIOD_MILLIS`]; purely a function of time, no state.
pub fn pulse_opacity(elapsed_millis: f32) -> f32 {
    1.0 + (std::f32::consts::TAU * elapsed_millis / PULSE_PERIOD_MILLIS).sin()
}

/// The cell the indicator currently sits on and whether it is taken.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HighlightState {
    pub cell: CellCoord,
    pub occupied: bool,
}

/// Tracks the hovered cell across pointer-move events.
///
/// Reads the occupancy index, never writes it.
#[derive(Debug)]
pub struct HighlightController {
    state: HighlightState,
}

impl Default for HighlightController {
    fn default() -> Self {
        Self {
            state: HighlightState {
                cell: CellCoord::new(0, 0),
                occupied: false,
            },
        }
    }
}

impl HighlightController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a pointer-move that projected to `hit` on the ground plane.
    ///
    /// With `Some(point)` the indicator snaps to that point's cell and
    /// recomputes the occupied flag; with `None` the previous state is kept.
    pub fn pointer_moved(&mut self, hit: Option<Point3<f32>>, occupancy: &OccupancyIndex) {
        if let Some(point) = hit {
            let (cell, _) = snap(point);
            self.state = HighlightState {
                cell,
                occupied: occupancy.is_occupied(cell),
            };
        }
    }

    /// Re-read occupancy for the current cell, e.g. right after a placement
    /// underneath the pointer.
    pub fn refresh(&mut self, occupancy: &OccupancyIndex) {
        self.state.occupied = occupancy.is_occupied(self.state.cell);
    }

    pub fn state(&self) -> HighlightState {
        self.state
    }

    /// World-space centre the indicator quad should be drawn at.
    pub fn centre(&self) -> Point3<f32> {
        self.state.cell.centre()
    }

    pub fn colour(&self) -> [f32; 3] {
        if self.state.occupied {
            OCCUPIED_COLOUR
        } else {
            FREE_COLOUR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_the_pointer_and_reads_occupancy() {
        let mut occupancy = OccupancyIndex::new();
        occupancy.try_place(CellCoord::new(0, 0), 1);

        let mut highlight = HighlightController::new();
        highlight.pointer_moved(Some(Point3::new(0.5, 0.0, 0.5)), &occupancy);
        assert_eq!(highlight.state().cell, CellCoord::new(0, 0));
        assert!(highlight.state().occupied);
        assert_eq!(highlight.colour(), OCCUPIED_COLOUR);

        highlight.pointer_moved(Some(Point3::new(1.5, 0.0, 0.5)), &occupancy);
        assert_eq!(highlight.state().cell, CellCoord::new(1, 0));
        assert!(!highlight.state().occupied);
        assert_eq!(highlight.colour(), FREE_COLOUR);
        assert_eq!(highlight.centre(), Point3::new(1.5, 0.0, 0.5));
    }

    #[test]
    fn keeps_state_when_nothing_was_hit() {
        let occupancy = OccupancyIndex::new();
        let mut highlight = HighlightController::new();
        highlight.pointer_moved(Some(Point3::new(3.2, 0.0, -2.8)), &occupancy);
        let before = highlight.state();
        highlight.pointer_moved(None, &occupancy);
        assert_eq!(highlight.state(), before);
    }

    #[test]
    fn refresh_picks_up_a_new_occupant() {
        let mut occupancy = OccupancyIndex::new();
        let mut highlight = HighlightController::new();
        highlight.pointer_moved(Some(Point3::new(0.1, 0.0, 0.1)), &occupancy);
        assert!(!highlight.state().occupied);

        occupancy.try_place(CellCoord::new(0, 0), 9);
        highlight.refresh(&occupancy);
        assert!(highlight.state().occupied);
    }

    #[test]
    fn pulse_repeats_after_one_period() {
        for t in [0.0_f32, 13.5, 100.0, 517.25] {
            let a = pulse_opacity(t);
            let b = pulse_opacity(t + PULSE_PERIOD_MILLIS);
            assert!((a - b).abs() < 1e-3, "t={t}: {a} vs {b}");
        }
    }
}
