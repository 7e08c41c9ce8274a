//! Placement requests and the per-session stage state.
//!
//! The [`PlacementPlanner`] owns the occupancy index and is its only writer.
//! Planning is pure bookkeeping: project + snap happen before, GPU spawning
//! happens after, so the decision itself is testable without a device. The
//! [`Stage`] bundles the planner with the highlight controller and the
//! session clock; it is passed explicitly to the flow instead of living in
//! globals.

use cgmath::Point3;
use instant::{Duration, Instant};

use crate::{
    grid::{CellCoord, InstanceId, OccupancyIndex, snap},
    highlight::HighlightController,
};

/// Selects which animation clip placed instances should loop.
#[derive(Clone, Debug, PartialEq)]
pub enum ClipSelector {
    /// Clip at this position in the asset's clip list.
    Index(usize),
    /// Clip with this name.
    Name(String),
}

impl ClipSelector {
    /// Resolve against the loaded asset's clip names. `None` when the asset
    /// has no such clip; placed instances then simply stay static.
    pub fn resolve<'a>(&self, clips: &'a [String]) -> Option<&'a str> {
        match self {
            ClipSelector::Index(i) => clips.get(*i).map(String::as_str),
            ClipSelector::Name(name) => clips
                .iter()
                .find(|clip| clip.as_str() == name)
                .map(String::as_str),
        }
    }
}

/// Demo configuration. The defaults reproduce the original scene: a 20x20
/// grid, the donkey model at 0.3 scale, looping its second clip.
#[derive(Clone, Debug)]
pub struct StageConfig {
    pub model_path: String,
    pub model_scale: f32,
    pub clip: ClipSelector,
    /// Half the side length of the ground plane; cells outside it cannot be
    /// hovered or placed.
    pub grid_half_extent: f32,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            model_path: "Donkey.gltf".to_string(),
            model_scale: 0.3,
            clip: ClipSelector::Index(1),
            grid_half_extent: 10.0,
        }
    }
}

/// A granted placement: the cell is now reserved under `id` and the caller
/// spawns the visual instance at `centre`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlannedPlacement {
    pub id: InstanceId,
    pub cell: CellCoord,
    pub centre: Point3<f32>,
}

/// Decides placement requests against the occupancy index.
#[derive(Debug, Default)]
pub struct PlacementPlanner {
    occupancy: OccupancyIndex,
    next_id: InstanceId,
}

impl PlacementPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a pointer-down that projected to `hit` on the ground plane.
    ///
    /// `None` (pointer missed the plane) and an already taken cell both
    /// silently decline; neither is an error. On success the cell is reserved
    /// before this returns, so a second request for the same spot in the same
    /// frame already sees it occupied.
    pub fn request(&mut self, hit: Option<Point3<f32>>) -> Option<PlannedPlacement> {
        let (cell, centre) = snap(hit?);
        let id = self.next_id;
        if !self.occupancy.try_place(cell, id) {
            return None;
        }
        self.next_id += 1;
        Some(PlannedPlacement { id, cell, centre })
    }

    pub fn occupancy(&self) -> &OccupancyIndex {
        &self.occupancy
    }

    /// Number of placements granted so far.
    pub fn placed(&self) -> usize {
        self.occupancy.len()
    }
}

/// All mutable session state of the demo, owned by the flow.
#[derive(Debug)]
pub struct Stage {
    pub planner: PlacementPlanner,
    pub highlight: HighlightController,
    started: Instant,
}

impl Default for Stage {
    fn default() -> Self {
        Self {
            planner: PlacementPlanner::new(),
            highlight: HighlightController::new(),
            started: Instant::now(),
        }
    }
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Milliseconds since session start, for the indicator pulse.
    pub fn elapsed_millis(&self) -> f32 {
        duration_millis(self.started.elapsed())
    }
}

fn duration_millis(duration: Duration) -> f32 {
    duration.as_secs_f32() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grants_a_free_cell_and_reserves_it() {
        let mut planner = PlacementPlanner::new();
        let placement = planner.request(Some(Point3::new(2.3, 0.0, -1.1))).unwrap();
        assert_eq!(placement.cell, CellCoord::new(2, -2));
        assert_eq!(placement.centre, Point3::new(2.5, 0.0, -1.5));
        assert!(planner.occupancy().is_occupied(placement.cell));
    }

    #[test]
    fn declines_without_an_intersection() {
        let mut planner = PlacementPlanner::new();
        assert!(planner.request(None).is_none());
        assert!(planner.occupancy().is_empty());
    }

    #[test]
    fn two_requests_on_one_spot_grant_once() {
        let mut planner = PlacementPlanner::new();
        let hit = Some(Point3::new(0.4, 0.0, 0.6));
        let first = planner.request(hit);
        let second = planner.request(hit);
        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(planner.placed(), 1);
    }

    #[test]
    fn ids_are_unique_per_grant() {
        let mut planner = PlacementPlanner::new();
        let a = planner.request(Some(Point3::new(0.5, 0.0, 0.5))).unwrap();
        let b = planner.request(Some(Point3::new(1.5, 0.0, 0.5))).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn clip_selector_resolves_by_index_and_name() {
        let clips = vec!["Eat".to_string(), "Walk".to_string()];
        assert_eq!(ClipSelector::Index(1).resolve(&clips), Some("Walk"));
        assert_eq!(ClipSelector::Index(5).resolve(&clips), None);
        assert_eq!(
            ClipSelector::Name("Eat".to_string()).resolve(&clips),
            Some("Eat")
        );
        assert_eq!(ClipSelector::Name("Fly".to_string()).resolve(&clips), None);
    }
}
