//! Unit grid cells and the occupancy index.
//!
//! The ground plane is divided into 1x1 cells identified by the floored
//! integer parts of their world coordinates. Snapping a world point to a cell
//! is a pure function; the [`OccupancyIndex`] records which cells already hold
//! a placed instance and is the single source of truth for "is this cell
//! free". It has no removal operation: placed instances stay for the session.

use std::collections::HashMap;

use cgmath::Point3;

/// Identity of a spawned instance, unique per session.
pub type InstanceId = u32;

/// A 1x1 cell of the ground plane, identified by its floored coordinates.
///
/// Two world points fall into the same cell iff their floored integer parts
/// are equal on both axes. Points exactly on a cell boundary belong to the
/// cell they floor into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellCoord {
    pub x: i32,
    pub z: i32,
}

impl CellCoord {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The cell containing the given world point (y is ignored).
    pub fn from_world(point: Point3<f32>) -> Self {
        Self {
            x: point.x.floor() as i32,
            z: point.z.floor() as i32,
        }
    }

    /// World-space centre of this cell, on the ground plane.
    pub fn centre(&self) -> Point3<f32> {
        Point3::new(self.x as f32 + 0.5, 0.0, self.z as f32 + 0.5)
    }
}

/// Snap a world point to its cell and the cell's centre point.
pub fn snap(point: Point3<f32>) -> (CellCoord, Point3<f32>) {
    let cell = CellCoord::from_world(point);
    (cell, cell.centre())
}

/// Which cells hold a placed instance.
///
/// Keys are unique; absence means the cell is free. The placement planner is
/// the only writer, so the check in [`try_place`](Self::try_place) and the
/// insert form one logical step under the single-threaded event loop.
#[derive(Debug, Default)]
pub struct OccupancyIndex {
    cells: HashMap<CellCoord, InstanceId>,
}

impl OccupancyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_occupied(&self, cell: CellCoord) -> bool {
        self.cells.contains_key(&cell)
    }

    pub fn occupant(&self, cell: CellCoord) -> Option<InstanceId> {
        self.cells.get(&cell).copied()
    }

    /// Register `id` on `cell`. Returns `false` (and changes nothing) when the
    /// cell is already taken; a taken cell is an expected outcome, not an
    /// error.
    pub fn try_place(&mut self, cell: CellCoord, id: InstanceId) -> bool {
        if self.cells.contains_key(&cell) {
            return false;
        }
        self.cells.insert(cell, id);
        true
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snaps_to_cell_centre() {
        let (cell, centre) = snap(Point3::new(2.3, 0.0, -1.1));
        assert_eq!(cell, CellCoord::new(2, -2));
        assert_eq!(centre, Point3::new(2.5, 0.0, -1.5));
    }

    #[test]
    fn snapping_is_idempotent() {
        let (cell, centre) = snap(Point3::new(-3.7, 0.0, 7.2));
        let (cell2, centre2) = snap(centre);
        assert_eq!(cell, cell2);
        assert_eq!(centre, centre2);
    }

    #[test]
    fn boundary_points_floor_to_the_lower_cell() {
        let (cell, centre) = snap(Point3::new(2.0, 0.0, -1.0));
        assert_eq!(cell, CellCoord::new(2, -1));
        assert_eq!(centre, Point3::new(2.5, 0.0, -0.5));
    }

    #[test]
    fn place_marks_cell_occupied() {
        let mut index = OccupancyIndex::new();
        let cell = CellCoord::new(0, 0);
        assert!(!index.is_occupied(cell));
        assert!(index.try_place(cell, 1));
        assert!(index.is_occupied(cell));
        assert!(!index.is_occupied(CellCoord::new(1, 0)));
    }

    #[test]
    fn second_place_on_same_cell_is_a_noop() {
        let mut index = OccupancyIndex::new();
        let cell = CellCoord::new(4, -2);
        assert!(index.try_place(cell, 7));
        assert!(!index.try_place(cell, 8));
        assert_eq!(index.occupant(cell), Some(7));
        assert_eq!(index.len(), 1);
    }
}
