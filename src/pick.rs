//! Pointer projection onto the ground plane.
//!
//! A [`Ray`] is built from the mouse position by the camera (see
//! [`crate::camera::Camera::mouse_ray`]) and intersected with the ground
//! plane at y = 0. "No intersection" is a normal outcome of pointer position
//! (e.g. looking above the horizon) and callers treat it as "no update".

use cgmath::{InnerSpace, Point3, Vector3};

/// A world-space ray with a normalized direction.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// First intersection with the ground plane (y = 0), limited to a square
    /// of `half_extent` around the origin so the pointer cannot place cells
    /// arbitrarily far away.
    ///
    /// Returns `None` when the ray is parallel to the plane, points away from
    /// it, or hits outside the extent.
    pub fn intersect_ground(&self, half_extent: f32) -> Option<Point3<f32>> {
        if self.direction.y.abs() <= f32::EPSILON {
            return None;
        }
        let t = -self.origin.y / self.direction.y;
        if t < 0.0 {
            return None;
        }
        let point = self.origin + self.direction * t;
        if point.x.abs() > half_extent || point.z.abs() > half_extent {
            return None;
        }
        Some(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_down_hits_below_origin() {
        let ray = Ray::new(Point3::new(0.2, 5.0, 0.3), Vector3::new(0.0, -1.0, 0.0));
        let hit = ray.intersect_ground(10.0).unwrap();
        assert!((hit.x - 0.2).abs() < 1e-5);
        assert!(hit.y.abs() < 1e-5);
        assert!((hit.z - 0.3).abs() < 1e-5);
    }

    #[test]
    fn ray_above_horizon_misses() {
        let ray = Ray::new(Point3::new(0.0, 5.0, 0.0), Vector3::new(0.0, 1.0, 0.2));
        assert!(ray.intersect_ground(10.0).is_none());
    }

    #[test]
    fn parallel_ray_misses() {
        let ray = Ray::new(Point3::new(0.0, 5.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
        assert!(ray.intersect_ground(10.0).is_none());
    }

    #[test]
    fn hit_outside_extent_misses() {
        let ray = Ray::new(Point3::new(50.0, 5.0, 0.0), Vector3::new(0.0, -1.0, 0.0));
        assert!(ray.intersect_ground(10.0).is_none());
        assert!(ray.intersect_ground(60.0).is_some());
    }

    #[test]
    fn slanted_ray_lands_where_expected() {
        let ray = Ray::new(Point3::new(0.0, 4.0, 0.0), Vector3::new(1.0, -1.0, 0.0));
        let hit = ray.intersect_ground(10.0).unwrap();
        assert!((hit.x - 4.0).abs() < 1e-4);
        assert!(hit.y.abs() < 1e-4);
    }
}
