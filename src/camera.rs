//! Camera, projection and the orbit controller.
//!
//! The camera orbits a target point on the ground: dragging with the right
//! mouse button rotates around it, the scroll wheel zooms. Besides producing
//! the view/projection uniform each frame, the camera turns window-space
//! pointer coordinates into world-space rays (see [`Camera::mouse_ray`]),
//! which drive cell highlighting and placement.

use cgmath::{
    Deg, EuclideanSpace, InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Vector3, Vector4,
    perspective,
};
use instant::Duration;
use winit::{
    dpi::PhysicalPosition,
    event::{MouseScrollDelta, WindowEvent},
};

use crate::pick::Ray;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
}

impl Camera {
    pub fn new<V, Y, P>(position: V, yaw: Y, pitch: P) -> Self
    where
        V: Into<Point3<f32>>,
        Y: Into<Rad<f32>>,
        P: Into<Rad<f32>>,
    {
        Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
        }
    }

    /// Unit vector the camera looks along.
    pub fn forward(&self) -> Vector3<f32> {
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        Vector3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw).normalize()
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.forward(), Vector3::unit_y())
    }

    /// World-space ray through the given window position.
    ///
    /// Unprojects the pointer onto the near and far planes and returns the
    /// ray between them. `None` only for degenerate input (zero-sized window
    /// or a non-invertible view-projection), which callers treat the same as
    /// a ray that misses everything.
    pub fn mouse_ray(
        &self,
        mouse: PhysicalPosition<f64>,
        width: f32,
        height: f32,
        projection: &Projection,
    ) -> Option<Ray> {
        if width <= 0.0 || height <= 0.0 {
            return None;
        }
        let ndc_x = 2.0 * mouse.x as f32 / width - 1.0;
        let ndc_y = 1.0 - 2.0 * mouse.y as f32 / height;

        let inverse = (projection.calc_matrix() * self.calc_matrix()).invert()?;
        let near = inverse * Vector4::new(ndc_x, ndc_y, 0.0, 1.0);
        let far = inverse * Vector4::new(ndc_x, ndc_y, 1.0, 1.0);
        if near.w.abs() <= f32::EPSILON || far.w.abs() <= f32::EPSILON {
            return None;
        }
        let near = near.truncate() / near.w;
        let far = far.truncate() / far.w;
        Some(Ray::new(Point3::from_vec(near), far - near))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Orbit-style camera controller.
///
/// Accumulates input between frames and applies it in
/// [`update`](Self::update): yaw/pitch from right-drag, distance from the
/// scroll wheel. Pitch is clamped so the camera never flips over the pole or
/// dips below the ground.
#[derive(Debug)]
pub struct OrbitController {
    pub target: Point3<f32>,
    distance: f32,
    yaw: Rad<f32>,
    pitch: Rad<f32>,
    rotate_speed: f32,
    zoom_speed: f32,
    rotate_delta: (f32, f32),
    scroll_delta: f32,
}

impl OrbitController {
    pub fn new<Y, P>(target: Point3<f32>, distance: f32, yaw: Y, pitch: P) -> Self
    where
        Y: Into<Rad<f32>>,
        P: Into<Rad<f32>>,
    {
        Self {
            target,
            distance,
            yaw: yaw.into(),
            pitch: pitch.into(),
            rotate_speed: 0.004,
            zoom_speed: 0.12,
            rotate_delta: (0.0, 0.0),
            scroll_delta: 0.0,
        }
    }

    /// Feed a raw mouse motion (called while the right button is held).
    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        self.rotate_delta.0 += dx as f32;
        self.rotate_delta.1 += dy as f32;
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        if let WindowEvent::MouseWheel { delta, .. } = event {
            self.scroll_delta += match delta {
                MouseScrollDelta::LineDelta(_, rows) => *rows,
                MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 40.0,
            };
        }
    }

    pub fn update(&mut self, camera: &mut Camera, _dt: Duration) {
        self.yaw += Rad(self.rotate_delta.0 * self.rotate_speed);
        self.pitch -= Rad(self.rotate_delta.1 * self.rotate_speed);
        self.rotate_delta = (0.0, 0.0);

        let min_pitch = Rad::from(Deg(-89.0));
        let max_pitch = Rad::from(Deg(-5.0));
        self.pitch = Rad(self.pitch.0.clamp(min_pitch.0, max_pitch.0));

        self.distance *= 1.0 - self.scroll_delta * self.zoom_speed;
        self.distance = self.distance.clamp(2.0, 80.0);
        self.scroll_delta = 0.0;

        camera.yaw = self.yaw;
        camera.pitch = self.pitch;
        camera.position = self.target - camera.forward() * self.distance;
    }
}

/// Camera state as laid out for the shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything camera-related the context owns: logical camera, controller,
/// and the GPU-side uniform resources.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: OrbitController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centre_ray_from_above_hits_near_the_target() {
        let camera = Camera::new((0.0, 10.0, 0.0), Deg(-90.0), Deg(-89.9));
        let projection = Projection::new(800, 600, Deg(45.0), 0.1, 500.0);
        let ray = camera
            .mouse_ray((400.0, 300.0).into(), 800.0, 600.0, &projection)
            .unwrap();
        let hit = ray.intersect_ground(20.0).unwrap();
        assert!(hit.x.abs() < 0.1, "{hit:?}");
        assert!(hit.z.abs() < 0.1, "{hit:?}");
    }

    #[test]
    fn ray_origin_sits_on_the_near_plane() {
        let camera = Camera::new((0.0, 6.0, 14.0), Deg(-90.0), Deg(-23.0));
        let projection = Projection::new(800, 600, Deg(45.0), 0.1, 500.0);
        let ray = camera
            .mouse_ray((400.0, 300.0).into(), 800.0, 600.0, &projection)
            .unwrap();
        let to_origin = ray.origin - camera.position;
        assert!(to_origin.magnitude() < 0.2, "{:?}", ray.origin);
    }

    #[test]
    fn orbit_update_keeps_the_target_distance() {
        let mut camera = Camera::new((0.0, 6.0, 14.0), Deg(-90.0), Deg(-23.0));
        let mut controller =
            OrbitController::new(Point3::new(0.0, 0.0, 0.0), 15.0, Deg(-90.0), Deg(-23.0));
        controller.handle_mouse(120.0, -40.0);
        controller.update(&mut camera, Duration::from_millis(16));
        let distance = (camera.position - controller.target).magnitude();
        assert!((distance - 15.0).abs() < 1e-3);
        // still looking at the target
        let to_target = (controller.target - camera.position).normalize();
        assert!(to_target.dot(camera.forward()) > 0.999);
    }
}
