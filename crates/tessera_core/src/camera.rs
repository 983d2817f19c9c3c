//! Camera state owned by the World
//!
//! The camera is plain data carried in the simulation context; there is no
//! process-wide "active camera". Behaviors read it through their context and
//! the raycast layer uses it for screen-to-world rays.

use crate::math::{Mat4, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub view: Mat4,
    pub projection: Mat4,
}

impl Camera {
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        Self { view, projection }
    }

    /// Right-handed perspective camera looking from `eye` at `target`.
    /// `fov_y` is in radians; depth maps to `[0, 1]`.
    pub fn perspective(
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            view: Mat4::look_at_rh(eye, target, up),
            projection: Mat4::perspective_rh(fov_y, aspect, near, far),
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// World-space camera position recovered from the view matrix.
    pub fn position(&self) -> Vec3 {
        self.view.inverse().transform_point3(Vec3::ZERO)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::ZERO,
            Vec3::Y,
            60f32.to_radians(),
            16.0 / 9.0,
            0.1,
            1000.0,
        )
    }
}
