//! The viewing camera.
//!
//! Holds the eye/center/up frame plus perspective parameters, and derives
//! the view and projection matrices the render visitor binds each frame.

use glam::{Mat4, Vec3};

/// A look-at camera with a perspective projection.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    /// Eye position in world space.
    pub eye: Vec3,
    /// Point the camera looks at.
    pub center: Vec3,
    /// Up direction.
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fovy: f32,
    /// Width / height of the viewport.
    pub aspect: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 5.0),
            center: Vec3::ZERO,
            up: Vec3::Y,
            fovy: std::f32::consts::FRAC_PI_3,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, eye: Vec3) -> Self {
        self.eye = eye;
        self
    }

    pub fn looking_at(mut self, center: Vec3) -> Self {
        self.center = center;
        self
    }

    pub fn with_fov(mut self, fovy_degrees: f32) -> Self {
        self.fovy = fovy_degrees.to_radians();
        self
    }

    pub fn with_clip(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// View matrix: world space to camera space.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.center, self.up)
    }

    /// Projection matrix: camera space to clip space.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy, self.aspect, self.near, self.far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn view_matrix_moves_eye_to_origin() {
        let camera = Camera::new()
            .at(Vec3::new(0.0, 2.0, 8.0))
            .looking_at(Vec3::ZERO);
        let eye = camera.view_matrix() * Vec4::new(0.0, 2.0, 8.0, 1.0);
        assert!(eye.truncate().length() < 1e-5);
    }

    #[test]
    fn look_target_lands_on_negative_z() {
        let camera = Camera::new().at(Vec3::new(0.0, 0.0, 5.0)).looking_at(Vec3::ZERO);
        let target = camera.view_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(target.x.abs() < 1e-5);
        assert!(target.y.abs() < 1e-5);
        assert!(target.z < 0.0);
    }
}
