//! Point lights.
//!
//! Lights carry only a position; every light shines with the single global
//! light color defined in [`phong`](crate::phong). Per-light color is out
//! of scope for this model.

use glam::Vec3;

/// A point light at a world-space position.
#[derive(Clone, Copy, Debug)]
pub struct Light {
    pub position: Vec3,
}

impl Light {
    pub fn new(position: Vec3) -> Self {
        Self { position }
    }

    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vec3::new(x, y, z),
        }
    }
}
