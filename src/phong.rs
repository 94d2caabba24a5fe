//! Phong illumination.
//!
//! [`phong`] is the reference semantics for what the GPU lighting shader
//! computes per fragment: a pure function from geometry, camera, and light
//! data to a color, callable on the CPU for verification. The WGSL in
//! `shaders/phong.wgsl` must reproduce exactly this model.

use glam::Vec3;

use crate::color::Color;
use crate::light::Light;

/// The color every light shines with. Lights carry no color of their own.
pub const LIGHT_COLOR: Vec3 = Vec3::new(0.8, 0.8, 0.8);

/// Reflection coefficients of a surface.
#[derive(Clone, Copy, Debug)]
pub struct PhongValues {
    /// Ambient coefficient.
    pub ka: f32,
    /// Diffuse coefficient.
    pub kd: f32,
    /// Specular coefficient.
    pub ks: f32,
    /// Specular exponent; higher is a tighter highlight.
    pub shininess: f32,
}

impl Default for PhongValues {
    fn default() -> Self {
        Self {
            ka: 0.3,
            kd: 0.6,
            ks: 0.7,
            shininess: 16.0,
        }
    }
}

/// A shading location: the point being lit and the surface normal there.
#[derive(Clone, Copy, Debug)]
pub struct Intersection {
    pub point: Vec3,
    pub normal: Vec3,
}

/// Computes the color of a surface point under the Phong lighting model.
///
/// For each light: the light vector runs from the point to the light, the
/// view vector from the point to the camera, and the reflection vector is
/// the light vector mirrored about the normal. Diffuse accumulates
/// `max(0, n·l)`, specular `max(0, r·v)^shininess`, both scaled by
/// [`LIGHT_COLOR`]. Back-facing contributions clamp to zero rather than
/// darkening the surface.
///
/// The result is `surface·kA + Σdiffuse·kD + Σspecular·kS` component-wise;
/// with no lights it degenerates to the ambient term alone.
pub fn phong(
    surface_color: Color,
    intersection: &Intersection,
    lights: &[Light],
    camera_position: Vec3,
    values: &PhongValues,
) -> Color {
    let surface = Vec3::new(surface_color.r, surface_color.g, surface_color.b);

    let mut diffuse_sum = Vec3::ZERO;
    let mut specular_sum = Vec3::ZERO;

    for light in lights {
        let n = intersection.normal;
        let l = (light.position - intersection.point).normalize();
        let v = (camera_position - intersection.point).normalize();
        let r = n * 2.0 * n.dot(l) - l;

        diffuse_sum += LIGHT_COLOR * n.dot(l).max(0.0);
        specular_sum += LIGHT_COLOR * r.dot(v).max(0.0).powf(values.shininess);
    }

    let shaded = surface * values.ka + diffuse_sum * values.kd + specular_sum * values.ks;
    Color::rgba(shaded.x, shaded.y, shaded.z, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALUES: PhongValues = PhongValues {
        ka: 0.1,
        kd: 0.5,
        ks: 0.4,
        shininess: 10.0,
    };

    fn origin_facing_z() -> Intersection {
        Intersection {
            point: Vec3::ZERO,
            normal: Vec3::Z,
        }
    }

    #[test]
    fn no_lights_is_ambient_only() {
        let result = phong(
            Color::rgb(0.5, 0.25, 1.0),
            &origin_facing_z(),
            &[],
            Vec3::new(0.0, 0.0, 1.0),
            &VALUES,
        );
        assert_eq!(result, Color::rgba(0.5 * 0.1, 0.25 * 0.1, 1.0 * 0.1, 1.0));
    }

    #[test]
    fn light_along_normal_gives_maximal_terms() {
        // Light and camera both sit on the normal ray: n·l = r·v = 1, so
        // every channel receives the full diffuse and specular terms.
        let result = phong(
            Color::RED,
            &origin_facing_z(),
            &[Light::at(0.0, 0.0, 1.0)],
            Vec3::new(0.0, 0.0, 1.0),
            &VALUES,
        );

        let diffuse = LIGHT_COLOR.x * VALUES.kd;
        let specular = LIGHT_COLOR.x * VALUES.ks;
        assert_eq!(result.r, 1.0 * VALUES.ka + diffuse + specular);
        assert_eq!(result.g, diffuse + specular);
        assert_eq!(result.b, diffuse + specular);
    }

    #[test]
    fn back_facing_light_contributes_nothing() {
        let result = phong(
            Color::WHITE,
            &origin_facing_z(),
            &[Light::at(0.0, 0.0, -3.0)],
            Vec3::new(0.0, 0.0, 1.0),
            &VALUES,
        );
        // Clamped diffuse and specular: ambient term only.
        assert_eq!(result, Color::rgba(0.1, 0.1, 0.1, 1.0));
    }

    #[test]
    fn lights_accumulate_additively() {
        let one = phong(
            Color::BLACK,
            &origin_facing_z(),
            &[Light::at(0.0, 0.0, 2.0)],
            Vec3::new(0.0, 0.0, 2.0),
            &VALUES,
        );
        let two = phong(
            Color::BLACK,
            &origin_facing_z(),
            &[Light::at(0.0, 0.0, 2.0), Light::at(0.0, 0.0, 2.0)],
            Vec3::new(0.0, 0.0, 2.0),
            &VALUES,
        );
        assert!((two.r - 2.0 * one.r).abs() < 1e-6);
        assert!((two.g - 2.0 * one.g).abs() < 1e-6);
        assert!((two.b - 2.0 * one.b).abs() < 1e-6);
    }

    #[test]
    fn negative_specular_clamps_to_zero() {
        // Camera opposite the reflection direction: r·v = -1, so only the
        // diffuse term survives (no negative highlight).
        let result = phong(
            Color::BLACK,
            &origin_facing_z(),
            &[Light::at(1.0, 0.0, 1.0)],
            Vec3::new(1.0, 0.0, -1.0),
            &VALUES,
        );
        let n_dot_l = std::f32::consts::FRAC_1_SQRT_2;
        let expected = LIGHT_COLOR.x * n_dot_l * VALUES.kd;
        assert!((result.r - expected).abs() < 1e-6);
        assert!((result.g - expected).abs() < 1e-6);
        assert!((result.b - expected).abs() < 1e-6);
    }
}
