//! Spatial transforms that carry both a forward and an inverse matrix.
//!
//! Every transform representation in this module exposes a forward 4×4
//! matrix (local space to parent space) and its algebraic inverse, and the
//! two are kept mutually consistent: `forward * inverse` is the identity
//! within floating-point tolerance after any mutation. The render visitor
//! accumulates both directions while walking the scene graph, so the
//! inverse is never recovered numerically at render time.
//!
//! Three representations exist:
//!
//! - [`MatrixTransform`] — an explicit matrix/inverse pair
//! - [`Rotation`] — an axis-angle rotation with overwritable cached matrices
//! - [`Sqt`] — separate scale, quaternion rotation, and translation
//!
//! [`Transform`] is the closed union over the three, the type stored on
//! every group node.

use glam::{Mat4, Quat, Vec3};

/// A transform given directly as a matrix and its inverse.
#[derive(Clone, Copy, Debug)]
pub struct MatrixTransform {
    pub matrix: Mat4,
    pub inverse: Mat4,
}

impl MatrixTransform {
    /// Wraps an explicit matrix/inverse pair.
    ///
    /// The caller is responsible for the pair actually being inverse to
    /// each other; no check is performed.
    pub fn new(matrix: Mat4, inverse: Mat4) -> Self {
        Self { matrix, inverse }
    }

    pub fn identity() -> Self {
        Self {
            matrix: Mat4::IDENTITY,
            inverse: Mat4::IDENTITY,
        }
    }

    /// A pure translation by `offset`.
    pub fn translation(offset: Vec3) -> Self {
        Self {
            matrix: Mat4::from_translation(offset),
            inverse: Mat4::from_translation(-offset),
        }
    }

    /// A pure scaling by `factors`. Factors must be non-zero.
    pub fn scaling(factors: Vec3) -> Self {
        Self {
            matrix: Mat4::from_scale(factors),
            inverse: Mat4::from_scale(factors.recip()),
        }
    }
}

/// An axis-angle rotation.
///
/// The forward and inverse matrices are cached in public fields because the
/// rotation animation replaces them with composed products: it folds the
/// animated node's previous matrices into a freshly constructed `Rotation`
/// before writing it back to the graph. After such an overwrite the cached
/// matrices no longer correspond to `axis`/`angle` alone.
#[derive(Clone, Copy, Debug)]
pub struct Rotation {
    pub axis: Vec3,
    pub angle: f32,
    pub matrix: Mat4,
    pub inverse: Mat4,
}

impl Rotation {
    /// A rotation of `angle` radians around `axis`.
    pub fn new(axis: Vec3, angle: f32) -> Self {
        let matrix = Mat4::from_axis_angle(axis.normalize(), angle);
        Self {
            axis,
            angle,
            // A rotation matrix is orthonormal, so transpose == inverse.
            inverse: matrix.transpose(),
            matrix,
        }
    }
}

/// A transform split into scale, rotation quaternion, and translation.
///
/// Forward and inverse matrices are derived from the components on every
/// access, so they stay consistent under component mutation. The slerp
/// animation overwrites `rotation` each frame.
#[derive(Clone, Copy, Debug)]
pub struct Sqt {
    pub scale: Vec3,
    pub rotation: Quat,
    pub translation: Vec3,
}

impl Sqt {
    pub fn new(scale: Vec3, rotation: Quat, translation: Vec3) -> Self {
        Self {
            scale,
            rotation,
            translation,
        }
    }

    /// Forward matrix, applied in scale → rotate → translate order.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Inverse matrix: undo translation, then rotation, then scale.
    pub fn inverse_matrix(&self) -> Mat4 {
        Mat4::from_scale(self.scale.recip())
            * Mat4::from_quat(self.rotation.inverse())
            * Mat4::from_translation(-self.translation)
    }
}

/// A node-local transform in any of its representations.
#[derive(Clone, Copy, Debug)]
pub enum Transform {
    Matrix(MatrixTransform),
    Rotation(Rotation),
    Sqt(Sqt),
}

impl Transform {
    pub fn identity() -> Self {
        Transform::Matrix(MatrixTransform::identity())
    }

    /// A translation by `offset`.
    pub fn translation(offset: Vec3) -> Self {
        Transform::Matrix(MatrixTransform::translation(offset))
    }

    /// A scaling by `factors`.
    pub fn scaling(factors: Vec3) -> Self {
        Transform::Matrix(MatrixTransform::scaling(factors))
    }

    /// A rotation of `angle` radians around `axis`.
    pub fn rotation(axis: Vec3, angle: f32) -> Self {
        Transform::Rotation(Rotation::new(axis, angle))
    }

    /// A scale-quaternion-translate transform.
    pub fn sqt(scale: Vec3, rotation: Quat, translation: Vec3) -> Self {
        Transform::Sqt(Sqt::new(scale, rotation, translation))
    }

    /// The forward matrix (local space to parent space).
    pub fn matrix(&self) -> Mat4 {
        match self {
            Transform::Matrix(t) => t.matrix,
            Transform::Rotation(r) => r.matrix,
            Transform::Sqt(s) => s.matrix(),
        }
    }

    /// The inverse of [`Transform::matrix`].
    pub fn inverse_matrix(&self) -> Mat4 {
        match self {
            Transform::Matrix(t) => t.inverse,
            Transform::Rotation(r) => r.inverse,
            Transform::Sqt(s) => s.inverse_matrix(),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_identity(m: Mat4) {
        for (value, expected) in m
            .to_cols_array()
            .iter()
            .zip(Mat4::IDENTITY.to_cols_array())
        {
            assert!((value - expected).abs() < 1e-5, "not identity: {m:?}");
        }
    }

    #[test]
    fn translation_round_trips() {
        let t = Transform::translation(Vec3::new(1.0, -2.0, 3.5));
        assert_identity(t.matrix() * t.inverse_matrix());
    }

    #[test]
    fn scaling_round_trips() {
        let t = Transform::scaling(Vec3::new(2.0, 0.5, 4.0));
        assert_identity(t.matrix() * t.inverse_matrix());
    }

    #[test]
    fn rotation_round_trips() {
        let t = Transform::rotation(Vec3::new(0.0, 1.0, 0.0), 1.2);
        assert_identity(t.matrix() * t.inverse_matrix());

        // Non-normalized axis input must not break orthonormality.
        let t = Transform::rotation(Vec3::new(1.0, 2.0, 3.0), -0.7);
        assert_identity(t.matrix() * t.inverse_matrix());
    }

    #[test]
    fn sqt_round_trips() {
        let t = Transform::sqt(
            Vec3::new(2.0, 2.0, 0.5),
            Quat::from_rotation_x(0.9),
            Vec3::new(-1.0, 4.0, 2.0),
        );
        assert_identity(t.matrix() * t.inverse_matrix());
    }

    #[test]
    fn sqt_stays_consistent_after_rotation_overwrite() {
        let mut s = Sqt::new(
            Vec3::ONE,
            Quat::IDENTITY,
            Vec3::new(0.0, 1.0, 0.0),
        );
        s.rotation = Quat::from_rotation_y(2.1);
        assert_identity(s.matrix() * s.inverse_matrix());
    }

    #[test]
    fn composed_rotation_stays_consistent() {
        // The same fold the rotation animation performs: previous matrices
        // multiplied into a fresh rotation on opposite sides.
        let previous = Transform::translation(Vec3::new(3.0, 0.0, -1.0));
        let mut rotation = Rotation::new(Vec3::Y, 0.25);
        rotation.matrix = previous.matrix() * rotation.matrix;
        rotation.inverse = rotation.inverse * previous.inverse_matrix();

        let t = Transform::Rotation(rotation);
        assert_identity(t.matrix() * t.inverse_matrix());
    }
}
