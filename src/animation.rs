//! Animation nodes: per-frame updaters that rewrite group transforms.
//!
//! An animation node holds a non-owning [`NodeId`] handle to the group it
//! animates and an `active` flag toggled from outside. The frame driver
//! runs every `simulate` call before the render traversal of the same
//! frame, so a render pass never observes a half-updated transform.
//! Elapsed time is passed in milliseconds.

use glam::{Quat, Vec3};

use crate::node::{NodeId, SceneGraph};
use crate::transform::{Rotation, Transform};

/// Fixed angular velocity of rotation animations, radians per time unit.
const ANGULAR_RATE: f32 = 4.0 * std::f32::consts::PI;

/// Scales elapsed milliseconds into rotation phase.
const ROTATION_TIME_SCALE: f32 = 1e-4;

/// Scales elapsed milliseconds into slerp clock advance.
const SLERP_TIME_SCALE: f32 = 1e-3;

/// Spins a group around a fixed axis at constant angular velocity.
///
/// Each step composes a small rotation with the group's previous
/// transform: the node's forward matrix is multiplied onto the left of the
/// step rotation and the step's inverse onto the left of the node's
/// inverse, then the composed [`Rotation`] replaces the group's transform
/// outright. Replacing rather than merging keeps the transform a
/// `Rotation`, while the algebraic fold preserves visual continuity.
pub struct RotationNode {
    target: NodeId,
    active: bool,
    /// Axis to rotate around, in the group's parent space.
    pub axis: Vec3,
    /// Current angular velocity; fixed to [`ANGULAR_RATE`] while running.
    pub angle: f32,
}

impl RotationNode {
    pub fn new(target: NodeId, axis: Vec3) -> Self {
        Self {
            target,
            active: false,
            axis,
            angle: 0.0,
        }
    }

    /// The group this node animates.
    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Flips between running and paused. Toggling twice restores the
    /// original state.
    pub fn toggle_active(&mut self) {
        self.active = !self.active;
    }

    /// Advances the rotation by `delta_ms` elapsed milliseconds.
    ///
    /// A no-op while inactive, safe to call every frame regardless of
    /// state.
    pub fn simulate(&mut self, scene: &mut SceneGraph, delta_ms: f32) {
        if !self.active {
            return;
        }
        self.angle = ANGULAR_RATE;

        let Some(group) = scene.group_mut(self.target) else {
            log::debug!("rotation animation target {} is gone", self.target);
            return;
        };

        let matrix = group.transform.matrix();
        let inverse = group.transform.inverse_matrix();

        let mut rotation = Rotation::new(self.axis, ROTATION_TIME_SCALE * self.angle * delta_ms);
        rotation.matrix = matrix * rotation.matrix;
        rotation.inverse = rotation.inverse * inverse;
        group.transform = Transform::Rotation(rotation);
    }
}

/// Oscillates a group's rotation between two quaternion endpoints.
///
/// The interpolation parameter is `(sin(t) + 1) / 2`, so the motion cycles
/// smoothly from one endpoint to the other and back, bounded and periodic
/// for every `t`. The target group's transform must be an
/// [`Sqt`](crate::transform::Sqt); only its rotation component is written.
pub struct SlerpNode {
    target: NodeId,
    active: bool,
    /// The two rotations to interpolate between.
    pub endpoints: [Quat; 2],
    /// The animation clock.
    pub t: f32,
}

impl SlerpNode {
    pub fn new(target: NodeId, from: Quat, to: Quat) -> Self {
        Self {
            target,
            active: false,
            endpoints: [from, to],
            t: 0.0,
        }
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn toggle_active(&mut self) {
        self.active = !self.active;
    }

    /// The current interpolation parameter, always in `[0, 1]`.
    pub fn parameter(&self) -> f32 {
        (self.t.sin() + 1.0) / 2.0
    }

    /// Advances the oscillation by `delta_ms` elapsed milliseconds.
    ///
    /// A no-op while inactive. If the target's transform is not an SQT
    /// there is no rotation component to overwrite; the step is skipped.
    pub fn simulate(&mut self, scene: &mut SceneGraph, delta_ms: f32) {
        if !self.active {
            return;
        }
        self.t += SLERP_TIME_SCALE * delta_ms;
        let rotation = self.endpoints[0].slerp(self.endpoints[1], self.parameter());

        match scene.group_mut(self.target) {
            Some(group) => match &mut group.transform {
                Transform::Sqt(sqt) => sqt.rotation = rotation,
                _ => log::debug!("slerp animation target {} has no SQT transform", self.target),
            },
            None => log::debug!("slerp animation target {} is gone", self.target),
        }
    }
}

/// The closed set of animation variants, as stored by the frame driver.
pub enum AnimationNode {
    Rotation(RotationNode),
    Slerp(SlerpNode),
}

impl AnimationNode {
    pub fn target(&self) -> NodeId {
        match self {
            AnimationNode::Rotation(n) => n.target(),
            AnimationNode::Slerp(n) => n.target(),
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            AnimationNode::Rotation(n) => n.is_active(),
            AnimationNode::Slerp(n) => n.is_active(),
        }
    }

    pub fn toggle_active(&mut self) {
        match self {
            AnimationNode::Rotation(n) => n.toggle_active(),
            AnimationNode::Slerp(n) => n.toggle_active(),
        }
    }

    pub fn simulate(&mut self, scene: &mut SceneGraph, delta_ms: f32) {
        match self {
            AnimationNode::Rotation(n) => n.simulate(scene, delta_ms),
            AnimationNode::Slerp(n) => n.simulate(scene, delta_ms),
        }
    }
}

impl From<RotationNode> for AnimationNode {
    fn from(node: RotationNode) -> Self {
        AnimationNode::Rotation(node)
    }
}

impl From<SlerpNode> for AnimationNode {
    fn from(node: SlerpNode) -> Self {
        AnimationNode::Slerp(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use glam::Mat4;

    fn assert_mat_eq(a: Mat4, b: Mat4) {
        for (x, y) in a.to_cols_array().iter().zip(b.to_cols_array()) {
            assert!((x - y).abs() < 1e-5, "{a:?} != {b:?}");
        }
    }

    fn spinning_scene() -> (SceneGraph, NodeId) {
        let mut scene = SceneGraph::new();
        let group = scene.add_group(Transform::translation(Vec3::new(2.0, 0.0, 0.0)));
        let leaf = scene.add_sphere(Color::WHITE);
        scene.attach(group, leaf).unwrap();
        (scene, group)
    }

    #[test]
    fn inactive_node_changes_nothing() {
        let (mut scene, group) = spinning_scene();
        let before = scene.group(group).unwrap().transform.matrix();

        let mut node = RotationNode::new(group, Vec3::Y);
        for _ in 0..10 {
            node.simulate(&mut scene, 16.0);
        }

        assert_mat_eq(scene.group(group).unwrap().transform.matrix(), before);
    }

    #[test]
    fn toggling_twice_restores_state() {
        let (mut scene, group) = spinning_scene();
        let before = scene.group(group).unwrap().transform.matrix();

        let mut node = RotationNode::new(group, Vec3::Y);
        assert!(!node.is_active());
        node.toggle_active();
        assert!(node.is_active());
        node.toggle_active();
        assert!(!node.is_active());

        node.simulate(&mut scene, 16.0);
        assert_mat_eq(scene.group(group).unwrap().transform.matrix(), before);
    }

    #[test]
    fn rotation_folds_the_previous_transform_in() {
        let (mut scene, group) = spinning_scene();
        let before = scene.group(group).unwrap().transform.matrix();

        let mut node = RotationNode::new(group, Vec3::Y);
        node.toggle_active();
        let delta_ms = 16.0;
        node.simulate(&mut scene, delta_ms);

        let step = Mat4::from_axis_angle(Vec3::Y, 1e-4 * 4.0 * std::f32::consts::PI * delta_ms);
        let after = scene.group(group).unwrap().transform;
        assert_mat_eq(after.matrix(), before * step);
        assert_mat_eq(after.matrix() * after.inverse_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn rotation_with_zero_elapsed_time_is_the_identity_step() {
        let (mut scene, group) = spinning_scene();
        let before = scene.group(group).unwrap().transform.matrix();

        let mut node = RotationNode::new(group, Vec3::Y);
        node.toggle_active();
        node.simulate(&mut scene, 0.0);

        // The transform object is replaced, but the composed matrices
        // carry the old value forward: no visual jump.
        assert_mat_eq(scene.group(group).unwrap().transform.matrix(), before);
    }

    #[test]
    fn repeated_steps_stay_consistent() {
        let (mut scene, group) = spinning_scene();
        let mut node = RotationNode::new(group, Vec3::new(1.0, 1.0, 0.0));
        node.toggle_active();

        for _ in 0..100 {
            node.simulate(&mut scene, 16.0);
        }
        let t = scene.group(group).unwrap().transform;
        assert_mat_eq(t.matrix() * t.inverse_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn slerp_parameter_is_bounded_and_centered() {
        let mut scene = SceneGraph::new();
        let group = scene.add_group(Transform::identity());
        let mut node = SlerpNode::new(group, Quat::IDENTITY, Quat::from_rotation_y(1.0));
        assert_eq!(node.parameter(), 0.5);

        // Inactive simulate must not advance the clock either.
        node.simulate(&mut scene, 500.0);
        assert_eq!(node.t, 0.0);

        for step in -100..100 {
            node.t = step as f32 * 0.37;
            let u = node.parameter();
            assert!((0.0..=1.0).contains(&u), "parameter {u} out of range");
        }
    }

    #[test]
    fn slerp_overwrites_the_sqt_rotation() {
        let mut scene = SceneGraph::new();
        let group = scene.add_group(Transform::sqt(
            Vec3::ONE,
            Quat::IDENTITY,
            Vec3::new(0.0, 0.0, -3.0),
        ));

        let from = Quat::from_rotation_x(0.3);
        let to = Quat::from_rotation_y(1.2);
        let mut node = SlerpNode::new(group, from, to);
        node.toggle_active();
        node.simulate(&mut scene, 250.0);

        let expected = from.slerp(to, node.parameter());
        match scene.group(group).unwrap().transform {
            Transform::Sqt(sqt) => {
                assert!((sqt.rotation.dot(expected).abs() - 1.0).abs() < 1e-5);
                // Translation and scale are untouched.
                assert_eq!(sqt.translation, Vec3::new(0.0, 0.0, -3.0));
                assert_eq!(sqt.scale, Vec3::ONE);
            }
            _ => panic!("transform variant changed"),
        }
    }

    #[test]
    fn slerp_skips_non_sqt_targets() {
        let (mut scene, group) = spinning_scene();
        let before = scene.group(group).unwrap().transform.matrix();

        let mut node = SlerpNode::new(group, Quat::IDENTITY, Quat::from_rotation_z(0.8));
        node.toggle_active();
        node.simulate(&mut scene, 100.0);

        assert_mat_eq(scene.group(group).unwrap().transform.matrix(), before);
    }
}
