//! The accumulated transform stack maintained during traversal.
//!
//! Each entry pairs the forward matrix (model space to world space) with
//! its inverse. Pushing a node's local transform multiplies the forward
//! product on the right and the inverse product on the left — the inverse
//! of a product reverses its factor order, so the two stacks grow from
//! opposite ends.

use glam::Mat4;

use crate::transform::Transform;

/// Stack of accumulated (forward, inverse) matrix pairs.
///
/// A fresh stack holds a single identity entry for the root; a balanced
/// traversal returns it to exactly that state.
pub struct TransformStack {
    forward: Vec<Mat4>,
    inverse: Vec<Mat4>,
}

impl TransformStack {
    pub fn new() -> Self {
        Self {
            forward: vec![Mat4::IDENTITY],
            inverse: vec![Mat4::IDENTITY],
        }
    }

    /// Pushes the accumulation of `transform` onto the current top.
    pub fn push(&mut self, transform: &Transform) {
        let forward = self.top_forward() * transform.matrix();
        let inverse = transform.inverse_matrix() * self.top_inverse();
        self.forward.push(forward);
        self.inverse.push(inverse);
    }

    /// Pops one entry. The root identity entry is never popped.
    pub fn pop(&mut self) {
        debug_assert!(self.forward.len() > 1, "transform stack underflow");
        if self.forward.len() > 1 {
            self.forward.pop();
            self.inverse.pop();
        }
    }

    /// The accumulated forward matrix at the current traversal point.
    pub fn top_forward(&self) -> Mat4 {
        *self.forward.last().unwrap()
    }

    /// The accumulated inverse matrix at the current traversal point.
    pub fn top_inverse(&self) -> Mat4 {
        *self.inverse.last().unwrap()
    }

    /// Current number of entries (1 when outside any group).
    pub fn depth(&self) -> usize {
        self.forward.len()
    }
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn assert_mat_eq(a: Mat4, b: Mat4) {
        for (x, y) in a.to_cols_array().iter().zip(b.to_cols_array()) {
            assert!((x - y).abs() < 1e-5, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn starts_with_one_identity_entry() {
        let stack = TransformStack::new();
        assert_eq!(stack.depth(), 1);
        assert_mat_eq(stack.top_forward(), Mat4::IDENTITY);
        assert_mat_eq(stack.top_inverse(), Mat4::IDENTITY);
    }

    #[test]
    fn accumulates_forward_root_to_leaf_and_inverse_leaf_to_root() {
        let outer = Transform::translation(Vec3::new(2.0, 0.0, 0.0));
        let inner = Transform::scaling(Vec3::splat(3.0));

        let mut stack = TransformStack::new();
        stack.push(&outer);
        stack.push(&inner);

        assert_mat_eq(stack.top_forward(), outer.matrix() * inner.matrix());
        assert_mat_eq(
            stack.top_inverse(),
            inner.inverse_matrix() * outer.inverse_matrix(),
        );
        assert_mat_eq(stack.top_forward() * stack.top_inverse(), Mat4::IDENTITY);
    }

    #[test]
    fn pop_restores_the_previous_top() {
        let outer = Transform::rotation(Vec3::Y, 0.5);
        let inner = Transform::translation(Vec3::new(0.0, 1.0, 0.0));

        let mut stack = TransformStack::new();
        stack.push(&outer);
        let snapshot = stack.top_forward();
        stack.push(&inner);
        stack.pop();

        assert_eq!(stack.depth(), 2);
        assert_mat_eq(stack.top_forward(), snapshot);
    }

    #[test]
    fn balanced_push_pop_returns_to_the_root_entry() {
        let mut stack = TransformStack::new();
        for _ in 0..4 {
            stack.push(&Transform::translation(Vec3::X));
            stack.push(&Transform::scaling(Vec3::splat(2.0)));
            stack.pop();
            stack.pop();
        }
        assert_eq!(stack.depth(), 1);
        assert_mat_eq(stack.top_forward(), Mat4::IDENTITY);
        assert_mat_eq(stack.top_inverse(), Mat4::IDENTITY);
    }
}
