//! The scene graph: an arena-backed tree of group and shape nodes.
//!
//! Nodes live in a [`SceneGraph`] arena and are addressed by copyable
//! [`NodeId`] handles, so visitors and animations can hold on to a node
//! without borrowing the graph. The graph is a tree, not a DAG: every node
//! has at most one parent, enforced at attach time. Removing a node vacates
//! its arena slot (and those of its whole subtree); slots are never reused,
//! so a stale `NodeId` can only miss, never alias a different node.

use std::path::PathBuf;

use glam::Mat4;

use crate::color::Color;
use crate::transform::Transform;

/// Handle to a node stored in a [`SceneGraph`].
///
/// The newtype prevents mixing node indices with other indices at compile
/// time; the value itself is only meaningful together with the graph that
/// issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An inner node: owns an ordered list of children and a local transform.
#[derive(Debug)]
pub struct GroupNode {
    pub transform: Transform,
    pub children: Vec<NodeId>,
}

/// A unit sphere (radius 1, centered at the origin) with a surface color.
#[derive(Debug)]
pub struct SphereNode {
    pub color: Color,
}

/// An axis-aligned box spanning (-0.5 .. 0.5) on each axis.
#[derive(Debug)]
pub struct AaBoxNode {
    pub color: Color,
}

/// Where a textured box gets its pixels from.
#[derive(Clone, Debug)]
pub enum TextureRef {
    /// An image file, decoded during the setup pass.
    File(PathBuf),
    /// A generated checkerboard, `cell` pixels per square.
    Checker { cell: u32, light: Color, dark: Color },
}

/// An axis-aligned box with a texture instead of a flat color.
#[derive(Debug)]
pub struct TextureBoxNode {
    pub texture: TextureRef,
}

/// The closed set of node variants. Visitors dispatch by matching on this.
#[derive(Debug)]
pub enum Node {
    Group(GroupNode),
    Sphere(SphereNode),
    AaBox(AaBoxNode),
    TextureBox(TextureBoxNode),
}

impl Node {
    /// Short variant name for error messages.
    fn kind(&self) -> &'static str {
        match self {
            Node::Group(_) => "group",
            Node::Sphere(_) => "sphere",
            Node::AaBox(_) => "box",
            Node::TextureBox(_) => "textured box",
        }
    }
}

/// Errors from structural scene-graph operations.
#[derive(Debug)]
pub enum SceneError {
    /// The id does not name a live node in this graph.
    UnknownNode(NodeId),
    /// Children can only be attached under group nodes.
    NotAGroup(NodeId),
    /// The node already has a parent; the graph must stay a tree.
    AlreadyAttached(NodeId),
}

impl std::fmt::Display for SceneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneError::UnknownNode(id) => write!(f, "unknown node {id}"),
            SceneError::NotAGroup(id) => write!(f, "node {id} is not a group"),
            SceneError::AlreadyAttached(id) => {
                write!(f, "node {id} already has a parent")
            }
        }
    }
}

impl std::error::Error for SceneError {}

struct Slot {
    node: Node,
    parent: Option<NodeId>,
}

/// Arena holding every node of one scene tree.
pub struct SceneGraph {
    slots: Vec<Option<Slot>>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    fn insert(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Some(Slot { node, parent: None }));
        id
    }

    /// Adds a detached group node. Attach it under a parent with
    /// [`SceneGraph::attach`], or use it as the tree root.
    pub fn add_group(&mut self, transform: Transform) -> NodeId {
        self.insert(Node::Group(GroupNode {
            transform,
            children: Vec::new(),
        }))
    }

    /// Adds a detached sphere leaf.
    pub fn add_sphere(&mut self, color: Color) -> NodeId {
        self.insert(Node::Sphere(SphereNode { color }))
    }

    /// Adds a detached axis-aligned box leaf.
    pub fn add_aa_box(&mut self, color: Color) -> NodeId {
        self.insert(Node::AaBox(AaBoxNode { color }))
    }

    /// Adds a detached textured box leaf.
    pub fn add_texture_box(&mut self, texture: TextureRef) -> NodeId {
        self.insert(Node::TextureBox(TextureBoxNode { texture }))
    }

    /// Appends `child` to `parent`'s child list, preserving declaration
    /// order for traversal.
    ///
    /// Fails if either id is dead, if `parent` is not a group, or if the
    /// attachment would break the tree invariant: `child` already has a
    /// parent, or `child` sits on `parent`'s own ancestor chain (which
    /// would close a cycle and make traversal unbounded).
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        let child_slot = self
            .slots
            .get(child.0)
            .and_then(|s| s.as_ref())
            .ok_or(SceneError::UnknownNode(child))?;
        if child_slot.parent.is_some() {
            return Err(SceneError::AlreadyAttached(child));
        }
        let mut ancestor = Some(parent);
        while let Some(current) = ancestor {
            if current == child {
                return Err(SceneError::AlreadyAttached(child));
            }
            ancestor = self.parent(current);
        }
        match self.slots.get_mut(parent.0).and_then(|s| s.as_mut()) {
            None => Err(SceneError::UnknownNode(parent)),
            Some(slot) => match &mut slot.node {
                Node::Group(group) => {
                    group.children.push(child);
                    self.slots[child.0].as_mut().unwrap().parent = Some(parent);
                    Ok(())
                }
                _ => Err(SceneError::NotAGroup(parent)),
            },
        }
    }

    /// Detaches `id` from its parent and vacates the slots of its entire
    /// subtree. Renderables built for removed nodes stay in the resource
    /// table until [`Renderables::prune`](crate::visitor::Renderables::prune)
    /// is called.
    pub fn remove(&mut self, id: NodeId) -> Result<(), SceneError> {
        let parent = self
            .slots
            .get(id.0)
            .and_then(|s| s.as_ref())
            .ok_or(SceneError::UnknownNode(id))?
            .parent;

        if let Some(parent) = parent
            && let Some(Node::Group(group)) = self.node_mut(parent)
        {
            group.children.retain(|c| *c != id);
        }

        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(Slot { node, .. }) = self.slots[next.0].take()
                && let Node::Group(group) = node
            {
                pending.extend(group.children);
            }
        }
        Ok(())
    }

    /// Whether `id` names a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.slots.get(id.0).is_some_and(|s| s.is_some())
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.0).and_then(|s| s.as_ref()).map(|s| &s.node)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.0)
            .and_then(|s| s.as_mut())
            .map(|s| &mut s.node)
    }

    /// The group behind `id`, or `None` if dead or a leaf.
    pub fn group(&self, id: NodeId) -> Option<&GroupNode> {
        match self.node(id) {
            Some(Node::Group(group)) => Some(group),
            _ => None,
        }
    }

    pub fn group_mut(&mut self, id: NodeId) -> Option<&mut GroupNode> {
        match self.node_mut(id) {
            Some(Node::Group(group)) => Some(group),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slots.get(id.0).and_then(|s| s.as_ref())?.parent
    }

    /// Accumulated (forward, inverse) matrices from the root down to `id`.
    ///
    /// The forward product multiplies ancestor locals in root-to-leaf
    /// order; the inverse multiplies local inverses in leaf-to-root order.
    /// Leaves contribute nothing (they carry no transform of their own).
    pub fn world_transform(&self, id: NodeId) -> Option<(Mat4, Mat4)> {
        if !self.contains(id) {
            return None;
        }

        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            chain.push(current);
            cursor = self.parent(current);
        }

        let mut forward = Mat4::IDENTITY;
        let mut inverse = Mat4::IDENTITY;
        for current in chain.iter().rev() {
            if let Some(Node::Group(group)) = self.node(*current) {
                forward = forward * group.transform.matrix();
                inverse = group.transform.inverse_matrix() * inverse;
            }
        }
        Some((forward, inverse))
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Human-readable description of a node for diagnostics.
    pub fn describe(&self, id: NodeId) -> String {
        match self.node(id) {
            Some(node) => format!("{} {id}", node.kind()),
            None => format!("dead node {id}"),
        }
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3};

    fn assert_mat_eq(a: Mat4, b: Mat4) {
        for (x, y) in a.to_cols_array().iter().zip(b.to_cols_array()) {
            assert!((x - y).abs() < 1e-5, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn children_keep_attach_order() {
        let mut scene = SceneGraph::new();
        let root = scene.add_group(Transform::identity());
        let a = scene.add_sphere(Color::RED);
        let b = scene.add_aa_box(Color::BLUE);
        let c = scene.add_sphere(Color::GREEN);
        scene.attach(root, a).unwrap();
        scene.attach(root, b).unwrap();
        scene.attach(root, c).unwrap();

        assert_eq!(scene.group(root).unwrap().children, vec![a, b, c]);
    }

    #[test]
    fn double_attach_is_rejected() {
        let mut scene = SceneGraph::new();
        let root = scene.add_group(Transform::identity());
        let other = scene.add_group(Transform::identity());
        let leaf = scene.add_sphere(Color::WHITE);
        scene.attach(root, leaf).unwrap();

        assert!(matches!(
            scene.attach(other, leaf),
            Err(SceneError::AlreadyAttached(id)) if id == leaf
        ));
    }

    #[test]
    fn attach_to_leaf_is_rejected() {
        let mut scene = SceneGraph::new();
        let leaf = scene.add_sphere(Color::WHITE);
        let child = scene.add_sphere(Color::WHITE);

        assert!(matches!(
            scene.attach(leaf, child),
            Err(SceneError::NotAGroup(id)) if id == leaf
        ));
    }

    #[test]
    fn remove_vacates_subtree() {
        let mut scene = SceneGraph::new();
        let root = scene.add_group(Transform::identity());
        let arm = scene.add_group(Transform::identity());
        let leaf = scene.add_sphere(Color::WHITE);
        scene.attach(root, arm).unwrap();
        scene.attach(arm, leaf).unwrap();

        scene.remove(arm).unwrap();

        assert!(scene.contains(root));
        assert!(!scene.contains(arm));
        assert!(!scene.contains(leaf));
        assert!(scene.group(root).unwrap().children.is_empty());
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn world_transform_multiplies_in_traversal_order() {
        let mut scene = SceneGraph::new();
        let root = scene.add_group(Transform::translation(Vec3::new(1.0, 0.0, 0.0)));
        let mid = scene.add_group(Transform::scaling(Vec3::splat(2.0)));
        let leaf = scene.add_sphere(Color::WHITE);
        scene.attach(root, mid).unwrap();
        scene.attach(mid, leaf).unwrap();

        let (forward, inverse) = scene.world_transform(leaf).unwrap();
        let expected = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0))
            * Mat4::from_scale(Vec3::splat(2.0));
        assert_mat_eq(forward, expected);
        assert_mat_eq(forward * inverse, Mat4::IDENTITY);

        // The inverse product runs leaf-to-root.
        let expected_inverse = Mat4::from_scale(Vec3::splat(0.5))
            * Mat4::from_translation(Vec3::new(-1.0, 0.0, 0.0));
        assert_mat_eq(inverse, expected_inverse);
    }
}
