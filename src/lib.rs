//! # Arbor
//!
//! **A hierarchical scene-graph renderer for wgpu.**
//!
//! Arbor renders a tree of transform nodes: group nodes carry transforms
//! and children, leaf nodes carry shapes. A one-time setup pass builds a
//! GPU renderable per leaf, a per-frame render pass walks the tree with a
//! stack of accumulated forward and inverse matrices, and animation nodes
//! rewrite group transforms between frames.
//!
//! ## Quick Start
//!
//! ```no_run
//! use arbor::*;
//!
//! fn main() {
//!     let mut scene = SceneGraph::new();
//!     let root = scene.add_group(Transform::identity());
//!
//!     let orbit = scene.add_group(Transform::identity());
//!     let arm = scene.add_group(Transform::translation(Vec3::new(3.0, 0.0, 0.0)));
//!     let planet = scene.add_sphere(Color::BLUE);
//!     scene.attach(root, orbit).unwrap();
//!     scene.attach(orbit, arm).unwrap();
//!     scene.attach(arm, planet).unwrap();
//!
//!     let mut stage = Stage::new(scene, root);
//!     stage.camera = Camera::new().at(Vec3::new(0.0, 2.0, 10.0)).looking_at(Vec3::ZERO);
//!     stage.lights.push(Light::at(5.0, 5.0, 5.0));
//!     stage.animations.push(RotationNode::new(orbit, Vec3::Y).into());
//!     stage.toggle_animations();
//!
//!     run(stage).unwrap();
//! }
//! ```
//!
//! ## Structure
//!
//! - Group nodes own a [`Transform`] (matrix pair, axis-angle rotation,
//!   or SQT) whose forward and inverse matrices stay consistent.
//! - [`SetupVisitor`] builds the [`Renderables`] side table once per
//!   topology; [`RenderVisitor`] looks renderables up every frame and
//!   never creates them.
//! - [`RotationNode`] and [`SlerpNode`] mutate group transforms during
//!   the simulate sweep that precedes each render sweep.
//! - [`phong`] is the CPU reference for the lighting the shaders compute.

mod animation;
mod app;
mod camera;
mod color;
mod gpu;
mod light;
mod node;
pub mod phong;
mod renderable;
mod shading;
mod texture;
mod transform;
mod transform_stack;
mod visitor;

pub use animation::{AnimationNode, RotationNode, SlerpNode};
pub use app::{Stage, run};
pub use camera::Camera;
pub use color::Color;
pub use gpu::{DEPTH_FORMAT, GpuContext};
pub use light::Light;
pub use node::{
    AaBoxNode, GroupNode, Node, NodeId, SceneError, SceneGraph, SphereNode, TextureBoxNode,
    TextureRef,
};
pub use phong::{Intersection, LIGHT_COLOR, PhongValues, phong};
pub use renderable::{Renderable, Vertex};
pub use shading::{MAX_LIGHTS, ShadingConfig, ShadingUniforms};
pub use texture::Texture;
pub use transform::{MatrixTransform, Rotation, Sqt, Transform};
pub use transform_stack::TransformStack;
pub use visitor::{RenderError, RenderVisitor, Renderables, SetupError, SetupVisitor};

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
