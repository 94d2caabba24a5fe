//! The dual-visitor traversal protocol.
//!
//! Two passes walk the scene graph depth-first, pre-order, dispatching on
//! the node variant:
//!
//! - [`SetupVisitor`] runs once per graph topology and builds one
//!   [`Renderable`] per leaf node into a [`Renderables`] side table.
//! - [`RenderVisitor`] runs every frame: it maintains the accumulated
//!   transform stack while descending through groups and, at each leaf,
//!   looks up the pre-built renderable and dispatches a draw with the
//!   current matrices bound.
//!
//! A leaf without a renderable at render time means the setup pass was
//! never run for this topology — a programmer error reported fail-fast
//! with the offending node id.

use std::collections::HashMap;

use glam::{Mat4, Vec3, Vec4};

use crate::camera::Camera;
use crate::color::Color;
use crate::gpu::GpuContext;
use crate::light::Light;
use crate::node::{Node, NodeId, SceneGraph, TextureRef};
use crate::phong::PhongValues;
use crate::renderable::Renderable;
use crate::shading::{ShadingConfig, ShadingUniforms};
use crate::texture::Texture;
use crate::transform_stack::TransformStack;

/// Errors from the setup pass.
#[derive(Debug)]
pub enum SetupError {
    /// A child id in the tree no longer names a live node.
    MissingNode(NodeId),
    /// A textured box's image could not be loaded.
    Texture {
        node: NodeId,
        source: image::ImageError,
    },
}

impl std::fmt::Display for SetupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SetupError::MissingNode(id) => write!(f, "node {id} vanished during setup"),
            SetupError::Texture { node, source } => {
                write!(f, "texture for node {node} failed to load: {source}")
            }
        }
    }
}

impl std::error::Error for SetupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SetupError::Texture { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Errors from the render pass.
#[derive(Debug)]
pub enum RenderError {
    /// A child id in the tree no longer names a live node.
    MissingNode(NodeId),
    /// A leaf has no renderable: the setup pass has not run since this
    /// node was added.
    MissingRenderable(NodeId),
    /// The surface produced no frame to draw into.
    Surface(wgpu::SurfaceError),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::MissingNode(id) => write!(f, "node {id} vanished during rendering"),
            RenderError::MissingRenderable(id) => {
                write!(f, "no renderable for node {id}; run setup first")
            }
            RenderError::Surface(e) => write!(f, "surface error: {e}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Surface(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wgpu::SurfaceError> for RenderError {
    fn from(e: wgpu::SurfaceError) -> Self {
        RenderError::Surface(e)
    }
}

/// The (node → renderable) side table.
///
/// Written once by the setup pass, read by every render pass. The
/// association is weak: entries do not keep nodes alive, and entries for
/// removed nodes linger until [`Renderables::prune`] drops them.
pub struct Renderables {
    objects: HashMap<NodeId, Renderable>,
}

impl Renderables {
    pub fn new() -> Self {
        Self {
            objects: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, id: NodeId, renderable: Renderable) {
        self.objects.insert(id, renderable);
    }

    pub fn get(&self, id: NodeId) -> Option<&Renderable> {
        self.objects.get(&id)
    }

    /// Drops entries whose nodes no longer exist in `scene`. Call after
    /// removing nodes; stale entries are harmless but hold GPU buffers.
    pub fn prune(&mut self, scene: &SceneGraph) {
        let before = self.objects.len();
        self.objects.retain(|id, _| scene.contains(*id));
        let dropped = before - self.objects.len();
        if dropped > 0 {
            log::debug!("pruned {dropped} stale renderables");
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Default for Renderables {
    fn default() -> Self {
        Self::new()
    }
}

/// One-time pre-pass: builds GPU resources for every leaf in the tree.
///
/// Calling setup again for an unchanged topology rebuilds identical
/// resources — wasteful but not incorrect. After adding nodes it must be
/// re-run before those nodes can render.
pub struct SetupVisitor<'a> {
    /// The textured shading configuration, needed for texture bind
    /// groups.
    textured: &'a ShadingConfig,
}

impl<'a> SetupVisitor<'a> {
    pub fn new(textured: &'a ShadingConfig) -> Self {
        Self { textured }
    }

    /// Walks the tree and returns the filled resource table.
    ///
    /// Also applies the one-time raster state: frames clear to white.
    /// Depth testing (LEQUAL, cleared to 1.0) and back-face culling are
    /// fixed in the shading configurations.
    pub fn setup(
        &self,
        gpu: &mut GpuContext,
        scene: &SceneGraph,
        root: NodeId,
    ) -> Result<Renderables, SetupError> {
        gpu.clear_color = wgpu::Color::WHITE;

        let mut renderables = Renderables::new();
        self.visit(gpu, scene, root, &mut renderables)?;
        log::info!("setup built {} renderables", renderables.len());
        Ok(renderables)
    }

    fn visit(
        &self,
        gpu: &GpuContext,
        scene: &SceneGraph,
        id: NodeId,
        out: &mut Renderables,
    ) -> Result<(), SetupError> {
        match scene.node(id).ok_or(SetupError::MissingNode(id))? {
            Node::Group(group) => {
                for child in &group.children {
                    self.visit(gpu, scene, *child, out)?;
                }
            }
            Node::Sphere(_) => {
                out.insert(id, Renderable::sphere(gpu, 32, 16));
            }
            Node::AaBox(_) => {
                out.insert(
                    id,
                    Renderable::aa_box(gpu, Vec3::splat(-0.5), Vec3::splat(0.5)),
                );
            }
            Node::TextureBox(node) => {
                let texture = match &node.texture {
                    TextureRef::File(path) => Texture::from_file(gpu, path)
                        .map_err(|source| SetupError::Texture { node: id, source })?,
                    TextureRef::Checker { cell, light, dark } => {
                        Texture::checkerboard(gpu, *cell, *light, *dark)
                    }
                };
                let bind_group = self
                    .textured
                    .create_texture_bind_group(gpu, &texture)
                    .expect("textured shading configuration lacks a texture layout");
                out.insert(
                    id,
                    Renderable::textured_box(gpu, Vec3::splat(-0.5), Vec3::splat(0.5), bind_group),
                );
            }
        }
        Ok(())
    }
}

/// Per-frame pass: traverses the tree and draws every leaf.
pub struct RenderVisitor {
    phong: ShadingConfig,
    textured: ShadingConfig,
    stack: TransformStack,
    /// View matrix cached from the last camera supplied.
    lookat: Option<Mat4>,
    /// Projection matrix cached from the last camera supplied.
    perspective: Option<Mat4>,
    camera_position: Option<Vec3>,
    /// Reflection coefficients applied to every lit shape.
    pub phong_values: PhongValues,
}

impl RenderVisitor {
    pub fn new(phong: ShadingConfig, textured: ShadingConfig) -> Self {
        Self {
            phong,
            textured,
            stack: TransformStack::new(),
            lookat: None,
            perspective: None,
            camera_position: None,
            phong_values: PhongValues::default(),
        }
    }

    /// Renders one frame of the scene tree.
    ///
    /// When `camera` is `None` the view and projection matrices cached
    /// from a previous call are reused; on the very first frame the
    /// respective bindings are simply skipped.
    pub fn render(
        &mut self,
        gpu: &GpuContext,
        scene: &SceneGraph,
        root: NodeId,
        renderables: &Renderables,
        camera: Option<&Camera>,
        lights: &[Light],
    ) -> Result<(), RenderError> {
        if let Some(camera) = camera {
            self.lookat = Some(camera.view_matrix());
            self.perspective = Some(camera.projection_matrix());
            self.camera_position = Some(camera.eye);
        }

        let frame = gpu.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Scene Encoder"),
            });

        let result = {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(gpu.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &gpu.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.visit(gpu, scene, root, renderables, lights, &mut render_pass)
        };

        gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.present();

        debug_assert_eq!(self.stack.depth(), 1, "unbalanced transform stack");
        result
    }

    fn visit(
        &mut self,
        gpu: &GpuContext,
        scene: &SceneGraph,
        id: NodeId,
        renderables: &Renderables,
        lights: &[Light],
        render_pass: &mut wgpu::RenderPass,
    ) -> Result<(), RenderError> {
        match scene.node(id).ok_or(RenderError::MissingNode(id))? {
            Node::Group(group) => {
                self.stack.push(&group.transform);
                let mut result = Ok(());
                for child in &group.children {
                    result = self.visit(gpu, scene, *child, renderables, lights, render_pass);
                    if result.is_err() {
                        break;
                    }
                }
                // Pop runs even when a child failed, so the stack stays
                // balanced for sibling subtrees.
                self.stack.pop();
                result
            }
            Node::Sphere(node) => {
                self.draw_sphere(gpu, id, node.color, renderables, lights, render_pass)
            }
            Node::AaBox(node) => {
                self.draw_aa_box(gpu, id, node.color, renderables, lights, render_pass)
            }
            Node::TextureBox(_) => self.draw_texture_box(gpu, id, renderables, render_pass),
        }
    }

    /// Spheres take the full lit path: model, inverse-model, view,
    /// projection, and the corrected normal matrix.
    fn draw_sphere(
        &mut self,
        gpu: &GpuContext,
        id: NodeId,
        color: Color,
        renderables: &Renderables,
        lights: &[Light],
        render_pass: &mut wgpu::RenderPass,
    ) -> Result<(), RenderError> {
        let renderable = renderables
            .get(id)
            .ok_or(RenderError::MissingRenderable(id))?;

        let to_world = self.stack.top_forward();
        let from_world = self.stack.top_inverse();

        let shader = &mut self.phong;
        shader.set_matrix("M", to_world);
        shader.set_matrix("M_inverse", from_world);
        if let Some(v) = self.lookat {
            shader.set_matrix("V", v);
        }
        if let Some(p) = self.perspective {
            shader.set_matrix("P", p);
        }
        shader.set_matrix("N", normal_matrix(from_world));
        shader.set_shading(ShadingUniforms::new(
            lights,
            self.camera_position.unwrap_or(Vec3::ZERO),
            color,
            &self.phong_values,
        ));

        shader.bind(gpu, render_pass);
        renderable.render(render_pass);
        Ok(())
    }

    /// Boxes bind model, view, and projection only; the inverse-model and
    /// normal slots keep whatever the previous lit draw staged.
    fn draw_aa_box(
        &mut self,
        gpu: &GpuContext,
        id: NodeId,
        color: Color,
        renderables: &Renderables,
        lights: &[Light],
        render_pass: &mut wgpu::RenderPass,
    ) -> Result<(), RenderError> {
        let renderable = renderables
            .get(id)
            .ok_or(RenderError::MissingRenderable(id))?;

        let shader = &mut self.phong;
        shader.set_matrix("M", self.stack.top_forward());
        if let Some(v) = self.lookat {
            shader.set_matrix("V", v);
        }
        if let Some(p) = self.perspective {
            shader.set_matrix("P", p);
        }
        shader.set_shading(ShadingUniforms::new(
            lights,
            self.camera_position.unwrap_or(Vec3::ZERO),
            color,
            &self.phong_values,
        ));

        shader.bind(gpu, render_pass);
        renderable.render(render_pass);
        Ok(())
    }

    /// Textured boxes use the textured configuration: the accumulated
    /// stack matrix as the model matrix, view and projection, nothing
    /// else. The configuration declares no inverse-model or normal slot,
    /// so those bindings are skipped by construction.
    fn draw_texture_box(
        &mut self,
        gpu: &GpuContext,
        id: NodeId,
        renderables: &Renderables,
        render_pass: &mut wgpu::RenderPass,
    ) -> Result<(), RenderError> {
        let renderable = renderables
            .get(id)
            .ok_or(RenderError::MissingRenderable(id))?;

        let shader = &mut self.textured;
        shader.set_matrix("M", self.stack.top_forward());
        if let Some(v) = self.lookat {
            shader.set_matrix("V", v);
        }
        if let Some(p) = self.perspective {
            shader.set_matrix("P", p);
        }

        shader.bind(gpu, render_pass);
        renderable.render(render_pass);
        Ok(())
    }
}

/// Normal matrix: transpose of the inverse-model matrix with the
/// translation row and column zeroed and the homogeneous corner reset to
/// 1. Directions must not pick up translation, and the inverse-transpose
/// keeps normals perpendicular under non-uniform scale.
fn normal_matrix(from_world: Mat4) -> Mat4 {
    let mut normal = from_world.transpose();
    normal.x_axis.w = 0.0;
    normal.y_axis.w = 0.0;
    normal.z_axis.w = 0.0;
    normal.w_axis = Vec4::new(0.0, 0.0, 0.0, 1.0);
    normal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Transform;
    use glam::Vec3;

    fn assert_mat_eq(a: Mat4, b: Mat4) {
        for (x, y) in a.to_cols_array().iter().zip(b.to_cols_array()) {
            assert!((x - y).abs() < 1e-5, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn normal_matrix_ignores_translation() {
        let transform = Transform::translation(Vec3::new(3.0, -2.0, 7.0));
        // Pure translation: the corrected normal matrix is the identity.
        assert_mat_eq(normal_matrix(transform.inverse_matrix()), Mat4::IDENTITY);
    }

    #[test]
    fn normal_matrix_compensates_non_uniform_scale() {
        let transform = Transform::scaling(Vec3::new(2.0, 1.0, 1.0));
        let n = normal_matrix(transform.inverse_matrix());

        // A normal on a surface slanted across X/Y must stay
        // perpendicular after the model is stretched along X.
        let slanted = Vec3::new(1.0, 1.0, 0.0).normalize();
        let tangent = Vec3::new(-1.0, 1.0, 0.0);

        let transformed_normal = (n * slanted.extend(0.0)).truncate();
        let transformed_tangent = (transform.matrix() * tangent.extend(0.0)).truncate();
        assert!(transformed_normal.dot(transformed_tangent).abs() < 1e-5);
    }

    #[test]
    fn normal_matrix_fixes_the_homogeneous_corner() {
        let transform = Transform::sqt(
            Vec3::new(1.0, 3.0, 0.5),
            glam::Quat::from_rotation_y(0.4),
            Vec3::new(5.0, -1.0, 2.0),
        );
        let n = normal_matrix(transform.inverse_matrix());

        assert_eq!(n.w_axis, Vec4::new(0.0, 0.0, 0.0, 1.0));
        assert_eq!(n.x_axis.w, 0.0);
        assert_eq!(n.y_axis.w, 0.0);
        assert_eq!(n.z_axis.w, 0.0);
    }
}
