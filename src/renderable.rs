//! GPU-resident geometry for leaf nodes.
//!
//! A [`Renderable`] owns the vertex and index buffers (and, for textured
//! shapes, the texture bind group) for exactly one leaf node. Renderables
//! are built once by the setup visitor and only looked up afterwards; the
//! render visitor binds a shading configuration and calls
//! [`Renderable::render`].

use glam::Vec3;

use crate::gpu::GpuContext;

/// Vertex format shared by every shape: position, normal, UV.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }

    /// Vertex buffer layout for pipeline creation: position (loc 0),
    /// normal (loc 1), uv (loc 2), 32 bytes per vertex.
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };
}

/// GPU resources for drawing one leaf node.
#[derive(Debug)]
pub struct Renderable {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    /// Present only for textured shapes; bound at group 1.
    texture_bind_group: Option<wgpu::BindGroup>,
}

impl Renderable {
    fn from_geometry(
        gpu: &GpuContext,
        vertices: &[Vertex],
        indices: &[u32],
        texture_bind_group: Option<wgpu::BindGroup>,
    ) -> Self {
        use wgpu::util::DeviceExt;

        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Renderable Vertex Buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Renderable Index Buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            texture_bind_group,
        }
    }

    /// A unit sphere: radius 1, centered at the origin, lat/long
    /// tessellation with the given segment and ring counts.
    pub fn sphere(gpu: &GpuContext, segments: u32, rings: u32) -> Self {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for ring in 0..=rings {
            let phi = std::f32::consts::PI * ring as f32 / rings as f32;
            let y = phi.cos();
            let ring_radius = phi.sin();

            for seg in 0..=segments {
                let theta = 2.0 * std::f32::consts::PI * seg as f32 / segments as f32;
                let x = ring_radius * theta.cos();
                let z = ring_radius * theta.sin();

                // On a unit sphere the position doubles as the normal.
                vertices.push(Vertex::new(
                    [x, y, z],
                    [x, y, z],
                    [seg as f32 / segments as f32, ring as f32 / rings as f32],
                ));
            }
        }

        for ring in 0..rings {
            for seg in 0..segments {
                let current = ring * (segments + 1) + seg;
                let next = current + segments + 1;

                indices.push(current);
                indices.push(next);
                indices.push(current + 1);

                indices.push(current + 1);
                indices.push(next);
                indices.push(next + 1);
            }
        }

        Self::from_geometry(gpu, &vertices, &indices, None)
    }

    /// An axis-aligned box between the `min` and `max` corners, flat
    /// per-face normals, each face mapping the full texture range.
    pub fn aa_box(gpu: &GpuContext, min: Vec3, max: Vec3) -> Self {
        let (vertices, indices) = box_geometry(min, max);
        Self::from_geometry(gpu, &vertices, &indices, None)
    }

    /// An axis-aligned box with a texture bind group attached.
    pub fn textured_box(
        gpu: &GpuContext,
        min: Vec3,
        max: Vec3,
        texture_bind_group: wgpu::BindGroup,
    ) -> Self {
        let (vertices, indices) = box_geometry(min, max);
        Self::from_geometry(gpu, &vertices, &indices, Some(texture_bind_group))
    }

    /// Issues the draw for this shape on a pass already holding a bound
    /// shading configuration.
    pub fn render(&self, render_pass: &mut wgpu::RenderPass) {
        if let Some(texture) = &self.texture_bind_group {
            render_pass.set_bind_group(1, texture, &[]);
        }
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// 24 vertices (4 per face, for flat normals) and 36 indices, CCW front
/// faces.
fn box_geometry(min: Vec3, max: Vec3) -> (Vec<Vertex>, Vec<u32>) {
    #[rustfmt::skip]
    let vertices = vec![
        // Front face (Z+)
        Vertex::new([min.x, min.y, max.z], [ 0.0,  0.0,  1.0], [0.0, 0.0]),
        Vertex::new([max.x, min.y, max.z], [ 0.0,  0.0,  1.0], [1.0, 0.0]),
        Vertex::new([max.x, max.y, max.z], [ 0.0,  0.0,  1.0], [1.0, 1.0]),
        Vertex::new([min.x, max.y, max.z], [ 0.0,  0.0,  1.0], [0.0, 1.0]),
        // Back face (Z-)
        Vertex::new([max.x, min.y, min.z], [ 0.0,  0.0, -1.0], [0.0, 0.0]),
        Vertex::new([min.x, min.y, min.z], [ 0.0,  0.0, -1.0], [1.0, 0.0]),
        Vertex::new([min.x, max.y, min.z], [ 0.0,  0.0, -1.0], [1.0, 1.0]),
        Vertex::new([max.x, max.y, min.z], [ 0.0,  0.0, -1.0], [0.0, 1.0]),
        // Top face (Y+)
        Vertex::new([min.x, max.y, max.z], [ 0.0,  1.0,  0.0], [0.0, 0.0]),
        Vertex::new([max.x, max.y, max.z], [ 0.0,  1.0,  0.0], [1.0, 0.0]),
        Vertex::new([max.x, max.y, min.z], [ 0.0,  1.0,  0.0], [1.0, 1.0]),
        Vertex::new([min.x, max.y, min.z], [ 0.0,  1.0,  0.0], [0.0, 1.0]),
        // Bottom face (Y-)
        Vertex::new([min.x, min.y, min.z], [ 0.0, -1.0,  0.0], [0.0, 0.0]),
        Vertex::new([max.x, min.y, min.z], [ 0.0, -1.0,  0.0], [1.0, 0.0]),
        Vertex::new([max.x, min.y, max.z], [ 0.0, -1.0,  0.0], [1.0, 1.0]),
        Vertex::new([min.x, min.y, max.z], [ 0.0, -1.0,  0.0], [0.0, 1.0]),
        // Right face (X+)
        Vertex::new([max.x, min.y, max.z], [ 1.0,  0.0,  0.0], [0.0, 0.0]),
        Vertex::new([max.x, min.y, min.z], [ 1.0,  0.0,  0.0], [1.0, 0.0]),
        Vertex::new([max.x, max.y, min.z], [ 1.0,  0.0,  0.0], [1.0, 1.0]),
        Vertex::new([max.x, max.y, max.z], [ 1.0,  0.0,  0.0], [0.0, 1.0]),
        // Left face (X-)
        Vertex::new([min.x, min.y, min.z], [-1.0,  0.0,  0.0], [0.0, 0.0]),
        Vertex::new([min.x, min.y, max.z], [-1.0,  0.0,  0.0], [1.0, 0.0]),
        Vertex::new([min.x, max.y, max.z], [-1.0,  0.0,  0.0], [1.0, 1.0]),
        Vertex::new([min.x, max.y, min.z], [-1.0,  0.0,  0.0], [0.0, 1.0]),
    ];

    #[rustfmt::skip]
    let indices: Vec<u32> = vec![
        0,  1,  2,  2,  3,  0,  // front
        4,  5,  6,  6,  7,  4,  // back
        8,  9,  10, 10, 11, 8,  // top
        12, 13, 14, 14, 15, 12, // bottom
        16, 17, 18, 18, 19, 16, // right
        20, 21, 22, 22, 23, 20, // left
    ];

    (vertices, indices)
}
