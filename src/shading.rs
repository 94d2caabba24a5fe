//! Shading configurations: pipelines with named uniform matrix slots.
//!
//! The render visitor does not talk to wgpu bind groups directly; it sets
//! matrices by name (`"M"`, `"M_inverse"`, `"N"`, `"V"`, `"P"`) on a
//! [`ShadingConfig`] and the config owns how those names map onto the GPU.
//! Setting a name a config does not declare is a soft no-op — the call
//! reports `false` and rendering proceeds with whatever the slot last
//! held. Two configurations exist: the lit [`ShadingConfig::phong`] path
//! for colored shapes and the [`ShadingConfig::textured`] path for
//! textured ones, which declares fewer slots.
//!
//! Slot values are staged CPU-side and persist across draws, so a draw
//! that skips a slot inherits the previous value. [`ShadingConfig::bind`]
//! snapshots the staged state into a fresh per-draw uniform buffer; a
//! shared buffer would not do, because queued buffer writes all land
//! before the render pass executes.

use glam::{Mat4, Vec3};

use crate::color::Color;
use crate::gpu::{self, GpuContext};
use crate::light::Light;
use crate::phong::PhongValues;
use crate::renderable::Vertex;
use crate::texture::Texture;

/// Upper bound on lights uploaded to the shader in one frame.
pub const MAX_LIGHTS: usize = 8;

const PHONG_SLOTS: &[&str] = &["M", "M_inverse", "N", "V", "P"];
const TEXTURED_SLOTS: &[&str] = &["M", "V", "P"];

/// Lighting and material data for the phong configuration.
///
/// The layout mirrors the `Shading` struct in `shaders/phong.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadingUniforms {
    /// Light positions, `light_count` of them valid.
    pub light_positions: [[f32; 4]; MAX_LIGHTS],
    /// Camera position in world space, for the specular term.
    pub camera_position: [f32; 4],
    /// Surface color of the shape being drawn.
    pub surface_color: [f32; 4],
    /// kA, kD, kS, shininess.
    pub coefficients: [f32; 4],
    pub light_count: u32,
    pub _padding: [u32; 3],
}

impl ShadingUniforms {
    pub fn new(
        lights: &[Light],
        camera_position: Vec3,
        surface_color: Color,
        values: &PhongValues,
    ) -> Self {
        if lights.len() > MAX_LIGHTS {
            log::debug!("{} lights exceed the limit of {MAX_LIGHTS}", lights.len());
        }

        let mut light_positions = [[0.0; 4]; MAX_LIGHTS];
        for (slot, light) in light_positions.iter_mut().zip(lights) {
            *slot = light.position.extend(1.0).to_array();
        }

        Self {
            light_positions,
            camera_position: camera_position.extend(1.0).to_array(),
            surface_color: surface_color.to_array(),
            coefficients: [values.ka, values.kd, values.ks, values.shininess],
            light_count: lights.len().min(MAX_LIGHTS) as u32,
            _padding: [0; 3],
        }
    }
}

impl Default for ShadingUniforms {
    fn default() -> Self {
        Self::new(&[], Vec3::ZERO, Color::BLACK, &PhongValues::default())
    }
}

/// A render pipeline plus its named uniform matrix slots.
pub struct ShadingConfig {
    label: &'static str,
    pipeline: wgpu::RenderPipeline,
    uniform_layout: wgpu::BindGroupLayout,
    slots: &'static [&'static str],
    staging: Vec<Mat4>,
    shading: Option<ShadingUniforms>,
    texture_layout: Option<wgpu::BindGroupLayout>,
}

impl ShadingConfig {
    /// The lit configuration: full matrix set plus lighting uniforms.
    pub fn phong(gpu: &GpuContext) -> Self {
        Self::build(
            gpu,
            "Phong",
            include_str!("shaders/phong.wgsl"),
            PHONG_SLOTS,
            true,
            false,
        )
    }

    /// The textured configuration: model/view/projection and a texture,
    /// no inverse-model or normal slot.
    pub fn textured(gpu: &GpuContext) -> Self {
        Self::build(
            gpu,
            "Textured",
            include_str!("shaders/textured.wgsl"),
            TEXTURED_SLOTS,
            false,
            true,
        )
    }

    fn build(
        gpu: &GpuContext,
        label: &'static str,
        source: &str,
        slots: &'static [&'static str],
        with_shading: bool,
        with_texture: bool,
    ) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{label} Shader")),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let uniform_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let mut layout_entries = vec![uniform_entry(0)];
        if with_shading {
            layout_entries.push(uniform_entry(1));
        }
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{label} Uniform Layout")),
            entries: &layout_entries,
        });

        let texture_layout = with_texture.then(|| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("{label} Texture Layout")),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            })
        });

        let mut bind_group_layouts = vec![&uniform_layout];
        if let Some(layout) = &texture_layout {
            bind_group_layouts.push(layout);
        }
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{label} Pipeline Layout")),
            bind_group_layouts: &bind_group_layouts,
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{label} Pipeline")),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[Vertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                front_face: wgpu::FrontFace::Ccw,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: gpu::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            label,
            pipeline,
            uniform_layout,
            slots,
            staging: vec![Mat4::IDENTITY; slots.len()],
            shading: with_shading.then(ShadingUniforms::default),
            texture_layout,
        }
    }

    /// Stages `matrix` into the named slot.
    ///
    /// Returns `false` when this configuration has no such slot; the
    /// caller skips the binding and the slot keeps its previous value.
    pub fn set_matrix(&mut self, name: &str, matrix: Mat4) -> bool {
        match self.slots.iter().position(|slot| *slot == name) {
            Some(index) => {
                self.staging[index] = matrix;
                true
            }
            None => false,
        }
    }

    /// Stages lighting/material uniforms; `false` if this configuration
    /// has no lighting block (the textured path).
    pub fn set_shading(&mut self, uniforms: ShadingUniforms) -> bool {
        match &mut self.shading {
            Some(staged) => {
                *staged = uniforms;
                true
            }
            None => false,
        }
    }

    /// Makes this configuration current on the pass: pipeline plus a
    /// snapshot of the staged uniforms in a fresh per-draw bind group.
    pub fn bind(&self, gpu: &GpuContext, render_pass: &mut wgpu::RenderPass) {
        use wgpu::util::DeviceExt;

        let matrices: Vec<[[f32; 4]; 4]> =
            self.staging.iter().map(|m| m.to_cols_array_2d()).collect();
        let matrix_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Matrix Uniforms", self.label)),
                contents: bytemuck::cast_slice(&matrices),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let shading_buffer = self.shading.map(|shading| {
            gpu.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Shading Uniforms", self.label)),
                    contents: bytemuck::cast_slice(&[shading]),
                    usage: wgpu::BufferUsages::UNIFORM,
                })
        });

        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: matrix_buffer.as_entire_binding(),
        }];
        if let Some(buffer) = &shading_buffer {
            entries.push(wgpu::BindGroupEntry {
                binding: 1,
                resource: buffer.as_entire_binding(),
            });
        }
        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Uniform Bind Group", self.label)),
            layout: &self.uniform_layout,
            entries: &entries,
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &bind_group, &[]);
    }

    /// Builds a bind group for `texture` against this configuration's
    /// texture layout; `None` if the configuration is untextured.
    pub fn create_texture_bind_group(
        &self,
        gpu: &GpuContext,
        texture: &Texture,
    ) -> Option<wgpu::BindGroup> {
        let layout = self.texture_layout.as_ref()?;
        Some(gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shading Texture Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        }))
    }
}
