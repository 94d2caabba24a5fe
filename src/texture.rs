//! GPU textures for textured box leaves.

use std::path::Path;

use crate::color::Color;
use crate::gpu::GpuContext;

/// A GPU texture with its view and sampler.
#[derive(Debug)]
pub struct Texture {
    #[allow(dead_code)]
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    /// Creates a texture from raw RGBA8 data.
    pub fn from_rgba(gpu: &GpuContext, data: &[u8], width: u32, height: u32, label: &str) -> Self {
        use wgpu::util::DeviceExt;

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{label} Sampler")),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            width,
            height,
        }
    }

    /// Loads a texture from an image file.
    pub fn from_file(gpu: &GpuContext, path: &Path) -> Result<Self, image::ImageError> {
        let img = image::open(path)?.to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self::from_rgba(
            gpu,
            &img,
            width,
            height,
            &path.display().to_string(),
        ))
    }

    /// Decodes a texture from in-memory image bytes.
    pub fn from_bytes(
        gpu: &GpuContext,
        bytes: &[u8],
        label: &str,
    ) -> Result<Self, image::ImageError> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self::from_rgba(gpu, &img, width, height, label))
    }

    /// Generates a two-color checkerboard, `cell` pixels per square.
    ///
    /// Handy for textured boxes that should render without any asset on
    /// disk.
    pub fn checkerboard(gpu: &GpuContext, cell: u32, light: Color, dark: Color) -> Self {
        let cell = cell.max(1);
        let size = cell * 8;
        let light = [
            (light.r * 255.0) as u8,
            (light.g * 255.0) as u8,
            (light.b * 255.0) as u8,
            255,
        ];
        let dark = [
            (dark.r * 255.0) as u8,
            (dark.g * 255.0) as u8,
            (dark.b * 255.0) as u8,
            255,
        ];

        let mut data = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let even = ((x / cell) + (y / cell)) % 2 == 0;
                data.extend_from_slice(if even { &light } else { &dark });
            }
        }

        Self::from_rgba(gpu, &data, size, size, "Checkerboard Texture")
    }
}
