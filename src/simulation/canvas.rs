//! Ping-pong canvas textures for the compute kernels.
//!
//! WGSL cannot read and write an `rgba8unorm` storage texture in the same
//! dispatch, so the canvas is a pair of textures alternating source/target
//! roles: the kernel loads from one and stores to the other, and [`flip`]
//! swaps them after every dispatch. The most recently written side doubles
//! as the display texture.
//!
//! [`flip`]: Canvas::flip

use super::{with_gpu_error_scope, DriverError};

pub struct Canvas {
    textures: [wgpu::Texture; 2],
    views: [wgpu::TextureView; 2],
    source: usize,
    width: u32,
    height: u32,
}

impl Canvas {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Result<Self, DriverError> {
        let textures = with_gpu_error_scope(device, "canvas textures", || {
            let make = |label| {
                device.create_texture(&wgpu::TextureDescriptor {
                    label: Some(label),
                    size: wgpu::Extent3d {
                        width,
                        height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: Self::FORMAT,
                    usage: wgpu::TextureUsages::STORAGE_BINDING
                        | wgpu::TextureUsages::TEXTURE_BINDING
                        | wgpu::TextureUsages::COPY_DST,
                    view_formats: &[],
                })
            };
            [make("Canvas A"), make("Canvas B")]
        })?;
        let views = [
            textures[0].create_view(&wgpu::TextureViewDescriptor::default()),
            textures[1].create_view(&wgpu::TextureViewDescriptor::default()),
        ];
        Ok(Self {
            textures,
            views,
            source: 0,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// View of either side; bind groups are pre-created per orientation.
    pub fn view(&self, index: usize) -> &wgpu::TextureView {
        &self.views[index]
    }

    /// Index of the current source side. After a flip this is the side the
    /// last dispatch wrote, which is also what the display should show.
    pub fn source_index(&self) -> usize {
        self.source
    }

    /// Swap source and target roles after a dispatch.
    pub fn flip(&mut self) {
        self.source = 1 - self.source;
    }

    /// Seed the current source texture with tightly packed RGBA8 pixels.
    pub fn upload_pixels(&self, queue: &wgpu::Queue, pixels: &[u8]) {
        debug_assert_eq!(pixels.len() as u32, self.width * self.height * 4);
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.textures[self.source],
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * self.width),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }
}
