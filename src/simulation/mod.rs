//! GPU simulation drivers and shared plumbing.
//!
//! Both drivers follow the same contract: validate configuration and record
//! layouts at construction, allocate GPU resources once inside error scopes,
//! dispatch over the full canvas in 8x8 thread groups, and release resources
//! with their owner. A step that fails skips the current cycle and retries on
//! the next one.

pub mod agents;
pub mod canvas;
pub mod layout;
pub mod records;
pub mod throttle;
pub mod war;

pub use agents::AgentDriver;
pub use canvas::Canvas;
pub use throttle::UpdateThrottle;
pub use war::GameOfWarDriver;

use thiserror::Error;

/// Compute kernels are written with a fixed 8x8 workgroup. Canvas dimensions
/// must be divisible by this; config validation rejects anything else rather
/// than silently skipping edge pixels.
pub const WORKGROUP_SIZE: u32 = 8;

/// Upper bound on simultaneous teams. The war kernel counts neighbours into a
/// fixed-size array; keep in sync with `MAX_TEAMS` in `game_of_war.wgsl`.
pub const MAX_TEAMS: usize = 8;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("record layout mismatch for {record}: declared stride {declared} bytes, host size {actual} bytes")]
    Layout {
        record: &'static str,
        declared: u32,
        actual: u32,
    },
    #[error("GPU resource allocation failed: {0}")]
    Resource(String),
    #[error("agent readback failed: {0}")]
    Readback(String),
}

/// Number of thread groups needed to cover `extent` pixels. Exact division is
/// guaranteed by config validation.
pub fn dispatch_groups(extent: u32) -> u32 {
    extent / WORKGROUP_SIZE
}

/// Run `f` inside GPU error scopes so allocation and validation failures
/// surface as [`DriverError::Resource`] instead of losing the device.
pub fn with_gpu_error_scope<T>(
    device: &wgpu::Device,
    what: &str,
    f: impl FnOnce() -> T,
) -> Result<T, DriverError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    let value = f();
    let out_of_memory = pollster::block_on(device.pop_error_scope());
    let validation = pollster::block_on(device.pop_error_scope());
    if let Some(err) = out_of_memory.or(validation) {
        return Err(DriverError::Resource(format!("{what}: {err}")));
    }
    Ok(value)
}

// Bind-group layout entries shared by both kernels: source texture, target
// storage texture, params uniform, structured storage buffers.

pub(crate) fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

pub(crate) fn storage_texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::StorageTexture {
            access: wgpu::StorageTextureAccess::WriteOnly,
            format: Canvas::FORMAT,
            view_dimension: wgpu::TextureViewDimension::D2,
        },
        count: None,
    }
}

pub(crate) fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub(crate) fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_groups_exact_division() {
        assert_eq!(dispatch_groups(1280), 160);
        assert_eq!(dispatch_groups(720), 90);
        assert_eq!(dispatch_groups(WORKGROUP_SIZE), 1);
    }
}
