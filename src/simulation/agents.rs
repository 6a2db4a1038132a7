//! Agent driver: slime-mold-style particles painted by the GPU.
//!
//! Each step uploads the cell and agent arrays, dispatches the kernel over
//! the canvas, then synchronously reads the agent buffer back so the
//! CPU-side heading jitter sees the kernel's output. The readback is a
//! deliberate GPU-CPU sync point; the jitter must land before the next
//! upload.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use wgpu::util::DeviceExt;

use crate::config::{AgentConfig, BorderCollision, SpawnPosition};

use super::canvas::Canvas;
use super::layout::{self, GpuRecord};
use super::records::{Agent, BackgroundColor, CellKind};
use super::throttle::UpdateThrottle;
use super::{dispatch_groups, with_gpu_error_scope, DriverError};

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct AgentParams {
    width: u32,
    height: u32,
    agent_count: u32,
    init: u32,
    border_collision: u32,
    delta_time: f32,
    trail_decay: f32,
    _pad: u32,
}

pub struct AgentDriver {
    pipeline: wgpu::ComputePipeline,
    bind_groups: [wgpu::BindGroup; 2],
    params_buffer: wgpu::Buffer,
    cells_buffer: wgpu::Buffer,
    agents_buffer: wgpu::Buffer,
    readback_buffer: wgpu::Buffer,
    canvas: Canvas,
    cells: Vec<CellKind>,
    agents: Vec<Agent>,
    border_collision: BorderCollision,
    pub angle_jitter: f32,
    pub trail_decay: f32,
    pub throttle: UpdateThrottle,
    rng: StdRng,
    steps: u64,
}

impl AgentDriver {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        config: &AgentConfig,
        width: u32,
        height: u32,
        seed: Option<u64>,
    ) -> Result<Self, DriverError> {
        if config.cells.is_empty() {
            return Err(DriverError::Config("cell kind sequence is empty".into()));
        }
        if config.agent_count == 0 {
            return Err(DriverError::Config("agent population is zero".into()));
        }
        layout::check::<CellKind>()?;
        layout::check::<Agent>()?;
        layout::check::<BackgroundColor>()?;

        let canvas = Canvas::new(device, width, height)?;

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let cells: Vec<CellKind> = config.cells.iter().map(|c| c.to_record()).collect();
        let agents = spawn_agents(
            config.agent_count as usize,
            cells.len(),
            width,
            height,
            config.spawn_position,
            &mut rng,
        );

        let agents_size = (Agent::stride() as usize * agents.len()) as u64;
        let (params_buffer, cells_buffer, agents_buffer, background_buffer, readback_buffer) =
            with_gpu_error_scope(device, "agent buffers", || {
                let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Agent Params Buffer"),
                    contents: bytemuck::bytes_of(&AgentParams {
                        width,
                        height,
                        agent_count: agents.len() as u32,
                        init: 1,
                        border_collision: config.border_collision.kernel_value(),
                        delta_time: 0.0,
                        trail_decay: config.trail_decay,
                        _pad: 0,
                    }),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
                let cells_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("Agent Cells Buffer"),
                    size: (CellKind::stride() as usize * cells.len()) as u64,
                    usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                let agents_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("Agents Buffer"),
                    size: agents_size,
                    usage: wgpu::BufferUsages::STORAGE
                        | wgpu::BufferUsages::COPY_DST
                        | wgpu::BufferUsages::COPY_SRC,
                    mapped_at_creation: false,
                });
                // Background color is uploaded once at startup; the bind
                // groups keep the buffer alive.
                let background_buffer =
                    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Agent Background Buffer"),
                        contents: bytemuck::bytes_of(&config.background_record()),
                        usage: wgpu::BufferUsages::STORAGE,
                    });
                let readback_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("Agent Readback Buffer"),
                    size: agents_size,
                    usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                (
                    params_buffer,
                    cells_buffer,
                    agents_buffer,
                    background_buffer,
                    readback_buffer,
                )
            })?;

        let (pipeline, bind_groups) = with_gpu_error_scope(device, "agent pipeline", || {
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Agent Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("../../shaders/agents.wgsl").into()),
            });
            let bind_group_layout =
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Agent Bind Group Layout"),
                    entries: &[
                        super::texture_entry(0),
                        super::storage_texture_entry(1),
                        super::uniform_entry(2),
                        super::storage_entry(3, true),
                        super::storage_entry(4, false),
                        super::storage_entry(5, true),
                    ],
                });
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Agent Pipeline Layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });
            let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("Agent Pipeline"),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: Some(&config.kernel_name),
                compilation_options: Default::default(),
                cache: None,
            });

            let make_bind_group = |source: usize| {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Agent Bind Group"),
                    layout: &bind_group_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(canvas.view(source)),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::TextureView(canvas.view(1 - source)),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: params_buffer.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 3,
                            resource: cells_buffer.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 4,
                            resource: agents_buffer.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 5,
                            resource: background_buffer.as_entire_binding(),
                        },
                    ],
                })
            };
            (pipeline, [make_bind_group(0), make_bind_group(1)])
        })?;

        let mut driver = Self {
            pipeline,
            bind_groups,
            params_buffer,
            cells_buffer,
            agents_buffer,
            readback_buffer,
            canvas,
            cells,
            agents,
            border_collision: config.border_collision,
            angle_jitter: config.angle_jitter,
            trail_decay: config.trail_decay,
            throttle: UpdateThrottle::new(config.update_delay, config.want_update),
            rng,
            steps: 0,
        };
        // One regular pass with the init signal raised, then clear it.
        driver.run_pass(device, queue, 0.0, true)?;
        Ok(driver)
    }

    /// Advance the simulation one step, passing the firing frame's `dt`.
    pub fn step(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        dt: f32,
    ) -> Result<(), DriverError> {
        self.run_pass(device, queue, dt, false)
    }

    fn run_pass(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        dt: f32,
        init: bool,
    ) -> Result<(), DriverError> {
        queue.write_buffer(&self.cells_buffer, 0, bytemuck::cast_slice(&self.cells));
        queue.write_buffer(&self.agents_buffer, 0, bytemuck::cast_slice(&self.agents));

        let params = AgentParams {
            width: self.canvas.width(),
            height: self.canvas.height(),
            agent_count: self.agents.len() as u32,
            init: init as u32,
            border_collision: self.border_collision.kernel_value(),
            delta_time: dt,
            trail_decay: self.trail_decay,
            _pad: 0,
        };
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));

        let agents_size = (Agent::stride() as usize * self.agents.len()) as u64;
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Agent Encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Agent Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_groups[self.canvas.source_index()], &[]);
            pass.dispatch_workgroups(
                dispatch_groups(self.canvas.width()),
                dispatch_groups(self.canvas.height()),
                1,
            );
        }
        encoder.copy_buffer_to_buffer(&self.agents_buffer, 0, &self.readback_buffer, 0, agents_size);
        queue.submit(Some(encoder.finish()));

        self.read_back_agents(device)?;

        if self.angle_jitter != 0.0 {
            apply_angle_jitter(&mut self.agents, self.angle_jitter, &mut self.rng);
        }

        self.canvas.flip();
        self.steps += 1;
        Ok(())
    }

    /// Blocking map of the readback buffer. Stalls until the GPU finishes the
    /// submitted dispatch.
    fn read_back_agents(&mut self, device: &wgpu::Device) -> Result<(), DriverError> {
        let slice = self.readback_buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device
            .poll(wgpu::PollType::Wait)
            .map_err(|err| DriverError::Readback(err.to_string()))?;
        match rx.recv() {
            Ok(Ok(())) => {
                {
                    let data = slice.get_mapped_range();
                    self.agents.copy_from_slice(bytemuck::cast_slice(&data));
                }
                self.readback_buffer.unmap();
                Ok(())
            }
            Ok(Err(err)) => Err(DriverError::Readback(err.to_string())),
            Err(_) => Err(DriverError::Readback("map callback dropped".into())),
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn cell_kind_count(&self) -> usize {
        self.cells.len()
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }
}

/// Build the initial agent population. Positions follow the spawn policy,
/// headings are uniform in `[0, 2π)`, kinds are uniform over the configured
/// cell types.
pub fn spawn_agents(
    count: usize,
    kind_count: usize,
    width: u32,
    height: u32,
    spawn: SpawnPosition,
    rng: &mut impl Rng,
) -> Vec<Agent> {
    let extent = Vec2::new(width as f32, height as f32);
    (0..count)
        .map(|_| {
            let position = match spawn {
                SpawnPosition::Center => extent * 0.5,
                SpawnPosition::Random => Vec2::new(
                    rng.gen_range(0.0..extent.x),
                    rng.gen_range(0.0..extent.y),
                ),
            };
            Agent {
                position: position.to_array(),
                angle: rng.gen_range(0.0..std::f32::consts::TAU),
                kind: rng.gen_range(0..kind_count) as i32,
            }
        })
        .collect()
}

/// Perturb every heading by a uniform offset in `[-jitter, +jitter]`.
pub fn apply_angle_jitter(agents: &mut [Agent], jitter: f32, rng: &mut impl Rng) {
    for agent in agents {
        agent.angle += rng.gen_range(-jitter..=jitter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_center_spawn_places_every_agent_at_canvas_center() {
        let agents = spawn_agents(200, 3, 640, 480, SpawnPosition::Center, &mut rng());
        assert_eq!(agents.len(), 200);
        for agent in &agents {
            assert_eq!(agent.position, [320.0, 240.0]);
        }
    }

    #[test]
    fn test_random_spawn_stays_in_bounds_and_spreads() {
        let agents = spawn_agents(4000, 3, 640, 480, SpawnPosition::Random, &mut rng());
        let mut quadrants = [0usize; 4];
        for agent in &agents {
            let [x, y] = agent.position;
            assert!((0.0..640.0).contains(&x));
            assert!((0.0..480.0).contains(&y));
            let quadrant = (x >= 320.0) as usize + 2 * ((y >= 240.0) as usize);
            quadrants[quadrant] += 1;
        }
        // Roughly uniform: every quadrant holds a substantial share.
        for &count in &quadrants {
            assert!(count > 700, "quadrants {quadrants:?}");
        }
    }

    #[test]
    fn test_spawn_headings_and_kinds_in_range() {
        let agents = spawn_agents(1000, 4, 64, 64, SpawnPosition::Random, &mut rng());
        for agent in &agents {
            assert!((0.0..std::f32::consts::TAU).contains(&agent.angle));
            assert!((0..4).contains(&agent.kind));
        }
    }

    #[test]
    fn test_zero_jitter_leaves_headings_unchanged() {
        let mut agents = spawn_agents(100, 2, 64, 64, SpawnPosition::Random, &mut rng());
        let before: Vec<f32> = agents.iter().map(|a| a.angle).collect();
        // Zero magnitude: the driver skips the pass entirely, and even if
        // invoked the offset range collapses to zero.
        apply_angle_jitter(&mut agents, 0.0, &mut rng());
        let after: Vec<f32> = agents.iter().map(|a| a.angle).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_jitter_is_bounded() {
        let mut agents = spawn_agents(1000, 2, 64, 64, SpawnPosition::Random, &mut rng());
        let before: Vec<f32> = agents.iter().map(|a| a.angle).collect();
        let jitter = 0.25;
        apply_angle_jitter(&mut agents, jitter, &mut rng());
        for (agent, old) in agents.iter().zip(&before) {
            let delta = agent.angle - old;
            // Small tolerance for the add-then-subtract rounding
            assert!(delta.abs() <= jitter + 1e-4, "delta {delta} exceeds jitter");
        }
        // Something actually moved
        assert!(agents.iter().zip(&before).any(|(a, old)| a.angle != *old));
    }
}
