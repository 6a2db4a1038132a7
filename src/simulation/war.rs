//! Game of War driver: a multi-team cellular automaton on the GPU.
//!
//! The canvas is seeded with random grayscale, converted to team occupancy by
//! a forced init dispatch, then evolved one generation per throttled step.
//! Rule and team buffers are re-uploaded before every dispatch; the team
//! sequence is rotated by one position first, so conquest priority cycles
//! round-robin through all teams.

use bytemuck::{Pod, Zeroable};
use rand::Rng;
use wgpu::util::DeviceExt;

use crate::config::WarConfig;

use super::canvas::Canvas;
use super::layout::{self, GpuRecord};
use super::records::{Rule, Team};
use super::throttle::UpdateThrottle;
use super::{dispatch_groups, with_gpu_error_scope, DriverError, MAX_TEAMS};

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct WarParams {
    width: u32,
    height: u32,
    init: u32,
    team_count: u32,
}

pub struct GameOfWarDriver {
    pipeline: wgpu::ComputePipeline,
    /// One bind group per ping-pong orientation, indexed by the canvas
    /// source side.
    bind_groups: [wgpu::BindGroup; 2],
    params_buffer: wgpu::Buffer,
    rule_buffer: wgpu::Buffer,
    team_buffer: wgpu::Buffer,
    canvas: Canvas,
    rules: Rule,
    teams: Vec<Team>,
    pub throttle: UpdateThrottle,
    steps: u64,
}

impl GameOfWarDriver {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        config: &WarConfig,
        width: u32,
        height: u32,
        rng: &mut impl Rng,
    ) -> Result<Self, DriverError> {
        if config.teams.is_empty() {
            return Err(DriverError::Config("team sequence is empty".into()));
        }
        if config.teams.len() > MAX_TEAMS {
            return Err(DriverError::Config(format!(
                "at most {MAX_TEAMS} teams supported, got {}",
                config.teams.len()
            )));
        }
        layout::check::<Rule>()?;
        layout::check::<Team>()?;

        let canvas = Canvas::new(device, width, height)?;
        canvas.upload_pixels(queue, &random_grayscale(width, height, rng));

        let rules = config.rules.to_record();
        let teams: Vec<Team> = config.teams.iter().map(|t| t.to_record()).collect();

        let (params_buffer, rule_buffer, team_buffer) =
            with_gpu_error_scope(device, "war buffers", || {
                let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("War Params Buffer"),
                    contents: bytemuck::bytes_of(&WarParams {
                        width,
                        height,
                        init: 1,
                        team_count: teams.len() as u32,
                    }),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
                let rule_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("War Rule Buffer"),
                    size: Rule::stride() as u64,
                    usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                let team_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("War Team Buffer"),
                    size: (Team::stride() as usize * teams.len()) as u64,
                    usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                (params_buffer, rule_buffer, team_buffer)
            })?;

        let (pipeline, bind_groups) = with_gpu_error_scope(device, "war pipeline", || {
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Game of War Shader"),
                source: wgpu::ShaderSource::Wgsl(
                    include_str!("../../shaders/game_of_war.wgsl").into(),
                ),
            });
            let bind_group_layout =
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("War Bind Group Layout"),
                    entries: &[
                        super::texture_entry(0),
                        super::storage_texture_entry(1),
                        super::uniform_entry(2),
                        super::storage_entry(3, true),
                        super::storage_entry(4, true),
                    ],
                });
            let pipeline_layout =
                device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("War Pipeline Layout"),
                    bind_group_layouts: &[&bind_group_layout],
                    push_constant_ranges: &[],
                });
            let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("Game of War Pipeline"),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: Some(&config.kernel_name),
                compilation_options: Default::default(),
                cache: None,
            });

            let make_bind_group = |source: usize| {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("War Bind Group"),
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
                            resource: rule_buffer.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 4,
                            resource: team_buffer.as_entire_binding(),
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
            rule_buffer,
            team_buffer,
            canvas,
            rules,
            teams,
            throttle: UpdateThrottle::new(config.update_delay, config.want_update),
            steps: 0,
        };
        // Forced initialisation pass, independent of the throttle.
        driver.run_pass(device, queue, true);
        Ok(driver)
    }

    /// Advance the automaton one generation.
    pub fn step(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        self.run_pass(device, queue, false);
    }

    fn run_pass(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, init: bool) {
        queue.write_buffer(&self.rule_buffer, 0, bytemuck::bytes_of(&self.rules));

        // Round-robin conquest priority: the previous first team moves to the
        // back, making the previous second team the new first.
        self.teams.rotate_left(1);
        queue.write_buffer(&self.team_buffer, 0, bytemuck::cast_slice(&self.teams));

        let params = WarParams {
            width: self.canvas.width(),
            height: self.canvas.height(),
            init: init as u32,
            team_count: self.teams.len() as u32,
        };
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("War Encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("War Pass"),
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
        queue.submit(Some(encoder.finish()));
        self.canvas.flip();
        self.steps += 1;
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn rules_mut(&mut self) -> &mut Rule {
        &mut self.rules
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }
}

/// Random grayscale seed pixels, one luminance value per pixel.
fn random_grayscale(width: u32, height: u32, rng: &mut impl Rng) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for _ in 0..width * height {
        let luminance: u8 = rng.gen();
        pixels.extend_from_slice(&[luminance, luminance, luminance, 255]);
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample_teams(count: usize) -> Vec<Team> {
        (0..count)
            .map(|i| Team {
                alive_color: [i as f32, 0.0, 0.0, 1.0],
                threshold_upper: [1.0; 4],
                threshold_lower: [0.0; 4],
            })
            .collect()
    }

    #[test]
    fn test_rotation_moves_head_to_tail() {
        let mut teams = sample_teams(3);
        let original = teams.clone();
        teams.rotate_left(1);
        assert_eq!(teams[0], original[1]);
        assert_eq!(teams[1], original[2]);
        assert_eq!(teams[2], original[0]);
    }

    #[test]
    fn test_n_rotations_restore_order() {
        for n in 1..=6 {
            let mut teams = sample_teams(n);
            let original = teams.clone();
            for _ in 0..n {
                teams.rotate_left(1);
            }
            assert_eq!(teams, original, "length {n}");
        }
    }

    #[test]
    fn test_grayscale_seed_is_gray_and_opaque() {
        let mut rng = StdRng::seed_from_u64(7);
        let pixels = random_grayscale(16, 8, &mut rng);
        assert_eq!(pixels.len(), 16 * 8 * 4);
        for pixel in pixels.chunks_exact(4) {
            assert_eq!(pixel[0], pixel[1]);
            assert_eq!(pixel[1], pixel[2]);
            assert_eq!(pixel[3], 255);
        }
        // Not a constant fill
        let first = pixels[0];
        assert!(pixels.chunks_exact(4).any(|p| p[0] != first));
    }
}
