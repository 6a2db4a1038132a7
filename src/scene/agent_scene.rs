//! Agent simulation scene.

use crate::config::AppConfig;
use crate::rendering::CanvasBlitter;
use crate::scene::{Scene, SceneStats};
use crate::simulation::{AgentDriver, DriverError};

pub struct AgentScene {
    driver: AgentDriver,
    blitter: CanvasBlitter,
    blit_groups: [wgpu::BindGroup; 2],
    step_due: bool,
    /// Frame time of the tick that fired the throttle; passed to the kernel.
    last_dt: f32,
}

impl AgentScene {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        config: &AppConfig,
        width: u32,
        height: u32,
    ) -> Result<Self, DriverError> {
        let driver = AgentDriver::new(device, queue, &config.agents, width, height, config.seed)?;
        let blitter = CanvasBlitter::new(device, surface_format);
        let blit_groups = [
            blitter.bind_canvas(device, driver.canvas().view(0)),
            blitter.bind_canvas(device, driver.canvas().view(1)),
        ];
        Ok(Self {
            driver,
            blitter,
            blit_groups,
            step_due: false,
            last_dt: 0.0,
        })
    }
}

impl Scene for AgentScene {
    fn update(&mut self, dt: f32) {
        if self.driver.throttle.tick(dt) {
            self.step_due = true;
            self.last_dt = dt;
        }
    }

    fn render(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, view: &wgpu::TextureView) {
        if self.step_due {
            self.step_due = false;
            if let Err(err) = self.driver.step(device, queue, self.last_dt) {
                // Skip this cycle; the next throttle firing retries.
                log::warn!("agent step failed, skipping frame: {err}");
            }
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Agent Scene Encoder"),
        });
        let bind_group = &self.blit_groups[self.driver.canvas().source_index()];
        self.blitter.draw(&mut encoder, view, bind_group);
        queue.submit(Some(encoder.finish()));
    }

    fn is_paused(&self) -> bool {
        !self.driver.throttle.is_active()
    }

    fn set_paused(&mut self, paused: bool) {
        self.driver.throttle.set_active(!paused);
    }

    fn ui(&mut self, ui: &mut egui::Ui) {
        ui.add(
            egui::Slider::new(self.driver.throttle.delay_mut(), 0.0..=1.0)
                .text("Update delay (s)"),
        );
        ui.add(
            egui::Slider::new(&mut self.driver.angle_jitter, 0.0..=1.0).text("Angle jitter (rad)"),
        );
        ui.add(
            egui::Slider::new(&mut self.driver.trail_decay, 0.0..=10.0).text("Trail decay (/s)"),
        );
    }

    fn stats(&self) -> SceneStats {
        SceneStats {
            name: "Agents",
            canvas_width: self.driver.canvas().width(),
            canvas_height: self.driver.canvas().height(),
            detail: format!(
                "{} agents, {} kinds",
                self.driver.agent_count(),
                self.driver.cell_kind_count()
            ),
            steps: self.driver.steps(),
        }
    }
}
