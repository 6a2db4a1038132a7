//! Game of War scene.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::AppConfig;
use crate::rendering::CanvasBlitter;
use crate::scene::{Scene, SceneStats};
use crate::simulation::{DriverError, GameOfWarDriver};

pub struct WarScene {
    driver: GameOfWarDriver,
    blitter: CanvasBlitter,
    /// Blit bind group per canvas side, indexed by the source side.
    blit_groups: [wgpu::BindGroup; 2],
    step_due: bool,
}

impl WarScene {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        config: &AppConfig,
        width: u32,
        height: u32,
    ) -> Result<Self, DriverError> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let driver = GameOfWarDriver::new(device, queue, &config.war, width, height, &mut rng)?;
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
        })
    }
}

impl Scene for WarScene {
    fn update(&mut self, dt: f32) {
        if self.driver.throttle.tick(dt) {
            self.step_due = true;
        }
    }

    fn render(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, view: &wgpu::TextureView) {
        if self.step_due {
            self.step_due = false;
            self.driver.step(device, queue);
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("War Scene Encoder"),
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
        ui.separator();
        ui.label("Rule factors (10 disables)");
        let rules = self.driver.rules_mut();
        ui.add(egui::Slider::new(&mut rules.loneliness_factor, 0..=10).text("Loneliness"));
        ui.add(egui::Slider::new(&mut rules.overpopulation_factor, 0..=10).text("Overpopulation"));
        ui.add(egui::Slider::new(&mut rules.conquest_factor, 0..=10).text("Conquest"));
        ui.add(egui::Slider::new(&mut rules.birth_factor, 0..=10).text("Birth"));
    }

    fn stats(&self) -> SceneStats {
        SceneStats {
            name: "Game of War",
            canvas_width: self.driver.canvas().width(),
            canvas_height: self.driver.canvas().height(),
            detail: format!("{} teams", self.driver.team_count()),
            steps: self.driver.steps(),
        }
    }
}
