//! Scene manager for switching between the two simulations.
//!
//! Handles creation, switching, and reset of the war and agent scenes.
//! Scenes are built lazily; a scene that fails to build is reported and the
//! previous one stays active.

use crate::config::AppConfig;
use crate::scene::{AgentScene, Scene, WarScene};
use crate::simulation::{DriverError, WORKGROUP_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationMode {
    War,
    Agents,
}

impl SimulationMode {
    pub fn display_name(self) -> &'static str {
        match self {
            SimulationMode::War => "Game of War",
            SimulationMode::Agents => "Agents",
        }
    }
}

pub struct SceneManager {
    current_mode: SimulationMode,
    war_scene: Option<WarScene>,
    agent_scene: Option<AgentScene>,
    config: AppConfig,
    surface_format: wgpu::TextureFormat,
    /// Last known window inner size, for `auto_size_to_window`.
    window_size: (u32, u32),
}

impl SceneManager {
    /// Create a new manager with the war scene active.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        config: AppConfig,
        window_size: (u32, u32),
    ) -> Result<Self, DriverError> {
        let mut manager = Self {
            current_mode: SimulationMode::War,
            war_scene: None,
            agent_scene: None,
            config,
            surface_format,
            window_size,
        };
        let (width, height) = manager.canvas_size();
        manager.war_scene = Some(WarScene::new(
            device,
            queue,
            surface_format,
            &manager.config,
            width,
            height,
        )?);
        Ok(manager)
    }

    /// Canvas dimensions for a newly built scene. When sized from the window
    /// the dimensions are rounded down to a workgroup multiple.
    fn canvas_size(&self) -> (u32, u32) {
        if self.config.canvas.auto_size_to_window {
            let round = |extent: u32| (extent - extent % WORKGROUP_SIZE).max(WORKGROUP_SIZE);
            (round(self.window_size.0), round(self.window_size.1))
        } else {
            (self.config.canvas.width, self.config.canvas.height)
        }
    }

    pub fn current_mode(&self) -> SimulationMode {
        self.current_mode
    }

    /// Switch to a different simulation mode, building the target scene if it
    /// doesn't exist yet. On failure the current scene stays active.
    pub fn switch_mode(&mut self, mode: SimulationMode, device: &wgpu::Device, queue: &wgpu::Queue) {
        if mode == self.current_mode {
            return;
        }

        log::info!(
            "Switching from {} to {}",
            self.current_mode.display_name(),
            mode.display_name()
        );

        let (width, height) = self.canvas_size();
        match mode {
            SimulationMode::War => {
                if self.war_scene.is_none() {
                    match WarScene::new(
                        device,
                        queue,
                        self.surface_format,
                        &self.config,
                        width,
                        height,
                    ) {
                        Ok(scene) => self.war_scene = Some(scene),
                        Err(err) => {
                            log::error!("failed to build war scene: {err}");
                            return;
                        }
                    }
                }
            }
            SimulationMode::Agents => {
                if self.agent_scene.is_none() {
                    match AgentScene::new(
                        device,
                        queue,
                        self.surface_format,
                        &self.config,
                        width,
                        height,
                    ) {
                        Ok(scene) => self.agent_scene = Some(scene),
                        Err(err) => {
                            log::error!("failed to build agent scene: {err}");
                            return;
                        }
                    }
                }
            }
        }

        self.current_mode = mode;
    }

    /// Rebuild the active scene from configuration at the current window
    /// size. On failure the old scene keeps running.
    pub fn reset_active(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let (width, height) = self.canvas_size();
        log::info!(
            "Resetting {} at {width}x{height}",
            self.current_mode.display_name()
        );
        match self.current_mode {
            SimulationMode::War => {
                match WarScene::new(
                    device,
                    queue,
                    self.surface_format,
                    &self.config,
                    width,
                    height,
                ) {
                    Ok(scene) => self.war_scene = Some(scene),
                    Err(err) => log::error!("failed to reset war scene: {err}"),
                }
            }
            SimulationMode::Agents => {
                match AgentScene::new(
                    device,
                    queue,
                    self.surface_format,
                    &self.config,
                    width,
                    height,
                ) {
                    Ok(scene) => self.agent_scene = Some(scene),
                    Err(err) => log::error!("failed to reset agent scene: {err}"),
                }
            }
        }
    }

    /// Track window resizes. The running canvas keeps its dimensions; the
    /// new size applies on the next reset or lazy scene build.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
    }

    pub fn active_scene_mut(&mut self) -> &mut dyn Scene {
        match self.current_mode {
            SimulationMode::War => self.war_scene.as_mut().expect("war scene should exist"),
            SimulationMode::Agents => self
                .agent_scene
                .as_mut()
                .expect("agent scene should exist"),
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.active_scene_mut().update(dt);
    }

    pub fn render(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, view: &wgpu::TextureView) {
        self.active_scene_mut().render(device, queue, view);
    }
}
