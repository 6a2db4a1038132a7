//! Application shell: window, wgpu setup, event loop, keyboard navigation.
//!
//! Keys: `1`/`2` switch between the two simulations, `R` rebuilds the active
//! scene from configuration, `Space` toggles pause, `Escape` quits.

use std::path::Path;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::config::AppConfig;
use crate::scene::{SceneManager, SimulationMode};
use crate::ui::UiOverlay;

pub struct App {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,
    scenes: SceneManager,
    overlay: UiOverlay,
    last_render_time: std::time::Instant,
    frame_count: u32,
    fps: f32,
    fps_timer: std::time::Instant,
}

impl App {
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Returns false when the application should exit.
    pub fn handle_event(&mut self, event: &WindowEvent) -> bool {
        if self.overlay.handle_event(&self.window, event) {
            // egui consumed the event (e.g. a slider drag); redraws still run.
            if !matches!(event, WindowEvent::RedrawRequested) {
                return true;
            }
        }
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested");
                return false;
            }
            WindowEvent::Resized(physical_size) => {
                if physical_size.width > 0 && physical_size.height > 0 {
                    self.surface_config.width = physical_size.width;
                    self.surface_config.height = physical_size.height;
                    self.surface.configure(&self.device, &self.surface_config);
                    self.scenes.resize(physical_size.width, physical_size.height);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed
                    && !event.repeat
                    && !self.overlay.wants_keyboard_input()
                {
                    return self.handle_key(event.physical_key);
                }
            }
            WindowEvent::RedrawRequested => {
                self.render();
            }
            _ => {}
        }
        true
    }

    fn handle_key(&mut self, key: PhysicalKey) -> bool {
        match key {
            PhysicalKey::Code(KeyCode::Digit1) => {
                self.scenes
                    .switch_mode(SimulationMode::War, &self.device, &self.queue);
            }
            PhysicalKey::Code(KeyCode::Digit2) => {
                self.scenes
                    .switch_mode(SimulationMode::Agents, &self.device, &self.queue);
            }
            PhysicalKey::Code(KeyCode::KeyR) => {
                self.scenes.reset_active(&self.device, &self.queue);
            }
            PhysicalKey::Code(KeyCode::Space) => {
                let scene = self.scenes.active_scene_mut();
                let paused = scene.is_paused();
                scene.set_paused(!paused);
            }
            PhysicalKey::Code(KeyCode::Escape) => {
                return false;
            }
            _ => {}
        }
        true
    }

    fn render(&mut self) {
        let now = std::time::Instant::now();
        let dt = now.duration_since(self.last_render_time).as_secs_f32();
        self.last_render_time = now;

        self.scenes.update(dt);

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.surface_config);
                return;
            }
            Err(err) => {
                log::warn!("surface unavailable, skipping frame: {err}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.scenes.render(&self.device, &self.queue, &view);
        self.draw_overlay(&view);

        output.present();

        self.frame_count += 1;
        if self.fps_timer.elapsed().as_secs_f32() >= 1.0 {
            self.fps = self.frame_count as f32 / self.fps_timer.elapsed().as_secs_f32();
            log::debug!("FPS: {:.0}", self.fps);
            self.frame_count = 0;
            self.fps_timer = std::time::Instant::now();
        }
    }

    fn draw_overlay(&mut self, view: &wgpu::TextureView) {
        self.overlay.begin_frame(&self.window);
        let ctx = self.overlay.ctx.clone();

        let mut requested_mode = self.scenes.current_mode();
        egui::Window::new("Simulation")
            .default_width(280.0)
            .show(&ctx, |ui| {
                let stats = self.scenes.active_scene_mut().stats();
                ui.label(format!("FPS: {:.0}", self.fps));
                ui.label(format!(
                    "Canvas: {}x{}",
                    stats.canvas_width, stats.canvas_height
                ));
                ui.label(format!("{} - steps: {}", stats.detail, stats.steps));
                ui.separator();

                ui.horizontal(|ui| {
                    for mode in [SimulationMode::War, SimulationMode::Agents] {
                        ui.selectable_value(&mut requested_mode, mode, mode.display_name());
                    }
                });

                let scene = self.scenes.active_scene_mut();
                let mut running = !scene.is_paused();
                if ui.checkbox(&mut running, "Running").changed() {
                    scene.set_paused(!running);
                }
                ui.separator();
                scene.ui(ui);
            });

        if requested_mode != self.scenes.current_mode() {
            self.scenes
                .switch_mode(requested_mode, &self.device, &self.queue);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Overlay Encoder"),
            });
        self.overlay.end_frame_and_draw(
            &self.device,
            &self.queue,
            &mut encoder,
            &self.window,
            view,
            [self.surface_config.width, self.surface_config.height],
        );
        self.queue.submit(Some(encoder.finish()));
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

struct AppState {
    app: Option<App>,
    config: AppConfig,
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.app.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title("Petri")
            .with_inner_size(winit::dpi::PhysicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("failed to create window: {err}");
                event_loop.exit();
                return;
            }
        };

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = match instance.create_surface(window.clone()) {
            Ok(surface) => surface,
            Err(err) => {
                log::error!("failed to create surface: {err}");
                event_loop.exit();
                return;
            }
        };

        let adapter = match pollster::block_on(instance.request_adapter(
            &wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            },
        )) {
            Ok(adapter) => adapter,
            Err(err) => {
                log::error!("no suitable GPU adapter: {err}");
                event_loop.exit();
                return;
            }
        };

        let (device, queue) = match pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            },
        )) {
            Ok(pair) => pair,
            Err(err) => {
                log::error!("failed to acquire GPU device: {err}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let scenes = match SceneManager::new(
            &device,
            &queue,
            surface_format,
            self.config.clone(),
            (size.width, size.height),
        ) {
            Ok(scenes) => scenes,
            Err(err) => {
                log::error!("failed to build initial scene: {err}");
                event_loop.exit();
                return;
            }
        };

        let overlay = UiOverlay::new(&device, surface_format, &window);

        self.app = Some(App {
            window,
            surface,
            device,
            queue,
            surface_config,
            scenes,
            overlay,
            last_render_time: std::time::Instant::now(),
            frame_count: 0,
            fps: 0.0,
            fps_timer: std::time::Instant::now(),
        });
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(app) = &mut self.app else { return };

        if window_id != app.window().id() {
            return;
        }

        if !app.handle_event(&event) {
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Poll);
        if let Some(app) = &self.app {
            app.request_redraw();
        }
    }
}

pub fn run() {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => match AppConfig::load(Path::new(&path)) {
            Ok(config) => config,
            Err(err) => {
                log::error!("failed to load {path}: {err}");
                std::process::exit(1);
            }
        },
        None => AppConfig::embedded_default(),
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            log::error!("failed to create event loop: {err}");
            std::process::exit(1);
        }
    };
    let mut state = AppState { app: None, config };

    if let Err(err) = event_loop.run_app(&mut state) {
        log::error!("event loop error: {err}");
    }
}
