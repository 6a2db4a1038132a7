//! Scene trait definition.
//!
//! Defines the common interface for the two simulation scenes. The app
//! delegates to the active scene for updates, rendering and overlay
//! controls.

/// Summary shown in the overlay.
pub struct SceneStats {
    pub name: &'static str,
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// One-line population description ("3 teams", "4096 agents").
    pub detail: String,
    pub steps: u64,
}

/// Common interface for all scene types.
pub trait Scene {
    /// Advance timers by `dt` seconds. GPU work is deferred to
    /// [`Scene::render`].
    fn update(&mut self, dt: f32);

    /// Run any due compute pass and draw the canvas to `view`.
    fn render(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, view: &wgpu::TextureView);

    /// Check if the simulation is paused.
    fn is_paused(&self) -> bool;

    /// Set the paused state.
    fn set_paused(&mut self, paused: bool);

    /// Per-scene overlay controls.
    fn ui(&mut self, ui: &mut egui::Ui);

    /// Current stats for the overlay readout.
    fn stats(&self) -> SceneStats;
}
