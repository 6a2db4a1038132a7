//! # Petri: GPU Compute Shader Simulations
//!
//! Petri is a standalone driver for two GPU-resident 2D simulations, blitted
//! to a window every frame with an egui control overlay.
//!
//! ## Architecture Overview
//!
//! ### 1. Simulation Drivers ([`simulation`])
//!
//! - [`simulation::GameOfWarDriver`] - multi-team cellular automaton; rotates
//!   team priority round-robin and re-uploads rule/team buffers every step
//! - [`simulation::AgentDriver`] - agent simulation with a synchronous GPU
//!   readback and CPU-side heading jitter after every dispatch
//! - [`simulation::layout`] - byte-stride accounting for structured records;
//!   every driver validates its record layouts at construction
//! - [`simulation::UpdateThrottle`] - frame-time accumulator gating dispatch
//!   frequency
//! - [`simulation::Canvas`] - ping-pong texture pair the kernels read from
//!   and write to
//!
//! **Key Design**: record strides are the plain sum of field widths with no
//! implicit padding; the WGSL structs are declared to match byte-for-byte.
//!
//! ### 2. Rendering ([`rendering`])
//!
//! - [`rendering::CanvasBlitter`] - fullscreen-triangle blit of the canvas
//!   onto the surface with nearest-neighbour sampling
//!
//! ### 3. Scenes ([`scene`])
//!
//! - [`scene::Scene`] - common interface: `update` accumulates time,
//!   `render` performs due compute passes and the blit
//! - [`scene::SceneManager`] - lazy construction and switching between the
//!   two simulations; a scene that fails to build is reported and the
//!   previous one stays active
//!
//! ### 4. Shell ([`app`], [`ui`], [`config`])
//!
//! - [`app::App`] - winit/wgpu setup, event loop, keyboard navigation
//!   (`1`/`2` switch scene, `R` reset, `Space` pause, `Escape` quit)
//! - [`ui::UiOverlay`] - egui context/renderer wiring and the overlay window
//! - [`config::AppConfig`] - RON-backed configuration with semantic
//!   validation; an embedded `config.ron` is the fallback
//!
//! ## Error Model
//!
//! Driver construction and stepping return [`simulation::DriverError`]
//! (empty configuration sequences, record layout mismatches, GPU allocation
//! failures, readback failures). A failed step skips the frame and retries
//! next cycle; nothing on these paths panics.

pub mod app;
pub mod config;
pub mod rendering;
pub mod scene;
pub mod simulation;
pub mod ui;
