//! # Petri Application Entry Point
//!
//! Petri drives two GPU compute-shader simulations over a shared 2D canvas:
//!
//! - **Game of War**: a multi-team cellular automaton where survival, birth
//!   and conquest are controlled by four bounded rule factors.
//! - **Agents**: a slime-mold-style particle simulation whose agents are
//!   moved and painted by the kernel, read back each step, and jittered on
//!   the CPU.
//!
//! The application uses:
//! - `wgpu` for compute dispatch and rendering
//! - `winit` for window management
//! - `egui` for the control overlay
//!
//! Pass a RON configuration file as the first argument to override the
//! embedded defaults: `petri my_config.ron`.

fn main() {
    petri::app::run();
}
