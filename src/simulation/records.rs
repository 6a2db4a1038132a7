//! Structured records shared with the compute kernels.
//!
//! Layouts are tightly packed. Where a WGSL vector type would introduce
//! padding the shader spells out scalar components instead (`CellKind.color`
//! in particular), keeping the GPU array stride equal to the host stride:
//! Rule 16, Team 48, CellKind 20, Agent 16, BackgroundColor 16 bytes.

use bytemuck::{Pod, Zeroable};

use super::layout::{Field, GpuRecord};

/// Survival/birth/conquest factors, each in `0..=10`. A value of 10 disables
/// the factor.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct Rule {
    pub loneliness_factor: u32,
    pub overpopulation_factor: u32,
    pub conquest_factor: u32,
    pub birth_factor: u32,
}

impl GpuRecord for Rule {
    const NAME: &'static str = "Rule";
    const SHAPE: &'static [Field] = &[Field::Uint, Field::Uint, Field::Uint, Field::Uint];
}

/// One automaton team: its alive color plus the grayscale band it claims
/// during the init pass.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Team {
    pub alive_color: [f32; 4],
    pub threshold_upper: [f32; 4],
    pub threshold_lower: [f32; 4],
}

impl GpuRecord for Team {
    const NAME: &'static str = "Team";
    const SHAPE: &'static [Field] = &[Field::Color, Field::Color, Field::Color];
}

/// Agent cell type: movement speed and trail color. 20-byte packed stride.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct CellKind {
    pub speed: f32,
    pub color: [f32; 4],
}

impl GpuRecord for CellKind {
    const NAME: &'static str = "CellKind";
    const SHAPE: &'static [Field] = &[Field::Float, Field::Color];
}

/// One simulated agent. Mutated by the kernel every dispatch and read back
/// for the CPU-side heading jitter.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Agent {
    pub position: [f32; 2],
    pub angle: f32,
    pub kind: i32,
}

impl GpuRecord for Agent {
    const NAME: &'static str = "Agent";
    const SHAPE: &'static [Field] = &[Field::Float, Field::Float, Field::Float, Field::Int];
}

/// Canvas initialisation color for the agent simulation.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct BackgroundColor {
    pub color: [f32; 4],
}

impl GpuRecord for BackgroundColor {
    const NAME: &'static str = "BackgroundColor";
    const SHAPE: &'static [Field] = &[Field::Color];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::layout;

    #[test]
    fn test_declared_strides() {
        assert_eq!(Rule::stride(), 16);
        assert_eq!(Team::stride(), 48);
        assert_eq!(CellKind::stride(), 20);
        assert_eq!(Agent::stride(), 16);
        assert_eq!(BackgroundColor::stride(), 16);
    }

    #[test]
    fn test_strides_match_repr_c_layout() {
        layout::check::<Rule>().unwrap();
        layout::check::<Team>().unwrap();
        layout::check::<CellKind>().unwrap();
        layout::check::<Agent>().unwrap();
        layout::check::<BackgroundColor>().unwrap();
    }

    #[test]
    fn test_cell_kind_has_no_tail_padding() {
        // f32 alignment keeps the 20-byte struct unpadded; a vec4-aligned
        // color field would silently grow it to 32.
        assert_eq!(std::mem::size_of::<CellKind>(), 20);
        assert_eq!(std::mem::align_of::<CellKind>(), 4);
    }
}
