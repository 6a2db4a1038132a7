//! Simulation configuration loaded from RON files.
//!
//! The default `config.ron` at the repository root is embedded as the
//! fallback when no path is given on the command line. Validation runs at
//! load time so empty sequences, out-of-range rule factors and non-divisible
//! canvas dimensions are reported up front instead of corrupting a dispatch.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::simulation::records::{BackgroundColor, CellKind, Rule, Team};
use crate::simulation::{MAX_TEAMS, WORKGROUP_SIZE};

/// Embedded fallback configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.ron");

/// A rule factor of 10 disables that rule on the kernel side.
pub const FACTOR_DISABLED: u32 = 10;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub canvas: CanvasConfig,
    /// Deterministic RNG seed for spawn, headings and grayscale seeding.
    pub seed: Option<u64>,
    pub war: WarConfig,
    pub agents: AgentConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    /// Take the window's inner size (rounded down to a workgroup multiple)
    /// at scene construction instead of the fixed dimensions.
    pub auto_size_to_window: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarConfig {
    /// Kernel entry point, resolved once at pipeline creation.
    pub kernel_name: String,
    pub update_delay: f32,
    pub want_update: bool,
    pub rules: RuleConfig,
    pub teams: Vec<TeamConfig>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RuleConfig {
    pub loneliness_factor: u32,
    pub overpopulation_factor: u32,
    pub conquest_factor: u32,
    pub birth_factor: u32,
}

impl RuleConfig {
    pub fn to_record(self) -> Rule {
        Rule {
            loneliness_factor: self.loneliness_factor,
            overpopulation_factor: self.overpopulation_factor,
            conquest_factor: self.conquest_factor,
            birth_factor: self.birth_factor,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TeamConfig {
    pub alive_color: [f32; 4],
    pub threshold_upper: [f32; 4],
    pub threshold_lower: [f32; 4],
}

impl TeamConfig {
    pub fn to_record(self) -> Team {
        Team {
            alive_color: self.alive_color,
            threshold_upper: self.threshold_upper,
            threshold_lower: self.threshold_lower,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Kernel entry point, resolved once at pipeline creation.
    pub kernel_name: String,
    pub update_delay: f32,
    pub want_update: bool,
    pub agent_count: u32,
    /// Uniform heading perturbation in `[-jitter, +jitter]` applied after
    /// every readback. Zero disables the jitter pass entirely.
    pub angle_jitter: f32,
    /// Trail fade rate toward the background color, per second.
    pub trail_decay: f32,
    pub spawn_position: SpawnPosition,
    pub border_collision: BorderCollision,
    pub background_color: [f32; 4],
    pub cells: Vec<CellKindConfig>,
}

impl AgentConfig {
    pub fn background_record(&self) -> BackgroundColor {
        BackgroundColor {
            color: self.background_color,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CellKindConfig {
    pub speed: f32,
    pub color: [f32; 4],
}

impl CellKindConfig {
    pub fn to_record(self) -> CellKind {
        CellKind {
            speed: self.speed,
            color: self.color,
        }
    }
}

/// Where agents start out. Consumed CPU-side when the population is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnPosition {
    Center,
    Random,
}

/// What agents do at the canvas edge. Passed to the kernel as an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BorderCollision {
    Bounce,
    Wrap,
    Center,
}

impl BorderCollision {
    /// Integer selector matching the constants in `agents.wgsl`.
    pub fn kernel_value(self) -> u32 {
        match self {
            BorderCollision::Bounce => 0,
            BorderCollision::Wrap => 1,
            BorderCollision::Center => 2,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = ron::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// The embedded `config.ron`. Parsing it is a build-time invariant.
    pub fn embedded_default() -> Self {
        let config: AppConfig =
            ron::from_str(DEFAULT_CONFIG).expect("embedded config.ron must parse");
        config
            .validate()
            .expect("embedded config.ron must validate");
        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::Invalid(message));

        if self.canvas.width == 0 || self.canvas.height == 0 {
            return invalid("canvas dimensions must be non-zero".into());
        }
        if self.canvas.width % WORKGROUP_SIZE != 0 || self.canvas.height % WORKGROUP_SIZE != 0 {
            return invalid(format!(
                "canvas dimensions {}x{} must be divisible by the {WORKGROUP_SIZE}-pixel workgroup",
                self.canvas.width, self.canvas.height
            ));
        }

        if self.war.teams.is_empty() {
            return invalid("war.teams must not be empty".into());
        }
        if self.war.teams.len() > MAX_TEAMS {
            return invalid(format!(
                "war.teams supports at most {MAX_TEAMS} teams, got {}",
                self.war.teams.len()
            ));
        }
        let factors = [
            ("loneliness_factor", self.war.rules.loneliness_factor),
            ("overpopulation_factor", self.war.rules.overpopulation_factor),
            ("conquest_factor", self.war.rules.conquest_factor),
            ("birth_factor", self.war.rules.birth_factor),
        ];
        for (name, value) in factors {
            if value > FACTOR_DISABLED {
                return invalid(format!("war.rules.{name} must be in 0..=10, got {value}"));
            }
        }
        // The war kernel identifies teams by their alive color; colors that
        // collide with each other or with the black dead state are ambiguous.
        for (i, team) in self.war.teams.iter().enumerate() {
            let rgb = &team.alive_color[..3];
            if color_distance(rgb, &[0.0, 0.0, 0.0]) < 0.05 {
                return invalid(format!("war.teams[{i}] alive_color is too close to black"));
            }
            for (j, other) in self.war.teams.iter().enumerate().skip(i + 1) {
                if color_distance(rgb, &other.alive_color[..3]) < 0.05 {
                    return invalid(format!(
                        "war.teams[{i}] and war.teams[{j}] alive colors are indistinguishable"
                    ));
                }
            }
        }
        if self.war.update_delay < 0.0 || !self.war.update_delay.is_finite() {
            return invalid("war.update_delay must be non-negative".into());
        }

        if self.agents.cells.is_empty() {
            return invalid("agents.cells must not be empty".into());
        }
        if self.agents.agent_count == 0 {
            return invalid("agents.agent_count must be at least 1".into());
        }
        if self.agents.angle_jitter < 0.0 || !self.agents.angle_jitter.is_finite() {
            return invalid("agents.angle_jitter must be non-negative".into());
        }
        if self.agents.trail_decay < 0.0 || !self.agents.trail_decay.is_finite() {
            return invalid("agents.trail_decay must be non-negative".into());
        }
        if self.agents.update_delay < 0.0 || !self.agents.update_delay.is_finite() {
            return invalid("agents.update_delay must be non-negative".into());
        }
        Ok(())
    }
}

fn color_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_default_parses_and_validates() {
        let config = AppConfig::embedded_default();
        assert!(!config.war.teams.is_empty());
        assert!(!config.agents.cells.is_empty());
        assert_eq!(config.canvas.width % WORKGROUP_SIZE, 0);
        assert_eq!(config.canvas.height % WORKGROUP_SIZE, 0);
    }

    #[test]
    fn test_rejects_empty_teams() {
        let mut config = AppConfig::embedded_default();
        config.war.teams.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_empty_cells() {
        let mut config = AppConfig::embedded_default();
        config.agents.cells.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_non_divisible_canvas() {
        let mut config = AppConfig::embedded_default();
        config.canvas.width = 1281;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_out_of_range_rule_factor() {
        let mut config = AppConfig::embedded_default();
        config.war.rules.birth_factor = 11;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_zero_agents() {
        let mut config = AppConfig::embedded_default();
        config.agents.agent_count = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_colliding_team_colors() {
        let mut config = AppConfig::embedded_default();
        let first = config.war.teams[0];
        config.war.teams[1].alive_color = first.alive_color;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_border_collision_kernel_values() {
        assert_eq!(BorderCollision::Bounce.kernel_value(), 0);
        assert_eq!(BorderCollision::Wrap.kernel_value(), 1);
        assert_eq!(BorderCollision::Center.kernel_value(), 2);
    }
}
