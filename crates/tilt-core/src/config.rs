//! Tunable configuration for the puzzle core.
//!
//! Every field has a serde default, so a partial JSON document (or `{}`)
//! yields the stock game configuration.

use serde::{Deserialize, Serialize};

use crate::transform::Axis;

/// Complete game configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GameConfig {
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub rules: PuzzleRules,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub camera: CameraConfig,
}

impl GameConfig {
    /// Loads a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes the configuration to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Physics world parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhysicsConfig {
    /// Gravity vector in world units per second squared.
    #[serde(default = "default_gravity")]
    pub gravity: [f32; 3],
    /// Fixed simulation timestep in seconds.
    #[serde(default = "default_timestep")]
    pub timestep: f32,
    /// Upper bound on fixed steps taken by a single `step_simulation` call.
    #[serde(default = "default_max_sub_steps")]
    pub max_sub_steps: u32,
    /// Constraint solver iterations per fixed step.
    #[serde(default = "default_solver_iterations")]
    pub solver_iterations: usize,
}

fn default_gravity() -> [f32; 3] {
    [0.0, -9.8, 0.0]
}

fn default_timestep() -> f32 {
    1.0 / 60.0
}

fn default_max_sub_steps() -> u32 {
    10
}

fn default_solver_iterations() -> usize {
    4
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: default_gravity(),
            timestep: default_timestep(),
            max_sub_steps: default_max_sub_steps(),
            solver_iterations: default_solver_iterations(),
        }
    }
}

/// Win/lose thresholds.
///
/// These are tuned against the stock ground slab (top face at `y = 0`) and
/// goal pad; they are not derived from the geometry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PuzzleRules {
    /// The ball is lost once its center drops below this height.
    #[serde(default = "default_lose_floor_y")]
    pub lose_floor_y: f32,
    /// Half-extent of the goal zone on both horizontal axes.
    #[serde(default = "default_goal_half_extent")]
    pub goal_half_extent: f32,
    /// Open vertical band `(min, max)` the ball center must lie in to win.
    #[serde(default = "default_win_band")]
    pub win_band: (f32, f32),
}

fn default_lose_floor_y() -> f32 {
    -2.0
}

fn default_goal_half_extent() -> f32 {
    1.0
}

fn default_win_band() -> (f32, f32) {
    (0.0, 1.0)
}

impl Default for PuzzleRules {
    fn default() -> Self {
        Self {
            lose_floor_y: default_lose_floor_y(),
            goal_half_extent: default_goal_half_extent(),
            win_band: default_win_band(),
        }
    }
}

/// Keyboard tilt parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct InputConfig {
    /// Rotation applied per frame while a tilt key is held (radians).
    #[serde(default = "default_tilt_step")]
    pub tilt_step: f32,
    /// Axis the selected platform is tilted about.
    #[serde(default)]
    pub tilt_axis: Axis,
}

fn default_tilt_step() -> f32 {
    0.03
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            tilt_step: default_tilt_step(),
            tilt_axis: Axis::Z,
        }
    }
}

/// Default camera used when a level does not place its own.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CameraConfig {
    #[serde(default = "default_camera_position")]
    pub position: [f32; 3],
    #[serde(default = "default_camera_look_at")]
    pub look_at: [f32; 3],
    /// Vertical field of view in degrees.
    #[serde(default = "default_fov_y")]
    pub fov_y: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
}

fn default_camera_position() -> [f32; 3] {
    [0.0, 7.0, 9.0]
}

fn default_camera_look_at() -> [f32; 3] {
    [0.0, 1.0, 0.0]
}

fn default_fov_y() -> f32 {
    60.0
}

fn default_near() -> f32 {
    0.1
}

fn default_far() -> f32 {
    100.0
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: default_camera_position(),
            look_at: default_camera_look_at(),
            fov_y: default_fov_y(),
            near: default_near(),
            far: default_far(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_yields_defaults() {
        let config = GameConfig::from_json("{}").expect("Failed to parse empty config");
        assert_eq!(config, GameConfig::default());
        assert_eq!(config.rules.lose_floor_y, -2.0);
        assert_eq!(config.rules.win_band, (0.0, 1.0));
        assert_eq!(config.physics.max_sub_steps, 10);
        assert_eq!(config.input.tilt_axis, Axis::Z);
    }

    #[test]
    fn test_partial_override() {
        let json = r#"{
            "rules": { "lose_floor_y": -5.0 },
            "input": { "tilt_step": 0.05, "tilt_axis": "x" }
        }"#;
        let config = GameConfig::from_json(json).expect("Failed to parse config");

        assert_eq!(config.rules.lose_floor_y, -5.0);
        assert_eq!(config.rules.goal_half_extent, 1.0);
        assert_eq!(config.input.tilt_step, 0.05);
        assert_eq!(config.input.tilt_axis, Axis::X);
        assert_eq!(config.physics, PhysicsConfig::default());
    }

    #[test]
    fn test_json_serialization_roundtrip() {
        let mut config = GameConfig::default();
        config.camera.position = [1.0, 2.0, 3.0];
        let json = config.to_json().expect("Failed to serialize");
        let loaded = GameConfig::from_json(&json).expect("Failed to deserialize");
        assert_eq!(loaded, config);
    }
}
