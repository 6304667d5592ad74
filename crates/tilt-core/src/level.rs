//! Declarative level descriptions and the loader that builds them.
//!
//! A level file is a JSON object. Every field is optional; missing fields
//! fall back to the defaults below. Construction order is fixed: ground,
//! platforms, conditional platforms, ball, goal, then selectable indices.
//! Conditional platforms are decided once, against the inventory as it is
//! when the level loads.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::entity::PhysicsEntity;
use crate::factory::{
    BALL_SPAWN, GOAL_SPAWN, RotationOverride, place, spawn_ball, spawn_goal_marker,
    spawn_ground, spawn_platform,
};
use crate::physics::PhysicsBackend;
use crate::progress::ProgressStore;
use crate::scene::{SceneGraph, VisualHandle};
use crate::transform::{EulerAngles, PhysicsSyncError};

/// Errors that abort level construction.
#[derive(Debug, thiserror::Error)]
pub enum LevelLoadError {
    #[error("Level not found: '{name}'")]
    NotFound { name: String },

    #[error("Failed to read level '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("Level '{name}' is malformed: {source}")]
    Malformed {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Sync(#[from] PhysicsSyncError),
}

/// Fallback height for platforms that omit `y`.
const PLATFORM_DEFAULT_Y: f32 = 1.0;

/// A platform pose. Missing coordinates default to `(0, 1, 0)`, missing
/// rotations to zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlatformPlacement {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z: Option<f32>,
    pub rx: Option<f32>,
    pub ry: Option<f32>,
    pub rz: Option<f32>,
}

impl PlatformPlacement {
    pub fn position(&self) -> Vec3 {
        Vec3::new(
            self.x.unwrap_or(0.0),
            self.y.unwrap_or(PLATFORM_DEFAULT_Y),
            self.z.unwrap_or(0.0),
        )
    }

    pub fn rotation(&self) -> EulerAngles {
        EulerAngles::new(
            self.rx.unwrap_or(0.0),
            self.ry.unwrap_or(0.0),
            self.rz.unwrap_or(0.0),
        )
    }
}

/// A platform that only exists when the player holds `required_item`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalPlatform {
    #[serde(flatten)]
    pub placement: PlatformPlacement,
    pub required_item: Option<String>,
    #[serde(default)]
    pub add_to_selectable: bool,
    pub status_message: Option<String>,
}

/// A point whose missing coordinates fall back to a per-object default.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointPlacement {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z: Option<f32>,
}

impl PointPlacement {
    pub fn position_or(&self, fallback: Vec3) -> Vec3 {
        Vec3::new(
            self.x.unwrap_or(fallback.x),
            self.y.unwrap_or(fallback.y),
            self.z.unwrap_or(fallback.z),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraPlacement {
    pub position: [f32; 3],
    pub look_at: [f32; 3],
}

/// Progress granted the first time the level is won.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinReward {
    pub award_item: Option<String>,
    pub unlock_level: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LevelDescription {
    pub name: Option<String>,
    pub platforms: Vec<PlatformPlacement>,
    pub conditional_platforms: Vec<ConditionalPlatform>,
    pub ball: Option<PointPlacement>,
    pub goal: Option<PointPlacement>,
    /// Indices into the spawned platform list, conditional platforms
    /// included. Out-of-range entries are ignored.
    pub selectable_indices: Vec<i64>,
    pub camera: Option<CameraPlacement>,
    pub on_win: Option<WinReward>,
}

impl LevelDescription {
    /// Parses a level document. `name` is only used for error reporting.
    pub fn from_json(name: &str, json: &str) -> Result<Self, LevelLoadError> {
        let malformed = |source| LevelLoadError::Malformed {
            name: name.to_string(),
            source,
        };

        let value: serde_json::Value = serde_json::from_str(json).map_err(malformed)?;
        if !value.is_object() {
            return Err(malformed(<serde_json::Error as serde::de::Error>::custom(
                "level description must be a JSON object",
            )));
        }
        serde_json::from_value(value).map_err(malformed)
    }
}

/// Where level documents come from.
pub trait LevelSource {
    /// Returns the raw JSON for `name`.
    fn fetch(&self, name: &str) -> Result<String, LevelLoadError>;

    fn load(&self, name: &str) -> Result<LevelDescription, LevelLoadError> {
        let json = self.fetch(name)?;
        LevelDescription::from_json(name, &json)
    }
}

/// Reads `<root>/<name>.json`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl LevelSource for DirectorySource {
    fn fetch(&self, name: &str) -> Result<String, LevelLoadError> {
        let path = self.root.join(format!("{name}.json"));
        std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                LevelLoadError::NotFound {
                    name: name.to_string(),
                }
            } else {
                LevelLoadError::Io {
                    name: name.to_string(),
                    source,
                }
            }
        })
    }
}

/// Levels held in memory, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    levels: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_level(mut self, name: &str, json: &str) -> Self {
        self.insert(name, json);
        self
    }

    pub fn insert(&mut self, name: &str, json: &str) {
        self.levels.insert(name.to_string(), json.to_string());
    }
}

impl LevelSource for MemorySource {
    fn fetch(&self, name: &str) -> Result<String, LevelLoadError> {
        self.levels
            .get(name)
            .cloned()
            .ok_or_else(|| LevelLoadError::NotFound {
                name: name.to_string(),
            })
    }
}

/// The stock campaign levels compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinLevels;

impl BuiltinLevels {
    pub const NAMES: [&'static str; 2] = ["level1", "level2"];
}

impl LevelSource for BuiltinLevels {
    fn fetch(&self, name: &str) -> Result<String, LevelLoadError> {
        let json = match name.to_ascii_lowercase().as_str() {
            "level1" => include_str!("../levels/level1.json"),
            "level2" => include_str!("../levels/level2.json"),
            _ => {
                return Err(LevelLoadError::NotFound {
                    name: name.to_string(),
                });
            }
        };
        Ok(json.to_string())
    }
}

/// Everything a level spawned, in spawn order.
#[derive(Debug, Clone)]
pub struct LoadedLevel {
    pub name: String,
    pub description: LevelDescription,
    pub ground: PhysicsEntity,
    pub platforms: Vec<PhysicsEntity>,
    pub ball: Option<PhysicsEntity>,
    /// Where reset puts the ball back.
    pub ball_spawn: Vec3,
    pub goal: Option<VisualHandle>,
    /// Entities to register for picking, in registration order.
    pub selectable: Vec<PhysicsEntity>,
    /// Status messages raised by conditional content.
    pub notifications: Vec<String>,
}

impl LoadedLevel {
    /// Entities that own a rigid body.
    pub fn entities(&self) -> impl Iterator<Item = &PhysicsEntity> {
        std::iter::once(&self.ground)
            .chain(self.platforms.iter())
            .chain(self.ball.iter())
    }

    pub fn goal_position(&self, scene: &SceneGraph) -> Option<Vec3> {
        self.goal
            .and_then(|goal| scene.get(goal))
            .map(|visual| visual.position)
    }

    /// Removes every spawned visual and body.
    pub fn despawn(&self, physics: &mut dyn PhysicsBackend, scene: &mut SceneGraph) {
        for entity in self.entities() {
            entity.despawn(physics, scene);
        }
        if let Some(goal) = self.goal {
            scene.remove_from_scene(goal);
        }
    }
}

/// Fetches `name` from `source` and builds it.
pub fn load_level(
    source: &dyn LevelSource,
    name: &str,
    progress: &dyn ProgressStore,
    physics: &mut dyn PhysicsBackend,
    scene: &mut SceneGraph,
) -> Result<LoadedLevel, LevelLoadError> {
    let description = source.load(name)?;
    build_level(name, description, progress, physics, scene)
}

/// Spawns a parsed level. On failure everything spawned so far is removed.
pub fn build_level(
    name: &str,
    description: LevelDescription,
    progress: &dyn ProgressStore,
    physics: &mut dyn PhysicsBackend,
    scene: &mut SceneGraph,
) -> Result<LoadedLevel, LevelLoadError> {
    let ground = spawn_ground(physics, scene);
    let mut level = LoadedLevel {
        name: description.name.clone().unwrap_or_else(|| name.to_string()),
        description,
        ground,
        platforms: Vec::new(),
        ball: None,
        ball_spawn: BALL_SPAWN,
        goal: None,
        selectable: Vec::new(),
        notifications: Vec::new(),
    };

    if let Err(err) = populate(&mut level, progress, physics, scene) {
        tracing::warn!("[level] failed to build '{}', rolling back: {err}", level.name);
        level.despawn(physics, scene);
        return Err(err.into());
    }

    tracing::info!(
        "[level] loaded '{}': {} platforms, {} selectable, ball={}, goal={}",
        level.name,
        level.platforms.len(),
        level.selectable.len(),
        level.ball.is_some(),
        level.goal.is_some(),
    );
    Ok(level)
}

fn spawn_placed_platform(
    physics: &mut dyn PhysicsBackend,
    scene: &mut SceneGraph,
    placement: &PlatformPlacement,
) -> Result<PhysicsEntity, PhysicsSyncError> {
    let platform = spawn_platform(physics, scene);
    if let Err(err) = place(
        physics,
        scene,
        &platform,
        placement.position(),
        RotationOverride::full(placement.rotation()),
    ) {
        platform.despawn(physics, scene);
        return Err(err);
    }
    Ok(platform)
}

fn populate(
    level: &mut LoadedLevel,
    progress: &dyn ProgressStore,
    physics: &mut dyn PhysicsBackend,
    scene: &mut SceneGraph,
) -> Result<(), PhysicsSyncError> {
    let description = level.description.clone();

    for placement in &description.platforms {
        let platform = spawn_placed_platform(physics, scene, placement)?;
        level.platforms.push(platform);
    }

    for conditional in &description.conditional_platforms {
        let held = conditional
            .required_item
            .as_deref()
            .is_some_and(|item| progress.has_item(item));
        if !held {
            tracing::debug!(
                "[level] skipping conditional platform, missing {:?}",
                conditional.required_item
            );
            continue;
        }

        let platform = spawn_placed_platform(physics, scene, &conditional.placement)?;
        level.platforms.push(platform);
        if conditional.add_to_selectable {
            level.selectable.push(platform);
        }
        if let Some(message) = &conditional.status_message {
            tracing::info!("[level] {message}");
            level.notifications.push(message.clone());
        }
    }

    if let Some(ball) = &description.ball {
        let spawn = ball.position_or(BALL_SPAWN);
        let entity = spawn_ball(physics, scene, spawn);
        level.ball = Some(entity);
        level.ball_spawn = spawn;
        place(physics, scene, &entity, spawn, RotationOverride::default())?;
    }

    if let Some(goal) = &description.goal {
        level.goal = Some(spawn_goal_marker(scene, goal.position_or(GOAL_SPAWN)));
    }

    for &index in &description.selectable_indices {
        match usize::try_from(index)
            .ok()
            .and_then(|i| level.platforms.get(i))
        {
            Some(platform) => {
                if !level.selectable.contains(platform) {
                    level.selectable.push(*platform);
                }
            }
            None => tracing::debug!("[level] ignoring selectable index {index}"),
        }
    }

    Ok(())
}
