//! Tilt-Puzzle Core Library
//!
//! Physics-synchronized puzzle core: a ball rolls under gravity across
//! player-tiltable platforms toward a goal zone, using `Rapier3D` behind the
//! [`PhysicsBackend`] interface.
//!
//! The core keeps visual and rigid-body transforms in lockstep, applies player
//! input as kinematic transform deltas, evaluates win/lose once per simulation
//! step, and builds levels from declarative JSON descriptions.

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod camera;
pub mod config;
pub mod entity;
pub mod events;
pub mod factory;
pub mod input;
pub mod level;
pub mod lifecycle;
pub mod physics;
pub mod progress;
pub mod puzzle;
pub mod scene;
pub mod selection;
pub mod session;
pub mod transform;

#[cfg(test)]
pub(crate) mod test_utils;

pub use camera::{Camera, PickRay, Viewport};
pub use config::{CameraConfig, GameConfig, InputConfig, PhysicsConfig, PuzzleRules};
pub use entity::{BodyRole, PhysicsEntity};
pub use events::{SessionEvent, StatusTone};
pub use factory::RotationOverride;
pub use input::{FrameInput, InputController, InputEvent, Key, TiltDirection};
pub use level::{
    BuiltinLevels, CameraPlacement, ConditionalPlatform, DirectorySource, LevelDescription,
    LevelLoadError, LevelSource, LoadedLevel, MemorySource, PlatformPlacement, PointPlacement,
    WinReward, build_level, load_level,
};
pub use lifecycle::SceneController;
pub use physics::{
    ActivationPolicy, BodyDesc, BodyHandle, BodyMode, BodyShape, PHYSICS_DT, PhysicsBackend,
    PhysicsWorld,
};
pub use progress::{ProgressData, ProgressStore};
pub use puzzle::{PuzzleOutcome, PuzzleStateMachine};
pub use scene::{
    Color, HeadlessRenderer, Material, Renderer, SceneGraph, Visual, VisualHandle, VisualShape,
};
pub use selection::SelectionController;
pub use session::PuzzleSession;
pub use transform::{
    Axis, EulerAngles, PhysicsSyncError, Pose, VelocityPolicy, pull_transform, push_transform,
};
