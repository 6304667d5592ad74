//! Shared test fixtures.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use glam::Vec3;

use crate::camera::{Camera, Viewport};
use crate::config::{GameConfig, PhysicsConfig};
use crate::level::MemorySource;
use crate::physics::{ActivationPolicy, BodyDesc, BodyHandle, BodyMode, PhysicsBackend};
use crate::progress::ProgressStore;
use crate::scene::{Renderer, SceneGraph};
use crate::session::PuzzleSession;
use crate::transform::Pose;

#[derive(Debug, Clone)]
struct FakeBody {
    pose: Pose,
    linear_velocity: Vec3,
    angular_velocity: Vec3,
    mode: BodyMode,
    policy: ActivationPolicy,
    activations: u32,
}

/// Physics backend without gravity or contacts. Dynamic bodies drift at
/// their linear velocity; everything else stays where it is put.
#[derive(Debug, Clone)]
pub struct FakePhysics {
    bodies: BTreeMap<u32, FakeBody>,
    next_index: u32,
    timestep: f32,
    pub steps: u32,
    /// Number of successful `set_world_transform` calls before every later
    /// call fails as if the body were missing.
    pub fail_transforms_after: Option<usize>,
    transforms_set: usize,
}

impl Default for FakePhysics {
    fn default() -> Self {
        Self::create(&PhysicsConfig::default())
    }
}

impl FakePhysics {
    fn body(&self, handle: BodyHandle) -> Option<&FakeBody> {
        let (index, _) = handle.into_raw_parts();
        self.bodies.get(&index)
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut FakeBody> {
        let (index, _) = handle.into_raw_parts();
        self.bodies.get_mut(&index)
    }

    /// Moves a body without going through the transform bridge.
    pub fn teleport(&mut self, handle: BodyHandle, position: Vec3) {
        if let Some(body) = self.body_mut(handle) {
            body.pose.position = position;
        }
    }

    pub fn activations(&self, handle: BodyHandle) -> u32 {
        self.body(handle).map_or(0, |body| body.activations)
    }

    pub fn activation_policy(&self, handle: BodyHandle) -> Option<ActivationPolicy> {
        self.body(handle).map(|body| body.policy)
    }
}

impl PhysicsBackend for FakePhysics {
    fn create(config: &PhysicsConfig) -> Self {
        Self {
            bodies: BTreeMap::new(),
            next_index: 0,
            timestep: config.timestep,
            steps: 0,
            fail_transforms_after: None,
            transforms_set: 0,
        }
    }

    fn add_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let index = self.next_index;
        self.next_index += 1;
        self.bodies.insert(
            index,
            FakeBody {
                pose: desc.pose,
                linear_velocity: Vec3::ZERO,
                angular_velocity: Vec3::ZERO,
                mode: if desc.is_dynamic() {
                    BodyMode::Dynamic
                } else {
                    BodyMode::Static
                },
                policy: ActivationPolicy::Default,
                activations: 0,
            },
        );
        BodyHandle::from_raw_parts(index, 0)
    }

    fn remove_body(&mut self, body: BodyHandle) -> bool {
        let (index, _) = body.into_raw_parts();
        self.bodies.remove(&index).is_some()
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn step_simulation(&mut self, dt: f32, max_sub_steps: u32) -> u32 {
        if dt <= 0.0 || max_sub_steps == 0 {
            return 0;
        }
        let steps = ((dt / self.timestep).round().max(1.0) as u32).min(max_sub_steps);
        for _ in 0..steps {
            for body in self.bodies.values_mut() {
                if body.mode == BodyMode::Dynamic {
                    body.pose.position += body.linear_velocity * self.timestep;
                }
            }
        }
        self.steps += steps;
        steps
    }

    fn world_transform(&self, body: BodyHandle) -> Option<Pose> {
        self.body(body).map(|body| body.pose)
    }

    fn set_world_transform(&mut self, body: BodyHandle, pose: Pose) -> bool {
        if self
            .fail_transforms_after
            .is_some_and(|limit| self.transforms_set >= limit)
        {
            return false;
        }
        let Some(body) = self.body_mut(body) else {
            return false;
        };
        body.pose = pose;
        self.transforms_set += 1;
        true
    }

    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.body(body).map(|body| body.linear_velocity)
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3) -> bool {
        self.body_mut(body)
            .map(|body| body.linear_velocity = velocity)
            .is_some()
    }

    fn angular_velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.body(body).map(|body| body.angular_velocity)
    }

    fn set_angular_velocity(&mut self, body: BodyHandle, velocity: Vec3) -> bool {
        self.body_mut(body)
            .map(|body| body.angular_velocity = velocity)
            .is_some()
    }

    fn activate(&mut self, body: BodyHandle) -> bool {
        self.body_mut(body).map(|body| body.activations += 1).is_some()
    }

    fn is_sleeping(&self, body: BodyHandle) -> Option<bool> {
        self.body(body).map(|_| false)
    }

    fn body_mode(&self, body: BodyHandle) -> Option<BodyMode> {
        self.body(body).map(|body| body.mode)
    }

    fn set_body_mode(&mut self, body: BodyHandle, mode: BodyMode) -> bool {
        self.body_mut(body).map(|body| body.mode = mode).is_some()
    }

    fn set_activation_policy(&mut self, body: BodyHandle, policy: ActivationPolicy) -> bool {
        self.body_mut(body).map(|body| body.policy = policy).is_some()
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

/// One platform at the origin, default ball and goal, platform selectable.
pub fn single_platform_level() -> String {
    r#"{
        "name": "Single",
        "platforms": [ { "x": 0, "y": 1, "z": 0, "rx": -0.35 } ],
        "ball": {},
        "goal": {},
        "selectableIndices": [0]
    }"#
    .to_string()
}

/// Loads `json` as a session with the default configuration.
pub fn load_session(
    json: &str,
    progress: &dyn ProgressStore,
    physics: &mut dyn PhysicsBackend,
    scene: &mut SceneGraph,
) -> PuzzleSession {
    let source = MemorySource::new().with_level("test", json);
    PuzzleSession::load(
        &source,
        "test",
        &GameConfig::default(),
        Viewport::default(),
        progress,
        physics,
        scene,
    )
    .expect("test level should load")
}

/// Renderer whose counters stay readable after it is boxed away.
#[derive(Debug, Clone, Default)]
pub struct CountingRenderer {
    pub frames: Rc<Cell<u64>>,
    pub releases: Rc<Cell<u32>>,
}

impl Renderer for CountingRenderer {
    fn render(&mut self, _scene: &SceneGraph, _camera: &Camera) {
        self.frames.set(self.frames.get() + 1);
    }

    fn release(&mut self) {
        self.releases.set(self.releases.get() + 1);
    }
}
