//! Physics backend interface and its `Rapier3D` implementation.
//!
//! The puzzle core never touches engine types directly: factories, the
//! transform bridge and the session loop all talk to a [`PhysicsBackend`],
//! which exposes exactly the body-level operations the game needs.

use std::fmt;
use std::num::NonZeroUsize;

use glam::Vec3;
use rapier3d::na::Vector3;
use rapier3d::prelude::{
    CCDSolver, ColliderBuilder, ColliderSet, DefaultBroadPhase, ImpulseJointSet,
    IntegrationParameters, IslandManager, MultibodyJointSet, NarrowPhase, PhysicsPipeline,
    RigidBody, RigidBodyActivation, RigidBodyBuilder, RigidBodyHandle, RigidBodySet,
    RigidBodyType,
};
use serde::{Deserialize, Serialize};

use crate::config::PhysicsConfig;
use crate::transform::{Pose, from_na_vector, to_na_vector};

/// Fixed timestep for physics simulation (60Hz).
pub const PHYSICS_DT: f32 = 1.0 / 60.0;

/// Default cap on fixed steps per `step_simulation` call.
pub const MAX_SUB_STEPS: u32 = 10;

/// Opaque handle to a rigid body owned by a [`PhysicsBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle {
    index: u32,
    generation: u32,
}

impl BodyHandle {
    pub const fn from_raw_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub const fn into_raw_parts(self) -> (u32, u32) {
        (self.index, self.generation)
    }
}

/// Collision shape attached to a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BodyShape {
    Cuboid { half_extents: Vec3 },
    Ball { radius: f32 },
}

/// How the engine moves a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyMode {
    /// Advanced by gravity, forces and contacts.
    Dynamic,
    /// Never moves.
    Static,
    /// Moved only by direct transform assignment.
    Kinematic,
}

/// Whether the engine may put a motionless body to sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActivationPolicy {
    #[default]
    Default,
    NeverSleep,
}

/// Construction parameters for a single-collider rigid body.
///
/// A positive `mass` produces a dynamic body whose inertia is computed from
/// the shape; zero mass produces a static body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyDesc {
    pub shape: BodyShape,
    pub mass: f32,
    pub pose: Pose,
    pub friction: f32,
    pub restitution: f32,
}

impl BodyDesc {
    pub fn new(shape: BodyShape, mass: f32, pose: Pose) -> Self {
        Self {
            shape,
            mass,
            pose,
            friction: 0.5,
            restitution: 0.0,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        self.mass > 0.0
    }
}

/// The physics world as seen by the puzzle core.
///
/// Mutators return `false` when the handle does not refer to a live body.
pub trait PhysicsBackend {
    /// Builds a fresh world.
    fn create(config: &PhysicsConfig) -> Self
    where
        Self: Sized;

    /// Inserts a body and its collider into the world.
    fn add_body(&mut self, desc: &BodyDesc) -> BodyHandle;

    /// Removes a body and its collider.
    fn remove_body(&mut self, body: BodyHandle) -> bool;

    /// Advances the world by `dt`, in whole fixed steps, taking at most
    /// `max_sub_steps` of them. Returns the number of steps taken.
    fn step_simulation(&mut self, dt: f32, max_sub_steps: u32) -> u32;

    /// Reads the body's current world transform.
    fn world_transform(&self, body: BodyHandle) -> Option<Pose>;

    fn set_world_transform(&mut self, body: BodyHandle, pose: Pose) -> bool;

    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec3>;

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3) -> bool;

    fn angular_velocity(&self, body: BodyHandle) -> Option<Vec3>;

    fn set_angular_velocity(&mut self, body: BodyHandle, velocity: Vec3) -> bool;

    /// Wakes the body so it is processed on the next step.
    fn activate(&mut self, body: BodyHandle) -> bool;

    fn is_sleeping(&self, body: BodyHandle) -> Option<bool>;

    fn body_mode(&self, body: BodyHandle) -> Option<BodyMode>;

    fn set_body_mode(&mut self, body: BodyHandle, mode: BodyMode) -> bool;

    fn set_activation_policy(&mut self, body: BodyHandle, policy: ActivationPolicy) -> bool;

    fn body_count(&self) -> usize;
}

/// Physics world containing all `Rapier3D` components.
pub struct PhysicsWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub gravity: Vector3<f32>,
    pub frame: u64,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("frame", &self.frame)
            .field("rigid_body_count", &self.rigid_body_set.len())
            .field("collider_count", &self.collider_set.len())
            .field("gravity", &self.gravity)
            .finish_non_exhaustive()
    }
}

impl PhysicsWorld {
    /// Creates a new physics world with default settings.
    pub fn new() -> Self {
        Self::with_config(&PhysicsConfig::default())
    }

    /// Creates a new physics world from configuration.
    pub fn with_config(config: &PhysicsConfig) -> Self {
        let mut integration_parameters = IntegrationParameters {
            dt: config.timestep,
            ..Default::default()
        };
        if let Some(iterations) = NonZeroUsize::new(config.solver_iterations) {
            integration_parameters.num_solver_iterations = iterations;
        }

        let [gx, gy, gz] = config.gravity;

        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            gravity: Vector3::new(gx, gy, gz),
            frame: 0,
        }
    }

    /// Advances the physics simulation by one fixed timestep.
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
        self.frame += 1;
    }

    /// Advances the physics simulation by multiple steps.
    pub fn step_n(&mut self, n: u32) {
        for _ in 0..n {
            self.step();
        }
    }

    /// Returns the current simulation frame number.
    pub fn current_frame(&self) -> u64 {
        self.frame
    }

    /// Gets an immutable reference to a rigid body.
    pub fn get_rigid_body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.rigid_body_set.get(to_rapier(handle))
    }

    /// Gets a mutable reference to a rigid body.
    pub fn get_rigid_body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.rigid_body_set.get_mut(to_rapier(handle))
    }

    fn with_body(&mut self, handle: BodyHandle, f: impl FnOnce(&mut RigidBody)) -> bool {
        match self.get_rigid_body_mut(handle) {
            Some(body) => {
                f(body);
                true
            }
            None => false,
        }
    }
}

fn to_rapier(handle: BodyHandle) -> RigidBodyHandle {
    let (index, generation) = handle.into_raw_parts();
    RigidBodyHandle::from_raw_parts(index, generation)
}

fn from_rapier(handle: RigidBodyHandle) -> BodyHandle {
    let (index, generation) = handle.into_raw_parts();
    BodyHandle::from_raw_parts(index, generation)
}

impl PhysicsBackend for PhysicsWorld {
    fn create(config: &PhysicsConfig) -> Self {
        Self::with_config(config)
    }

    fn add_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let body_type = if desc.is_dynamic() {
            RigidBodyType::Dynamic
        } else {
            RigidBodyType::Fixed
        };
        let body = RigidBodyBuilder::new(body_type)
            .position(desc.pose.to_isometry())
            .build();
        let handle = self.rigid_body_set.insert(body);

        let mut collider = match desc.shape {
            BodyShape::Cuboid { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
            BodyShape::Ball { radius } => ColliderBuilder::ball(radius),
        }
        .friction(desc.friction)
        .restitution(desc.restitution);
        if desc.is_dynamic() {
            collider = collider.mass(desc.mass);
        }
        self.collider_set
            .insert_with_parent(collider.build(), handle, &mut self.rigid_body_set);

        from_rapier(handle)
    }

    fn remove_body(&mut self, body: BodyHandle) -> bool {
        self.rigid_body_set
            .remove(
                to_rapier(body),
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            )
            .is_some()
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn step_simulation(&mut self, dt: f32, max_sub_steps: u32) -> u32 {
        if dt <= 0.0 || max_sub_steps == 0 {
            return 0;
        }
        let ratio = dt / self.integration_parameters.dt;
        let steps = (ratio.round().max(1.0) as u32).min(max_sub_steps);
        self.step_n(steps);
        steps
    }

    fn world_transform(&self, body: BodyHandle) -> Option<Pose> {
        self.get_rigid_body(body)
            .map(|body| Pose::from_isometry(body.position()))
    }

    fn set_world_transform(&mut self, body: BodyHandle, pose: Pose) -> bool {
        let isometry = pose.to_isometry();
        self.with_body(body, |body| body.set_position(isometry, false))
    }

    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.get_rigid_body(body)
            .map(|body| from_na_vector(body.linvel()))
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3) -> bool {
        self.with_body(body, |body| body.set_linvel(to_na_vector(velocity), false))
    }

    fn angular_velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.get_rigid_body(body)
            .map(|body| from_na_vector(body.angvel()))
    }

    fn set_angular_velocity(&mut self, body: BodyHandle, velocity: Vec3) -> bool {
        self.with_body(body, |body| body.set_angvel(to_na_vector(velocity), false))
    }

    fn activate(&mut self, body: BodyHandle) -> bool {
        self.with_body(body, |body| body.wake_up(true))
    }

    fn is_sleeping(&self, body: BodyHandle) -> Option<bool> {
        self.get_rigid_body(body).map(RigidBody::is_sleeping)
    }

    fn body_mode(&self, body: BodyHandle) -> Option<BodyMode> {
        self.get_rigid_body(body).map(|body| match body.body_type() {
            RigidBodyType::Dynamic => BodyMode::Dynamic,
            RigidBodyType::Fixed => BodyMode::Static,
            RigidBodyType::KinematicPositionBased | RigidBodyType::KinematicVelocityBased => {
                BodyMode::Kinematic
            }
        })
    }

    fn set_body_mode(&mut self, body: BodyHandle, mode: BodyMode) -> bool {
        let body_type = match mode {
            BodyMode::Dynamic => RigidBodyType::Dynamic,
            BodyMode::Static => RigidBodyType::Fixed,
            BodyMode::Kinematic => RigidBodyType::KinematicPositionBased,
        };
        self.with_body(body, |body| body.set_body_type(body_type, true))
    }

    fn set_activation_policy(&mut self, body: BodyHandle, policy: ActivationPolicy) -> bool {
        self.with_body(body, |body| {
            *body.activation_mut() = match policy {
                ActivationPolicy::Default => RigidBodyActivation::active(),
                ActivationPolicy::NeverSleep => RigidBodyActivation::cannot_sleep(),
            };
            body.wake_up(true);
        })
    }

    fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }
}
