//! Transform bridge between visual objects and rigid bodies.
//!
//! Visuals store orientation as XYZ-order Euler angles (the convention level
//! files and keyboard tilt use); bodies store a position plus unit quaternion.
//! [`push_transform`] writes a visual-side transform into both worlds and
//! [`pull_transform`] copies a simulated body back onto its visual.

use glam::{EulerRot, Quat, Vec3};
use rapier3d::na::{Isometry3, Quaternion, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::{BodyRole, PhysicsEntity};
use crate::physics::{BodyHandle, PhysicsBackend};
use crate::scene::{SceneGraph, VisualHandle};

/// Errors raised when an entity's two halves fall out of step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhysicsSyncError {
    #[error("Rigid body {0:?} is not present in the physics world")]
    MissingBody(BodyHandle),

    #[error("Visual {0:?} is not present in the scene")]
    MissingVisual(VisualHandle),
}

/// Rotation axis selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    #[default]
    Z,
}

/// Rotation in radians about X, then Y, then Z.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EulerAngles {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl EulerAngles {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn to_quat(self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.x, self.y, self.z)
    }

    pub fn from_quat(rotation: Quat) -> Self {
        let (x, y, z) = rotation.to_euler(EulerRot::XYZ);
        Self { x, y, z }
    }

    pub fn get(self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Returns a copy with one component replaced.
    #[must_use]
    pub fn with(mut self, axis: Axis, value: f32) -> Self {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
        }
        self
    }
}

/// World-space position and orientation of a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
    };

    pub const fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn from_euler(position: Vec3, rotation: EulerAngles) -> Self {
        Self::new(position, rotation.to_quat())
    }

    pub fn euler(&self) -> EulerAngles {
        EulerAngles::from_quat(self.orientation)
    }

    pub fn to_isometry(&self) -> Isometry3<f32> {
        let q = self.orientation;
        Isometry3::from_parts(
            Translation3::new(self.position.x, self.position.y, self.position.z),
            UnitQuaternion::new_normalize(Quaternion::new(q.w, q.x, q.y, q.z)),
        )
    }

    pub fn from_isometry(isometry: &Isometry3<f32>) -> Self {
        let t = isometry.translation.vector;
        let q = isometry.rotation.quaternion().coords;
        Self {
            position: Vec3::new(t.x, t.y, t.z),
            orientation: Quat::from_xyzw(q.x, q.y, q.z, q.w),
        }
    }

    /// Compares positions component-wise and orientations up to sign.
    pub fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.position.abs_diff_eq(other.position, epsilon)
            && self.orientation.dot(other.orientation).abs() >= 1.0 - epsilon
    }
}

pub(crate) fn to_na_vector(v: Vec3) -> Vector3<f32> {
    Vector3::new(v.x, v.y, v.z)
}

pub(crate) fn from_na_vector(v: &Vector3<f32>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

/// What happens to a body's velocity when its transform is assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VelocityPolicy {
    /// Keep whatever velocity the body already has.
    #[default]
    Preserve,
    /// Zero linear and angular velocity (dynamic bodies only).
    Reset,
}

/// Assigns an entity's transform on both the visual and the body, then wakes
/// the body so the next step sees the new pose.
pub fn push_transform(
    physics: &mut dyn PhysicsBackend,
    scene: &mut SceneGraph,
    entity: &PhysicsEntity,
    position: Vec3,
    rotation: EulerAngles,
    velocity: VelocityPolicy,
) -> Result<(), PhysicsSyncError> {
    if !scene.contains(entity.visual) {
        return Err(PhysicsSyncError::MissingVisual(entity.visual));
    }

    let pose = Pose::from_euler(position, rotation);
    if !physics.set_world_transform(entity.body, pose) {
        return Err(PhysicsSyncError::MissingBody(entity.body));
    }

    if let Some(visual) = scene.get_mut(entity.visual) {
        visual.position = position;
        visual.rotation = rotation;
    }

    if velocity == VelocityPolicy::Reset && entity.role == BodyRole::Dynamic {
        physics.set_linear_velocity(entity.body, Vec3::ZERO);
        physics.set_angular_velocity(entity.body, Vec3::ZERO);
    }

    physics.activate(entity.body);
    Ok(())
}

/// Copies the body's simulated transform onto its visual.
pub fn pull_transform(
    physics: &dyn PhysicsBackend,
    scene: &mut SceneGraph,
    entity: &PhysicsEntity,
) -> Result<Pose, PhysicsSyncError> {
    let pose = physics
        .world_transform(entity.body)
        .ok_or(PhysicsSyncError::MissingBody(entity.body))?;
    let visual = scene
        .get_mut(entity.visual)
        .ok_or(PhysicsSyncError::MissingVisual(entity.visual))?;

    visual.position = pose.position;
    visual.rotation = pose.euler();
    Ok(pose)
}
