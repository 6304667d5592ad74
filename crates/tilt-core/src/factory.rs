//! Factories for the puzzle's physics entities.
//!
//! Each factory builds a visual, a matching collision shape and (except for
//! the goal marker) a rigid body, and registers both halves with their
//! worlds. Default spawn poses can be overridden afterwards with [`place`].

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::entity::{BodyRole, PhysicsEntity};
use crate::physics::{ActivationPolicy, BodyDesc, BodyMode, BodyShape, PhysicsBackend};
use crate::scene::{Color, Material, SceneGraph, Visual, VisualHandle, VisualShape};
use crate::transform::{EulerAngles, PhysicsSyncError, Pose, VelocityPolicy, push_transform};

pub const GROUND_HALF_EXTENTS: Vec3 = Vec3::new(10.0, 0.25, 10.0);
pub const GROUND_POSITION: Vec3 = Vec3::new(0.0, -0.25, 0.0);
pub const GROUND_COLOR: Color = Color::from_hex(0x444444);

pub const BALL_RADIUS: f32 = 0.3;
pub const BALL_MASS: f32 = 1.0;
pub const BALL_SPAWN: Vec3 = Vec3::new(0.0, 2.2, -1.0);
pub const BALL_COLOR: Color = Color::from_hex(0xffcc00);

pub const PLATFORM_HALF_EXTENTS: Vec3 = Vec3::new(1.5, 0.15, 1.5);
pub const PLATFORM_SPAWN: Vec3 = Vec3::new(0.0, 1.0, 0.0);
/// Initial tilt about X so a freshly spawned platform already slopes.
pub const PLATFORM_TILT_X: f32 = -0.35;
pub const PLATFORM_COLOR: Color = Color::from_hex(0x00ff84);

pub const GOAL_HALF_EXTENTS: Vec3 = Vec3::new(1.0, 0.05, 1.0);
pub const GOAL_SPAWN: Vec3 = Vec3::new(0.0, 0.05, 1.5);
pub const GOAL_COLOR: Color = Color::from_hex(0x00aa44);
pub const GOAL_WON_COLOR: Color = Color::from_hex(0x22ff88);
pub const GOAL_LOST_COLOR: Color = Color::from_hex(0xaa0000);

const FRICTION: f32 = 0.5;

/// Per-axis rotation override. `None` keeps the entity's current angle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RotationOverride {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z: Option<f32>,
}

impl RotationOverride {
    pub const fn full(rotation: EulerAngles) -> Self {
        Self {
            x: Some(rotation.x),
            y: Some(rotation.y),
            z: Some(rotation.z),
        }
    }

    pub fn apply(&self, base: EulerAngles) -> EulerAngles {
        EulerAngles::new(
            self.x.unwrap_or(base.x),
            self.y.unwrap_or(base.y),
            self.z.unwrap_or(base.z),
        )
    }
}

fn spawn_box(
    physics: &mut dyn PhysicsBackend,
    scene: &mut SceneGraph,
    half_extents: Vec3,
    mass: f32,
    position: Vec3,
    rotation: EulerAngles,
    color: Color,
) -> (VisualHandle, crate::physics::BodyHandle) {
    let mut desc = BodyDesc::new(
        BodyShape::Cuboid { half_extents },
        mass,
        Pose::from_euler(position, rotation),
    );
    desc.friction = FRICTION;
    let body = physics.add_body(&desc);

    let mut visual = Visual::new(
        VisualShape::Box { half_extents },
        position,
        Material::solid(color),
    );
    visual.rotation = rotation;
    (scene.add_to_scene(visual), body)
}

/// The static floor slab. Its top face sits at `y = 0`.
pub fn spawn_ground(physics: &mut dyn PhysicsBackend, scene: &mut SceneGraph) -> PhysicsEntity {
    let (visual, body) = spawn_box(
        physics,
        scene,
        GROUND_HALF_EXTENTS,
        0.0,
        GROUND_POSITION,
        EulerAngles::ZERO,
        GROUND_COLOR,
    );
    tracing::trace!("[scene] spawned ground");
    PhysicsEntity::new(visual, body, BodyRole::Static)
}

/// The decorative goal pad. It has no body; the ball passes through it and
/// win detection reads its position directly.
pub fn spawn_goal_marker(scene: &mut SceneGraph, position: Vec3) -> VisualHandle {
    tracing::trace!("[scene] spawned goal marker at {position}");
    scene.add_to_scene(Visual::new(
        VisualShape::Box {
            half_extents: GOAL_HALF_EXTENTS,
        },
        position,
        Material::solid(GOAL_COLOR),
    ))
}

/// The dynamic ball, with mass and shape-derived inertia.
pub fn spawn_ball(
    physics: &mut dyn PhysicsBackend,
    scene: &mut SceneGraph,
    position: Vec3,
) -> PhysicsEntity {
    let mut desc = BodyDesc::new(
        BodyShape::Ball {
            radius: BALL_RADIUS,
        },
        BALL_MASS,
        Pose::new(position, Quat::IDENTITY),
    );
    desc.friction = FRICTION;
    let body = physics.add_body(&desc);
    let visual = scene.add_to_scene(Visual::new(
        VisualShape::Sphere {
            radius: BALL_RADIUS,
        },
        position,
        Material::solid(BALL_COLOR),
    ));
    tracing::trace!("[scene] spawned ball at {position}");
    PhysicsEntity::new(visual, body, BodyRole::Dynamic)
}

/// A tiltable platform at its default pose. The body is kinematic and never
/// sleeps, so transform pushes take effect even when it is motionless.
pub fn spawn_platform(physics: &mut dyn PhysicsBackend, scene: &mut SceneGraph) -> PhysicsEntity {
    let (visual, body) = spawn_box(
        physics,
        scene,
        PLATFORM_HALF_EXTENTS,
        0.0,
        PLATFORM_SPAWN,
        EulerAngles::new(PLATFORM_TILT_X, 0.0, 0.0),
        PLATFORM_COLOR,
    );
    physics.set_body_mode(body, BodyMode::Kinematic);
    physics.set_activation_policy(body, ActivationPolicy::NeverSleep);
    tracing::trace!("[scene] spawned platform");
    PhysicsEntity::new(visual, body, BodyRole::KinematicKeyframed)
}

/// Moves a freshly built entity to `position`, overriding the rotation axes
/// given in `rotation`. Velocity is left alone.
pub fn place(
    physics: &mut dyn PhysicsBackend,
    scene: &mut SceneGraph,
    entity: &PhysicsEntity,
    position: Vec3,
    rotation: RotationOverride,
) -> Result<(), PhysicsSyncError> {
    let current = scene
        .get(entity.visual)
        .ok_or(PhysicsSyncError::MissingVisual(entity.visual))?
        .rotation;
    push_transform(
        physics,
        scene,
        entity,
        position,
        rotation.apply(current),
        VelocityPolicy::Preserve,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::PhysicsWorld;
    use crate::test_utils::FakePhysics;
    use crate::transform::pull_transform;

    #[test]
    fn test_ball_is_dynamic() {
        let mut physics = PhysicsWorld::new();
        let mut scene = SceneGraph::new();
        let ball = spawn_ball(&mut physics, &mut scene, BALL_SPAWN);

        assert_eq!(ball.role, BodyRole::Dynamic);
        assert_eq!(physics.body_mode(ball.body), Some(BodyMode::Dynamic));
        assert_eq!(scene.get(ball.visual).unwrap().material.color, BALL_COLOR);
    }

    #[test]
    fn test_platform_is_kinematic_and_awake() {
        let mut physics = FakePhysics::default();
        let mut scene = SceneGraph::new();
        let platform = spawn_platform(&mut physics, &mut scene);

        assert_eq!(platform.role, BodyRole::KinematicKeyframed);
        assert_eq!(physics.body_mode(platform.body), Some(BodyMode::Kinematic));
        assert_eq!(
            physics.activation_policy(platform.body),
            Some(ActivationPolicy::NeverSleep)
        );

        let visual = scene.get(platform.visual).unwrap();
        assert_eq!(visual.position, PLATFORM_SPAWN);
        assert_eq!(visual.rotation.x, PLATFORM_TILT_X);
    }

    #[test]
    fn test_ground_is_static() {
        let mut physics = PhysicsWorld::new();
        let mut scene = SceneGraph::new();
        let ground = spawn_ground(&mut physics, &mut scene);

        assert_eq!(physics.body_mode(ground.body), Some(BodyMode::Static));
        physics.step_n(30);
        let pose = physics.world_transform(ground.body).unwrap();
        assert_eq!(pose.position, GROUND_POSITION);
    }

    #[test]
    fn test_goal_marker_has_no_body() {
        let mut physics = FakePhysics::default();
        let mut scene = SceneGraph::new();
        spawn_goal_marker(&mut scene, GOAL_SPAWN);

        assert_eq!(physics.body_count(), 0);
        assert_eq!(scene.len(), 1);
        assert_eq!(physics.step_simulation(1.0 / 60.0, 1), 1);
    }

    #[test]
    fn test_place_overrides_only_given_axes() {
        let mut physics = PhysicsWorld::new();
        let mut scene = SceneGraph::new();
        let platform = spawn_platform(&mut physics, &mut scene);

        place(
            &mut physics,
            &mut scene,
            &platform,
            Vec3::new(2.0, 1.5, -3.0),
            RotationOverride {
                z: Some(0.2),
                ..RotationOverride::default()
            },
        )
        .unwrap();

        let visual = scene.get(platform.visual).unwrap().clone();
        assert_eq!(visual.position, Vec3::new(2.0, 1.5, -3.0));
        assert_eq!(visual.rotation, EulerAngles::new(PLATFORM_TILT_X, 0.0, 0.2));

        let pose = pull_transform(&physics, &mut scene, &platform).unwrap();
        assert!(pose.approx_eq(&visual.pose(), 1e-5));
    }
}
