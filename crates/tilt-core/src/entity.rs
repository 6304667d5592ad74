//! Paired visual/body entities.

use serde::{Deserialize, Serialize};

use crate::physics::{BodyHandle, PhysicsBackend};
use crate::scene::{SceneGraph, VisualHandle};

/// How a body participates in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyRole {
    /// Driven by the engine; its visual follows the body.
    Dynamic,
    /// Positioned by gameplay code each frame; the body follows the visual.
    KinematicKeyframed,
    /// Never moves after placement.
    Static,
}

/// A visual object and the rigid body that represents it in the physics
/// world. The two are created together and must be destroyed together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicsEntity {
    pub visual: VisualHandle,
    pub body: BodyHandle,
    pub role: BodyRole,
}

impl PhysicsEntity {
    pub const fn new(visual: VisualHandle, body: BodyHandle, role: BodyRole) -> Self {
        Self { visual, body, role }
    }

    pub fn is_dynamic(&self) -> bool {
        self.role == BodyRole::Dynamic
    }

    /// Removes both halves. Missing halves are ignored.
    pub fn despawn(&self, physics: &mut dyn PhysicsBackend, scene: &mut SceneGraph) {
        physics.remove_body(self.body);
        scene.remove_from_scene(self.visual);
    }
}
