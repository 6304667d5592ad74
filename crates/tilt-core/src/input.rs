//! Keyboard, touch and pointer input.
//!
//! Raw events are collected as they arrive and drained once per frame with
//! [`InputController::take_frame`]. Tilting rotates the selected platform's
//! visual about one axis and pushes the result through the transform bridge.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::InputConfig;
use crate::entity::PhysicsEntity;
use crate::physics::PhysicsBackend;
use crate::scene::SceneGraph;
use crate::transform::{PhysicsSyncError, VelocityPolicy, push_transform};

/// Logical keys the puzzle reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Key {
    TiltLeft,
    TiltRight,
    Reset,
}

impl Key {
    /// Maps a DOM-style `KeyboardEvent.code`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "KeyA" | "ArrowLeft" => Some(Self::TiltLeft),
            "KeyD" | "ArrowRight" => Some(Self::TiltRight),
            "KeyR" => Some(Self::Reset),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TiltDirection {
    /// Increases the angle.
    Left,
    /// Decreases the angle.
    Right,
}

impl TiltDirection {
    pub fn sign(self) -> f32 {
        match self {
            Self::Left => 1.0,
            Self::Right => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputEvent {
    KeyDown { key: Key },
    KeyUp { key: Key },
    /// Pointer press in normalized device coordinates.
    PointerDown { ndc: Vec2 },
    /// One tilt step, as from an on-screen button.
    Nudge { direction: TiltDirection },
    /// On-screen reset button.
    ResetPressed,
}

/// Input to apply this frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameInput {
    pub reset: bool,
    /// Net tilt in steps, `None` when no tilt source was active.
    pub tilt: Option<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct InputController {
    config: InputConfig,
    held: BTreeSet<Key>,
    reset_pending: bool,
    nudges: Vec<TiltDirection>,
}

impl InputController {
    pub fn new(config: InputConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// Records a keyboard or touch event. Pointer presses are not buffered;
    /// they are routed to selection immediately by the session.
    pub fn handle_event(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::KeyDown { key } => {
                // Reset fires on the press edge, not while held.
                if key == Key::Reset && !self.held.contains(&key) {
                    self.reset_pending = true;
                }
                self.held.insert(key);
            }
            InputEvent::KeyUp { key } => {
                self.held.remove(&key);
            }
            InputEvent::Nudge { direction } => self.nudges.push(direction),
            InputEvent::ResetPressed => self.reset_pending = true,
            InputEvent::PointerDown { .. } => {}
        }
    }

    /// Drains buffered input for one frame. A pending reset consumes the
    /// whole frame: no tilt is reported alongside it.
    pub fn take_frame(&mut self) -> FrameInput {
        if std::mem::take(&mut self.reset_pending) {
            self.nudges.clear();
            return FrameInput {
                reset: true,
                tilt: None,
            };
        }

        let mut active = false;
        let mut steps = 0.0;
        for (key, direction) in [
            (Key::TiltLeft, TiltDirection::Left),
            (Key::TiltRight, TiltDirection::Right),
        ] {
            if self.held.contains(&key) {
                active = true;
                steps += direction.sign();
            }
        }
        for direction in self.nudges.drain(..) {
            active = true;
            steps += direction.sign();
        }

        FrameInput {
            reset: false,
            tilt: active.then_some(steps),
        }
    }

    /// Rotates `selected` by `steps` tilt increments about the configured
    /// axis and wakes the ball so it reacts on the next step.
    pub fn apply_tilt(
        &self,
        physics: &mut dyn PhysicsBackend,
        scene: &mut SceneGraph,
        selected: &PhysicsEntity,
        steps: f32,
        ball: Option<&PhysicsEntity>,
    ) -> Result<(), PhysicsSyncError> {
        let visual = scene
            .get(selected.visual)
            .ok_or(PhysicsSyncError::MissingVisual(selected.visual))?;
        let axis = self.config.tilt_axis;
        let position = visual.position;
        let rotation = visual
            .rotation
            .with(axis, visual.rotation.get(axis) + steps * self.config.tilt_step);

        push_transform(
            physics,
            scene,
            selected,
            position,
            rotation,
            VelocityPolicy::Preserve,
        )?;
        if let Some(ball) = ball {
            physics.activate(ball.body);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::factory::{spawn_ball, spawn_platform};
    use crate::test_utils::FakePhysics;

    #[test]
    fn test_key_codes() {
        assert_eq!(Key::from_code("KeyA"), Some(Key::TiltLeft));
        assert_eq!(Key::from_code("KeyD"), Some(Key::TiltRight));
        assert_eq!(Key::from_code("KeyR"), Some(Key::Reset));
        assert_eq!(Key::from_code("KeyQ"), None);
    }

    #[test]
    fn test_held_keys_repeat_every_frame() {
        let mut input = InputController::default();
        input.handle_event(&InputEvent::KeyDown { key: Key::TiltLeft });

        assert_eq!(input.take_frame().tilt, Some(1.0));
        assert_eq!(input.take_frame().tilt, Some(1.0));

        input.handle_event(&InputEvent::KeyDown { key: Key::TiltRight });
        assert_eq!(input.take_frame().tilt, Some(0.0));

        input.handle_event(&InputEvent::KeyUp { key: Key::TiltLeft });
        input.handle_event(&InputEvent::KeyUp { key: Key::TiltRight });
        assert_eq!(input.take_frame(), FrameInput::default());
    }

    #[test]
    fn test_nudges_apply_once() {
        let mut input = InputController::default();
        input.handle_event(&InputEvent::Nudge {
            direction: TiltDirection::Right,
        });
        input.handle_event(&InputEvent::Nudge {
            direction: TiltDirection::Right,
        });

        assert_eq!(input.take_frame().tilt, Some(-2.0));
        assert_eq!(input.take_frame().tilt, None);
    }

    #[test]
    fn test_reset_is_edge_triggered_and_consumes_frame() {
        let mut input = InputController::default();
        input.handle_event(&InputEvent::KeyDown { key: Key::TiltLeft });
        input.handle_event(&InputEvent::KeyDown { key: Key::Reset });
        // Auto-repeat while held does not re-trigger.
        input.handle_event(&InputEvent::KeyDown { key: Key::Reset });

        let frame = input.take_frame();
        assert!(frame.reset);
        assert_eq!(frame.tilt, None);

        let frame = input.take_frame();
        assert!(!frame.reset);
        assert_eq!(frame.tilt, Some(1.0));

        input.handle_event(&InputEvent::KeyUp { key: Key::Reset });
        input.handle_event(&InputEvent::KeyDown { key: Key::Reset });
        assert!(input.take_frame().reset);
    }

    #[test]
    fn test_apply_tilt_rotates_about_axis() {
        let mut physics = FakePhysics::default();
        let mut scene = SceneGraph::new();
        let platform = spawn_platform(&mut physics, &mut scene);
        let ball = spawn_ball(&mut physics, &mut scene, Vec3::new(0.0, 2.2, -1.0));
        let input = InputController::default();

        input
            .apply_tilt(&mut physics, &mut scene, &platform, 1.0, Some(&ball))
            .unwrap();
        input
            .apply_tilt(&mut physics, &mut scene, &platform, 1.0, Some(&ball))
            .unwrap();

        let visual = scene.get(platform.visual).unwrap();
        assert!((visual.rotation.z - 0.06).abs() < 1e-6);
        assert!((visual.rotation.x + 0.35).abs() < 1e-6);

        let pose = physics.world_transform(platform.body).unwrap();
        assert!(pose.approx_eq(&visual.pose(), 1e-5));
        assert_eq!(physics.activations(ball.body), 2);
    }
}
