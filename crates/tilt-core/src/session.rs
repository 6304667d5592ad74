//! A single level being played.
//!
//! One `PuzzleSession` type serves every level; everything level-specific
//! comes from the [`LevelDescription`](crate::level::LevelDescription). The
//! session owns the spawned entities, the selection, buffered input and the
//! win/lose state, but borrows the physics world and scene graph from its
//! owner on every call.

use glam::Vec3;

use crate::camera::{Camera, Viewport};
use crate::config::GameConfig;
use crate::entity::PhysicsEntity;
use crate::events::{LOSE_STATUS, SessionEvent, StatusTone, WIN_STATUS};
use crate::factory::{GOAL_COLOR, GOAL_LOST_COLOR, GOAL_WON_COLOR};
use crate::input::{InputController, InputEvent};
use crate::level::{LevelLoadError, LevelSource, LoadedLevel, WinReward, load_level};
use crate::physics::PhysicsBackend;
use crate::progress::ProgressStore;
use crate::puzzle::{PuzzleOutcome, PuzzleStateMachine};
use crate::scene::{Color, SceneGraph};
use crate::selection::SelectionController;
use crate::transform::{EulerAngles, PhysicsSyncError, VelocityPolicy, pull_transform, push_transform};

#[derive(Debug)]
pub struct PuzzleSession {
    level: LoadedLevel,
    selection: SelectionController,
    input: InputController,
    puzzle: PuzzleStateMachine,
    camera: Camera,
    timestep: f32,
    max_sub_steps: u32,
    frame: u64,
}

impl PuzzleSession {
    /// Builds `name` into the given worlds and registers its selectables.
    pub fn load(
        source: &dyn LevelSource,
        name: &str,
        config: &GameConfig,
        viewport: Viewport,
        progress: &dyn ProgressStore,
        physics: &mut dyn PhysicsBackend,
        scene: &mut SceneGraph,
    ) -> Result<Self, LevelLoadError> {
        let level = load_level(source, name, progress, physics, scene)?;
        Ok(Self::from_level(level, config, viewport))
    }

    /// Wraps an already spawned level.
    pub fn from_level(level: LoadedLevel, config: &GameConfig, viewport: Viewport) -> Self {
        let mut selection = SelectionController::new();
        for entity in &level.selectable {
            selection.add_selectable(*entity);
        }

        let mut camera = Camera::from_config(&config.camera, viewport);
        if let Some(placement) = level.description.camera {
            camera.look_at(
                Vec3::from_array(placement.position),
                Vec3::from_array(placement.look_at),
            );
        }

        Self {
            level,
            selection,
            input: InputController::new(config.input),
            puzzle: PuzzleStateMachine::new(config.rules),
            camera,
            timestep: config.physics.timestep,
            max_sub_steps: config.physics.max_sub_steps,
            frame: 0,
        }
    }

    /// Status lines raised while the level was built.
    pub fn startup_events(&self) -> Vec<SessionEvent> {
        self.level
            .notifications
            .iter()
            .map(|message| SessionEvent::status(message.as_str(), StatusTone::Success))
            .collect()
    }

    pub fn level(&self) -> &LoadedLevel {
        &self.level
    }

    pub fn name(&self) -> &str {
        &self.level.name
    }

    pub fn outcome(&self) -> PuzzleOutcome {
        self.puzzle.outcome()
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn ball(&self) -> Option<&PhysicsEntity> {
        self.level.ball.as_ref()
    }

    pub fn reward(&self) -> Option<&WinReward> {
        self.level.description.on_win.as_ref()
    }

    /// Frames run so far.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Routes one input event. Pointer presses select immediately; keys and
    /// nudges wait for the next frame.
    pub fn handle_input(&mut self, event: &InputEvent, scene: &mut SceneGraph) -> Vec<SessionEvent> {
        if let InputEvent::PointerDown { ndc } = *event {
            if self.selection.on_pointer_down(ndc, &self.camera, scene) {
                let selected = self.selection.selected_index();
                tracing::debug!("[selection] selected {selected:?}");
                return vec![SessionEvent::SelectionChanged { selected }];
            }
            return Vec::new();
        }
        self.input.handle_event(event);
        Vec::new()
    }

    /// Applies this frame's buffered input.
    pub fn apply_input(
        &mut self,
        physics: &mut dyn PhysicsBackend,
        scene: &mut SceneGraph,
    ) -> Result<Vec<SessionEvent>, PhysicsSyncError> {
        let frame = self.input.take_frame();
        if frame.reset {
            return self.reset(physics, scene);
        }

        if let (Some(steps), Some(selected)) = (frame.tilt, self.selection.selected()) {
            self.input
                .apply_tilt(physics, scene, selected, steps, self.level.ball.as_ref())?;
        }
        Ok(Vec::new())
    }

    /// Advances the physics world by one fixed timestep.
    pub fn step(&self, physics: &mut dyn PhysicsBackend) -> u32 {
        physics.step_simulation(self.timestep, self.max_sub_steps)
    }

    /// Copies every dynamic body back onto its visual, then evaluates the
    /// puzzle against the ball's new position.
    pub fn sync_and_evaluate(
        &mut self,
        physics: &dyn PhysicsBackend,
        scene: &mut SceneGraph,
    ) -> Result<Vec<SessionEvent>, PhysicsSyncError> {
        let mut ball_position = None;
        for entity in self.level.entities().filter(|entity| entity.is_dynamic()) {
            let pose = pull_transform(physics, scene, entity)?;
            if Some(entity) == self.level.ball.as_ref() {
                ball_position = Some(pose.position);
            }
        }

        let goal = self.level.goal_position(scene);
        let Some(outcome) = self.puzzle.evaluate(ball_position, goal) else {
            return Ok(Vec::new());
        };

        let events = match outcome {
            PuzzleOutcome::Won => {
                tracing::info!("[session] '{}' complete at frame {}", self.level.name, self.frame);
                self.recolor_goal(scene, GOAL_WON_COLOR);
                vec![
                    SessionEvent::status(WIN_STATUS, StatusTone::Success),
                    SessionEvent::Won,
                ]
            }
            PuzzleOutcome::Lost => {
                tracing::info!("[session] '{}' lost at frame {}", self.level.name, self.frame);
                self.recolor_goal(scene, GOAL_LOST_COLOR);
                vec![
                    SessionEvent::status(LOSE_STATUS, StatusTone::Failure),
                    SessionEvent::Lost,
                ]
            }
            PuzzleOutcome::Playing => Vec::new(),
        };
        Ok(events)
    }

    /// Runs one frame: input, physics step, sync and evaluation.
    pub fn frame(
        &mut self,
        physics: &mut dyn PhysicsBackend,
        scene: &mut SceneGraph,
    ) -> Result<Vec<SessionEvent>, PhysicsSyncError> {
        let mut events = self.apply_input(physics, scene)?;
        self.step(physics);
        events.extend(self.sync_and_evaluate(physics, scene)?);
        self.frame += 1;
        Ok(events)
    }

    /// Puts the ball back at its spawn, at rest, and resumes play. Safe to
    /// call in any state and any number of times.
    pub fn reset(
        &mut self,
        physics: &mut dyn PhysicsBackend,
        scene: &mut SceneGraph,
    ) -> Result<Vec<SessionEvent>, PhysicsSyncError> {
        self.puzzle.reset();
        if let Some(ball) = &self.level.ball {
            push_transform(
                physics,
                scene,
                ball,
                self.level.ball_spawn,
                EulerAngles::ZERO,
                VelocityPolicy::Reset,
            )?;
        }
        self.recolor_goal(scene, GOAL_COLOR);
        tracing::info!("[session] '{}' reset", self.level.name);
        Ok(vec![SessionEvent::StatusCleared, SessionEvent::Reset])
    }

    fn recolor_goal(&self, scene: &mut SceneGraph, color: Color) {
        if let Some(visual) = self.level.goal.and_then(|goal| scene.get_mut(goal)) {
            visual.material.color = color;
        }
    }

    /// Clears the selection and removes every spawned entity.
    pub fn teardown(&mut self, physics: &mut dyn PhysicsBackend, scene: &mut SceneGraph) {
        self.selection.clear(scene);
        self.level.despawn(physics, scene);
    }
}
