//! Scene lifecycle: owns the physics world, the scene graph and at most one
//! running puzzle session.

use crate::camera::Viewport;
use crate::config::GameConfig;
use crate::events::{SessionEvent, StatusTone};
use crate::input::InputEvent;
use crate::level::{LevelLoadError, LevelSource};
use crate::physics::PhysicsBackend;
use crate::progress::ProgressStore;
use crate::puzzle::PuzzleOutcome;
use crate::scene::{Renderer, SceneGraph};
use crate::session::PuzzleSession;
use crate::transform::PhysicsSyncError;

struct ActiveScene<P> {
    physics: P,
    scene: SceneGraph,
    session: PuzzleSession,
}

/// Starts, runs and stops puzzle sessions.
///
/// Each `start` builds a fresh physics world with `P::create`, so nothing
/// leaks from one level into the next. Per frame, [`tick`](Self::tick) runs
/// input, one physics step, transform sync and evaluation, then renders.
pub struct SceneController<P: PhysicsBackend, S: ProgressStore> {
    config: GameConfig,
    viewport: Viewport,
    levels: Box<dyn LevelSource>,
    progress: S,
    renderer: Box<dyn Renderer>,
    active: Option<ActiveScene<P>>,
}

impl<P: PhysicsBackend, S: ProgressStore> SceneController<P, S> {
    pub fn new(
        config: GameConfig,
        levels: Box<dyn LevelSource>,
        progress: S,
        renderer: Box<dyn Renderer>,
    ) -> Self {
        Self {
            config,
            viewport: Viewport::default(),
            levels,
            progress,
            renderer,
            active: None,
        }
    }

    #[must_use]
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    /// Stops any running session and starts `level` in a new world.
    ///
    /// On failure no session is running and the error is returned to the
    /// caller. Returns the level's startup status events.
    pub fn start(&mut self, level: &str) -> Result<Vec<SessionEvent>, LevelLoadError> {
        self.stop();

        let mut physics = P::create(&self.config.physics);
        let mut scene = SceneGraph::new();
        let session = PuzzleSession::load(
            self.levels.as_ref(),
            level,
            &self.config,
            self.viewport,
            &self.progress,
            &mut physics,
            &mut scene,
        )
        .inspect_err(|err| tracing::warn!("[scene] failed to start '{level}': {err}"))?;

        tracing::info!("[scene] started '{}'", session.name());
        let events = session.startup_events();
        self.active = Some(ActiveScene {
            physics,
            scene,
            session,
        });
        Ok(events)
    }

    /// Halts the running session, if any, and releases the renderer.
    pub fn stop(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };
        active
            .session
            .teardown(&mut active.physics, &mut active.scene);
        self.renderer.release();
        tracing::info!(
            "[scene] stopped '{}' after {} frames",
            active.session.name(),
            active.session.frame_count()
        );
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Routes an input event to the running session.
    pub fn handle_input(&mut self, event: &InputEvent) -> Vec<SessionEvent> {
        match &mut self.active {
            Some(active) => active.session.handle_input(event, &mut active.scene),
            None => Vec::new(),
        }
    }

    /// Runs one frame. Does nothing while stopped.
    pub fn tick(&mut self) -> Result<Vec<SessionEvent>, PhysicsSyncError> {
        let Some(active) = &mut self.active else {
            return Ok(Vec::new());
        };

        let mut events = active
            .session
            .frame(&mut active.physics, &mut active.scene)?;

        if events.contains(&SessionEvent::Won) {
            events.extend(grant_reward(&active.session, &mut self.progress));
        }

        self.renderer
            .render(&active.scene, active.session.camera());
        Ok(events)
    }

    /// Resets the running session's ball and outcome.
    pub fn reset(&mut self) -> Result<Vec<SessionEvent>, PhysicsSyncError> {
        match &mut self.active {
            Some(active) => active.session.reset(&mut active.physics, &mut active.scene),
            None => Ok(Vec::new()),
        }
    }

    pub fn outcome(&self) -> Option<PuzzleOutcome> {
        self.active.as_ref().map(|active| active.session.outcome())
    }

    pub fn session(&self) -> Option<&PuzzleSession> {
        self.active.as_ref().map(|active| &active.session)
    }

    pub fn scene(&self) -> Option<&SceneGraph> {
        self.active.as_ref().map(|active| &active.scene)
    }

    pub fn physics(&self) -> Option<&P> {
        self.active.as_ref().map(|active| &active.physics)
    }

    pub fn physics_mut(&mut self) -> Option<&mut P> {
        self.active.as_mut().map(|active| &mut active.physics)
    }

    pub fn progress(&self) -> &S {
        &self.progress
    }

    pub fn progress_mut(&mut self) -> &mut S {
        &mut self.progress
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
}

impl<P: PhysicsBackend, S: ProgressStore> Drop for SceneController<P, S> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Forwards the level's win reward to the progress store.
fn grant_reward(session: &PuzzleSession, progress: &mut dyn ProgressStore) -> Vec<SessionEvent> {
    let Some(reward) = session.reward() else {
        return Vec::new();
    };

    let mut events = Vec::new();
    if let Some(item) = &reward.award_item {
        progress.add_item(item);
        tracing::info!("[scene] awarded '{item}'");
        events.push(SessionEvent::ItemAwarded { item: item.clone() });
    }
    if let Some(level) = &reward.unlock_level {
        progress.unlock_level(level);
        tracing::info!("[scene] unlocked '{level}'");
        events.push(SessionEvent::LevelUnlocked {
            level: level.clone(),
        });
    }
    if let Some(message) = &reward.message {
        events.push(SessionEvent::status(message.as_str(), StatusTone::Success));
    }
    events
}
