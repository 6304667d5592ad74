//! Scene flow: Level1, Level2, then the end screen.

use anyhow::Context;
use tilt_core::{
    PhysicsBackend, ProgressStore, PuzzleOutcome, SceneController, SessionEvent,
};

use crate::save::SaveFile;
use crate::script::Script;

pub const LEVEL_ORDER: [&str; 2] = ["Level1", "Level2"];
pub const END_SCENE: &str = "End";
pub const BADGES: [&str; 2] = ["GoldenBadge", "PlatinumBadge"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelResult {
    Won,
    Lost,
    /// No outcome within the frame limit.
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelReport {
    pub scene: String,
    pub result: LevelResult,
    pub frames: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignReport {
    pub levels: Vec<LevelReport>,
    pub collected_all: bool,
}

impl CampaignReport {
    /// End-screen line.
    pub fn summary(&self) -> &'static str {
        if self.collected_all {
            "You collected ALL items!"
        } else {
            "You missed some items..."
        }
    }
}

/// Where a new run starts. Continuing resumes the last saved scene.
pub fn first_scene(continue_game: bool, save: &SaveFile) -> &'static str {
    if !continue_game {
        return LEVEL_ORDER[0];
    }
    let last = save.last_scene().unwrap_or(LEVEL_ORDER[0]);
    LEVEL_ORDER
        .into_iter()
        .chain([END_SCENE])
        .find(|scene| *scene == last)
        .unwrap_or(LEVEL_ORDER[0])
}

pub struct Campaign<P: PhysicsBackend> {
    controller: SceneController<P, SaveFile>,
    script: Script,
    max_frames: u64,
}

impl<P: PhysicsBackend> Campaign<P> {
    pub fn new(controller: SceneController<P, SaveFile>, script: Script, max_frames: u64) -> Self {
        Self {
            controller,
            script,
            max_frames,
        }
    }

    pub fn save(&self) -> &SaveFile {
        self.controller.progress()
    }

    /// Plays every level from `start` onwards, then shows the end screen.
    /// Each level ends at its first outcome or at the frame limit.
    pub fn run(&mut self, start: &str) -> anyhow::Result<CampaignReport> {
        let first = LEVEL_ORDER
            .iter()
            .position(|scene| *scene == start)
            .unwrap_or(LEVEL_ORDER.len());

        let mut levels = Vec::new();
        for scene in &LEVEL_ORDER[first..] {
            levels.push(self.play(scene)?);
        }

        self.controller.progress_mut().set_last_scene(END_SCENE);
        let collected_all = BADGES
            .iter()
            .all(|badge| self.controller.progress().has_item(badge));
        let report = CampaignReport {
            levels,
            collected_all,
        };
        tracing::info!("[campaign] {}", report.summary());
        Ok(report)
    }

    fn play(&mut self, scene: &str) -> anyhow::Result<LevelReport> {
        self.controller.progress_mut().set_last_scene(scene);
        let startup = self
            .controller
            .start(&scene.to_ascii_lowercase())
            .with_context(|| format!("failed to start {scene}"))?;
        log_events(scene, &startup);

        let viewport = self.controller.viewport();
        let mut frames = 0;
        let mut result = LevelResult::TimedOut;
        while frames < self.max_frames {
            for event in self.script.events_at(scene, frames, &viewport) {
                let events = self.controller.handle_input(&event);
                log_events(scene, &events);
            }
            let events = self
                .controller
                .tick()
                .with_context(|| format!("{scene} desynchronized at frame {frames}"))?;
            log_events(scene, &events);
            frames += 1;

            match self.controller.outcome() {
                Some(PuzzleOutcome::Won) => {
                    result = LevelResult::Won;
                    break;
                }
                Some(PuzzleOutcome::Lost) => {
                    result = LevelResult::Lost;
                    break;
                }
                _ => {}
            }
        }
        self.controller.stop();

        tracing::info!("[campaign] {scene}: {result:?} after {frames} frames");
        Ok(LevelReport {
            scene: scene.to_string(),
            result,
            frames,
        })
    }
}

fn log_events(scene: &str, events: &[SessionEvent]) {
    for event in events {
        match event {
            SessionEvent::Status { text, .. } => tracing::info!("[campaign] {scene}: {text}"),
            other => tracing::debug!("[campaign] {scene}: {other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tilt_core::{BuiltinLevels, GameConfig, HeadlessRenderer, PhysicsWorld};

    use super::*;

    fn temp_save(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("tilt-campaign-{}-{name}", std::process::id()))
            .join("save.json")
    }

    fn campaign(path: &PathBuf, max_frames: u64) -> Campaign<PhysicsWorld> {
        let controller = SceneController::new(
            GameConfig::default(),
            Box::new(BuiltinLevels),
            SaveFile::open(path).unwrap(),
            Box::new(HeadlessRenderer::default()),
        );
        Campaign::new(controller, Script::default(), max_frames)
    }

    #[test]
    fn test_full_run_reaches_end_screen() {
        let path = temp_save("full");
        let mut campaign = campaign(&path, 30);

        let report = campaign.run("Level1").unwrap();

        assert_eq!(report.levels.len(), 2);
        assert_eq!(report.levels[0].scene, "Level1");
        assert_eq!(report.levels[1].scene, "Level2");
        assert_eq!(campaign.save().last_scene(), Some(END_SCENE));
        assert_eq!(
            report.collected_all,
            BADGES.iter().all(|b| campaign.save().has_item(b))
        );

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_continue_resumes_saved_scene() {
        let path = temp_save("continue");
        let mut save = SaveFile::open(&path).unwrap();
        assert_eq!(first_scene(true, &save), "Level1");

        save.set_last_scene("Level2");
        assert_eq!(first_scene(true, &save), "Level2");
        assert_eq!(first_scene(false, &save), "Level1");

        let mut campaign = campaign(&path, 10);
        let report = campaign.run("Level2").unwrap();
        assert_eq!(report.levels.len(), 1);
        assert_eq!(report.levels[0].result, LevelResult::TimedOut);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_summary_lines() {
        let mut report = CampaignReport {
            levels: Vec::new(),
            collected_all: true,
        };
        assert_eq!(report.summary(), "You collected ALL items!");
        report.collected_all = false;
        assert_eq!(report.summary(), "You missed some items...");
    }
}
