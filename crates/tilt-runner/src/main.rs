//! Tilt-Puzzle Runner
//!
//! Plays the campaign headless: loads levels, replays scripted input, keeps
//! the save file up to date and prints the end-screen summary.
//!
//! Configuration comes from the environment:
//! - `TILT_LEVELS_DIR`: directory of `<level>.json` files (built-in levels if unset)
//! - `TILT_SAVE_FILE`: save file path (default `tilt-save.json`)
//! - `TILT_SCRIPT`: scripted input file
//! - `TILT_CONFIG`: game configuration JSON
//! - `TILT_MAX_FRAMES`: frame limit per level (default 1800)
//! - `TILT_CONTINUE`: resume from the last saved scene when `1` or `true`

use std::path::PathBuf;

use anyhow::Context;
use tilt_core::{
    BuiltinLevels, DirectorySource, GameConfig, HeadlessRenderer, LevelSource, PhysicsWorld,
    SceneController,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::campaign::{Campaign, first_scene};
use crate::save::SaveFile;
use crate::script::Script;

mod campaign;
mod save;
mod script;

const DEFAULT_SAVE_FILE: &str = "tilt-save.json";
const DEFAULT_MAX_FRAMES: u64 = 1800;

#[derive(Debug)]
struct RunnerOptions {
    levels_dir: Option<PathBuf>,
    save_file: PathBuf,
    script: Option<PathBuf>,
    config: Option<PathBuf>,
    max_frames: u64,
    continue_game: bool,
}

impl RunnerOptions {
    fn from_env() -> anyhow::Result<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        let max_frames = match var("TILT_MAX_FRAMES") {
            Some(value) => value
                .parse()
                .with_context(|| format!("TILT_MAX_FRAMES must be a frame count, got '{value}'"))?,
            None => DEFAULT_MAX_FRAMES,
        };

        Ok(Self {
            levels_dir: var("TILT_LEVELS_DIR").map(PathBuf::from),
            save_file: var("TILT_SAVE_FILE").map_or_else(|| PathBuf::from(DEFAULT_SAVE_FILE), PathBuf::from),
            script: var("TILT_SCRIPT").map(PathBuf::from),
            config: var("TILT_CONFIG").map(PathBuf::from),
            max_frames,
            continue_game: var("TILT_CONTINUE")
                .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true")),
        })
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let options = RunnerOptions::from_env()?;
    tracing::debug!("[runner] {options:?}");

    let config = match &options.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            GameConfig::from_json(&json)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => GameConfig::default(),
    };

    let levels: Box<dyn LevelSource> = match &options.levels_dir {
        Some(dir) => Box::new(DirectorySource::new(dir)),
        None => Box::new(BuiltinLevels),
    };

    let script = match &options.script {
        Some(path) => Script::load(path)
            .with_context(|| format!("failed to load script {}", path.display()))?,
        None => Script::default(),
    };

    let save = SaveFile::open(&options.save_file)?;
    let start = first_scene(options.continue_game, &save);
    tracing::info!("[runner] starting at {start}, saving to {}", save.path().display());

    let controller = SceneController::<PhysicsWorld, _>::new(
        config,
        levels,
        save,
        Box::new(HeadlessRenderer::default()),
    );
    let mut campaign = Campaign::new(controller, script, options.max_frames);
    let report = campaign.run(start)?;

    for level in &report.levels {
        println!("{}: {:?} ({} frames)", level.scene, level.result, level.frames);
    }
    println!("{}", report.summary());
    Ok(())
}
