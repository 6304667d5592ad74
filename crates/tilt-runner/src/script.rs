//! Scripted input: timed actions replayed into a running level.
//!
//! ```json
//! {
//!   "levels": {
//!     "Level1": [
//!       { "frame": 0, "action": { "pointer": [640, 360] } },
//!       { "frame": 1, "action": { "keyDown": "KeyA" } },
//!       { "frame": 40, "action": { "keyUp": "KeyA" } }
//!     ]
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tilt_core::{InputEvent, Key, TiltDirection, Viewport};

#[derive(thiserror::Error, Debug)]
pub enum ScriptError {
    #[error("Failed to read script: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid script: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScriptAction {
    /// Key press by DOM key code, e.g. `KeyA`.
    KeyDown(String),
    KeyUp(String),
    /// Pointer press in pixels.
    Pointer([f32; 2]),
    Nudge(TiltDirection),
    Reset,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptEntry {
    pub frame: u64,
    pub action: ScriptAction,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Script {
    #[serde(default)]
    levels: BTreeMap<String, Vec<ScriptEntry>>,
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Input events scheduled for `frame` of `scene`, in file order.
    pub fn events_at(&self, scene: &str, frame: u64, viewport: &Viewport) -> Vec<InputEvent> {
        let Some(entries) = self.levels.get(scene) else {
            return Vec::new();
        };
        entries
            .iter()
            .filter(|entry| entry.frame == frame)
            .filter_map(|entry| to_event(&entry.action, viewport))
            .collect()
    }
}

fn to_event(action: &ScriptAction, viewport: &Viewport) -> Option<InputEvent> {
    let key = |code: &str| {
        let key = Key::from_code(code);
        if key.is_none() {
            tracing::debug!("[script] unmapped key code {code}");
        }
        key
    };
    match action {
        ScriptAction::KeyDown(code) => key(code).map(|key| InputEvent::KeyDown { key }),
        ScriptAction::KeyUp(code) => key(code).map(|key| InputEvent::KeyUp { key }),
        ScriptAction::Pointer([x, y]) => Some(InputEvent::PointerDown {
            ndc: viewport.to_ndc(*x, *y),
        }),
        ScriptAction::Nudge(direction) => Some(InputEvent::Nudge {
            direction: *direction,
        }),
        ScriptAction::Reset => Some(InputEvent::ResetPressed),
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;

    const SCRIPT: &str = r#"{
        "levels": {
            "Level1": [
                { "frame": 0, "action": { "pointer": [640, 360] } },
                { "frame": 0, "action": { "keyDown": "KeyA" } },
                { "frame": 3, "action": { "keyDown": "KeyQ" } },
                { "frame": 5, "action": { "nudge": "right" } },
                { "frame": 5, "action": "reset" }
            ]
        }
    }"#;

    #[test]
    fn test_events_by_frame() {
        let script = Script::from_json(SCRIPT).unwrap();
        let viewport = Viewport::new(1280.0, 720.0);

        assert_eq!(
            script.events_at("Level1", 0, &viewport),
            vec![
                InputEvent::PointerDown { ndc: Vec2::ZERO },
                InputEvent::KeyDown { key: Key::TiltLeft },
            ]
        );
        assert!(script.events_at("Level1", 3, &viewport).is_empty());
        assert_eq!(
            script.events_at("Level1", 5, &viewport),
            vec![
                InputEvent::Nudge {
                    direction: TiltDirection::Right
                },
                InputEvent::ResetPressed,
            ]
        );
        assert!(script.events_at("Level2", 0, &viewport).is_empty());
    }

    #[test]
    fn test_invalid_script() {
        assert!(matches!(
            Script::from_json(r#"{ "levels": 3 }"#),
            Err(ScriptError::Parse(_))
        ));
    }
}
