//! Signals emitted by a puzzle session for the presentation layer.

use serde::{Deserialize, Serialize};

use crate::scene::Color;

/// Semantic colour of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusTone {
    Neutral,
    Success,
    Failure,
}

impl StatusTone {
    pub const fn color(self) -> Color {
        match self {
            Self::Neutral => Color::from_hex(0xffffff),
            Self::Success => Color::from_hex(0x22ff88),
            Self::Failure => Color::from_hex(0xff2244),
        }
    }
}

pub const WIN_STATUS: &str = "LEVEL COMPLETE!";
pub const LOSE_STATUS: &str = "YOU LOSE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// Show a status line.
    Status { text: String, tone: StatusTone },
    StatusCleared,
    Won,
    Lost,
    /// The ball was returned to its spawn and play resumed.
    Reset,
    SelectionChanged { selected: Option<usize> },
    ItemAwarded { item: String },
    LevelUnlocked { level: String },
}

impl SessionEvent {
    pub fn status(text: impl Into<String>, tone: StatusTone) -> Self {
        Self::Status {
            text: text.into(),
            tone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_colors() {
        assert_eq!(StatusTone::Success.color().to_css(), "#22ff88");
        assert_eq!(StatusTone::Failure.color().to_css(), "#ff2244");
    }
}
