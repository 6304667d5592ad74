//! Inventory and level-unlock contract.
//!
//! The core only queries and mutates progress through [`ProgressStore`]; how
//! it is persisted is up to the host.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Player inventory and unlocked levels.
pub trait ProgressStore {
    fn has_item(&self, item: &str) -> bool;

    /// Adds an item. Adding an item already held is a no-op.
    fn add_item(&mut self, item: &str);

    fn is_level_unlocked(&self, level: &str) -> bool;

    fn unlock_level(&mut self, level: &str);
}

/// In-memory progress, serializable as a save document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressData {
    #[serde(default)]
    pub items: BTreeSet<String>,
    #[serde(default)]
    pub unlocked_levels: BTreeSet<String>,
    /// Scene the player was last in, used to continue a campaign.
    #[serde(default)]
    pub last_scene: Option<String>,
}

impl ProgressData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper that adds an item.
    #[must_use]
    pub fn with_item(mut self, item: &str) -> Self {
        self.add_item(item);
        self
    }
}

impl ProgressStore for ProgressData {
    fn has_item(&self, item: &str) -> bool {
        self.items.contains(item)
    }

    fn add_item(&mut self, item: &str) {
        self.items.insert(item.to_string());
    }

    fn is_level_unlocked(&self, level: &str) -> bool {
        self.unlocked_levels.contains(level)
    }

    fn unlock_level(&mut self, level: &str) {
        self.unlocked_levels.insert(level.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_item_is_idempotent() {
        let mut progress = ProgressData::new();
        progress.add_item("GoldenBadge");
        progress.add_item("GoldenBadge");

        assert!(progress.has_item("GoldenBadge"));
        assert_eq!(progress.items.len(), 1);
        assert!(!progress.has_item("PlatinumBadge"));
    }

    #[test]
    fn test_unlock_level() {
        let mut progress = ProgressData::new();
        assert!(!progress.is_level_unlocked("Level2"));
        progress.unlock_level("Level2");
        assert!(progress.is_level_unlocked("Level2"));
    }

    #[test]
    fn test_save_document_shape() {
        let progress = ProgressData::new().with_item("GoldenBadge");
        let json = serde_json::to_value(&progress).unwrap();

        assert_eq!(json["items"], serde_json::json!(["GoldenBadge"]));
        assert_eq!(json["unlockedLevels"], serde_json::json!([]));

        let loaded: ProgressData = serde_json::from_str("{}").unwrap();
        assert_eq!(loaded, ProgressData::default());
    }
}
