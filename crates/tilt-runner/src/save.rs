//! JSON save file holding the player's inventory and campaign progress.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tilt_core::{ProgressData, ProgressStore};

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Failed to access save file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Save file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Progress backed by a file. Every mutation is written through.
#[derive(Debug)]
pub struct SaveFile {
    path: PathBuf,
    data: ProgressData,
}

impl SaveFile {
    /// Opens `path`, starting from empty progress if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SaveError> {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json).map_err(|source| SaveError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::info!("[save] no save at {}, starting fresh", path.display());
                ProgressData::default()
            }
            Err(source) => return Err(SaveError::Io { path, source }),
        };
        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &ProgressData {
        &self.data
    }

    pub fn last_scene(&self) -> Option<&str> {
        self.data.last_scene.as_deref()
    }

    pub fn set_last_scene(&mut self, scene: &str) {
        self.data.last_scene = Some(scene.to_string());
        self.persist();
    }

    pub fn save(&self) -> Result<(), SaveError> {
        let io_err = |source| SaveError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(&self.data).map_err(|source| {
            SaveError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;
        std::fs::write(&self.path, json).map_err(io_err)
    }

    fn persist(&self) {
        if let Err(err) = self.save() {
            tracing::warn!("[save] {err}");
        }
    }
}

impl ProgressStore for SaveFile {
    fn has_item(&self, item: &str) -> bool {
        self.data.has_item(item)
    }

    fn add_item(&mut self, item: &str) {
        self.data.add_item(item);
        self.persist();
    }

    fn is_level_unlocked(&self, level: &str) -> bool {
        self.data.is_level_unlocked(level)
    }

    fn unlock_level(&mut self, level: &str) {
        self.data.unlock_level(level);
        self.persist();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("tilt-runner-{}-{name}", std::process::id()))
            .join("save.json")
    }

    #[test]
    fn test_missing_file_starts_fresh() {
        let save = SaveFile::open(temp_path("fresh")).unwrap();
        assert_eq!(save.data(), &ProgressData::default());
        assert_eq!(save.last_scene(), None);
    }

    #[test]
    fn test_mutations_are_written_through() {
        let path = temp_path("write-through");
        let mut save = SaveFile::open(&path).unwrap();
        save.add_item("GoldenBadge");
        save.unlock_level("Level2");
        save.set_last_scene("Level2");

        let reopened = SaveFile::open(&path).unwrap();
        assert!(reopened.has_item("GoldenBadge"));
        assert!(reopened.is_level_unlocked("Level2"));
        assert_eq!(reopened.last_scene(), Some("Level2"));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let path = temp_path("corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[[[").unwrap();

        let err = SaveFile::open(&path).unwrap_err();
        assert!(matches!(err, SaveError::Corrupt { .. }));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
