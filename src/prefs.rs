use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Light/dark presentation theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which camera the capture surface should prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    #[default]
    Back,
    Front,
}

impl CameraFacing {
    pub fn toggled(self) -> Self {
        match self {
            CameraFacing::Back => CameraFacing::Front,
            CameraFacing::Front => CameraFacing::Back,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CameraFacing::Back => "back",
            CameraFacing::Front => "front",
        }
    }
}

impl std::fmt::Display for CameraFacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User preferences: the only state the application persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Preferences {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub camera_facing: CameraFacing,
}

/// Loads and saves the preferences file.
///
/// Missing or corrupt files fall back to defaults with a warning; a failed
/// save is logged and otherwise ignored. Preferences must never take the
/// application down.
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load preferences, falling back to defaults if the file is missing
    /// or unreadable.
    pub fn load(&self) -> Preferences {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(
                    "No preferences file at {}, using defaults",
                    self.path.display()
                );
                return Preferences::default();
            }
            Err(e) => {
                warn!(
                    "Failed to read preferences from {}: {}, using defaults",
                    self.path.display(),
                    e
                );
                return Preferences::default();
            }
        };

        match toml::from_str(&contents) {
            Ok(prefs) => {
                debug!("Loaded preferences from {}", self.path.display());
                prefs
            }
            Err(e) => {
                warn!(
                    "Preferences file {} is corrupt ({}), using defaults",
                    self.path.display(),
                    e
                );
                Preferences::default()
            }
        }
    }

    /// Save preferences to disk.
    pub fn save(&self, prefs: &Preferences) -> Result<()> {
        let contents = toml::to_string_pretty(prefs)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, contents)?;
        info!("Saved preferences to {}", self.path.display());
        Ok(())
    }

    /// Save, logging instead of propagating on failure.
    pub fn save_best_effort(&self, prefs: &Preferences) {
        if let Err(e) = self.save(prefs) {
            warn!("Failed to save preferences: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("prefs.toml"));

        let prefs = store.load();
        assert_eq!(prefs.theme, Theme::Light);
        assert_eq!(prefs.camera_facing, CameraFacing::Back);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("prefs.toml"));

        let prefs = Preferences {
            theme: Theme::Dark,
            camera_facing: CameraFacing::Front,
        };
        store.save(&prefs).unwrap();

        assert_eq!(store.load(), prefs);
    }

    #[test]
    fn test_corrupt_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.toml");
        std::fs::write(&path, "theme = 42\n").unwrap();

        let store = PreferenceStore::new(&path);
        assert_eq!(store.load(), Preferences::default());
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("nested/prefs.toml"));

        store.save(&Preferences::default()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_toggles() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(CameraFacing::Back.toggled(), CameraFacing::Front);
    }
}
