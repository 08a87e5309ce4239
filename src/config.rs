use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::constants::constants;

/// Persisted user settings. Read once at startup, written on every key save.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct Settings {
  pub api_key: Option<String>,
}

impl Settings {
  pub fn path() -> Option<PathBuf> {
    ProjectDirs::from("", "", &constants().app_name).map(|dirs| dirs.config_dir().join(&constants().settings_file))
  }

  /// Missing or unreadable settings mean "no key configured".
  pub fn load() -> Self {
    let Some(path) = Self::path() else { return Self::default() };
    if !path.exists() {
      return Self::default();
    }
    Self::load_from(&path).unwrap_or_else(|e| {
      warn!(err = %e, path = %path.display(), "settings: ignoring unreadable file");
      Self::default()
    })
  }

  pub fn load_from(path: &Path) -> Result<Self> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mut settings: Settings = toml::from_str(&content).context("Failed to parse settings")?;
    settings.api_key = settings.api_key.filter(|k| !k.trim().is_empty());
    Ok(settings)
  }

  pub fn save(&self) -> Result<()> {
    let path = Self::path().context("No home directory for settings")?;
    self.save_to(&path)
  }

  pub fn save_to(&self, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
      std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let content = toml::to_string(self).context("Failed to serialize settings")?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn round_trip_preserves_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("settings.toml");
    let settings = Settings { api_key: Some("abc-123-secret".to_string()) };
    settings.save_to(&path).unwrap();
    assert_eq!(Settings::load_from(&path).unwrap(), settings);
  }

  #[test]
  fn no_key_round_trips_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    Settings::default().save_to(&path).unwrap();
    assert_eq!(Settings::load_from(&path).unwrap().api_key, None);
  }

  #[test]
  fn blank_key_loads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    std::fs::write(&path, "api_key = \"   \"\n").unwrap();
    assert_eq!(Settings::load_from(&path).unwrap().api_key, None);
  }

  #[test]
  fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    std::fs::write(&path, "api_key = [").unwrap();
    assert!(Settings::load_from(&path).is_err());
  }
}
