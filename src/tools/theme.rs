//! Theme preference: a single persisted "light"/"dark" setting.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid preferences file: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Unknown theme: {0}")]
    UnknownTheme(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

impl FromStr for Theme {
    type Err = PreferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(PreferenceError::UnknownTheme(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub theme: Theme,
}

/// Preferences persisted as JSON at a fixed path.
pub struct PreferenceStore {
    path: PathBuf,
    current: RwLock<Preferences>,
}

impl PreferenceStore {
    /// Load from `path`. A missing or unreadable file yields defaults.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = match Self::read(&path).await {
            Ok(Some(prefs)) => prefs,
            Ok(None) => Preferences::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable preferences");
                Preferences::default()
            }
        };
        Self {
            path,
            current: RwLock::new(current),
        }
    }

    async fn read(path: &Path) -> Result<Option<Preferences>, PreferenceError> {
        match fs::read(path).await {
            Ok(data) => Ok(Some(serde_json::from_slice(&data)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn theme(&self) -> Theme {
        self.current.read().await.theme
    }

    pub async fn set_theme(&self, theme: Theme) -> Result<Theme, PreferenceError> {
        let mut current = self.current.write().await;
        let next = Preferences { theme };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(&next)?).await?;
        *current = next;
        debug!(theme = %theme, "Saved theme preference");
        Ok(theme)
    }

    /// Flip light/dark and persist.
    pub async fn toggle(&self) -> Result<Theme, PreferenceError> {
        let next = self.theme().await.toggled();
        self.set_theme(next).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_and_toggle() {
        assert_eq!("light".parse::<Theme>().unwrap(), Theme::Light);
        assert!("sepia".parse::<Theme>().is_err());
        assert_eq!(Theme::default(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
    }

    #[tokio::test]
    async fn test_toggle_persists() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("prefs/preferences.json");

        let store = PreferenceStore::load(&path).await;
        assert_eq!(store.theme().await, Theme::Dark);
        assert_eq!(store.toggle().await.unwrap(), Theme::Light);

        let reloaded = PreferenceStore::load(&path).await;
        assert_eq!(reloaded.theme().await, Theme::Light);
    }

    #[tokio::test]
    async fn test_corrupt_file_falls_back_to_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("preferences.json");
        std::fs::write(&path, "not json").unwrap();

        let store = PreferenceStore::load(&path).await;
        assert_eq!(store.theme().await, Theme::Dark);
    }
}
