//! Theme preference store.
//!
//! Three independent dimensions (color mode, accent palette, display font)
//! loaded once at startup from a JSON file and written back on every change,
//! so re-initializing from the file reproduces the last-set values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::errors::AppError;

/// Light or dark color mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

/// Named accent palettes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Palette {
    #[default]
    Rose,
    Lavender,
    Beige,
}

/// Named display font families.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFamily {
    #[default]
    Playfair,
    Cormorant,
    Inter,
}

/// The full preference state. Exactly one active value per dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub mode: ThemeMode,
    pub palette: Palette,
    pub font: FontFamily,
}

/// Partial update: any subset of the three dimensions.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
    #[serde(default)]
    pub mode: Option<ThemeMode>,
    #[serde(default)]
    pub palette: Option<Palette>,
    #[serde(default)]
    pub font: Option<FontFamily>,
}

/// Preference state container with file-backed persistence.
pub struct PreferenceStore {
    path: PathBuf,
    current: RwLock<Preferences>,
}

impl PreferenceStore {
    /// Load the store, falling back to defaults when the file is absent or
    /// unreadable.
    pub async fn load(path: &Path) -> Self {
        let current = match tokio::fs::read_to_string(path).await {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(prefs) => prefs,
                Err(e) => {
                    tracing::warn!("Ignoring malformed preference file: {}", e);
                    Preferences::default()
                }
            },
            Err(_) => Preferences::default(),
        };

        Self {
            path: path.to_path_buf(),
            current: RwLock::new(current),
        }
    }

    /// Current preference values.
    pub async fn get(&self) -> Preferences {
        *self.current.read().await
    }

    /// Apply a partial update and persist before returning.
    pub async fn apply(&self, update: PreferencesUpdate) -> Result<Preferences, AppError> {
        let mut current = self.current.write().await;
        let next = Preferences {
            mode: update.mode.unwrap_or(current.mode),
            palette: update.palette.unwrap_or(current.palette),
            font: update.font.unwrap_or(current.font),
        };

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.ok();
        }
        let contents = serde_json::to_string_pretty(&next)?;
        tokio::fs::write(&self.path, contents).await?;

        *current = next;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_defaults_when_file_absent() {
        let dir = TempDir::new().unwrap();
        let store = PreferenceStore::load(&dir.path().join("prefs.json")).await;

        let prefs = store.get().await;
        assert_eq!(prefs.mode, ThemeMode::Light);
        assert_eq!(prefs.palette, Palette::Rose);
        assert_eq!(prefs.font, FontFamily::Playfair);
    }

    #[tokio::test]
    async fn test_reload_reproduces_last_set_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.json");

        let store = PreferenceStore::load(&path).await;
        store
            .apply(PreferencesUpdate {
                mode: Some(ThemeMode::Dark),
                font: Some(FontFamily::Inter),
                ..Default::default()
            })
            .await
            .unwrap();

        let reloaded = PreferenceStore::load(&path).await;
        let prefs = reloaded.get().await;
        assert_eq!(prefs.mode, ThemeMode::Dark);
        assert_eq!(prefs.palette, Palette::Rose);
        assert_eq!(prefs.font, FontFamily::Inter);
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_dimensions() {
        let dir = TempDir::new().unwrap();
        let store = PreferenceStore::load(&dir.path().join("prefs.json")).await;

        store
            .apply(PreferencesUpdate {
                palette: Some(Palette::Lavender),
                ..Default::default()
            })
            .await
            .unwrap();

        let prefs = store.get().await;
        assert_eq!(prefs.mode, ThemeMode::Light);
        assert_eq!(prefs.palette, Palette::Lavender);
    }

    #[tokio::test]
    async fn test_malformed_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let store = PreferenceStore::load(&path).await;
        assert_eq!(store.get().await, Preferences::default());
    }
}
