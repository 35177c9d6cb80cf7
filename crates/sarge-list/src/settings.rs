//! List tuning read from `<config_dir>/sarge/list.toml`.
//!
//! ```toml
//! row_height = 24
//! overscan = 10
//! double_click_ms = 250
//! ```
//!
//! Every key is optional. A missing or unreadable file yields the defaults.

use sarge_core::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ListError;
use crate::viewport::Scroller;

const SETTINGS_FILE: &str = "list.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListSettings {
    /// Uniform row height in pixels.
    pub row_height: u32,
    /// Rows materialized beyond each edge of the viewport.
    pub overscan: u32,
    /// Single/double click disambiguation window in milliseconds.
    pub double_click_ms: u64,
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            row_height: Scroller::DEFAULT_ROW_HEIGHT,
            overscan: Scroller::DEFAULT_OVERSCAN,
            double_click_ms: 250,
        }
    }
}

/// Get the path to list.toml.
pub fn settings_path() -> Result<PathBuf, ConfigError> {
    sarge_core::config_dir()
        .map(|dir| dir.join(SETTINGS_FILE))
        .ok_or(ConfigError::NoConfigDir)
}

impl ListSettings {
    /// Load from the user's config directory, falling back to defaults.
    pub fn load() -> Self {
        match settings_path() {
            Ok(path) => Self::load_from(&path),
            Err(e) => {
                tracing::warn!("{}, using default list settings", e);
                Self::default()
            }
        }
    }

    /// Load from `path`, falling back to defaults on any error.
    pub fn load_from(path: &Path) -> Self {
        match Self::try_load_from(path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("{}, using default list settings", e);
                Self::default()
            }
        }
    }

    /// Load from `path`. A missing file is not an error.
    pub fn try_load_from(path: &Path) -> Result<Self, ListError> {
        if !path.exists() {
            tracing::debug!("{:?} not found, using default list settings", path);
            return Ok(Self::default());
        }

        let settings_error = |message: String| ListError::Settings {
            path: path.to_path_buf(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| settings_error(e.to_string()))?;
        let settings: Self = toml::from_str(&content).map_err(|e| settings_error(e.to_string()))?;

        tracing::info!("Loaded list settings from {:?}", path);
        Ok(settings)
    }

    /// Build the windowing geometry. Fails on a zero row height.
    pub fn scroller(&self) -> Result<Scroller, ListError> {
        Scroller::new(self.row_height, self.overscan)
    }

    pub fn double_click_window(&self) -> Duration {
        Duration::from_millis(self.double_click_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = ListSettings::default();
        assert_eq!(settings.scroller().unwrap(), Scroller::default());
        assert_eq!(settings.double_click_window(), Duration::from_millis(250));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("list.toml");
        assert_eq!(ListSettings::try_load_from(&path).unwrap(), ListSettings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("list.toml");
        std::fs::write(&path, "row_height = 32\n").unwrap();

        let settings = ListSettings::load_from(&path);
        assert_eq!(settings.row_height, 32);
        assert_eq!(settings.overscan, Scroller::DEFAULT_OVERSCAN);
        assert_eq!(settings.double_click_ms, 250);
    }

    #[test]
    fn test_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("list.toml");
        std::fs::write(&path, "row_height = \"tall\"").unwrap();

        assert!(matches!(
            ListSettings::try_load_from(&path),
            Err(ListError::Settings { .. })
        ));
        assert_eq!(ListSettings::load_from(&path), ListSettings::default());
    }

    #[test]
    fn test_settings_path() {
        match settings_path() {
            Ok(path) => assert!(path.ends_with("sarge/list.toml")),
            Err(e) => assert!(matches!(e, ConfigError::NoConfigDir)),
        }
        assert_eq!(
            settings_path().is_ok(),
            sarge_core::config_dir().is_some()
        );
    }

    #[test]
    fn test_zero_row_height_setting() {
        let settings = ListSettings {
            row_height: 0,
            ..ListSettings::default()
        };
        assert!(matches!(settings.scroller(), Err(ListError::ZeroRowHeight)));
    }
}
