//! Mixer Settings
//!
//! User preferences the mixer reads on every operation. Stored as JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default crossfade length in seconds
pub const DEFAULT_CROSSFADE_SECS: f64 = 1.0;

/// Playback preferences
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerSettings {
    /// Seconds over which a volume change is ramped
    pub crossfade_duration_secs: f64,
    /// Whether layers loop their buffer
    pub auto_loop: bool,
}

impl Default for MixerSettings {
    fn default() -> Self {
        Self {
            crossfade_duration_secs: DEFAULT_CROSSFADE_SECS,
            auto_loop: true,
        }
    }
}

impl MixerSettings {
    /// Crossfade length with negative or non-finite values treated as 0
    pub fn crossfade_secs(&self) -> f64 {
        if self.crossfade_duration_secs.is_finite() {
            self.crossfade_duration_secs.max(0.0)
        } else {
            0.0
        }
    }

    /// Restore every field to its default
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Load settings from a JSON file
    ///
    /// A missing file yields the defaults; missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save settings to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let settings = MixerSettings::default();
        assert_eq!(settings.crossfade_duration_secs, 1.0);
        assert!(settings.auto_loop);
    }

    #[test]
    fn test_reset() {
        let mut settings = MixerSettings {
            crossfade_duration_secs: 4.0,
            auto_loop: false,
        };
        settings.reset();
        assert_eq!(settings, MixerSettings::default());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: MixerSettings =
            serde_json::from_str(r#"{"crossfade_duration_secs": 3.0}"#).unwrap();
        assert_eq!(settings.crossfade_duration_secs, 3.0);
        assert!(settings.auto_loop);
    }

    #[test]
    fn test_crossfade_sanitized() {
        let mut settings = MixerSettings::default();
        settings.crossfade_duration_secs = -2.0;
        assert_eq!(settings.crossfade_secs(), 0.0);
        settings.crossfade_duration_secs = f64::NAN;
        assert_eq!(settings.crossfade_secs(), 0.0);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config").join("settings.json");

        let settings = MixerSettings {
            crossfade_duration_secs: 0.5,
            auto_loop: false,
        };
        settings.save(&path).unwrap();

        assert_eq!(MixerSettings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = MixerSettings::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(settings, MixerSettings::default());
    }
}
