//! Presets
//!
//! A preset is a named, timestamped snapshot of all four layer volumes. The
//! library keeps them in save order and persists them as a JSON array.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, SoundscapeError};
use crate::mixer::layer::{LayerKind, Volume, VolumeMap};

/// A saved mix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Display name, never empty
    pub name: String,
    /// Milliseconds since the Unix epoch at save time
    pub timestamp: i64,
    /// Volume per layer
    #[serde(deserialize_with = "known_layers")]
    pub layers: VolumeMap,
}

/// Keep only entries naming one of the four layers.
fn known_layers<'de, D>(deserializer: D) -> std::result::Result<VolumeMap, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: BTreeMap<String, Volume> = BTreeMap::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(name, volume)| match name.parse::<LayerKind>() {
            Ok(kind) => Some((kind, volume)),
            Err(_) => {
                debug!("dropping unknown layer '{}' from preset", name);
                None
            }
        })
        .collect())
}

impl Preset {
    /// Snapshot `volumes` under `name`, stamped with the current time
    ///
    /// # Errors
    /// * `InvalidPreset` - if the name is empty after trimming
    pub fn capture(name: &str, volumes: VolumeMap) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SoundscapeError::InvalidPreset {
                reason: "preset name is empty".to_string(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            timestamp: Utc::now().timestamp_millis(),
            layers: volumes,
        })
    }

    /// One-line description of the audible layers
    ///
    /// ```
    /// use soundscapes::mixer::{LayerKind, Volume, VolumeMap};
    /// use soundscapes::state::Preset;
    ///
    /// let mut volumes = VolumeMap::new();
    /// volumes.insert(LayerKind::Rain, Volume::new(60));
    /// volumes.insert(LayerKind::Synth, Volume::new(0));
    /// let preset = Preset::capture("Evening", volumes).unwrap();
    /// assert_eq!(preset.summary(), "rain: 60%");
    /// ```
    pub fn summary(&self) -> String {
        let active: Vec<String> = self
            .layers
            .iter()
            .filter(|(_, volume)| !volume.is_silent())
            .map(|(kind, volume)| format!("{}: {}", kind, volume))
            .collect();

        if active.is_empty() {
            "No active layers".to_string()
        } else {
            active.join(", ")
        }
    }
}

/// Ordered collection of presets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetLibrary {
    presets: Vec<Preset>,
}

impl PresetLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a library from a JSON file; a missing file is an empty library
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let library: PresetLibrary = serde_json::from_str(&content)?;
        debug!("loaded {} preset(s) from {}", library.len(), path.display());
        Ok(library)
    }

    /// Write the library to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.export_json()?)?;
        info!("saved {} preset(s) to {}", self.len(), path.display());
        Ok(())
    }

    /// Pretty-printed JSON array of every preset
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.presets)?)
    }

    /// Append a preset
    pub fn add(&mut self, preset: Preset) {
        self.presets.push(preset);
    }

    /// Remove the preset at `index`
    pub fn remove(&mut self, index: usize) -> Option<Preset> {
        if index < self.presets.len() {
            Some(self.presets.remove(index))
        } else {
            None
        }
    }

    /// Most recently saved preset called `name`
    pub fn find(&self, name: &str) -> Option<&Preset> {
        self.presets.iter().rev().find(|preset| preset.name == name)
    }

    /// Index of the most recently saved preset called `name`
    pub fn position(&self, name: &str) -> Option<usize> {
        self.presets.iter().rposition(|preset| preset.name == name)
    }

    /// Like [`PresetLibrary::find`], but a missing preset is an error
    pub fn get(&self, name: &str) -> Result<&Preset> {
        self.find(name).ok_or_else(|| SoundscapeError::PresetNotFound {
            name: name.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.iter()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Remove every preset
    pub fn clear(&mut self) {
        self.presets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn volumes(rain: u32, cafe: u32) -> VolumeMap {
        let mut map = VolumeMap::new();
        map.insert(LayerKind::Rain, Volume::new(rain));
        map.insert(LayerKind::Cafe, Volume::new(cafe));
        map.insert(LayerKind::WhiteNoise, Volume::MIN);
        map.insert(LayerKind::Synth, Volume::MIN);
        map
    }

    #[test]
    fn test_capture_trims_and_stamps() {
        let preset = Preset::capture("  Focus  ", volumes(50, 20)).unwrap();
        assert_eq!(preset.name, "Focus");
        assert!(preset.timestamp > 0);
    }

    #[test]
    fn test_capture_rejects_blank_name() {
        let err = Preset::capture("   ", volumes(50, 20)).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PRESET");
    }

    #[test]
    fn test_summary() {
        let preset = Preset::capture("Mix", volumes(50, 20)).unwrap();
        assert_eq!(preset.summary(), "rain: 50%, cafe: 20%");

        let silent = Preset::capture("Quiet", volumes(0, 0)).unwrap();
        assert_eq!(silent.summary(), "No active layers");
    }

    #[test]
    fn test_record_format() {
        let preset = Preset {
            name: "Night".to_string(),
            timestamp: 1700000000000,
            layers: volumes(40, 0),
        };
        let json: serde_json::Value = serde_json::to_value(&preset).unwrap();
        assert_eq!(json["name"], "Night");
        assert_eq!(json["timestamp"], 1700000000000_i64);
        assert_eq!(json["layers"]["rain"], 40);
        assert_eq!(json["layers"]["whitenoise"], 0);
    }

    #[test]
    fn test_reads_string_volumes_and_skips_unknown_layers() {
        let json = r#"[{
            "name": "Old",
            "timestamp": 1,
            "layers": {"rain": "65", "cafe": 10, "thunder": 90}
        }]"#;
        let library: PresetLibrary = serde_json::from_str(json).unwrap();
        let preset = library.get("Old").unwrap();

        assert_eq!(preset.layers.len(), 2);
        assert_eq!(preset.layers[&LayerKind::Rain], Volume::new(65));
        assert_eq!(preset.layers[&LayerKind::Cafe], Volume::new(10));
    }

    #[test]
    fn test_library_add_find_remove() {
        let mut library = PresetLibrary::new();
        library.add(Preset::capture("A", volumes(10, 0)).unwrap());
        library.add(Preset::capture("B", volumes(20, 0)).unwrap());
        library.add(Preset::capture("A", volumes(30, 0)).unwrap());

        assert_eq!(library.len(), 3);
        assert_eq!(library.find("A").unwrap().layers[&LayerKind::Rain], Volume::new(30));
        assert!(library.get("C").is_err());

        assert_eq!(library.position("A"), Some(2));
        assert_eq!(library.position("C"), None);

        let removed = library.remove(1).unwrap();
        assert_eq!(removed.name, "B");
        assert!(library.remove(5).is_none());
        assert_eq!(library.len(), 2);
    }

    #[test]
    fn test_library_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("presets.json");

        let mut library = PresetLibrary::new();
        library.add(Preset::capture("Rainy cafe", volumes(70, 45)).unwrap());
        library.save(&path).unwrap();

        let loaded = PresetLibrary::load(&path).unwrap();
        assert_eq!(loaded, library);
    }

    #[test]
    fn test_load_missing_library_is_empty() {
        let dir = tempdir().unwrap();
        let library = PresetLibrary::load(&dir.path().join("none.json")).unwrap();
        assert!(library.is_empty());
    }
}
