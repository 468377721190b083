//! CLI Module
//!
//! Command-line interface for the soundscape mixer.

pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::engine::DEFAULT_SAMPLE_RATE;
use crate::mixer::{LayerKind, Volume, VolumeMap};

/// Settings file used unless `--settings` is given
pub const DEFAULT_SETTINGS_PATH: &str = "settings.json";

/// Page share links point at unless `--base` is given
pub const DEFAULT_SHARE_BASE: &str = "https://soundscapes.app/";

/// Soundscapes - procedural ambient mixer
#[derive(Parser, Debug)]
#[command(name = "soundscapes")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Per-layer volume flags shared by several commands
#[derive(Args, Debug, Clone, Default)]
pub struct VolumeArgs {
    /// Rain volume (0-100)
    #[arg(long)]
    pub rain: Option<Volume>,

    /// Cafe volume (0-100)
    #[arg(long)]
    pub cafe: Option<Volume>,

    /// White noise volume (0-100)
    #[arg(long)]
    pub whitenoise: Option<Volume>,

    /// Synth pad volume (0-100)
    #[arg(long)]
    pub synth: Option<Volume>,
}

impl VolumeArgs {
    /// Only the layers given on the command line
    pub fn to_map(&self) -> VolumeMap {
        LayerKind::ALL
            .into_iter()
            .zip([self.rain, self.cafe, self.whitenoise, self.synth])
            .filter_map(|(kind, volume)| volume.map(|v| (kind, v)))
            .collect()
    }

    /// All four layers, with unspecified ones at 0
    pub fn to_full_map(&self) -> VolumeMap {
        let given = self.to_map();
        LayerKind::ALL
            .into_iter()
            .map(|kind| (kind, given.get(&kind).copied().unwrap_or_default()))
            .collect()
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Play a mix through the offline renderer and print levels
    #[command(name = "simulate")]
    Simulate {
        #[command(flatten)]
        volumes: VolumeArgs,

        /// Start from a saved preset
        #[arg(short, long)]
        preset: Option<String>,

        /// Start from a share link
        #[arg(long)]
        link: Option<String>,

        /// Command script to run before the final render
        #[arg(long)]
        script: Option<PathBuf>,

        /// Sleep timer in minutes
        #[arg(short, long)]
        timer: Option<u32>,

        /// Seconds to render after the script
        #[arg(short, long, default_value_t = 10)]
        seconds: u64,

        /// Output sample rate
        #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: u32,

        /// Seed for reproducible textures
        #[arg(long)]
        seed: Option<u64>,

        /// Crossfade length in seconds (overrides settings)
        #[arg(long)]
        crossfade: Option<f64>,

        /// Play each buffer once instead of looping
        #[arg(long)]
        no_loop: bool,

        /// Settings file
        #[arg(long, default_value = DEFAULT_SETTINGS_PATH)]
        settings: PathBuf,

        /// Preset library file
        #[arg(long, default_value = "presets.json")]
        library: PathBuf,
    },

    /// Manage saved presets
    #[command(name = "preset")]
    Preset {
        /// Preset library file
        #[arg(long, global = true, default_value = "presets.json")]
        library: PathBuf,

        #[command(subcommand)]
        action: PresetAction,
    },

    /// Print a share link for a mix, or decode one
    #[command(name = "share")]
    Share {
        #[command(flatten)]
        volumes: VolumeArgs,

        /// Share a saved preset instead of the volume flags
        #[arg(short, long, conflicts_with = "decode")]
        preset: Option<String>,

        /// Link to decode
        #[arg(short, long)]
        decode: Option<String>,

        /// Page the link points at
        #[arg(long, default_value = DEFAULT_SHARE_BASE)]
        base: String,

        /// Preset library file
        #[arg(long, default_value = "presets.json")]
        library: PathBuf,
    },

    /// View or change playback settings
    #[command(name = "settings")]
    Settings {
        /// Settings file
        #[arg(long, global = true, default_value = DEFAULT_SETTINGS_PATH)]
        settings: PathBuf,

        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Delete every preset and restore default settings
    #[command(name = "clear")]
    Clear {
        /// Preset library file
        #[arg(long, default_value = "presets.json")]
        library: PathBuf,

        /// Settings file
        #[arg(long, default_value = DEFAULT_SETTINGS_PATH)]
        settings: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Print the current settings
    #[command(name = "show")]
    Show,

    /// Change one or more settings and save them
    #[command(name = "set")]
    Set {
        /// Crossfade length in seconds
        #[arg(long)]
        crossfade: Option<f64>,

        /// Whether layers loop their buffer
        #[arg(long = "loop")]
        auto_loop: Option<bool>,
    },

    /// Restore the defaults and save them
    #[command(name = "reset")]
    Reset,
}

#[derive(Subcommand, Debug)]
pub enum PresetAction {
    /// Save the given volumes under a name
    #[command(name = "save")]
    Save {
        /// Preset name
        name: String,

        #[command(flatten)]
        volumes: VolumeArgs,
    },

    /// List saved presets
    #[command(name = "list")]
    List,

    /// Show one preset
    #[command(name = "show")]
    Show {
        /// Preset name
        name: String,
    },

    /// Delete a preset
    #[command(name = "delete")]
    Delete {
        /// Preset name
        name: String,
    },

    /// Export every preset as JSON
    #[command(name = "export")]
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_simulate_volumes() {
        let cli = Cli::try_parse_from([
            "soundscapes",
            "simulate",
            "--rain",
            "50",
            "--cafe",
            "130",
            "--timer",
            "1",
        ])
        .unwrap();

        let Some(Commands::Simulate { volumes, timer, seconds, .. }) = cli.command else {
            panic!("expected simulate");
        };
        let map = volumes.to_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map[&LayerKind::Cafe], Volume::MAX);
        assert_eq!(timer, Some(1));
        assert_eq!(seconds, 10);
    }

    #[test]
    fn test_full_map_fills_silence() {
        let args = VolumeArgs {
            synth: Some(Volume::new(20)),
            ..Default::default()
        };
        let map = args.to_full_map();
        assert_eq!(map.len(), 4);
        assert_eq!(map[&LayerKind::Rain], Volume::MIN);
        assert_eq!(map[&LayerKind::Synth], Volume::new(20));
    }

    #[test]
    fn test_parse_settings_set() {
        let cli = Cli::try_parse_from([
            "soundscapes",
            "settings",
            "set",
            "--crossfade",
            "2.5",
            "--loop",
            "false",
        ])
        .unwrap();

        let Some(Commands::Settings { settings, action }) = cli.command else {
            panic!("expected settings");
        };
        assert_eq!(settings, PathBuf::from(DEFAULT_SETTINGS_PATH));
        let SettingsAction::Set { crossfade, auto_loop } = action else {
            panic!("expected set");
        };
        assert_eq!(crossfade, Some(2.5));
        assert_eq!(auto_loop, Some(false));
    }

    #[test]
    fn test_rejects_bad_volume() {
        assert!(Cli::try_parse_from(["soundscapes", "share", "--rain", "loud"]).is_err());
    }
}
