//! Soundscapes CLI - Procedural Ambient Mixer
//!
//! Command-line interface for the soundscape mixer.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use soundscapes::cli::commands::{self, SimulateOptions};
use soundscapes::cli::{Cli, Commands, PresetAction, SettingsAction, DEFAULT_SHARE_BASE};
use soundscapes::{Result, SoundscapeError};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    info!("Soundscapes v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd)
            .map_err(|e| {
                for suggestion in e.recovery_suggestions() {
                    eprintln!("hint: {}", suggestion);
                }
                e
            })
            .context("command failed"),
        None => {
            println!("Soundscapes v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Simulate {
            volumes,
            preset,
            link,
            script,
            timer,
            seconds,
            sample_rate,
            seed,
            crossfade,
            no_loop,
            settings,
            library,
        } => commands::simulate(SimulateOptions {
            volumes,
            preset,
            link,
            script,
            timer,
            seconds,
            sample_rate,
            seed,
            crossfade,
            no_loop,
            settings,
            library,
        }),
        Commands::Preset { library, action } => match action {
            PresetAction::Save { name, volumes } => commands::preset_save(&library, &name, &volumes),
            PresetAction::List => commands::preset_list(&library),
            PresetAction::Show { name } => {
                commands::preset_show(&library, &name, DEFAULT_SHARE_BASE)
            }
            PresetAction::Delete { name } => commands::preset_delete(&library, &name),
            PresetAction::Export { output } => {
                commands::preset_export(&library, output.as_deref())
            }
        },
        Commands::Settings { settings, action } => match action {
            SettingsAction::Show => commands::settings_show(&settings),
            SettingsAction::Set {
                crossfade,
                auto_loop,
            } => commands::settings_set(&settings, crossfade, auto_loop).map(|_| ()),
            SettingsAction::Reset => commands::settings_reset(&settings),
        },
        Commands::Clear { library, settings } => commands::clear_all_data(&library, &settings),
        Commands::Share {
            volumes,
            preset,
            decode,
            base,
            library,
        } => match (decode, preset) {
            (Some(link), _) => commands::share_decode(&link),
            (None, Some(name)) => {
                let volumes = commands::preset_volumes(&library, &name)?;
                commands::share(&base, &volumes)
            }
            (None, None) => {
                if volumes.to_map().is_empty() {
                    return Err(SoundscapeError::InvalidShareLink {
                        reason: "give at least one layer volume, --preset or --decode".to_string(),
                    });
                }
                commands::share(&base, &volumes.to_full_map())
            }
        },
    }
}
