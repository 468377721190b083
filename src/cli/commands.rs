//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::cli::VolumeArgs;
use crate::engine::{
    format_remaining, ManualClock, OfflineBackend, OutputDevice, PlaybackTimer, TimerTick,
};
use crate::error::{Result, SoundscapeError};
use crate::mixer::{Command, EventLog, MixerEngine, MixerEvent, MixerSettings, VolumeMap};
use crate::state::{decode_share_link, share_link, Preset, PresetLibrary};
use crate::synth::NoiseGenerator;

// ============================================================================
// Simulation Scripts
// ============================================================================

/// One line of a simulation script
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    /// A mixer command
    Command(Command),
    /// Render this many seconds
    Wait(u64),
    /// Arm the sleep timer for this many minutes (0 clears it)
    Timer(u32),
}

impl FromStr for ScriptStep {
    type Err = SoundscapeError;

    fn from_str(line: &str) -> Result<Self> {
        let invalid = |reason: &str| SoundscapeError::InvalidCommand {
            line: line.to_string(),
            reason: reason.to_string(),
        };

        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            ["wait", secs] => secs
                .parse()
                .map(ScriptStep::Wait)
                .map_err(|_| invalid("wait takes whole seconds")),
            ["timer", minutes] => minutes
                .parse()
                .map(ScriptStep::Timer)
                .map_err(|_| invalid("timer takes whole minutes")),
            _ => line.parse().map(ScriptStep::Command),
        }
    }
}

/// Parse a script, skipping blank lines and `#` comments
pub fn parse_script(text: &str) -> Result<Vec<ScriptStep>> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::parse::<ScriptStep>)
        .collect()
}

// ============================================================================
// Simulation Session
// ============================================================================

/// A mixer rendering offline, with a sleep timer that follows rendered time
pub struct Session {
    engine: MixerEngine<OfflineBackend>,
    timer: PlaybackTimer<Arc<ManualClock>>,
    clock: Arc<ManualClock>,
    events: Arc<EventLog>,
    elapsed: u64,
}

impl Session {
    /// Create a session at `sample_rate`, seeded when `seed` is given
    pub fn new(sample_rate: u32, seed: Option<u64>, settings: MixerSettings) -> Self {
        let generator = match seed {
            Some(seed) => NoiseGenerator::seeded(seed),
            None => NoiseGenerator::from_entropy(),
        };
        let events = Arc::new(EventLog::new());
        let clock = Arc::new(ManualClock::new());

        let mut engine = MixerEngine::with_generator(OfflineBackend::new(sample_rate), generator);
        engine.set_settings(settings);
        engine.set_observer(events.clone());

        let mut timer = PlaybackTimer::with_clock(Arc::clone(&clock));
        timer.set_observer(events.clone());

        Self {
            engine,
            timer,
            clock,
            events,
            elapsed: 0,
        }
    }

    pub fn engine(&self) -> &MixerEngine<OfflineBackend> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut MixerEngine<OfflineBackend> {
        &mut self.engine
    }

    pub fn timer(&self) -> &PlaybackTimer<Arc<ManualClock>> {
        &self.timer
    }

    /// Seconds rendered so far
    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    /// Run one script step
    pub fn run(&mut self, step: ScriptStep) -> Result<()> {
        debug!("script: {:?}", step);
        match step {
            ScriptStep::Command(command) => {
                self.engine.apply(command)?;
                self.print_events();
            }
            ScriptStep::Wait(secs) => self.render(secs)?,
            ScriptStep::Timer(minutes) => {
                self.set_timer(minutes);
            }
        }
        Ok(())
    }

    /// Arm the sleep timer
    pub fn set_timer(&mut self, minutes: u32) -> TimerTick {
        let tick = self.timer.set_timer(minutes);
        self.print_events();
        println!("  * timer: {}", tick);
        tick
    }

    /// Render `secs` one-second blocks, ticking the timer after each
    pub fn render(&mut self, secs: u64) -> Result<()> {
        self.engine.ensure_ready()?;

        for _ in 0..secs {
            let Some(device) = self.engine.device_mut() else {
                break;
            };
            let rate = device.sample_rate();
            let block = device.render(rate as usize);

            self.clock.advance(Duration::from_secs(1));
            self.elapsed += 1;
            let tick = self.timer.tick(&mut self.engine);

            println!("{}", self.meter_line(block.peak_db(), block.rms_db(), tick));
            self.print_events();
        }
        Ok(())
    }

    fn meter_line(&self, peak_db: f32, rms_db: f32, tick: Option<TimerTick>) -> String {
        let playing: Vec<String> = self
            .engine
            .playing_layers()
            .iter()
            .map(|kind| kind.to_string())
            .collect();
        let playing = if playing.is_empty() {
            "-".to_string()
        } else {
            playing.join(",")
        };

        let mut line = format!(
            "[{}] peak {:>7} rms {:>7}  {}",
            format_remaining(Duration::from_secs(self.elapsed)),
            format_db(peak_db),
            format_db(rms_db),
            playing
        );
        if let Some(tick) = tick {
            line.push_str(&format!("  ({})", tick));
        }
        line
    }

    fn print_events(&self) {
        for event in self.events.drain() {
            match event {
                MixerEvent::LayerStateChanged { layer, playing } => {
                    let state = if playing { "started" } else { "stopped" };
                    println!("  * {} {}", layer, state);
                }
                MixerEvent::TimerTick { expired: true, .. } => {
                    println!("  * timer: {}", TimerTick { remaining: None, expired: true });
                }
                // shown on the meter line or by set_timer
                MixerEvent::TimerTick { .. } => {}
            }
        }
    }
}

fn format_db(db: f32) -> String {
    if db.is_finite() {
        format!("{:.1} dB", db)
    } else {
        "-inf dB".to_string()
    }
}

// ============================================================================
// Commands
// ============================================================================

/// Options for [`simulate`]
#[derive(Debug, Clone, Default)]
pub struct SimulateOptions {
    pub volumes: VolumeArgs,
    pub preset: Option<String>,
    pub link: Option<String>,
    pub script: Option<PathBuf>,
    pub timer: Option<u32>,
    pub seconds: u64,
    pub sample_rate: u32,
    pub seed: Option<u64>,
    pub crossfade: Option<f64>,
    pub no_loop: bool,
    pub settings: PathBuf,
    pub library: PathBuf,
}

/// Build a mix, play it through the offline renderer and print levels.
pub fn simulate(options: SimulateOptions) -> Result<()> {
    let mut settings = MixerSettings::load(&options.settings)?;
    if let Some(crossfade) = options.crossfade {
        settings.crossfade_duration_secs = crossfade;
    }
    if options.no_loop {
        settings.auto_loop = false;
    }

    let mut volumes = VolumeMap::new();
    if let Some(name) = &options.preset {
        let library = PresetLibrary::load(&options.library)?;
        let preset = library.get(name)?;
        println!("Preset: {} ({})", preset.name, preset.summary());
        volumes.extend(preset.layers.iter());
    }
    if let Some(link) = &options.link {
        volumes.extend(decode_share_link(link)?);
    }
    volumes.extend(options.volumes.to_map());

    info!(
        "Simulating at {} Hz, crossfade {:.2}s, loop {}",
        options.sample_rate,
        settings.crossfade_secs(),
        settings.auto_loop
    );

    let mut session = Session::new(options.sample_rate, options.seed, settings);
    session.engine_mut().apply_volumes(&volumes);
    session.run(ScriptStep::Command(Command::PlayAll))?;

    if let Some(minutes) = options.timer {
        session.set_timer(minutes);
    }

    if let Some(path) = &options.script {
        let text = fs::read_to_string(path)?;
        for step in parse_script(&text)? {
            session.run(step)?;
        }
    }

    session.render(options.seconds)?;

    println!();
    println!("Rendered {}s", session.elapsed());
    for (kind, volume) in session.engine().volumes() {
        let state = if session.engine().is_playing(kind) {
            "playing"
        } else {
            "stopped"
        };
        println!("  {:<10} {:>4}  {}", kind.as_str(), volume.to_string(), state);
    }

    Ok(())
}

/// Print the saved settings.
pub fn settings_show(settings_path: &Path) -> Result<()> {
    let settings = MixerSettings::load(settings_path)?;
    print_settings(&settings);
    Ok(())
}

/// Change settings and save them.
pub fn settings_set(
    settings_path: &Path,
    crossfade: Option<f64>,
    auto_loop: Option<bool>,
) -> Result<MixerSettings> {
    info!("Updating settings: {}", settings_path.display());

    let mut settings = MixerSettings::load(settings_path)?;
    if let Some(crossfade) = crossfade {
        settings.crossfade_duration_secs = crossfade;
    }
    if let Some(auto_loop) = auto_loop {
        settings.auto_loop = auto_loop;
    }
    settings.save(settings_path)?;

    println!("Settings saved: {}", settings_path.display());
    print_settings(&settings);
    Ok(settings)
}

/// Restore default settings and save them.
pub fn settings_reset(settings_path: &Path) -> Result<()> {
    let mut settings = MixerSettings::load(settings_path)?;
    settings.reset();
    settings.save(settings_path)?;

    println!("Settings reset to defaults.");
    print_settings(&settings);
    Ok(())
}

/// Delete every preset and restore default settings.
pub fn clear_all_data(library_path: &Path, settings_path: &Path) -> Result<()> {
    info!(
        "Clearing {} and {}",
        library_path.display(),
        settings_path.display()
    );

    let mut library = PresetLibrary::load(library_path)?;
    let removed = library.len();
    library.clear();
    library.save(library_path)?;

    let mut settings = MixerSettings::load(settings_path)?;
    settings.reset();
    settings.save(settings_path)?;

    println!("Deleted {} preset(s) and restored default settings.", removed);
    Ok(())
}

fn print_settings(settings: &MixerSettings) {
    println!("  crossfade  {:.2}s", settings.crossfade_secs());
    println!("  loop       {}", if settings.auto_loop { "on" } else { "off" });
}

/// Save a preset from the given volumes.
pub fn preset_save(library_path: &Path, name: &str, volumes: &VolumeArgs) -> Result<()> {
    let mut library = PresetLibrary::load(library_path)?;
    let preset = Preset::capture(name, volumes.to_full_map())?;
    println!("Saved preset '{}': {}", preset.name, preset.summary());

    library.add(preset);
    library.save(library_path)
}

/// List saved presets.
pub fn preset_list(library_path: &Path) -> Result<()> {
    let library = PresetLibrary::load(library_path)?;

    if library.is_empty() {
        println!("No presets saved.");
        return Ok(());
    }

    println!("Presets:");
    println!("{:-<60}", "");
    for preset in library.iter() {
        let saved = DateTime::<Utc>::from_timestamp_millis(preset.timestamp)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!("{:<20} {}  {}", preset.name, saved, preset.summary());
    }
    println!("{:-<60}", "");
    println!("Total: {}", library.len());

    Ok(())
}

/// Show one preset with its share link.
pub fn preset_show(library_path: &Path, name: &str, base: &str) -> Result<()> {
    let library = PresetLibrary::load(library_path)?;
    let preset = library.get(name)?;

    println!("{}", preset.name);
    for (kind, volume) in &preset.layers {
        println!("  {:<10} {}", kind.as_str(), volume);
    }
    if let Some(link) = share_link(base, &preset.layers) {
        println!("Share: {}", link);
    }

    Ok(())
}

/// Delete the most recently saved preset with this name.
pub fn preset_delete(library_path: &Path, name: &str) -> Result<()> {
    let mut library = PresetLibrary::load(library_path)?;
    let removed = library
        .position(name)
        .and_then(|index| library.remove(index))
        .ok_or_else(|| SoundscapeError::PresetNotFound {
            name: name.to_string(),
        })?;

    library.save(library_path)?;
    println!("Deleted preset '{}'", removed.name);

    Ok(())
}

/// Export the library as JSON.
pub fn preset_export(library_path: &Path, output: Option<&Path>) -> Result<()> {
    let library = PresetLibrary::load(library_path)?;
    let json = library.export_json()?;

    match output {
        Some(path) => {
            fs::write(path, json)?;
            println!("Exported {} preset(s) to {}", library.len(), path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}

/// Print the share link for a mix.
pub fn share(base: &str, volumes: &VolumeMap) -> Result<()> {
    match share_link(base, volumes) {
        Some(link) => println!("{}", link),
        None => println!("Nothing to share: every layer is silent."),
    }
    Ok(())
}

/// Print the volumes carried by a share link.
pub fn share_decode(link: &str) -> Result<()> {
    let volumes = decode_share_link(link)?;
    for (kind, volume) in &volumes {
        println!("{:<10} {}", kind.as_str(), volume);
    }
    Ok(())
}

/// Volumes of a saved preset, for sharing.
pub fn preset_volumes(library_path: &Path, name: &str) -> Result<VolumeMap> {
    let library = PresetLibrary::load(library_path)?;
    Ok(library.get(name)?.layers.clone())
}

// ============================================================================
// Unit Tests
// ============================================================================
