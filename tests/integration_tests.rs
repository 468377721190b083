//! Integration Tests
//!
//! End-to-end tests for the mixer: synthesis, playback, crossfades, the sleep
//! timer, presets and share links.

use std::sync::Arc;
use std::time::Duration;

use approx::assert_abs_diff_eq;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

use soundscapes::engine::{ManualClock, OfflineBackend, OutputDevice, PlaybackTimer, StopAll};
use soundscapes::mixer::{EventLog, LayerKind, MixerEngine, MixerEvent, Volume};
use soundscapes::state::{decode_share_link, share_link, Preset, PresetLibrary};
use soundscapes::synth::NoiseGenerator;

const RATE: u32 = 1000;

/// Helper to create a seeded engine with an event log attached
fn create_engine() -> (MixerEngine, Arc<EventLog>) {
    let mut engine = MixerEngine::with_generator(OfflineBackend::new(RATE), NoiseGenerator::seeded(7));
    let log = Arc::new(EventLog::new());
    engine.set_observer(log.clone());
    (engine, log)
}

fn advance(engine: &mut MixerEngine, secs: f64) {
    engine.device_mut().expect("device open").advance(secs);
}

// === Playback Scenarios ===

#[test]
fn test_play_all_follows_volumes() {
    let (mut engine, _log) = create_engine();

    engine.play_all().unwrap();
    assert!(engine.playing_layers().is_empty());

    engine.set_layer_volume(LayerKind::Rain, Volume::new(50));
    engine.play_all().unwrap();
    assert_eq!(engine.playing_layers(), vec![LayerKind::Rain]);

    engine.set_layer_volume(LayerKind::Cafe, Volume::new(80));
    engine.play_layer(LayerKind::Cafe);
    assert_eq!(engine.playing_layers(), vec![LayerKind::Rain, LayerKind::Cafe]);

    engine.stop_all();
    assert!(engine.playing_layers().is_empty());
}

#[test]
fn test_play_all_then_stop_all_stops_everything() {
    let (mut engine, log) = create_engine();
    for (kind, percent) in LayerKind::ALL.into_iter().zip([0, 100, 1, 60]) {
        engine.set_layer_volume(kind, Volume::new(percent));
    }

    engine.play_all().unwrap();
    assert_eq!(engine.playing_layers().len(), 3);

    engine.stop_all();
    engine.stop_all();
    assert!(engine.playing_layers().is_empty());

    let stops = log
        .events()
        .into_iter()
        .filter(|e| matches!(e, MixerEvent::LayerStateChanged { playing: false, .. }))
        .count();
    assert_eq!(stops, 3);
}

#[test]
fn test_repeated_play_and_stop_are_idempotent() {
    let (mut engine, log) = create_engine();
    engine.initialize().unwrap();

    engine.play_layer(LayerKind::Synth);
    engine.play_layer(LayerKind::Synth);
    assert_eq!(engine.device().unwrap().active_voices(), 1);

    engine.stop_layer(LayerKind::Synth);
    engine.stop_layer(LayerKind::Synth);
    assert_eq!(engine.device().unwrap().active_voices(), 0);
    assert_eq!(log.events().len(), 2);
}

#[test]
fn test_volume_boundaries_reach_device() {
    let (mut engine, _log) = create_engine();
    engine.settings_mut().crossfade_duration_secs = 0.0;
    engine.set_layer_volume(LayerKind::WhiteNoise, Volume::MAX);
    engine.play_all().unwrap();
    assert_eq!(engine.current_gain(LayerKind::WhiteNoise), Some(1.0));

    engine.set_layer_volume(LayerKind::WhiteNoise, Volume::new(0));
    assert_eq!(engine.current_gain(LayerKind::WhiteNoise), Some(0.0));
    assert!(engine.is_playing(LayerKind::WhiteNoise));
}

// === Crossfades ===

#[test]
fn test_ramp_reaches_target_after_crossfade() {
    let (mut engine, _log) = create_engine();
    engine.set_layer_volume(LayerKind::Rain, Volume::MAX);
    engine.play_all().unwrap();

    engine.set_layer_volume(LayerKind::Rain, Volume::new(30));
    advance(&mut engine, 1.0);
    assert_abs_diff_eq!(engine.current_gain(LayerKind::Rain).unwrap(), 0.30, epsilon = 1e-4);
}

#[test]
fn test_new_volume_supersedes_ramp_in_flight() {
    let (mut engine, _log) = create_engine();
    engine.set_layer_volume(LayerKind::Rain, Volume::MAX);
    engine.play_all().unwrap();

    engine.set_layer_volume(LayerKind::Rain, Volume::new(30));
    advance(&mut engine, 0.5);
    let midway = engine.current_gain(LayerKind::Rain).unwrap();
    assert_abs_diff_eq!(midway, 0.65, epsilon = 1e-4);

    engine.set_layer_volume(LayerKind::Rain, Volume::new(90));

    // the first ramp would have landed on 0.30 here
    advance(&mut engine, 0.5);
    assert_abs_diff_eq!(engine.current_gain(LayerKind::Rain).unwrap(), 0.775, epsilon = 1e-4);

    advance(&mut engine, 0.5);
    assert_abs_diff_eq!(engine.current_gain(LayerKind::Rain).unwrap(), 0.90, epsilon = 1e-4);

    advance(&mut engine, 2.0);
    assert_abs_diff_eq!(engine.current_gain(LayerKind::Rain).unwrap(), 0.90, epsilon = 1e-4);
}

#[test]
fn test_back_to_back_volume_changes() {
    let (mut engine, _log) = create_engine();
    engine.set_layer_volume(LayerKind::Rain, Volume::new(50));
    engine.play_all().unwrap();

    engine.set_layer_volume(LayerKind::Rain, Volume::new(30));
    engine.set_layer_volume(LayerKind::Rain, Volume::new(90));

    advance(&mut engine, 1.0);
    assert_abs_diff_eq!(engine.current_gain(LayerKind::Rain).unwrap(), 0.90, epsilon = 1e-4);
}

#[test]
fn test_rendered_level_tracks_volume() {
    let (mut engine, _log) = create_engine();
    engine.settings_mut().crossfade_duration_secs = 0.0;
    engine.set_layer_volume(LayerKind::WhiteNoise, Volume::MAX);
    engine.play_all().unwrap();

    let loud = engine.device_mut().unwrap().render(RATE as usize).rms_db();
    engine.set_layer_volume(LayerKind::WhiteNoise, Volume::new(50));
    let quiet = engine.device_mut().unwrap().render(RATE as usize).rms_db();

    // half the gain is about 6 dB down
    assert!((loud - quiet - 6.02).abs() < 0.5, "loud {:.2} dB, quiet {:.2} dB", loud, quiet);
}

#[test]
fn test_stop_during_ramp_is_silent() {
    let (mut engine, _log) = create_engine();
    engine.set_layer_volume(LayerKind::Rain, Volume::MAX);
    engine.play_all().unwrap();

    engine.set_layer_volume(LayerKind::Rain, Volume::new(20));
    advance(&mut engine, 0.3);
    engine.stop_layer(LayerKind::Rain);

    assert_eq!(engine.current_gain(LayerKind::Rain), None);
    assert_eq!(engine.device().unwrap().active_voices(), 0);
    let after = engine.device_mut().unwrap().render(RATE as usize);
    assert_eq!(after.peak_db(), f32::NEG_INFINITY);
}

// === Looping ===

#[test]
fn test_loop_off_falls_silent_after_buffer() {
    let (mut engine, _log) = create_engine();
    engine.settings_mut().auto_loop = false;
    engine.set_layer_volume(LayerKind::WhiteNoise, Volume::MAX);
    engine.play_all().unwrap();

    advance(&mut engine, 10.0);
    let tail = engine.device_mut().unwrap().render(RATE as usize);
    assert_eq!(tail.peak_db(), f32::NEG_INFINITY);

    // the layer stays playing until stopped
    assert!(engine.is_playing(LayerKind::WhiteNoise));
}

#[test]
fn test_loop_on_keeps_playing_past_buffer() {
    let (mut engine, _log) = create_engine();
    engine.set_layer_volume(LayerKind::WhiteNoise, Volume::MAX);
    engine.play_all().unwrap();

    advance(&mut engine, 10.0);
    let tail = engine.device_mut().unwrap().render(RATE as usize);
    assert!(tail.peak_db() > -20.0, "peak {:.1} dB", tail.peak_db());
}

#[test]
fn test_loop_setting_applies_to_next_play() {
    let (mut engine, _log) = create_engine();
    engine.set_layer_volume(LayerKind::WhiteNoise, Volume::MAX);
    engine.play_all().unwrap();

    // changing the setting leaves the running voice alone
    engine.settings_mut().auto_loop = false;
    advance(&mut engine, 10.0);
    let looped = engine.device_mut().unwrap().render(RATE as usize);
    assert!(looped.peak_db().is_finite());

    engine.stop_layer(LayerKind::WhiteNoise);
    engine.play_layer(LayerKind::WhiteNoise);
    advance(&mut engine, 10.0);
    let tail = engine.device_mut().unwrap().render(RATE as usize);
    assert_eq!(tail.peak_db(), f32::NEG_INFINITY);
}

// === Sleep Timer ===

struct CountingStop<'a> {
    engine: &'a mut MixerEngine,
    calls: usize,
}

impl StopAll for CountingStop<'_> {
    fn stop_all(&mut self) {
        self.calls += 1;
        self.engine.stop_all();
    }
}

#[test]
fn test_timer_expiry_stops_once() {
    let (mut engine, log) = create_engine();
    engine.set_layer_volume(LayerKind::Rain, Volume::new(40));
    engine.set_layer_volume(LayerKind::Synth, Volume::new(20));
    engine.play_all().unwrap();

    let clock = Arc::new(ManualClock::new());
    let mut timer = PlaybackTimer::with_clock(Arc::clone(&clock));
    timer.set_observer(log.clone());
    timer.set_timer(1);

    let mut target = CountingStop {
        engine: &mut engine,
        calls: 0,
    };

    clock.advance(Duration::from_secs(30));
    let tick = timer.tick(&mut target).unwrap();
    assert_eq!(tick.to_string(), "0:30 remaining");

    clock.advance(Duration::from_secs(31));
    assert!(timer.tick(&mut target).unwrap().expired);
    assert!(timer.tick(&mut target).is_none());
    clock.advance(Duration::from_secs(60));
    assert!(timer.tick(&mut target).is_none());

    assert_eq!(target.calls, 1);
    assert!(engine.playing_layers().is_empty());

    let expired = log
        .events()
        .into_iter()
        .filter(|e| matches!(e, MixerEvent::TimerTick { expired: true, .. }))
        .count();
    assert_eq!(expired, 1);
}

#[test]
fn test_timer_zero_cancels() {
    let (mut engine, _log) = create_engine();
    engine.set_layer_volume(LayerKind::Cafe, Volume::new(40));
    engine.play_all().unwrap();

    let clock = Arc::new(ManualClock::new());
    let mut timer = PlaybackTimer::with_clock(Arc::clone(&clock));
    timer.set_timer(1);
    let tick = timer.set_timer(0);
    assert_eq!(tick.to_string(), "No timer set");

    clock.advance(Duration::from_secs(120));
    assert!(timer.tick(&mut engine).is_none());
    assert!(engine.is_playing(LayerKind::Cafe));
}

// === Presets and Share Links ===

#[test]
fn test_preset_restores_mix() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("presets.json");

    let (mut engine, _log) = create_engine();
    engine.set_layer_volume(LayerKind::Rain, Volume::new(70));
    engine.set_layer_volume(LayerKind::Cafe, Volume::new(25));

    let mut library = PresetLibrary::load(&path).unwrap();
    library.add(Preset::capture("Study", engine.volumes()).unwrap());
    library.save(&path).unwrap();

    let (mut restored, _log) = create_engine();
    let library = PresetLibrary::load(&path).unwrap();
    restored.apply_volumes(&library.get("Study").unwrap().layers);

    assert_eq!(restored.volumes(), engine.volumes());
    restored.play_all().unwrap();
    assert_eq!(restored.playing_layers(), vec![LayerKind::Rain, LayerKind::Cafe]);
}

#[test]
fn test_share_link_round_trip() {
    let (mut engine, _log) = create_engine();
    engine.set_layer_volume(LayerKind::WhiteNoise, Volume::new(100));
    engine.set_layer_volume(LayerKind::Synth, Volume::new(1));

    let link = share_link("https://example.com/", &engine.volumes()).unwrap();
    let (mut other, _log) = create_engine();
    other.apply_volumes(&decode_share_link(&link).unwrap());

    assert_eq!(other.volumes(), engine.volumes());
}

#[test]
fn test_silent_mix_has_no_link() {
    let (engine, _log) = create_engine();
    assert!(share_link("https://example.com/", &engine.volumes()).is_none());
}

// === Synthesis ===

#[test]
fn test_engine_buffers_match_device_rate() {
    let (mut engine, _log) = create_engine();
    engine.initialize().unwrap();

    for kind in LayerKind::ALL {
        let buffer = engine.layer(kind).buffer().unwrap();
        assert_eq!(buffer.sample_rate(), RATE);
        assert_eq!(buffer.len(), RATE as usize * 10);
        assert_eq!(buffer.channels(), 2);
    }
}

#[test]
fn test_same_seed_same_textures() {
    let a = NoiseGenerator::seeded(99);
    let b = NoiseGenerator::seeded(99);

    // generation order does not matter
    let cafe_b = b.generate(LayerKind::Cafe, RATE);
    let rain_b = b.generate(LayerKind::Rain, RATE);
    assert_eq!(a.generate(LayerKind::Rain, RATE), rain_b);
    assert_eq!(a.generate(LayerKind::Cafe, RATE), cafe_b);
}

#[test]
fn test_device_clock_follows_rendering() {
    let (mut engine, _log) = create_engine();
    engine.initialize().unwrap();
    advance(&mut engine, 2.5);
    assert_abs_diff_eq!(engine.device().unwrap().current_time(), 2.5, epsilon = 1e-9);
}
