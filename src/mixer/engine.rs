//! Mixer Engine
//!
//! Owns the four layers and the shared output device. All operations only
//! schedule work on the device and return immediately.
//!
//! The device is opened lazily through a small state machine:
//! `Uninitialized --ensure_ready()--> Ready(device)`. Opening the device also
//! generates every layer's buffer, once per engine.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::engine::output::{AudioBackend, OfflineBackend, OutputDevice};
use crate::engine::timer::StopAll;
use crate::error::Result;
use crate::mixer::command::Command;
use crate::mixer::layer::{Layer, LayerKind, Volume, VolumeMap};
use crate::mixer::observer::MixerObserver;
use crate::mixer::settings::MixerSettings;
use crate::synth::NoiseGenerator;

/// Output device lifecycle
#[derive(Debug)]
enum DeviceState<D> {
    Uninitialized,
    Ready(D),
}

/// The layer mixer
///
/// # Example
/// ```
/// use soundscapes::engine::OfflineBackend;
/// use soundscapes::mixer::{LayerKind, MixerEngine, Volume};
/// use soundscapes::synth::NoiseGenerator;
///
/// let mut mixer = MixerEngine::with_generator(OfflineBackend::new(8000), NoiseGenerator::seeded(1));
/// mixer.set_layer_volume(LayerKind::Rain, Volume::new(50));
/// mixer.play_all().unwrap();
/// assert_eq!(mixer.playing_layers(), vec![LayerKind::Rain]);
/// ```
pub struct MixerEngine<B: AudioBackend = OfflineBackend> {
    backend: B,
    device: DeviceState<B::Device>,
    generator: NoiseGenerator,
    layers: [Layer; 4],
    settings: MixerSettings,
    observer: Option<Arc<dyn MixerObserver>>,
}

impl<B: AudioBackend> MixerEngine<B> {
    /// Create an engine whose textures are seeded from OS entropy
    pub fn new(backend: B) -> Self {
        Self::with_generator(backend, NoiseGenerator::from_entropy())
    }

    /// Create an engine with a specific texture generator
    pub fn with_generator(backend: B, generator: NoiseGenerator) -> Self {
        Self {
            backend,
            device: DeviceState::Uninitialized,
            generator,
            layers: LayerKind::ALL.map(Layer::new),
            settings: MixerSettings::default(),
            observer: None,
        }
    }

    /// Attach an observer for layer state notifications
    pub fn set_observer(&mut self, observer: Arc<dyn MixerObserver>) {
        self.observer = Some(observer);
    }

    pub fn settings(&self) -> &MixerSettings {
        &self.settings
    }

    /// Change settings; only affects operations issued afterwards
    pub fn set_settings(&mut self, settings: MixerSettings) {
        self.settings = settings;
    }

    pub fn settings_mut(&mut self) -> &mut MixerSettings {
        &mut self.settings
    }

    // ========================================================================
    // Device Lifecycle
    // ========================================================================

    /// Open the device and generate buffers, once
    ///
    /// # Errors
    /// * `EnvironmentUnavailable` - if the backend cannot open a device. The
    ///   engine stays uninitialized; nothing is retried automatically.
    pub fn ensure_ready(&mut self) -> Result<()> {
        if let DeviceState::Ready(_) = self.device {
            return Ok(());
        }

        let device = self.backend.open().map_err(|e| {
            warn!("Audio output could not be opened: {}", e);
            e
        })?;
        let sample_rate = device.sample_rate();
        info!("Audio output ready at {} Hz", sample_rate);

        for layer in &mut self.layers {
            if !layer.has_buffer() {
                let buffer = self.generator.generate(layer.kind(), sample_rate);
                layer.set_buffer(Arc::new(buffer));
            }
        }

        self.device = DeviceState::Ready(device);
        Ok(())
    }

    /// Alias for [`MixerEngine::ensure_ready`]
    pub fn initialize(&mut self) -> Result<()> {
        self.ensure_ready()
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.device, DeviceState::Ready(_))
    }

    /// The output device, once opened
    pub fn device(&self) -> Option<&B::Device> {
        match &self.device {
            DeviceState::Ready(device) => Some(device),
            DeviceState::Uninitialized => None,
        }
    }

    /// Mutable access to the output device, once opened
    pub fn device_mut(&mut self) -> Option<&mut B::Device> {
        match &mut self.device {
            DeviceState::Ready(device) => Some(device),
            DeviceState::Uninitialized => None,
        }
    }

    // ========================================================================
    // Layer Control
    // ========================================================================

    pub fn layer(&self, kind: LayerKind) -> &Layer {
        &self.layers[kind.index()]
    }

    /// Start a stopped layer or stop a playing one, opening the device first
    pub fn toggle_layer(&mut self, kind: LayerKind) -> Result<()> {
        self.ensure_ready()?;

        if self.layer(kind).is_playing() {
            self.stop_layer(kind);
        } else {
            self.play_layer(kind);
        }
        Ok(())
    }

    /// Start a layer at its current volume
    ///
    /// Does nothing if the layer has no buffer yet (device not opened) or is
    /// already playing.
    pub fn play_layer(&mut self, kind: LayerKind) {
        let DeviceState::Ready(device) = &mut self.device else {
            debug!("play {} ignored: no buffer yet", kind);
            return;
        };

        let layer = &mut self.layers[kind.index()];
        if layer.is_playing() {
            return;
        }
        let Some(buffer) = layer.buffer().cloned() else {
            debug!("play {} ignored: no buffer yet", kind);
            return;
        };

        let handle = device.start(buffer, layer.gain(), self.settings.auto_loop);
        layer.attach(handle);
        debug!("{} playing at {}", kind, layer.volume());

        self.notify(kind, true);
    }

    /// Stop a layer and release its voice; any ramp in flight is dropped
    pub fn stop_layer(&mut self, kind: LayerKind) {
        let layer = &mut self.layers[kind.index()];
        if !layer.is_playing() {
            return;
        }

        if let Some(handle) = layer.detach() {
            if let DeviceState::Ready(device) = &mut self.device {
                device.stop(handle);
            }
        }
        debug!("{} stopped", kind);

        self.notify(kind, false);
    }

    /// Record a new volume and, if the layer is playing, crossfade to it
    ///
    /// The ramp starts from the gain's value right now and replaces any ramp
    /// still in progress.
    pub fn set_layer_volume(&mut self, kind: LayerKind, volume: Volume) {
        let layer = &mut self.layers[kind.index()];
        layer.set_volume(volume);

        let (Some(handle), DeviceState::Ready(device)) = (layer.handle(), &mut self.device) else {
            return;
        };

        let crossfade = self.settings.crossfade_secs();
        device.ramp_gain(handle, volume.gain(), crossfade);
        debug!("{} ramping to {} over {:.2}s", kind, volume, crossfade);
    }

    /// Start every stopped layer whose volume is above zero
    pub fn play_all(&mut self) -> Result<()> {
        self.ensure_ready()?;

        for kind in LayerKind::ALL {
            let layer = self.layer(kind);
            if !layer.volume().is_silent() && !layer.is_playing() {
                self.play_layer(kind);
            }
        }
        Ok(())
    }

    /// Stop every playing layer
    pub fn stop_all(&mut self) {
        for kind in LayerKind::ALL {
            if self.layer(kind).is_playing() {
                self.stop_layer(kind);
            }
        }
    }

    // ========================================================================
    // Volume Snapshot
    // ========================================================================

    pub fn volume(&self, kind: LayerKind) -> Volume {
        self.layer(kind).volume()
    }

    /// Every layer's volume, for presets and share links
    pub fn volumes(&self) -> VolumeMap {
        self.layers
            .iter()
            .map(|layer| (layer.kind(), layer.volume()))
            .collect()
    }

    /// Set several volumes at once, each through [`MixerEngine::set_layer_volume`]
    pub fn apply_volumes<'a, I>(&mut self, volumes: I)
    where
        I: IntoIterator<Item = (&'a LayerKind, &'a Volume)>,
    {
        for (kind, volume) in volumes {
            self.set_layer_volume(*kind, *volume);
        }
    }

    /// Gain a layer is producing right now, or None if it is not playing
    pub fn current_gain(&self, kind: LayerKind) -> Option<f32> {
        let handle = self.layer(kind).handle()?;
        self.device()?.gain(handle)
    }

    pub fn is_playing(&self, kind: LayerKind) -> bool {
        self.layer(kind).is_playing()
    }

    /// Layers currently playing, in mixer order
    pub fn playing_layers(&self) -> Vec<LayerKind> {
        self.layers
            .iter()
            .filter(|layer| layer.is_playing())
            .map(Layer::kind)
            .collect()
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Run a command
    ///
    /// Commands naming an unknown layer are ignored. Only device failures
    /// are returned as errors.
    pub fn apply(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Toggle { layer } => {
                if let Some(kind) = Self::resolve(&layer) {
                    self.toggle_layer(kind)?;
                }
            }
            Command::Play { layer } => {
                if let Some(kind) = Self::resolve(&layer) {
                    self.play_layer(kind);
                }
            }
            Command::Stop { layer } => {
                if let Some(kind) = Self::resolve(&layer) {
                    self.stop_layer(kind);
                }
            }
            Command::SetVolume { layer, volume } => {
                if let Some(kind) = Self::resolve(&layer) {
                    self.set_layer_volume(kind, volume);
                }
            }
            Command::PlayAll => self.play_all()?,
            Command::StopAll => self.stop_all(),
        }
        Ok(())
    }

    fn resolve(name: &str) -> Option<LayerKind> {
        match name.parse() {
            Ok(kind) => Some(kind),
            Err(e) => {
                debug!("ignoring command: {}", e);
                None
            }
        }
    }

    fn notify(&self, kind: LayerKind, playing: bool) {
        if let Some(observer) = &self.observer {
            observer.on_layer_state_changed(kind, playing);
        }
    }
}

impl<B: AudioBackend> StopAll for MixerEngine<B> {
    fn stop_all(&mut self) {
        MixerEngine::stop_all(self);
    }
}

impl Default for MixerEngine<OfflineBackend> {
    fn default() -> Self {
        Self::new(OfflineBackend::default())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
