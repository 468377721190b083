//! Layers
//!
//! A layer is one synthesized texture with its own volume and play state.
//! The set of layers is closed: rain, cafe, whitenoise and synth.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::engine::buffer::SampleBuffer;
use crate::engine::output::PlaybackHandle;
use crate::error::SoundscapeError;

// ============================================================================
// Layer Kind
// ============================================================================

/// The four textures a mix is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// Filtered pink-ish noise
    Rain,
    /// Brown-ish noise with a slow swell
    Cafe,
    /// Unfiltered white noise
    WhiteNoise,
    /// Three-oscillator pad
    Synth,
}

impl LayerKind {
    /// Every layer, in mixer order
    pub const ALL: [LayerKind; 4] = [
        LayerKind::Rain,
        LayerKind::Cafe,
        LayerKind::WhiteNoise,
        LayerKind::Synth,
    ];

    /// Identifier used in commands, presets and share links
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Rain => "rain",
            LayerKind::Cafe => "cafe",
            LayerKind::WhiteNoise => "whitenoise",
            LayerKind::Synth => "synth",
        }
    }

    /// Position in [`LayerKind::ALL`]
    pub fn index(&self) -> usize {
        match self {
            LayerKind::Rain => 0,
            LayerKind::Cafe => 1,
            LayerKind::WhiteNoise => 2,
            LayerKind::Synth => 3,
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerKind {
    type Err = SoundscapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LayerKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| SoundscapeError::InvalidLayerName {
                name: s.to_string(),
            })
    }
}

// ============================================================================
// Volume
// ============================================================================

/// Whole-percent volume, always within 0..=100
///
/// Out-of-range input is clamped rather than rejected.
///
/// # Example
/// ```
/// use soundscapes::mixer::Volume;
///
/// assert_eq!(Volume::new(250).percent(), 100);
/// assert_eq!(Volume::new(50).gain(), 0.5);
/// assert_eq!("42".parse::<Volume>().unwrap().percent(), 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Volume(u8);

impl Volume {
    /// Silent
    pub const MIN: Volume = Volume(0);

    /// Full scale
    pub const MAX: Volume = Volume(100);

    /// Create a volume, clamping to 100
    pub fn new(percent: u32) -> Self {
        Volume(percent.min(100) as u8)
    }

    /// Create a volume from a possibly fractional or negative number
    ///
    /// Rounds to the nearest whole percent and clamps to 0..=100. Returns
    /// None for NaN.
    pub fn from_f64(value: f64) -> Option<Self> {
        if value.is_nan() {
            return None;
        }
        Some(Volume(value.round().clamp(0.0, 100.0) as u8))
    }

    /// Percentage, 0..=100
    pub fn percent(&self) -> u8 {
        self.0
    }

    /// Linear gain, 0.0..=1.0
    pub fn gain(&self) -> f32 {
        self.0 as f32 / 100.0
    }

    /// Check if the volume is zero
    pub fn is_silent(&self) -> bool {
        self.0 == 0
    }
}

impl From<u8> for Volume {
    fn from(percent: u8) -> Self {
        Volume::new(percent as u32)
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl FromStr for Volume {
    type Err = SoundscapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches('%');
        trimmed
            .parse::<f64>()
            .ok()
            .and_then(Volume::from_f64)
            .ok_or_else(|| SoundscapeError::InvalidVolume {
                value: s.to_string(),
            })
    }
}

impl Serialize for Volume {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

// Stored records may carry volumes as numbers or as numeric strings.
impl<'de> Deserialize<'de> for Volume {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct VolumeVisitor;

        impl<'de> Visitor<'de> for VolumeVisitor {
            type Value = Volume;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a volume percentage as a number or numeric string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Volume, E> {
                Ok(Volume::new(v.min(u32::MAX as u64) as u32))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Volume, E> {
                Ok(Volume::new(v.clamp(0, 100) as u32))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Volume, E> {
                Volume::from_f64(v).ok_or_else(|| E::custom("volume is NaN"))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Volume, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(VolumeVisitor)
    }
}

/// Volume per layer, in mixer order
pub type VolumeMap = BTreeMap<LayerKind, Volume>;

// ============================================================================
// Layer
// ============================================================================

/// One texture channel inside the mixer
///
/// The buffer is generated once per session and shared read-only. The
/// playback handle exists only while the layer is playing.
#[derive(Debug)]
pub struct Layer {
    kind: LayerKind,
    buffer: Option<Arc<SampleBuffer>>,
    handle: Option<PlaybackHandle>,
    volume: Volume,
    playing: bool,
}

impl Layer {
    /// Create a stopped, silent layer with no buffer yet
    pub fn new(kind: LayerKind) -> Self {
        Self {
            kind,
            buffer: None,
            handle: None,
            volume: Volume::MIN,
            playing: false,
        }
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// The cached loop buffer, once generated
    pub fn buffer(&self) -> Option<&Arc<SampleBuffer>> {
        self.buffer.as_ref()
    }

    /// Install the generated buffer; later calls keep the first one
    pub fn set_buffer(&mut self, buffer: Arc<SampleBuffer>) {
        if self.buffer.is_none() {
            self.buffer = Some(buffer);
        }
    }

    pub fn has_buffer(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn volume(&self) -> Volume {
        self.volume
    }

    pub fn set_volume(&mut self, volume: Volume) {
        self.volume = volume;
    }

    /// Gain the layer plays at once any ramp has settled
    pub fn gain(&self) -> f32 {
        self.volume.gain()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn handle(&self) -> Option<&PlaybackHandle> {
        self.handle.as_ref()
    }

    /// Take ownership of a freshly started voice and mark the layer playing
    pub fn attach(&mut self, handle: PlaybackHandle) {
        self.handle = Some(handle);
        self.playing = true;
    }

    /// Give up the voice (if any) and mark the layer stopped
    pub fn detach(&mut self) -> Option<PlaybackHandle> {
        self.playing = false;
        self.handle.take()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
