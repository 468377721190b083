//! Audio Output
//!
//! The mixer talks to the audio device through two traits:
//! - [`AudioBackend`] opens a device (this is where environment failures surface)
//! - [`OutputDevice`] starts and stops voices and schedules gain ramps
//!
//! [`OfflineBackend`] provides a software device that renders the mix into
//! memory. Its clock advances only as frames are rendered.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::engine::buffer::{SampleBuffer, DEFAULT_SAMPLE_RATE, OUTPUT_CHANNELS};
use crate::engine::gain::GainParam;
use crate::error::{Result, SoundscapeError};

// ============================================================================
// Playback Handle
// ============================================================================

/// Exclusive handle to one playing voice
///
/// Not `Clone`: whoever holds the handle owns the voice, and stopping the
/// voice consumes the handle.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct PlaybackHandle {
    id: u64,
}

impl PlaybackHandle {
    /// Create a handle for a device-assigned voice id
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    /// The device-assigned voice id
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Display for PlaybackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "voice#{}", self.id)
    }
}

// ============================================================================
// Device Traits
// ============================================================================

/// A shared audio output with its own clock
pub trait OutputDevice {
    /// Device sample rate in Hz
    fn sample_rate(&self) -> u32;

    /// Output clock in seconds
    fn current_time(&self) -> f64;

    /// Start playing `buffer` from position 0 through a fresh gain control
    fn start(&mut self, buffer: Arc<SampleBuffer>, gain: f32, looping: bool) -> PlaybackHandle;

    /// Stop a voice immediately, abandoning any gain ramp in flight
    fn stop(&mut self, handle: PlaybackHandle);

    /// Replace the voice's scheduled gain changes with a linear ramp to
    /// `target` starting now and lasting `duration_secs`
    fn ramp_gain(&mut self, handle: &PlaybackHandle, target: f32, duration_secs: f64);

    /// Current gain of a voice, or None if the device no longer knows it
    fn gain(&self, handle: &PlaybackHandle) -> Option<f32>;
}

/// Opens the shared output device
pub trait AudioBackend {
    type Device: OutputDevice;

    /// Create the device
    ///
    /// # Errors
    /// * `EnvironmentUnavailable` - if no output can be created
    fn open(&self) -> Result<Self::Device>;
}

// ============================================================================
// Offline Backend
// ============================================================================

/// Backend producing [`OfflineDevice`]s at a fixed sample rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfflineBackend {
    sample_rate: u32,
}

impl OfflineBackend {
    /// Create a backend for the given sample rate
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

impl Default for OfflineBackend {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

impl AudioBackend for OfflineBackend {
    type Device = OfflineDevice;

    fn open(&self) -> Result<OfflineDevice> {
        if self.sample_rate == 0 {
            return Err(SoundscapeError::environment(
                "output device reported a sample rate of 0 Hz",
            ));
        }
        Ok(OfflineDevice::new(self.sample_rate))
    }
}

/// A voice inside the offline device
#[derive(Debug)]
struct Voice {
    buffer: Arc<SampleBuffer>,
    gain: GainParam,
    position: usize,
    looping: bool,
    finished: bool,
}

/// Software output device that mixes voices into stereo blocks on demand
#[derive(Debug)]
pub struct OfflineDevice {
    sample_rate: u32,
    frames_rendered: u64,
    next_id: u64,
    voices: HashMap<u64, Voice>,
}

impl OfflineDevice {
    /// Create a device with its clock at zero
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            frames_rendered: 0,
            next_id: 0,
            voices: HashMap::new(),
        }
    }

    /// Number of voices still producing sound
    pub fn active_voices(&self) -> usize {
        self.voices.values().filter(|v| !v.finished).count()
    }

    /// Frames rendered since the device opened
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Render `frames` frames of the mix and advance the clock
    ///
    /// Each voice is multiplied by its gain at every frame and summed.
    /// Looping voices wrap to position 0; others fall silent at the end of
    /// their buffer.
    pub fn render(&mut self, frames: usize) -> SampleBuffer {
        let mut output = SampleBuffer::silence(OUTPUT_CHANNELS, frames, self.sample_rate);
        let start_frame = self.frames_rendered;
        let rate = self.sample_rate as f64;

        for voice in self.voices.values_mut() {
            let source_channels = voice.buffer.channels();
            let source_len = voice.buffer.len();
            if source_channels == 0 || source_len == 0 {
                voice.finished = true;
            }

            for frame in 0..frames {
                if voice.finished {
                    break;
                }
                let time = (start_frame + frame as u64) as f64 / rate;
                let gain = voice.gain.value_at(time);

                for channel in 0..OUTPUT_CHANNELS {
                    let sample = voice.buffer.channel(channel % source_channels)[voice.position];
                    output.channel_mut(channel)[frame] += sample * gain;
                }

                voice.position += 1;
                if voice.position >= source_len {
                    if voice.looping {
                        voice.position = 0;
                    } else {
                        voice.finished = true;
                    }
                }
            }
        }

        self.frames_rendered += frames as u64;
        output
    }

    /// Advance the clock by `secs` seconds, discarding the rendered audio
    pub fn advance(&mut self, secs: f64) {
        let frames = (secs * self.sample_rate as f64).round() as usize;
        self.render(frames);
    }
}

impl OutputDevice for OfflineDevice {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn current_time(&self) -> f64 {
        self.frames_rendered as f64 / self.sample_rate as f64
    }

    fn start(&mut self, buffer: Arc<SampleBuffer>, gain: f32, looping: bool) -> PlaybackHandle {
        let id = self.next_id;
        self.next_id += 1;

        self.voices.insert(
            id,
            Voice {
                buffer,
                gain: GainParam::new(gain),
                position: 0,
                looping,
                finished: false,
            },
        );

        let handle = PlaybackHandle::new(id);
        debug!("started {} (gain {:.2}, loop {})", handle, gain, looping);
        handle
    }

    fn stop(&mut self, handle: PlaybackHandle) {
        if self.voices.remove(&handle.id).is_some() {
            debug!("stopped {}", handle);
        }
    }

    fn ramp_gain(&mut self, handle: &PlaybackHandle, target: f32, duration_secs: f64) {
        let now = self.current_time();
        if let Some(voice) = self.voices.get_mut(&handle.id) {
            voice.gain.ramp_to(target, now, duration_secs);
        }
    }

    fn gain(&self, handle: &PlaybackHandle) -> Option<f32> {
        let now = self.current_time();
        self.voices
            .get(&handle.id)
            .map(|voice| voice.gain.value_at(now))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
