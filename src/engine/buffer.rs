//! Sample Buffer
//!
//! Non-interleaved multi-channel `f32` storage used for generated textures and
//! rendered mixes. Generated textures are wrapped in `Arc` and never mutated
//! after creation.

// ============================================================================
// Constants
// ============================================================================

/// Length of every generated texture loop in seconds
pub const LOOP_DURATION_SECS: u32 = 10;

/// Number of channels in generated textures and rendered output
pub const OUTPUT_CHANNELS: usize = 2;

/// Default device sample rate when none is specified
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert linear amplitude to decibels
///
/// Returns `f32::NEG_INFINITY` for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Calculate the RMS level of a single channel (linear)
pub fn channel_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_squares / samples.len() as f64).sqrt() as f32
}

/// Calculate the absolute peak of a single channel (linear)
pub fn channel_peak(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0_f32, f32::max)
}

// ============================================================================
// Sample Buffer
// ============================================================================

/// Multi-channel sample storage at a declared sample rate
///
/// Every channel has the same length.
///
/// # Example
/// ```
/// use soundscapes::engine::SampleBuffer;
///
/// let buffer = SampleBuffer::silence(2, 48000, 48000);
/// assert_eq!(buffer.channels(), 2);
/// assert_eq!(buffer.len(), 48000);
/// assert_eq!(buffer.duration_secs(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    samples: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Create a zeroed buffer
    ///
    /// # Arguments
    /// * `channels` - Number of channels
    /// * `frames` - Number of samples per channel
    /// * `sample_rate` - Sample rate in Hz
    pub fn silence(channels: usize, frames: usize, sample_rate: u32) -> Self {
        Self {
            samples: vec![vec![0.0_f32; frames]; channels],
            sample_rate,
        }
    }

    /// Create a buffer from per-channel sample vectors
    ///
    /// Channels shorter than the longest one are zero-padded so the equal
    /// length invariant holds.
    pub fn from_channels(mut samples: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        let frames = samples.iter().map(Vec::len).max().unwrap_or(0);
        for channel in &mut samples {
            channel.resize(frames, 0.0);
        }
        Self {
            samples,
            sample_rate,
        }
    }

    /// Get the number of channels
    #[inline]
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Get the number of samples per channel
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer holds no samples
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the sample rate in Hz
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Get immutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Get mutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.samples[index]
    }

    /// RMS level in dB across all channels
    pub fn rms_db(&self) -> f32 {
        let total = self.channels() * self.len();
        if total == 0 {
            return f32::NEG_INFINITY;
        }

        let sum_squares: f64 = self
            .samples
            .iter()
            .flat_map(|channel| channel.iter())
            .map(|&s| (s as f64) * (s as f64))
            .sum();

        linear_to_db((sum_squares / total as f64).sqrt() as f32)
    }

    /// Peak level in dB across all channels
    pub fn peak_db(&self) -> f32 {
        let peak = self
            .samples
            .iter()
            .map(|channel| channel_peak(channel))
            .fold(0.0_f32, f32::max);
        linear_to_db(peak)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
