//! Texture synthesis.
//!
//! Generates the four looping textures from scratch: filtered pink-ish noise
//! (rain), brown-ish noise with a slow swell (cafe), plain white noise, and a
//! three-oscillator pad under a half-sine envelope (synth).
//!
//! Samples are computed in `f64` and stored as `f32`.

use std::f64::consts::PI;

use log::debug;
use rand::Rng;

use crate::engine::buffer::{SampleBuffer, LOOP_DURATION_SECS, OUTPUT_CHANNELS};
use crate::mixer::layer::LayerKind;
use crate::synth::rng::{create_rng, derive_texture_seed, entropy_seed, white_sample};

/// Pad oscillator frequencies: A2, D3, E3.
pub const PAD_FREQUENCIES: [f64; 3] = [110.0, 146.83, 164.81];

/// Rate of the cafe texture's amplitude swell in Hz.
const CAFE_SWELL_HZ: f64 = 0.5;

/// Number of frames in one loop at `sample_rate`.
pub fn loop_frames(sample_rate: u32) -> usize {
    sample_rate as usize * LOOP_DURATION_SECS as usize
}

/// Generates texture buffers from a seedable random source.
///
/// # Example
/// ```
/// use soundscapes::mixer::LayerKind;
/// use soundscapes::synth::NoiseGenerator;
///
/// let generator = NoiseGenerator::seeded(7);
/// let a = generator.generate(LayerKind::Rain, 8000);
/// let b = generator.generate(LayerKind::Rain, 8000);
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 80_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoiseGenerator {
    seed: u64,
}

impl NoiseGenerator {
    /// Creates a generator with a fixed base seed.
    pub fn seeded(seed: u64) -> Self {
        Self { seed }
    }

    /// Creates a generator seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::seeded(entropy_seed())
    }

    /// The base seed in use.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generates a stereo loop of `kind` at `sample_rate`.
    pub fn generate(&self, kind: LayerKind, sample_rate: u32) -> SampleBuffer {
        let mut rng = create_rng(derive_texture_seed(self.seed, kind.as_str()));
        let buffer = generate_with(kind, sample_rate, &mut rng);
        debug!(
            "generated {} texture: {} frames at {} Hz",
            kind,
            buffer.len(),
            sample_rate
        );
        buffer
    }
}

impl Default for NoiseGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// Generates a stereo loop of `kind` drawing white samples from `rng`.
///
/// Channels are filled one after the other from the same stream, so noise
/// textures get different left and right channels.
pub fn generate_with<R: Rng + ?Sized>(
    kind: LayerKind,
    sample_rate: u32,
    rng: &mut R,
) -> SampleBuffer {
    let frames = loop_frames(sample_rate);
    let mut buffer = SampleBuffer::silence(OUTPUT_CHANNELS, frames, sample_rate);

    for channel in 0..OUTPUT_CHANNELS {
        let data = buffer.channel_mut(channel);
        match kind {
            LayerKind::Rain => fill_rain(data, rng),
            LayerKind::Cafe => fill_cafe(data, sample_rate, rng),
            LayerKind::WhiteNoise => fill_white(data, rng),
            LayerKind::Synth => fill_pad(data, sample_rate),
        }
    }

    buffer
}

/// Pink-ish noise from a seven-stage filter bank.
///
/// `b6` enters the sum before it is refreshed, so each output carries the
/// previous sample's `b6` term.
fn fill_rain<R: Rng + ?Sized>(data: &mut [f32], rng: &mut R) {
    let (mut b0, mut b1, mut b2, mut b3, mut b4, mut b5, mut b6) =
        (0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0_f64);

    for sample in data.iter_mut() {
        let white = white_sample(rng);
        b0 = 0.99886 * b0 + white * 0.0555179;
        b1 = 0.99332 * b1 + white * 0.0750759;
        b2 = 0.96900 * b2 + white * 0.1538520;
        b3 = 0.86650 * b3 + white * 0.3104856;
        b4 = 0.55000 * b4 + white * 0.5329522;
        b5 = -0.7616 * b5 - white * 0.0168980;
        *sample = ((b0 + b1 + b2 + b3 + b4 + b5 + b6 + white * 0.5362) * 0.11) as f32;
        b6 = white * 0.115926;
    }
}

/// Brown-ish noise from a leaky integrator plus a slow sine swell.
fn fill_cafe<R: Rng + ?Sized>(data: &mut [f32], sample_rate: u32, rng: &mut R) {
    let rate = sample_rate as f64;
    let mut b0 = 0.0_f64;

    for (i, sample) in data.iter_mut().enumerate() {
        let white = white_sample(rng);
        b0 = (b0 + 0.02 * white) / 1.02;
        let swell = (i as f64 / rate * 2.0 * PI * CAFE_SWELL_HZ).sin() * 0.3;
        *sample = ((b0 * 3.5 + swell) * 0.3) as f32;
    }
}

fn fill_white<R: Rng + ?Sized>(data: &mut [f32], rng: &mut R) {
    for sample in data.iter_mut() {
        *sample = white_sample(rng) as f32;
    }
}

/// Three averaged sines under one half-sine envelope spanning the loop, so
/// the loop starts and ends at silence.
fn fill_pad(data: &mut [f32], sample_rate: u32) {
    let rate = sample_rate as f64;
    let duration = LOOP_DURATION_SECS as f64;

    for (i, sample) in data.iter_mut().enumerate() {
        let t = i as f64 / rate;
        let envelope = (t * PI / duration).sin() * 0.5;
        let sum: f64 = PAD_FREQUENCIES
            .iter()
            .map(|freq| (2.0 * PI * freq * t).sin())
            .sum();
        *sample = (sum / 3.0 * envelope * 0.3) as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::buffer::{channel_peak, channel_rms};
    use crate::synth::rng::create_rng;
    use approx::assert_relative_eq;

    const RATE: u32 = 8000;

    #[test]
    fn test_all_textures_have_loop_length() {
        let generator = NoiseGenerator::seeded(1);
        for kind in LayerKind::ALL {
            let buffer = generator.generate(kind, RATE);
            assert_eq!(buffer.channels(), 2, "{}", kind);
            assert_eq!(buffer.len(), RATE as usize * 10, "{}", kind);
            assert_eq!(buffer.sample_rate(), RATE);
        }
    }

    #[test]
    fn test_arbitrary_sample_rates() {
        let generator = NoiseGenerator::seeded(1);
        for rate in [22050, 44100, 96000] {
            assert_eq!(
                generator.generate(LayerKind::WhiteNoise, rate).len(),
                rate as usize * 10
            );
        }
    }

    #[test]
    fn test_noise_channels_differ() {
        let generator = NoiseGenerator::seeded(3);
        for kind in [LayerKind::Rain, LayerKind::Cafe, LayerKind::WhiteNoise] {
            let buffer = generator.generate(kind, RATE);
            assert_ne!(buffer.channel(0), buffer.channel(1), "{}", kind);
        }
    }

    #[test]
    fn test_pad_channels_identical() {
        let buffer = NoiseGenerator::seeded(3).generate(LayerKind::Synth, RATE);
        assert_eq!(buffer.channel(0), buffer.channel(1));
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        for kind in [LayerKind::Rain, LayerKind::Cafe] {
            let a = NoiseGenerator::seeded(99).generate(kind, RATE);
            let b = NoiseGenerator::seeded(99).generate(kind, RATE);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = NoiseGenerator::seeded(1).generate(LayerKind::Rain, RATE);
        let b = NoiseGenerator::seeded(2).generate(LayerKind::Rain, RATE);
        assert_ne!(a, b);
    }

    #[test]
    fn test_rain_matches_filter_bank() {
        // Recompute the first samples by hand from the same stream.
        let mut reference_rng = create_rng(5);
        let mut rng = create_rng(5);
        let buffer = generate_with(LayerKind::Rain, RATE, &mut rng);

        let w0 = white_sample(&mut reference_rng);
        let w1 = white_sample(&mut reference_rng);

        let first = (w0 * 0.0555179
            + w0 * 0.0750759
            + w0 * 0.1538520
            + w0 * 0.3104856
            + w0 * 0.5329522
            - w0 * 0.0168980
            + w0 * 0.5362)
            * 0.11;
        assert_relative_eq!(buffer.channel(0)[0], first as f32, epsilon = 1e-6);

        let b0 = 0.99886 * (w0 * 0.0555179) + w1 * 0.0555179;
        let b1 = 0.99332 * (w0 * 0.0750759) + w1 * 0.0750759;
        let b2 = 0.96900 * (w0 * 0.1538520) + w1 * 0.1538520;
        let b3 = 0.86650 * (w0 * 0.3104856) + w1 * 0.3104856;
        let b4 = 0.55000 * (w0 * 0.5329522) + w1 * 0.5329522;
        let b5 = -0.7616 * (-w0 * 0.0168980) - w1 * 0.0168980;
        let b6 = w0 * 0.115926;
        let second = (b0 + b1 + b2 + b3 + b4 + b5 + b6 + w1 * 0.5362) * 0.11;
        assert_relative_eq!(buffer.channel(0)[1], second as f32, epsilon = 1e-6);
    }

    #[test]
    fn test_white_noise_in_range() {
        let buffer = NoiseGenerator::seeded(11).generate(LayerKind::WhiteNoise, RATE);
        for channel in 0..2 {
            assert!(buffer.channel(channel).iter().all(|s| (-1.0..1.0).contains(s)));
            // Uniform noise on [-1, 1) has RMS 1/sqrt(3).
            assert_relative_eq!(channel_rms(buffer.channel(channel)), 0.577, epsilon = 0.01);
        }
    }

    #[test]
    fn test_cafe_carries_slow_swell() {
        let buffer = NoiseGenerator::seeded(4).generate(LayerKind::Cafe, RATE);
        // The swell peaks at t = 0.5 s (0.3 * 0.3 = 0.09) and troughs at 1.5 s.
        let half_window = RATE as usize / 10;
        let around = |t: f64| -> f32 {
            let center = (t * RATE as f64) as usize;
            let range = center - half_window..center + half_window;
            let sum: f32 = (0..2)
                .map(|ch| buffer.channel(ch)[range.clone()].iter().sum::<f32>())
                .sum();
            sum / (4 * half_window) as f32
        };
        assert!(around(0.5) > 0.03);
        assert!(around(1.5) < -0.03);
    }

    #[test]
    fn test_pad_envelope_starts_and_ends_silent() {
        let buffer = NoiseGenerator::seeded(0).generate(LayerKind::Synth, RATE);
        let data = buffer.channel(0);
        assert_eq!(data[0], 0.0);
        assert!(data[data.len() - 1].abs() < 1e-3);
        assert!(channel_peak(data) <= 0.15 + 1e-6);
        assert!(channel_peak(&data[data.len() / 2 - 400..data.len() / 2 + 400]) > 0.05);
    }
}
