//! Soundscapes - Procedural Ambient Mixer
//!
//! Soundscapes synthesizes four looping textures from noise and oscillators
//! and blends them at independent volumes:
//! - rain: filtered pink-ish noise
//! - cafe: brown-ish noise with a slow swell
//! - whitenoise: plain uniform noise
//! - synth: a three-oscillator pad
//!
//! # Architecture
//!
//! - `synth`: buffer generation, seeded and reproducible
//! - `engine`: sample buffers, gain ramps, output devices and the sleep timer
//! - `mixer`: layers, volumes, crossfades and the command interface
//! - `state`: presets and share links

pub mod cli;
pub mod engine;
pub mod error;
pub mod mixer;
pub mod state;
pub mod synth;

pub use error::{Result, SoundscapeError};
