//! Procedural Texture Synthesis
//!
//! Builds every layer's loop buffer from scratch; there are no audio assets.

pub mod noise;
pub mod rng;

pub use noise::{generate_with, loop_frames, NoiseGenerator, PAD_FREQUENCIES};
