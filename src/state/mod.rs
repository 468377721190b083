//! Saved State Module
//!
//! Presets and share links: the two ways a mix leaves the mixer.

pub mod preset;
pub mod share;

pub use preset::{Preset, PresetLibrary};
pub use share::{decode_share_link, encode_query, share_link};
