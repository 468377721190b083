//! Layer Mixer Module
//!
//! The four texture layers, their volumes and play state, and the engine
//! that drives them on the output device.

pub mod command;
pub mod engine;
pub mod layer;
pub mod observer;
pub mod settings;

pub use command::Command;
pub use engine::MixerEngine;
pub use layer::{Layer, LayerKind, Volume, VolumeMap};
pub use observer::{EventLog, MixerEvent, MixerObserver};
pub use settings::{MixerSettings, DEFAULT_CROSSFADE_SECS};
