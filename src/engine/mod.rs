//! Audio Engine Module
//!
//! Playback plumbing underneath the mixer:
//! - Sample buffers and level measurement
//! - Gain automation with linear ramps
//! - Output devices and voices
//! - The sleep timer

pub mod buffer;
pub mod gain;
pub mod output;
pub mod timer;

pub use buffer::{SampleBuffer, DEFAULT_SAMPLE_RATE, LOOP_DURATION_SECS, OUTPUT_CHANNELS};
pub use gain::GainParam;
pub use output::{AudioBackend, OfflineBackend, OfflineDevice, OutputDevice, PlaybackHandle};
pub use timer::{
    format_remaining, Clock, ManualClock, PlaybackTimer, StopAll, SystemClock, TimerState,
    TimerTick, TICK_INTERVAL,
};
