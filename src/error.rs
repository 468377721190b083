//! Error handling for Soundscapes
//!
//! Environment failures are surfaced to the caller; everything else the mixer
//! absorbs as a no-op at its command boundary.

use thiserror::Error;

/// Result type alias for Soundscapes operations
pub type Result<T> = std::result::Result<T, SoundscapeError>;

/// Main error type for Soundscapes operations
#[derive(Error, Debug)]
pub enum SoundscapeError {
    // Environment Errors
    #[error("Audio output unavailable: {reason}")]
    EnvironmentUnavailable {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Input Errors
    #[error("Unknown layer: {name}")]
    InvalidLayerName { name: String },

    #[error("Invalid volume '{value}': expected a number between 0 and 100")]
    InvalidVolume { value: String },

    #[error("Invalid preset: {reason}")]
    InvalidPreset { reason: String },

    #[error("Preset not found: {name}")]
    PresetNotFound { name: String },

    #[error("Invalid command '{line}': {reason}")]
    InvalidCommand { line: String, reason: String },

    #[error("Invalid share link: {reason}")]
    InvalidShareLink { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SoundscapeError {
    /// Build an `EnvironmentUnavailable` error without an underlying cause
    pub fn environment(reason: impl Into<String>) -> Self {
        SoundscapeError::EnvironmentUnavailable {
            reason: reason.into(),
            source: None,
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            SoundscapeError::EnvironmentUnavailable { .. } => "ENVIRONMENT_UNAVAILABLE",
            SoundscapeError::InvalidLayerName { .. } => "INVALID_LAYER_NAME",
            SoundscapeError::InvalidVolume { .. } => "INVALID_VOLUME",
            SoundscapeError::InvalidPreset { .. } => "INVALID_PRESET",
            SoundscapeError::PresetNotFound { .. } => "PRESET_NOT_FOUND",
            SoundscapeError::InvalidCommand { .. } => "INVALID_COMMAND",
            SoundscapeError::InvalidShareLink { .. } => "INVALID_SHARE_LINK",
            SoundscapeError::Io(_) => "IO_ERROR",
            SoundscapeError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable
    ///
    /// Input errors can be fixed by the caller and retried. A missing audio
    /// device has to be resolved outside the process.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SoundscapeError::InvalidLayerName { .. }
                | SoundscapeError::InvalidVolume { .. }
                | SoundscapeError::InvalidPreset { .. }
                | SoundscapeError::PresetNotFound { .. }
                | SoundscapeError::InvalidCommand { .. }
                | SoundscapeError::InvalidShareLink { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            SoundscapeError::EnvironmentUnavailable { .. } => vec![
                "Check that an audio output device is connected",
                "Allow audio playback for this application",
                "Use the offline renderer to simulate a session",
            ],
            SoundscapeError::InvalidLayerName { .. } => {
                vec!["Available layers: rain, cafe, whitenoise, synth"]
            }
            SoundscapeError::InvalidVolume { .. } => {
                vec!["Volumes are whole percentages from 0 to 100"]
            }
            SoundscapeError::InvalidPreset { .. } => vec!["Give the preset a non-empty name"],
            SoundscapeError::PresetNotFound { .. } => {
                vec!["Run 'soundscapes preset list' to see saved presets"]
            }
            SoundscapeError::InvalidCommand { .. } => vec![
                "Commands: toggle|play|stop <layer>, volume <layer> <0-100>, play-all, stop-all",
            ],
            SoundscapeError::InvalidShareLink { .. } => {
                vec!["Links look like ?rain=50&cafe=30&whitenoise=0&synth=0"]
            }
            _ => vec![],
        }
    }
}
