//! Playback Context - Errors

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlaybackError {
    #[error("No document loaded")]
    NoDocument,

    #[error("Invalid {name}: {value} (expected 0.5 to 2.0)")]
    InvalidSetting { name: &'static str, value: f32 },

    #[error("Voice not found: {0}")]
    VoiceNotFound(String),
}
