//! Error types for the session engine.
//!
//! Invalid transitions (retuning before a context exists, starting a live
//! pair) are not errors: they are recorded as pending intent and logged.

use thiserror::Error;

/// Failures surfaced by the graph manager and the playback controller.
///
/// None of these poison the controller; calling `toggle()` again retries.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The hardware audio resource could not be acquired. No graph exists.
    #[error("audio output unavailable: {0}")]
    ResourceUnavailable(String),

    /// The host refused to resume or suspend an existing stream.
    #[error("audio stream control failed: {0}")]
    Stream(String),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Settings or configuration the engine cannot apply.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("malformed session settings: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("{field} must be a finite, non-negative frequency (got {value})")]
    InvalidFrequency { field: &'static str, value: f32 },

    /// An engine configuration value is out of range.
    #[error("config `{field}` {expected} (got {value})")]
    InvalidConfig { field: &'static str, expected: &'static str, value: f32 },
}

pub type Result<T, E = EngineError> = core::result::Result<T, E>;
