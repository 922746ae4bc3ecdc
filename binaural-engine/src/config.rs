//! Engine configuration: ramp time constants, default levels and buffer
//! sizes, loadable from JSON and checked before use.

use serde::{Deserialize, Serialize};

use crate::controller::Tuning;
use crate::error::SettingsError;
use crate::graph::GraphDefaults;
use crate::params::RampPolicy;

/// Engine defaults. Every field is optional in JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EngineConfig {
    #[serde(flatten)]
    pub ramp: RampPolicy,
    pub master_volume: f32,
    pub noise_volume: f32,
    /// Noise volume used when a color is picked while the bed is silent.
    pub audible_noise_volume: f32,
    pub noise_buffer_secs: f32,
    pub analysis_fft_size: usize,
    /// Fixed seed for reproducible noise buffers.
    pub noise_seed: Option<u64>,
    pub initial_tuning: Tuning,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ramp: RampPolicy::default(),
            master_volume: 0.5,
            noise_volume: 0.1,
            audible_noise_volume: 0.2,
            noise_buffer_secs: 2.0,
            analysis_fft_size: 2048,
            noise_seed: None,
            initial_tuning: Tuning::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would turn a ramp into a jump or leave a buffer empty.
    pub fn validate(&self) -> Result<(), SettingsError> {
        positive("tone-tau-secs", self.ramp.tone_tau_secs)?;
        positive("gain-tau-secs", self.ramp.gain_tau_secs)?;
        unit("master-volume", self.master_volume)?;
        unit("noise-volume", self.noise_volume)?;
        unit("audible-noise-volume", self.audible_noise_volume)?;
        positive("noise-buffer-secs", self.noise_buffer_secs)?;
        if self.analysis_fft_size == 0 {
            return Err(SettingsError::InvalidConfig {
                field: "analysis-fft-size",
                expected: "must be at least 1",
                value: 0.0,
            });
        }
        let Tuning { base, beat } = self.initial_tuning;
        if !(base.is_finite() && base > 0.0) {
            return Err(SettingsError::InvalidFrequency { field: "initial-tuning.base", value: base });
        }
        if !(beat.is_finite() && beat >= 0.0) {
            return Err(SettingsError::InvalidFrequency { field: "initial-tuning.beat", value: beat });
        }
        Ok(())
    }

    pub(crate) fn graph_defaults(&self) -> GraphDefaults {
        GraphDefaults {
            master_volume: self.master_volume,
            noise_volume: self.noise_volume,
            fft_size: self.analysis_fft_size,
            policy: self.ramp,
        }
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), SettingsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SettingsError::InvalidConfig { field, expected: "must be finite and greater than 0", value })
    }
}

fn unit(field: &'static str, value: f32) -> Result<(), SettingsError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SettingsError::InvalidConfig { field, expected: "must be within 0..=1", value })
    }
}
