//! Session settings produced by the coaching collaborator.
//!
//! The remote call is not part of the engine; its JSON answer is:
//!
//! ```json
//! { "baseFrequency": 150, "beatFrequency": 6,
//!   "targetState": "Theta", "description": "..." }
//! ```
//!
//! `targetStateLabel` and `explanation` are accepted as aliases.

use serde::{Deserialize, Serialize};

use crate::controller::Tuning;
use crate::error::SettingsError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSettings {
    pub base_frequency: f32,
    pub beat_frequency: f32,
    #[serde(alias = "targetStateLabel")]
    pub target_state: String,
    #[serde(default, alias = "explanation")]
    pub description: String,
}

impl SessionSettings {
    /// Parse and validate. Nothing is applied on error.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        check("baseFrequency", self.base_frequency, false)?;
        check("beatFrequency", self.beat_frequency, true)
    }

    #[inline]
    pub fn tuning(&self) -> Tuning {
        Tuning { base: self.base_frequency, beat: self.beat_frequency }
    }
}

fn check(field: &'static str, value: f32, zero_ok: bool) -> Result<(), SettingsError> {
    let ok = value.is_finite() && if zero_ok { value >= 0.0 } else { value > 0.0 };
    if ok {
        Ok(())
    } else {
        Err(SettingsError::InvalidFrequency { field, value })
    }
}
