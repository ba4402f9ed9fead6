//! Effect parameters: the three knobs the control surface owns.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Slider range for speed, shown to the user as 50%–120%.
pub const SPEED_RANGE: RangeInclusive<f32> = 0.5..=1.2;
/// Slider range for reverb wetness, shown as 0%–100%.
pub const WET_RANGE: RangeInclusive<f32> = 0.0..=1.0;
/// Slider range for reverb decay in seconds, shown to one decimal.
pub const DECAY_RANGE: RangeInclusive<f32> = 0.1..=10.0;

/// The mutable parameter set for one session. Field names follow the JS
/// control surface (`speed`, `reverbWet`, `reverbDecay`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EffectParams {
    /// Playback rate multiplier. Duration scales by 1/speed; pitch shifts
    /// with it (raw resample, no time-stretching).
    pub speed: f32,
    /// Wet-path gain in [0, 1]. The dry path always gets `1 - reverb_wet`.
    pub reverb_wet: f32,
    /// Impulse response length in seconds.
    pub reverb_decay: f32,
}

impl Default for EffectParams {
    fn default() -> Self {
        EffectParams {
            speed: 0.85,
            reverb_wet: 0.4,
            reverb_decay: 2.5,
        }
    }
}

impl EffectParams {
    /// Check that every field is inside its engine domain (wider than the
    /// slider ranges: any positive speed and decay are renderable).
    pub fn validate(&self) -> Result<(), RenderError> {
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(RenderError::InvalidSpeed(self.speed));
        }
        if !self.reverb_wet.is_finite() || !(0.0..=1.0).contains(&self.reverb_wet) {
            return Err(RenderError::InvalidWetLevel(self.reverb_wet));
        }
        if !self.reverb_decay.is_finite() || self.reverb_decay <= 0.0 {
            return Err(RenderError::InvalidDecay(self.reverb_decay));
        }
        Ok(())
    }

    /// Serialize for preset storage.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Deserialize a stored preset. Missing fields fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let p = EffectParams::default();
        assert!(p.validate().is_ok());
        assert!((p.speed - 0.85).abs() < 1e-6);
        assert!((p.reverb_wet - 0.4).abs() < 1e-6);
        assert!((p.reverb_decay - 2.5).abs() < 1e-6);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut p = EffectParams::default();
        p.speed = 0.0;
        assert!(matches!(p.validate(), Err(RenderError::InvalidSpeed(_))));

        let mut p = EffectParams::default();
        p.reverb_wet = 1.5;
        assert!(matches!(p.validate(), Err(RenderError::InvalidWetLevel(_))));

        let mut p = EffectParams::default();
        p.reverb_decay = -1.0;
        assert!(matches!(p.validate(), Err(RenderError::InvalidDecay(_))));

        let mut p = EffectParams::default();
        p.reverb_decay = f32::NAN;
        assert!(matches!(p.validate(), Err(RenderError::InvalidDecay(_))));
    }

    #[test]
    fn json_round_trip_uses_camel_case() {
        let p = EffectParams {
            speed: 0.75,
            reverb_wet: 0.5,
            reverb_decay: 3.0,
        };
        let json = p.to_json();
        assert!(json.contains("reverbWet"));
        assert!(json.contains("reverbDecay"));
        let back = EffectParams::from_json(&json).unwrap();
        assert_eq!(p, back);
    }

    #[test]
    fn missing_fields_default() {
        let p = EffectParams::from_json(r#"{"speed": 1.0}"#).unwrap();
        assert!((p.speed - 1.0).abs() < 1e-6);
        assert!((p.reverb_wet - 0.4).abs() < 1e-6);
    }
}
