//! Engine configuration
//!
//! Window sizes and classification thresholds. Every field has a default, so
//! a config file only needs the values it changes.

use crate::error::ComputeError;
use crate::trend::{DEFAULT_HEIGHT_TOLERANCE_M, DEFAULT_STEP_DELTA_THRESHOLD};
use crate::weekday::DEFAULT_WEEKDAY_WINDOW_DAYS;
use serde::{Deserialize, Serialize};

/// Tunables for the dashboard computations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rolling window for statistics, trends and weekday grouping (days)
    pub window_days: u32,
    /// Window for the short-term view (days)
    pub short_window_days: u32,
    /// Step-count change that counts as a trend
    pub step_delta_threshold: f64,
    /// Target upper bound for average heart rate (bpm)
    pub heart_rate_goal_bpm: f64,
    /// Nights shorter than this are flagged (hours)
    pub short_sleep_hours: f64,
    /// Height readings closer than this are the same (metres)
    pub height_tolerance_m: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WEEKDAY_WINDOW_DAYS,
            short_window_days: 7,
            step_delta_threshold: DEFAULT_STEP_DELTA_THRESHOLD,
            heart_rate_goal_bpm: 100.0,
            short_sleep_hours: 6.0,
            height_tolerance_m: DEFAULT_HEIGHT_TOLERANCE_M,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ComputeError> {
        if self.window_days == 0 || self.short_window_days == 0 {
            return Err(ComputeError::InvalidConfig(
                "window sizes must be at least one day".to_string(),
            ));
        }
        let thresholds = [
            ("step_delta_threshold", self.step_delta_threshold),
            ("heart_rate_goal_bpm", self.heart_rate_goal_bpm),
            ("short_sleep_hours", self.short_sleep_hours),
            ("height_tolerance_m", self.height_tolerance_m),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(ComputeError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Load and validate a config from JSON
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Window size as a point count
    pub fn window_points(&self) -> usize {
        self.window_days as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{"window_days": 14}"#).unwrap();
        assert_eq!(config.window_days, 14);
        assert_eq!(config.step_delta_threshold, 500.0);
        assert_eq!(config.short_window_days, 7);
    }

    #[test]
    fn test_round_trip() {
        let config = EngineConfig::default();
        let loaded = EngineConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"window_days": 0}"#),
            Err(ComputeError::InvalidConfig(_))
        ));
        assert!(EngineConfig::from_json(r#"{"short_sleep_hours": -1.0}"#).is_err());
        assert!(EngineConfig::from_json("not json").is_err());
    }
}
