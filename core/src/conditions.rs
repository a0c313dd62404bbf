//! Site condition flags.
//!
//! Maps wind speed and wave height to a green/yellow/red operational flag.
//! The rules are checked from most to least severe and the first match wins.
//!
//! # Example
//!
//! ```
//! use dive_ops_core::{classify_conditions, FlagStatus};
//!
//! let flag = classify_conditions(20.0, 0.5);
//! assert_eq!(flag.status, FlagStatus::Yellow);
//! assert_eq!(flag.reason, "Caution: Moderate conditions");
//! ```

use serde::{Deserialize, Serialize};

use crate::error::OpsError;
use crate::models::{ConditionFlag, FlagStatus};

pub const UNSAFE_REASON: &str = "Unsafe conditions: High wind or waves";
pub const CAUTION_REASON: &str = "Caution: Moderate conditions";
pub const SAFE_REASON: &str = "Safe conditions";

/// Limits above which conditions escalate. Comparisons are strict, so a value
/// exactly on a limit stays in the lower band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionThresholds {
    /// Wind (km/h) above which the site is unsafe
    pub unsafe_wind_kmh: f64,
    /// Waves (m) above which the site is unsafe
    pub unsafe_wave_m: f64,
    /// Wind (km/h) above which divers are cautioned
    pub caution_wind_kmh: f64,
    /// Waves (m) above which divers are cautioned
    pub caution_wave_m: f64,
}

impl Default for ConditionThresholds {
    fn default() -> Self {
        Self {
            unsafe_wind_kmh: 25.0,
            unsafe_wave_m: 2.5,
            caution_wind_kmh: 15.0,
            caution_wave_m: 1.5,
        }
    }
}

impl ConditionThresholds {
    pub fn classify(&self, wind_speed_kmh: f64, wave_height_m: f64) -> ConditionFlag {
        let (status, reason) =
            if wind_speed_kmh > self.unsafe_wind_kmh || wave_height_m > self.unsafe_wave_m {
                (FlagStatus::Red, UNSAFE_REASON)
            } else if wind_speed_kmh > self.caution_wind_kmh || wave_height_m > self.caution_wave_m
            {
                (FlagStatus::Yellow, CAUTION_REASON)
            } else {
                (FlagStatus::Green, SAFE_REASON)
            };

        ConditionFlag {
            status,
            reason: reason.to_string(),
        }
    }

    /// Caution limits must sit at or below the unsafe limits.
    pub fn validate(&self) -> Result<(), OpsError> {
        let limits = [
            ("unsafe_wind_kmh", self.unsafe_wind_kmh),
            ("unsafe_wave_m", self.unsafe_wave_m),
            ("caution_wind_kmh", self.caution_wind_kmh),
            ("caution_wave_m", self.caution_wave_m),
        ];
        for (name, value) in limits {
            if !value.is_finite() || value < 0.0 {
                return Err(OpsError::Config(format!(
                    "{name} must be a finite, non-negative number (got {value})"
                )));
            }
        }
        if self.caution_wind_kmh > self.unsafe_wind_kmh {
            return Err(OpsError::Config(
                "caution_wind_kmh exceeds unsafe_wind_kmh".to_string(),
            ));
        }
        if self.caution_wave_m > self.unsafe_wave_m {
            return Err(OpsError::Config(
                "caution_wave_m exceeds unsafe_wave_m".to_string(),
            ));
        }
        Ok(())
    }
}

/// Classify with the default limits (25 km/h / 2.5 m unsafe, 15 km/h / 1.5 m
/// caution). Total over all inputs; NaN never exceeds a limit.
pub fn classify_conditions(wind_speed_kmh: f64, wave_height_m: f64) -> ConditionFlag {
    ConditionThresholds::default().classify(wind_speed_kmh, wave_height_m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_red_on_wind_or_waves() {
        assert_eq!(classify_conditions(30.0, 0.0).status, FlagStatus::Red);
        assert_eq!(classify_conditions(0.0, 3.0).status, FlagStatus::Red);
        assert_eq!(classify_conditions(30.0, 0.0).reason, UNSAFE_REASON);
    }

    #[test]
    fn test_yellow_and_green() {
        let flag = classify_conditions(20.0, 0.0);
        assert_eq!(flag.status, FlagStatus::Yellow);
        assert_eq!(flag.reason, CAUTION_REASON);

        assert_eq!(classify_conditions(0.0, 2.0).status, FlagStatus::Yellow);

        let flag = classify_conditions(0.0, 0.0);
        assert_eq!(flag.status, FlagStatus::Green);
        assert_eq!(flag.reason, SAFE_REASON);
    }

    #[test]
    fn test_boundaries_are_strict() {
        assert_eq!(classify_conditions(25.0, 0.0).status, FlagStatus::Yellow);
        assert_eq!(classify_conditions(25.01, 0.0).status, FlagStatus::Red);
        assert_eq!(classify_conditions(15.0, 1.5).status, FlagStatus::Green);
        assert_eq!(classify_conditions(0.0, 2.5).status, FlagStatus::Yellow);
        assert_eq!(classify_conditions(0.0, 2.51).status, FlagStatus::Red);
    }

    #[test]
    fn test_total_over_odd_inputs() {
        assert_eq!(classify_conditions(-10.0, -1.0).status, FlagStatus::Green);
        assert_eq!(classify_conditions(f64::NAN, 0.0).status, FlagStatus::Green);
        assert_eq!(
            classify_conditions(f64::INFINITY, 0.0).status,
            FlagStatus::Red
        );
    }

    #[test]
    fn test_custom_thresholds() {
        let strict = ConditionThresholds {
            unsafe_wind_kmh: 20.0,
            unsafe_wave_m: 1.5,
            caution_wind_kmh: 10.0,
            caution_wave_m: 1.0,
        };
        assert!(strict.validate().is_ok());
        assert_eq!(strict.classify(21.0, 0.0).status, FlagStatus::Red);
        assert_eq!(strict.classify(12.0, 0.0).status, FlagStatus::Yellow);
    }

    #[test]
    fn test_validate_rejects_inverted_limits() {
        let inverted = ConditionThresholds {
            caution_wind_kmh: 30.0,
            ..ConditionThresholds::default()
        };
        assert!(matches!(inverted.validate(), Err(OpsError::Config(_))));

        let negative = ConditionThresholds {
            caution_wave_m: -1.0,
            ..ConditionThresholds::default()
        };
        assert!(negative.validate().is_err());
    }
}
