use std::env;
use std::fmt::Display;
use std::str::FromStr;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::calendar::DayClock;
use crate::conditions::ConditionThresholds;
use crate::error::OpsError;

pub const ENV_UTC_OFFSET_MINUTES: &str = "DIVE_OPS_UTC_OFFSET_MINUTES";
pub const ENV_DATABASE_PATH: &str = "DIVE_OPS_DATABASE_PATH";
pub const ENV_UNSAFE_WIND_KMH: &str = "DIVE_OPS_UNSAFE_WIND_KMH";
pub const ENV_UNSAFE_WAVE_M: &str = "DIVE_OPS_UNSAFE_WAVE_M";
pub const ENV_CAUTION_WIND_KMH: &str = "DIVE_OPS_CAUTION_WIND_KMH";
pub const ENV_CAUTION_WAVE_M: &str = "DIVE_OPS_CAUTION_WAVE_M";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpsConfig {
    pub thresholds: ConditionThresholds,
    /// Offset of the operator's local day from UTC, in minutes
    pub utc_offset_minutes: i32,
    /// SQLite file; in-memory when unset
    pub database_path: Option<String>,
}

impl OpsConfig {
    pub fn from_json(raw: &str) -> Result<Self, OpsError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| OpsError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, OpsError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from `DIVE_OPS_*` variables, falling back to defaults for any
    /// that are unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, OpsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            thresholds: ConditionThresholds {
                unsafe_wind_kmh: load(
                    &lookup,
                    ENV_UNSAFE_WIND_KMH,
                    defaults.thresholds.unsafe_wind_kmh,
                )?,
                unsafe_wave_m: load(
                    &lookup,
                    ENV_UNSAFE_WAVE_M,
                    defaults.thresholds.unsafe_wave_m,
                )?,
                caution_wind_kmh: load(
                    &lookup,
                    ENV_CAUTION_WIND_KMH,
                    defaults.thresholds.caution_wind_kmh,
                )?,
                caution_wave_m: load(
                    &lookup,
                    ENV_CAUTION_WAVE_M,
                    defaults.thresholds.caution_wave_m,
                )?,
            },
            utc_offset_minutes: load(
                &lookup,
                ENV_UTC_OFFSET_MINUTES,
                defaults.utc_offset_minutes,
            )?,
            database_path: lookup(ENV_DATABASE_PATH).filter(|p| !p.trim().is_empty()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), OpsError> {
        self.thresholds.validate()?;
        self.day_clock()?;
        Ok(())
    }

    pub fn day_clock(&self) -> Result<DayClock, OpsError> {
        DayClock::from_offset_minutes(self.utc_offset_minutes)
    }
}

fn load<T, F>(lookup: &F, key: &str, default: T) -> Result<T, OpsError>
where
    T: FromStr + Display,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e| {
            warn!("invalid {key} value {raw:?}: {e}");
            OpsError::Config(format!("{key}: {e}"))
        }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
