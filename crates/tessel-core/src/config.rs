// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Engine-wide sync settings.
//!
//! A [`SyncConfig`] is built once (defaults, JSON, environment overrides) and
//! handed to the sync agent at construction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Settings that apply to every synced mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Allows meshes to be subdivided.
    pub enable_subdivision: bool,
    /// Default dicing rate for subdivided meshes.
    pub dicing_rate: f32,
    /// Upper bound on the refine level.
    pub max_subdivision_level: u32,
    /// Allows deformation and transform motion blur.
    pub enable_motion_blur: bool,
    /// Multiplier applied to velocity-derived motion keys.
    pub velocity_scale: f32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enable_subdivision: true,
            dicing_rate: 1.0,
            max_subdivision_level: 12,
            enable_motion_blur: false,
            velocity_scale: 1.0,
        }
    }
}

/// An error raised while loading a [`SyncConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// The JSON document could not be parsed.
    Parse(serde_json::Error),
    /// A setting holds a value outside its valid range.
    InvalidValue {
        /// The setting name.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(e) => write!(f, "Failed to parse sync config: {e}"),
            ConfigError::InvalidValue { key, reason } => {
                write!(f, "Invalid value for '{key}': {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Parse(e) => Some(e),
            ConfigError::InvalidValue { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Prefix of the environment variables read by [`SyncConfig::with_env_overrides`].
pub const ENV_PREFIX: &str = "TESSEL_";

impl SyncConfig {
    /// Parses a JSON document. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SyncConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dicing_rate.is_nan() || self.dicing_rate <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "dicing_rate",
                reason: format!("must be positive, got {}", self.dicing_rate),
            });
        }
        if !self.velocity_scale.is_finite() {
            return Err(ConfigError::InvalidValue {
                key: "velocity_scale",
                reason: "must be finite".to_owned(),
            });
        }
        Ok(())
    }

    /// Applies `(key, value)` overrides, e.g. from the environment.
    ///
    /// Keys are matched case-insensitively after stripping [`ENV_PREFIX`].
    /// Unknown keys are ignored; unparsable values are logged and skipped.
    pub fn with_overrides<I, K, V>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in overrides {
            let key = key.as_ref();
            let name = key
                .strip_prefix(ENV_PREFIX)
                .unwrap_or(key)
                .to_ascii_lowercase();
            let value = value.as_ref().trim();
            let applied = match name.as_str() {
                "enable_subdivision" => parse_bool(value).map(|v| self.enable_subdivision = v),
                "dicing_rate" => value
                    .parse::<f32>()
                    .ok()
                    .filter(|v| *v > 0.0)
                    .map(|v| self.dicing_rate = v),
                "max_subdivision_level" | "max_subdivision" => value
                    .parse::<u32>()
                    .ok()
                    .map(|v| self.max_subdivision_level = v),
                "enable_motion_blur" | "motion_blur" => {
                    parse_bool(value).map(|v| self.enable_motion_blur = v)
                }
                "velocity_scale" => value
                    .parse::<f32>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map(|v| self.velocity_scale = v),
                _ => continue,
            };
            if applied.is_none() {
                log::warn!("Ignoring invalid value '{value}' for sync setting '{key}'");
            }
        }
        self
    }

    /// Applies overrides from `TESSEL_*` environment variables.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(std::env::vars().filter(|(key, _)| key.starts_with(ENV_PREFIX)))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert!(config.enable_subdivision);
        assert!(!config.enable_motion_blur);
        assert_eq!(config.max_subdivision_level, 12);
        assert_eq!(config.dicing_rate, 1.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            SyncConfig::from_json_str(r#"{ "enable_motion_blur": true, "dicing_rate": 0.5 }"#)
                .unwrap();
        assert!(config.enable_motion_blur);
        assert_eq!(config.dicing_rate, 0.5);
        assert_eq!(config.max_subdivision_level, 12);
    }

    #[test]
    fn test_json_errors() {
        assert!(matches!(
            SyncConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
        let err = SyncConfig::from_json_str(r#"{ "dicing_rate": 0.0 }"#).unwrap_err();
        assert!(err.to_string().contains("dicing_rate"));
    }

    #[test]
    fn test_overrides() {
        let config = SyncConfig::default().with_overrides([
            ("TESSEL_MOTION_BLUR", "1"),
            ("TESSEL_MAX_SUBDIVISION", "3"),
            ("TESSEL_DICING_RATE", "-2"),
            ("TESSEL_UNKNOWN", "x"),
        ]);
        assert!(config.enable_motion_blur);
        assert_eq!(config.max_subdivision_level, 3);
        assert_eq!(config.dicing_rate, 1.0);
    }
}
