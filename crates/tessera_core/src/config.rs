//! Engine configuration
//!
//! Loaded once at startup (JSON) and validated before the World is built.
//! Runtime changes go through the World so invalid values can be rejected
//! while keeping the previous setting.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("grid cell size must be a finite value > 0, got {0}")]
    InvalidCellSize(f32),
    #[error("{loop_name} rate must be > 0 Hz")]
    InvalidTickRate { loop_name: &'static str },
    #[error("default ray distance must be a finite value > 0, got {0}")]
    InvalidRayDistance(f32),
    #[error("failed to parse engine config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub physics: PhysicsConfig,
    pub raycast: RaycastConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Edge length of a spatial grid cell, in world units.
    pub cell_size: f32,
    /// Log per-tick physics statistics.
    pub debug: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaycastConfig {
    /// Record casts into the debug ray history and log their results.
    pub debug: bool,
    /// Capacity of the debug ray history.
    pub max_debug_rays: usize,
    /// Length used for rays without an explicit max distance.
    pub default_max_distance: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub simulation_hz: u32,
    pub presentation_hz: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            cell_size: 4.0,
            debug: false,
        }
    }
}

impl Default for RaycastConfig {
    fn default() -> Self {
        Self {
            debug: false,
            max_debug_rays: 64,
            default_max_distance: 1000.0,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            simulation_hz: crate::time::TICK_RATE_HZ,
            presentation_hz: 60,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_cell_size(self.physics.cell_size)?;
        if self.pipeline.simulation_hz == 0 {
            return Err(ConfigError::InvalidTickRate { loop_name: "simulation" });
        }
        if self.pipeline.presentation_hz == 0 {
            return Err(ConfigError::InvalidTickRate { loop_name: "presentation" });
        }
        let distance = self.raycast.default_max_distance;
        if !(distance.is_finite() && distance > 0.0) {
            return Err(ConfigError::InvalidRayDistance(distance));
        }
        Ok(())
    }
}

pub(crate) fn validate_cell_size(cell_size: f32) -> Result<(), ConfigError> {
    if cell_size.is_finite() && cell_size > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidCellSize(cell_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = EngineConfig::from_json_str(r#"{ "physics": { "cell_size": 2.5 } }"#)
            .expect("valid config");
        assert_eq!(config.physics.cell_size, 2.5);
        assert!(!config.physics.debug);
        assert_eq!(config.raycast.max_debug_rays, 64);
        assert_eq!(config.pipeline.simulation_hz, 60);
    }

    #[test]
    fn rejects_non_positive_cell_size() {
        let err = EngineConfig::from_json_str(r#"{ "physics": { "cell_size": 0.0 } }"#)
            .expect_err("zero cell size");
        assert!(matches!(err, ConfigError::InvalidCellSize(_)));
    }

    #[test]
    fn rejects_zero_presentation_rate() {
        let mut config = EngineConfig::default();
        config.pipeline.presentation_hz = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTickRate { loop_name: "presentation" })
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            EngineConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn serialises_back_to_json() {
        let text = EngineConfig::default().to_json_string().expect("serialise");
        let parsed = EngineConfig::from_json_str(&text).expect("parse back");
        assert_eq!(parsed, EngineConfig::default());
    }
}
