//! TOML configuration for the selection daemon.
//!
//! Loaded once at startup and read-only for the engine's lifetime. Anything
//! malformed or missing here is fatal; there is no sensible degraded mode
//! for a rover that does not know which caster to ask.

use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Errors that make the configuration unusable.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid config TOML: {0}")]
    Toml(String),
    #[error("missing required option `{0}`")]
    MissingOption(&'static str),
    #[error("option `{option}` must be a positive finite number, got {value}")]
    NotPositive { option: &'static str, value: f64 },
    #[error("option `{option}` must be a non-negative finite number, got {value}")]
    Negative { option: &'static str, value: f64 },
}

/// Raw deserialized shape. Everything is optional here; [`resolve`]
/// applies defaults and rejects what cannot be defaulted.
///
/// [`resolve`]: SelectionConfigInput::resolve
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SelectionConfigInput {
    pub gps_topic: Option<String>,
    pub caster_address: Option<String>,
    pub caster_port: Option<u16>,
    pub excluded_mountpoints: Vec<String>,
    pub max_distance_km: Option<f64>,
    pub hysteresis_km: Option<f64>,
    pub critical_distance_km: Option<f64>,
    pub evaluation_hz: Option<f64>,
    pub query_timeout_s: Option<f64>,
}

/// Resolved, validated configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionConfig {
    /// Position feed identifier: the UDP address the feed listens on.
    pub gps_topic: String,
    /// Caster host the directory client queries.
    pub caster_address: String,
    /// Caster port.
    pub caster_port: u16,
    /// Mountpoints that must never be selected.
    pub excluded_mountpoints: HashSet<String>,
    /// Directory search radius in kilometres.
    pub max_distance_km: f64,
    /// Distance buffer added to the current base before allowing a switch.
    pub hysteresis_km: f64,
    /// Radius within which the current base is kept unconditionally.
    pub critical_distance_km: f64,
    /// Upper bound on evaluation cycles per second.
    pub evaluation_hz: f64,
    /// Per-query timeout for the caster directory.
    pub query_timeout: Duration,
}

impl SelectionConfigInput {
    /// Applies defaults and validates ranges.
    pub fn resolve(self) -> Result<SelectionConfig, ConfigError> {
        let gps_topic = self
            .gps_topic
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingOption("gps_topic"))?;
        let caster_address = self
            .caster_address
            .filter(|a| !a.trim().is_empty())
            .ok_or(ConfigError::MissingOption("caster_address"))?;

        let max_distance_km = positive("max_distance_km", self.max_distance_km.unwrap_or(50.0))?;
        let hysteresis_km = non_negative("hysteresis_km", self.hysteresis_km.unwrap_or(1.0))?;
        let critical_distance_km =
            non_negative("critical_distance_km", self.critical_distance_km.unwrap_or(15.0))?;
        let evaluation_hz = positive("evaluation_hz", self.evaluation_hz.unwrap_or(0.2))?;
        let query_timeout_s = positive("query_timeout_s", self.query_timeout_s.unwrap_or(10.0))?;

        Ok(SelectionConfig {
            gps_topic,
            caster_address,
            caster_port: self.caster_port.unwrap_or(2101),
            excluded_mountpoints: self.excluded_mountpoints.into_iter().collect(),
            max_distance_km,
            hysteresis_km,
            critical_distance_km,
            evaluation_hz,
            query_timeout: Duration::from_secs_f64(query_timeout_s),
        })
    }
}

impl SelectionConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let parsed: SelectionConfigInput =
            toml::from_str(input).map_err(|e| ConfigError::Toml(e.to_string()))?;
        parsed.resolve()
    }

    /// Minimum interval between evaluation cycles, `1 / evaluation_hz`.
    pub fn evaluation_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.evaluation_hz)
    }
}

fn positive(option: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::NotPositive { option, value })
    }
}

fn non_negative(option: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::Negative { option, value })
    }
}
