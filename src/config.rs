//! Dashboard configuration, loaded from YAML.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::simulators::LayerKind;

fn default_name() -> String {
    "ecomap".to_string()
}

fn default_point_latency_ms() -> u64 {
    300
}

fn default_grid_latency_ms() -> u64 {
    500
}

fn default_weather_poll() -> u64 {
    10
}

fn default_air_quality_poll() -> u64 {
    30
}

fn default_rainfall_poll() -> u64 {
    30
}

fn default_wildfire_poll() -> u64 {
    60
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Absent means a fresh entropy seed on every start.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Offset used to read month and hour of day off a timestamp.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[serde(default)]
    pub latency: LatencyConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub rainfall: RainfallConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyConfig {
    #[serde(default = "default_point_latency_ms")]
    pub weather_ms: u64,
    #[serde(default = "default_point_latency_ms")]
    pub air_quality_ms: u64,
    #[serde(default = "default_grid_latency_ms")]
    pub rainfall_ms: u64,
    #[serde(default = "default_grid_latency_ms")]
    pub wildfire_ms: u64,
}

impl LatencyConfig {
    pub fn none() -> Self {
        Self {
            weather_ms: 0,
            air_quality_ms: 0,
            rainfall_ms: 0,
            wildfire_ms: 0,
        }
    }
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            weather_ms: default_point_latency_ms(),
            air_quality_ms: default_point_latency_ms(),
            rainfall_ms: default_grid_latency_ms(),
            wildfire_ms: default_grid_latency_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_weather_poll")]
    pub weather_minutes: u64,
    #[serde(default = "default_air_quality_poll")]
    pub air_quality_minutes: u64,
    #[serde(default = "default_rainfall_poll")]
    pub rainfall_minutes: u64,
    #[serde(default = "default_wildfire_poll")]
    pub wildfire_minutes: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            weather_minutes: default_weather_poll(),
            air_quality_minutes: default_air_quality_poll(),
            rainfall_minutes: default_rainfall_poll(),
            wildfire_minutes: default_wildfire_poll(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RainfallConfig {
    /// When false the grid always uses the current month, whatever time the
    /// caller selected.
    #[serde(default)]
    pub follow_reference_time: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            seed: None,
            utc_offset_minutes: 0,
            latency: LatencyConfig::default(),
            polling: PollingConfig::default(),
            rainfall: RainfallConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config serialization error: {0}")]
    Serialize(#[from] serde_yaml::Error),
    #[error("config validation error: {0}")]
    Validation(String),
}

/// Offsets beyond these are not real time zones.
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

const MIN_POLL_MINUTES: u64 = 1;

impl DashboardConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(ConfigError::Validation(format!(
                "utc_offset_minutes must be within ±{MAX_OFFSET_MINUTES}, got {}",
                self.utc_offset_minutes
            )));
        }
        for kind in LayerKind::ALL {
            let minutes = self.poll_minutes(kind);
            if minutes < MIN_POLL_MINUTES {
                return Err(ConfigError::Validation(format!(
                    "poll interval for {} must be at least one minute",
                    kind.name()
                )));
            }
            if minutes.checked_mul(60).is_none() {
                return Err(ConfigError::Validation(format!(
                    "poll interval for {} is too large: {minutes} minutes",
                    kind.name()
                )));
            }
        }
        Ok(())
    }

    pub fn utc_offset(&self) -> FixedOffset {
        let clamped = self
            .utc_offset_minutes
            .clamp(-MAX_OFFSET_MINUTES, MAX_OFFSET_MINUTES);
        FixedOffset::east_opt(clamped * 60).unwrap_or_else(|| Utc.fix())
    }

    pub fn latency(&self, kind: LayerKind) -> Duration {
        let millis = match kind {
            LayerKind::Weather => self.latency.weather_ms,
            LayerKind::AirQuality => self.latency.air_quality_ms,
            LayerKind::Rainfall => self.latency.rainfall_ms,
            LayerKind::Wildfire => self.latency.wildfire_ms,
        };
        Duration::from_millis(millis)
    }

    fn poll_minutes(&self, kind: LayerKind) -> u64 {
        match kind {
            LayerKind::Weather => self.polling.weather_minutes,
            LayerKind::AirQuality => self.polling.air_quality_minutes,
            LayerKind::Rainfall => self.polling.rainfall_minutes,
            LayerKind::Wildfire => self.polling.wildfire_minutes,
        }
    }

    /// Never shorter than a minute, even for configs that skipped
    /// [`DashboardConfig::validate`].
    pub fn poll_interval(&self, kind: LayerKind) -> Duration {
        let minutes = self.poll_minutes(kind).max(MIN_POLL_MINUTES);
        Duration::from_secs(minutes.saturating_mul(60))
    }
}

/// Resolves config files relative to a base directory.
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<DashboardConfig, ConfigError> {
        DashboardConfig::from_yaml(self.base_dir.join(file))
    }
}
