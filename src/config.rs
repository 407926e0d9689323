//! Configuration management for Loadshare
//!
//! This module handles loading, validation, and management of the site
//! configuration from YAML files. Hardware integrations are out of scope;
//! vehicles and loadpoints configured here are simulated.

use crate::error::{LoadshareError, Result};
use crate::vehicle::ChargeStatus;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

mod defaults;

fn default_true() -> bool {
    true
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Site-wide settings
    pub site: SiteConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Energy metrics persistence
    pub metrics: MetricsConfig,

    /// Known vehicles
    #[serde(default)]
    pub vehicles: Vec<VehicleConfig>,

    /// Loadpoints competing for vehicles and power
    #[serde(default)]
    pub loadpoints: Vec<LoadpointConfig>,
}

/// Site settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Display title
    pub title: String,

    /// Timezone used to group profile slots by local time of day
    pub timezone: String,

    /// Control cycle interval in milliseconds
    pub cycle_interval_ms: u64,

    /// Simulated household consumption in watts
    pub home_power_w: f64,

    /// Simulated grid power in watts (positive import, negative export)
    pub grid_power_w: f64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base log level
    pub level: String,

    /// Console log level (defaults to `level`)
    #[serde(default)]
    pub console_level: Option<String>,

    /// File log level (defaults to `level`)
    #[serde(default)]
    pub file_level: Option<String>,

    /// Log file path or directory
    pub file: String,

    /// Emit JSON formatted lines
    pub json_format: bool,

    /// Also log to stdout when file logging is active
    #[serde(default = "default_true")]
    pub console_output: bool,

    /// Number of rotated log files to keep
    pub backup_count: u32,
}

/// Metrics persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Persist slots to SQLite; otherwise keep them in memory
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// SQLite database path
    pub database: String,

    /// Days of history averaged into the home profile
    pub profile_days: u32,

    /// JSON file remembering vehicle assignments across restarts
    pub state_file: String,
}

/// Vehicle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleConfig {
    /// Vehicle title, unique across the site
    pub title: String,

    /// Simulated IEC 61851 status letter; vehicles without one cannot
    /// be detected by status
    #[serde(default)]
    pub status: Option<String>,
}

/// Loadpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadpointConfig {
    /// Loadpoint title, unique across the site
    pub title: String,

    /// Higher values win surplus power from lower ones
    #[serde(default)]
    pub priority: i32,

    /// Simulated power that could be given up without stopping (watts)
    #[serde(default)]
    pub flexibility_w: f64,

    /// Vehicle acquired at startup, by title
    #[serde(default)]
    pub vehicle: Option<String>,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the first default location that exists
    pub fn load() -> Result<Self> {
        let default_paths = [
            "loadshare.yaml",
            "/data/loadshare.yaml",
            "/etc/loadshare/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parsed site timezone
    pub fn timezone(&self) -> Result<chrono_tz::Tz> {
        self.site.timezone.parse::<chrono_tz::Tz>().map_err(|_| {
            LoadshareError::validation(
                "site.timezone".to_string(),
                format!("Unknown timezone: {}", self.site.timezone),
            )
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.site.title.trim().is_empty() {
            return Err(LoadshareError::validation("site.title", "Cannot be empty"));
        }

        self.timezone()?;

        if self.site.cycle_interval_ms == 0 {
            return Err(LoadshareError::validation(
                "site.cycle_interval_ms",
                "Must be greater than 0",
            ));
        }

        if self.site.home_power_w < 0.0 {
            return Err(LoadshareError::validation(
                "site.home_power_w",
                "Must not be negative",
            ));
        }

        for level in std::iter::once(&self.logging.level)
            .chain(self.logging.console_level.iter())
            .chain(self.logging.file_level.iter())
        {
            crate::logging::parse_log_level(level)?;
        }

        if self.metrics.enabled && self.metrics.database.trim().is_empty() {
            return Err(LoadshareError::validation(
                "metrics.database",
                "Cannot be empty when metrics are enabled",
            ));
        }

        if self.metrics.profile_days == 0 {
            return Err(LoadshareError::validation(
                "metrics.profile_days",
                "Must be greater than 0",
            ));
        }

        let mut vehicles = HashSet::new();
        for (i, v) in self.vehicles.iter().enumerate() {
            let field = format!("vehicles[{}]", i);
            if v.title.trim().is_empty() {
                return Err(LoadshareError::validation(
                    format!("{}.title", field),
                    "Cannot be empty".to_string(),
                ));
            }
            if !vehicles.insert(v.title.as_str()) {
                return Err(LoadshareError::validation(
                    format!("{}.title", field),
                    format!("Duplicate vehicle title: {}", v.title),
                ));
            }
            if let Some(status) = &v.status {
                status.parse::<ChargeStatus>().map_err(|_| {
                    LoadshareError::validation(
                        format!("{}.status", field),
                        format!("Invalid charge status: {}", status),
                    )
                })?;
            }
        }

        let mut loadpoints = HashSet::new();
        for (i, lp) in self.loadpoints.iter().enumerate() {
            let field = format!("loadpoints[{}]", i);
            if lp.title.trim().is_empty() {
                return Err(LoadshareError::validation(
                    format!("{}.title", field),
                    "Cannot be empty".to_string(),
                ));
            }
            if !loadpoints.insert(lp.title.as_str()) {
                return Err(LoadshareError::validation(
                    format!("{}.title", field),
                    format!("Duplicate loadpoint title: {}", lp.title),
                ));
            }
            if lp.flexibility_w < 0.0 {
                return Err(LoadshareError::validation(
                    format!("{}.flexibility_w", field),
                    "Must not be negative".to_string(),
                ));
            }
            if let Some(title) = &lp.vehicle
                && !vehicles.contains(title.as_str())
            {
                return Err(LoadshareError::validation(
                    format!("{}.vehicle", field),
                    format!("Unknown vehicle: {}", title),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.site.timezone, "UTC");
        assert_eq!(config.site.cycle_interval_ms, 10_000);
        assert_eq!(config.metrics.profile_days, 30);
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.site.timezone = "Mars/Olympus".to_string();
        assert!(config.validate().is_err());

        config = Config::default();
        config.site.cycle_interval_ms = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let deserialized: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.site.title, deserialized.site.title);
        assert_eq!(config.loadpoints.len(), deserialized.loadpoints.len());
    }
}
