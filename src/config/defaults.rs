use super::*;

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Home".to_string(),
            timezone: "UTC".to_string(),
            cycle_interval_ms: 10_000,
            home_power_w: 500.0,
            grid_power_w: 0.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_level: None,
            file_level: None,
            file: "/var/log/loadshare/loadshare.log".to_string(),
            json_format: false,
            console_output: true,
            backup_count: 5,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database: "/data/loadshare/metrics.db".to_string(),
            profile_days: 30,
            state_file: "/data/loadshare/state.json".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
            vehicles: Vec::new(),
            loadpoints: Vec::new(),
        }
    }
}
