//! Process-level settings for the gateway.
//!
//! These are read once at startup. The per-service routing table lives in the
//! separately hot-reloaded services document (see [`crate::gateway::ConfigStore`]).

use std::path::PathBuf;
use std::time::Duration;

use config::{Config as ConfigLoader, Environment, File};
use serde::Deserialize;

/// Errors from loading process settings.
pub use config::ConfigError as SettingsError;

/// Main settings structure for the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    /// Path of the hot-reloaded services document.
    #[serde(default = "default_services_file")]
    pub services_file: PathBuf,
    /// Seconds between modification-time checks of the services document (0 = off).
    #[serde(default = "default_reload_interval")]
    pub reload_interval_secs: u64,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub health: HealthPolicy,
}

#[derive(Debug, Clone, Deserialize)]
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

#[derive(Debug, Clone, Deserialize)]
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

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Ring buffer capacity per service, used for percentiles.
    #[serde(default = "default_sample_capacity")]
    pub sample_capacity: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            sample_capacity: default_sample_capacity(),
        }
    }
}

/// Thresholds for the rolling health classification.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthPolicy {
    /// Maximum number of most recent samples considered.
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Maximum age of samples considered.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    /// Below this many samples the status is `unknown`.
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
    /// External success fraction below which the service is degraded.
    #[serde(default = "default_success_threshold")]
    pub success_threshold: f64,
    /// p95 latency above `timeout * latency_ratio` marks the service degraded.
    #[serde(default = "default_latency_ratio")]
    pub latency_ratio: f64,
}

impl HealthPolicy {
    pub fn window_age(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            window_secs: default_window_secs(),
            min_samples: default_min_samples(),
            success_threshold: default_success_threshold(),
            latency_ratio: default_latency_ratio(),
        }
    }
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8001
}
fn default_services_file() -> PathBuf {
    PathBuf::from("config/services.yaml")
}
fn default_reload_interval() -> u64 {
    5
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_sample_capacity() -> usize {
    200
}
fn default_window_size() -> usize {
    50
}
fn default_window_secs() -> u64 {
    60
}
fn default_min_samples() -> usize {
    3
}
fn default_success_threshold() -> f64 {
    0.5
}
fn default_latency_ratio() -> f64 {
    0.8
}

impl Settings {
    /// Load settings from file and environment variables.
    ///
    /// Sources (in order of precedence):
    /// 1. Environment variables (GATEWAY__SECTION__KEY format)
    /// 2. gateway.toml (if present)
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, SettingsError> {
        let settings = ConfigLoader::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("reload_interval_secs", default_reload_interval() as i64)?
            .add_source(File::with_name("gateway").required(false))
            .add_source(
                Environment::with_prefix("GATEWAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn reload_interval(&self) -> Option<Duration> {
        (self.reload_interval_secs > 0).then(|| Duration::from_secs(self.reload_interval_secs))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            services_file: default_services_file(),
            reload_interval_secs: default_reload_interval(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
            health: HealthPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_server_config() {
        let server = ServerConfig::default();
        assert_eq!(server.host, "0.0.0.0");
        assert_eq!(server.port, 8001);
    }

    #[test]
    fn test_default_health_policy() {
        let policy = HealthPolicy::default();
        assert_eq!(policy.window_size, 50);
        assert_eq!(policy.window_age(), Duration::from_secs(60));
        assert_eq!(policy.min_samples, 3);
        assert_eq!(policy.success_threshold, 0.5);
        assert_eq!(policy.latency_ratio, 0.8);
    }

    #[test]
    fn test_zero_interval_disables_polling() {
        let settings = Settings {
            reload_interval_secs: 0,
            ..Default::default()
        };
        assert!(settings.reload_interval().is_none());
        assert_eq!(
            Settings::default().reload_interval(),
            Some(Duration::from_secs(5))
        );
    }

    #[test]
    fn test_settings_deserialize_partial() {
        let settings: Settings = ConfigLoader::builder()
            .add_source(config::File::from_str(
                "services_file = \"/etc/jobmatch/services.yaml\"\n[health]\nmin_samples = 5\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.services_file, PathBuf::from("/etc/jobmatch/services.yaml"));
        assert_eq!(settings.health.min_samples, 5);
        assert_eq!(settings.health.window_size, 50);
        assert_eq!(settings.server.port, 8001);
    }
}
