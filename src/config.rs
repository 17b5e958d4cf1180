//! Configuration for the agent, loaded from environment variables.
//!
//! Every value is required unless noted otherwise; a missing or malformed
//! variable is a startup error. The agent never starts degraded.

use std::path::PathBuf;
use thiserror::Error;

/// Fallback thermal zone, tried when the configured path does not exist.
/// Resolved relative to [`MonitoringConfig::sys_root`].
pub const THERMAL_FALLBACK: &str = "class/thermal/thermal_zone0/temp";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
    #[error("Validation error: {0}")]
    Validation(String),
}

/// InfluxDB connection settings.
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    /// Base URL of the InfluxDB instance (e.g. "http://localhost:8086").
    pub url: String,
    /// API token used for the v2 write API.
    pub token: String,
    /// Organization name.
    pub org: String,
    /// Target bucket.
    pub bucket: String,
    /// Host identifier attached as the `host` tag on every point.
    pub hostname: String,
}

impl InfluxConfig {
    /// Load from process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            url: require(&lookup, "INFLUXDB_URL")?,
            token: require(&lookup, "INFLUXDB_TOKEN")?,
            org: require(&lookup, "INFLUXDB_ORG")?,
            bucket: require(&lookup, "INFLUXDB_BUCKET")?,
            hostname: require(&lookup, "HOSTNAME")?,
        })
    }
}

/// Metric collection settings.
#[derive(Debug, Clone)]
pub struct MonitoringConfig {
    /// Seconds between collection cycles. Must be > 0.
    pub collection_interval: u64,
    /// Primary thermal zone path (millidegrees Celsius).
    pub cpu_temp_path: PathBuf,
    pub enable_cpu: bool,
    pub enable_memory: bool,
    pub enable_disk: bool,
    pub enable_temperature: bool,
    pub enable_network: bool,
    /// Root of the sysfs tree, overridable via `HOST_SYS` when the agent runs
    /// inside a container with the host tree mounted elsewhere.
    pub sys_root: PathBuf,
    /// Root of the procfs tree, overridable via `HOST_PROC`.
    pub proc_root: PathBuf,
}

impl MonitoringConfig {
    /// Load from process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let interval_raw = require(&lookup, "COLLECTION_INTERVAL")?;
        let collection_interval =
            interval_raw
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::Invalid {
                    name: "COLLECTION_INTERVAL",
                    reason: e.to_string(),
                })?;

        let config = Self {
            collection_interval,
            cpu_temp_path: PathBuf::from(require(&lookup, "CPU_TEMP_PATH")?),
            enable_cpu: require_bool(&lookup, "ENABLE_CPU")?,
            enable_memory: require_bool(&lookup, "ENABLE_MEMORY")?,
            enable_disk: require_bool(&lookup, "ENABLE_DISK")?,
            enable_temperature: require_bool(&lookup, "ENABLE_TEMPERATURE")?,
            enable_network: require_bool(&lookup, "ENABLE_NETWORK")?,
            sys_root: PathBuf::from(lookup("HOST_SYS").unwrap_or_else(|| "/sys".to_string())),
            proc_root: PathBuf::from(lookup("HOST_PROC").unwrap_or_else(|| "/proc".to_string())),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collection_interval == 0 {
            return Err(ConfigError::Validation(
                "COLLECTION_INTERVAL must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Fallback thermal zone path under the configured sysfs root.
    pub fn thermal_fallback_path(&self) -> PathBuf {
        self.sys_root.join(THERMAL_FALLBACK)
    }
}

fn require<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).ok_or(ConfigError::Missing(name))
}

fn require_bool<F>(lookup: &F, name: &'static str) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = require(lookup, name)?;
    Ok(raw.trim().eq_ignore_ascii_case("true"))
}
