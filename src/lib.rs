//! Host metrics agent for single-board computers.
//!
//! pimon samples local system metrics (CPU, memory, disk, network,
//! thermal-zone temperature) on a fixed interval and writes them to an
//! InfluxDB v2 backend as tagged line-protocol points:
//!
//! ```text
//! cpu,host=<hostname> cpu_usage_percent=12.5,cpu_count=4,...
//! memory,host=<hostname> memory_total=...,memory_percent=...
//! temperature,host=<hostname> cpu_temperature=45.0
//! disk,host=<hostname>,device=/dev/mmcblk0p2,mountpoint=/ disk_total=...,disk_percent=...
//! network,host=<hostname>,interface=eth0 bytes_sent=...,bytes_recv=...
//! ```
//!
//! - [`config`] - Configuration loading (environment variables)
//! - [`metrics`] - Snapshot data model (`CategoryRecord`, `CategoryResult`, `Snapshot`)
//! - [`collector`] - Metric source adapters and `collect_all()`
//! - [`sysfs`] - Sysfs readers (thermal zone, cpufreq)
//! - [`point`] - Write point construction and line protocol encoding
//! - [`writer`] - InfluxDB batch writer
//! - [`service`] - Collection loop with graceful shutdown

pub mod collector;
pub mod config;
pub mod metrics;
pub mod point;
pub mod service;
pub mod sysfs;
pub mod writer;

pub use collector::MetricsCollector;
pub use config::{ConfigError, InfluxConfig, MonitoringConfig};
pub use metrics::{CategoryRecord, CategoryResult, DiskRecord, NetworkRecord, Snapshot};
pub use point::{WritePoint, build_points, encode_lines};
pub use writer::{InfluxWriter, WriteError};

/// Initialize tracing for the agent binary.
///
/// Honors `RUST_LOG` when set, otherwise falls back to the given level.
pub fn init_tracing(default_level: &str) -> anyhow::Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}
