//! pimon agent entry point.
//!
//! Loads configuration from the environment, establishes the InfluxDB
//! session and runs the collection loop until SIGINT/SIGTERM.

use anyhow::{Context, Result};
use tracing::info;

use pimon::collector::MetricsCollector;
use pimon::config::{InfluxConfig, MonitoringConfig};
use pimon::service::MonitoringService;
use pimon::writer::InfluxWriter;

#[tokio::main]
async fn main() -> Result<()> {
    pimon::init_tracing("info")?;

    // Missing configuration is fatal; the agent never starts degraded.
    let influx_config = InfluxConfig::from_env().context("Invalid InfluxDB configuration")?;
    let monitoring_config =
        MonitoringConfig::from_env().context("Invalid monitoring configuration")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        url = %influx_config.url,
        bucket = %influx_config.bucket,
        host = %influx_config.hostname,
        interval_secs = monitoring_config.collection_interval,
        "Starting pimon"
    );

    let hostname = influx_config.hostname.clone();
    let mut writer = InfluxWriter::new(influx_config);
    writer
        .connect()
        .await
        .context("Failed to establish InfluxDB connection")?;

    let interval_secs = monitoring_config.collection_interval;
    let collector = MetricsCollector::new(monitoring_config);

    MonitoringService::new(collector, writer, hostname, interval_secs)
        .run()
        .await
}
