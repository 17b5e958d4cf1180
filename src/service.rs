//! The collection loop.
//!
//! One cycle runs to completion (collect, build points, submit batch) before
//! the inter-cycle sleep. The sleep is the only cancellation point: SIGINT or
//! SIGTERM arriving mid-cycle is latched by the signal streams and observed
//! at the sleep, so the in-flight cycle always finishes and the writer is
//! closed before exit.

use std::time::Duration;

use tokio::signal::unix::{SignalKind, signal};
use tracing::{info, warn};

use crate::collector::MetricsCollector;
use crate::metrics::Snapshot;
use crate::point::build_points;
use crate::writer::InfluxWriter;

/// Ties the collector to the writer on a fixed interval.
pub struct MonitoringService {
    collector: MetricsCollector,
    writer: InfluxWriter,
    hostname: String,
    interval: Duration,
}

impl MonitoringService {
    pub fn new(
        collector: MetricsCollector,
        writer: InfluxWriter,
        hostname: String,
        interval_secs: u64,
    ) -> Self {
        Self {
            collector,
            writer,
            hostname,
            interval: Duration::from_secs(interval_secs),
        }
    }

    /// Run until SIGINT or SIGTERM.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        info!(
            host = %self.hostname,
            interval_secs = self.interval.as_secs(),
            "Monitoring service running"
        );

        loop {
            let snapshot = self.collector.collect_all().await;
            log_cycle_summary(&snapshot);

            let points = build_points(&snapshot, &self.hostname);
            match self.writer.write_points(&points).await {
                Ok(written) => info!(points = written, "Batch submitted"),
                Err(e) => warn!(error = %e, "Failed to write batch"),
            }

            tokio::select! {
                _ = sigint.recv() => break,
                _ = sigterm.recv() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("Received shutdown signal, stopping");
        self.writer.close();
        Ok(())
    }
}

fn log_cycle_summary(snapshot: &Snapshot) {
    if let Some(usage) = snapshot
        .cpu
        .as_collected()
        .and_then(|r| r.get("cpu_usage_percent"))
    {
        info!(cpu_usage_percent = usage, "CPU");
    }
    if let Some(percent) = snapshot
        .memory
        .as_collected()
        .and_then(|r| r.get("memory_percent"))
    {
        info!(memory_percent = percent, "Memory");
    }
    if let Some(celsius) = snapshot
        .temperature
        .as_collected()
        .and_then(|r| r.get("cpu_temperature"))
    {
        info!(cpu_temperature = celsius, "Temperature");
    }
}
