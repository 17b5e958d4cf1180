//! Metric source adapters and the per-cycle collector.
//!
//! [`MetricsCollector::collect_all`] runs all five adapters and assembles one
//! [`Snapshot`]. Every adapter checks its own enable flag and isolates its
//! own failures: a platform read that fails turns into
//! [`CategoryResult::Unavailable`] for that category only, never into an
//! error for the cycle.

use std::path::Path;
use std::time::Duration;

use sysinfo::{Disks, System};
use tracing::warn;

use crate::config::MonitoringConfig;
use crate::metrics::{CategoryRecord, CategoryResult, DiskRecord, NetworkRecord, Snapshot};
use crate::sysfs::{self, CpuFreqRange};

/// Sampling window for interval-based CPU utilization. Two refreshes this far
/// apart give a meaningful instantaneous rate instead of a cumulative value.
const CPU_SAMPLE_WINDOW: Duration = Duration::from_secs(1);

/// Collects system metrics for one host.
pub struct MetricsCollector {
    system: System,
    disks: Disks,
    config: MonitoringConfig,
}

impl MetricsCollector {
    pub fn new(config: MonitoringConfig) -> Self {
        Self {
            system: System::new_all(),
            disks: Disks::new_with_refreshed_list(),
            config,
        }
    }

    /// Collect every enabled category into one snapshot.
    ///
    /// Safe to call repeatedly; no state from one cycle influences the shape
    /// of the next. The CPU adapter blocks for [`CPU_SAMPLE_WINDOW`].
    pub async fn collect_all(&mut self) -> Snapshot {
        Snapshot {
            cpu: self.collect_cpu().await,
            memory: self.collect_memory(),
            disk: self.collect_disk(),
            network: self.collect_network(),
            temperature: self.collect_temperature(),
        }
    }

    /// CPU utilization (global and per core), core count and frequencies.
    async fn collect_cpu(&mut self) -> CategoryResult<CategoryRecord> {
        if !self.config.enable_cpu {
            return CategoryResult::Disabled;
        }

        self.system.refresh_cpu_usage();
        tokio::time::sleep(CPU_SAMPLE_WINDOW).await;
        self.system.refresh_cpu_usage();

        let per_core: Vec<f64> = self
            .system
            .cpus()
            .iter()
            .map(|cpu| cpu.cpu_usage() as f64)
            .collect();
        if per_core.is_empty() {
            warn!("No CPUs reported by the platform");
            return CategoryResult::Unavailable;
        }

        let global = self.system.global_cpu_usage() as f64;
        let current_mhz = self
            .system
            .cpus()
            .first()
            .map(|cpu| cpu.frequency())
            .filter(|freq| *freq > 0)
            .map(|freq| freq as f64);
        let freq_range = sysfs::cpu_freq_range(&self.config.sys_root);

        CategoryResult::Collected(cpu_record(global, &per_core, current_mhz, freq_range))
    }

    /// Physical memory and swap usage.
    fn collect_memory(&mut self) -> CategoryResult<CategoryRecord> {
        if !self.config.enable_memory {
            return CategoryResult::Disabled;
        }

        self.system.refresh_memory();
        CategoryResult::Collected(memory_record(&MemorySample {
            total: self.system.total_memory(),
            available: self.system.available_memory(),
            used: self.system.used_memory(),
            free: self.system.free_memory(),
            swap_total: self.system.total_swap(),
            swap_used: self.system.used_swap(),
            swap_free: self.system.free_swap(),
        }))
    }

    /// Usage per mounted partition. Partitions the platform cannot stat are
    /// simply not listed; the rest are returned.
    fn collect_disk(&mut self) -> CategoryResult<Vec<DiskRecord>> {
        if !self.config.enable_disk {
            return CategoryResult::Disabled;
        }

        self.disks.refresh(true);
        let records = self
            .disks
            .list()
            .iter()
            .map(|disk| {
                disk_record(
                    &disk.name().to_string_lossy(),
                    &disk.mount_point().to_string_lossy(),
                    disk.total_space(),
                    disk.available_space(),
                )
            })
            .collect();
        CategoryResult::Collected(records)
    }

    /// Cumulative I/O counters per network interface, from
    /// `<proc_root>/net/dev`.
    fn collect_network(&self) -> CategoryResult<Vec<NetworkRecord>> {
        if !self.config.enable_network {
            return CategoryResult::Disabled;
        }

        let path = self.config.proc_root.join("net/dev");
        match read_interface_counters(&path) {
            Ok(records) => CategoryResult::Collected(records),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read network counters");
                CategoryResult::Unavailable
            }
        }
    }

    /// Thermal zone temperature, absent when no source is readable.
    fn collect_temperature(&self) -> CategoryResult<CategoryRecord> {
        if !self.config.enable_temperature {
            return CategoryResult::Disabled;
        }

        match sysfs::read_cpu_temperature(
            &self.config.cpu_temp_path,
            &self.config.thermal_fallback_path(),
        ) {
            Some(celsius) => {
                let mut record = CategoryRecord::new();
                record.insert("cpu_temperature", celsius);
                CategoryResult::Collected(record)
            }
            None => CategoryResult::Unavailable,
        }
    }
}

/// Build the CPU record from sampled values.
///
/// Frequency fields are included only when the platform reported them; the
/// key is omitted entirely otherwise.
fn cpu_record(
    global_percent: f64,
    per_core_percent: &[f64],
    current_mhz: Option<f64>,
    freq_range: CpuFreqRange,
) -> CategoryRecord {
    let mut record = CategoryRecord::new();
    record.insert("cpu_usage_percent", global_percent);
    record.insert("cpu_count", per_core_percent.len() as f64);

    if let Some(current) = current_mhz {
        record.insert("cpu_freq_current", current);
    }
    if let Some(min) = freq_range.min_mhz {
        record.insert("cpu_freq_min", min);
    }
    if let Some(max) = freq_range.max_mhz {
        record.insert("cpu_freq_max", max);
    }

    for (idx, usage) in per_core_percent.iter().enumerate() {
        record.insert(format!("cpu_core_{}_usage", idx), *usage);
    }

    record
}

/// Raw memory counters for one sample, all in bytes.
struct MemorySample {
    total: u64,
    available: u64,
    used: u64,
    free: u64,
    swap_total: u64,
    swap_used: u64,
    swap_free: u64,
}

fn memory_record(sample: &MemorySample) -> CategoryRecord {
    let mut record = CategoryRecord::new();
    record.insert("memory_total", sample.total as f64);
    record.insert("memory_available", sample.available as f64);
    record.insert("memory_used", sample.used as f64);
    record.insert("memory_free", sample.free as f64);
    record.insert("memory_percent", percent_of(sample.used, sample.total));
    record.insert("swap_total", sample.swap_total as f64);
    record.insert("swap_used", sample.swap_used as f64);
    record.insert("swap_free", sample.swap_free as f64);
    record.insert("swap_percent", percent_of(sample.swap_used, sample.swap_total));
    record
}

fn disk_record(device: &str, mountpoint: &str, total: u64, available: u64) -> DiskRecord {
    let used = total.saturating_sub(available);
    let mut fields = CategoryRecord::new();
    fields.insert("disk_total", total as f64);
    fields.insert("disk_used", used as f64);
    fields.insert("disk_free", available as f64);
    fields.insert("disk_percent", percent_of(used, total));
    DiskRecord {
        device: device.to_string(),
        mountpoint: mountpoint.to_string(),
        fields,
    }
}

/// Cumulative counters for one interface, as read from `/proc/net/dev`.
struct InterfaceCounters {
    bytes_sent: u64,
    bytes_recv: u64,
    packets_sent: u64,
    packets_recv: u64,
    errin: u64,
    errout: u64,
    dropin: u64,
    dropout: u64,
}

fn network_record(interface: &str, counters: &InterfaceCounters) -> NetworkRecord {
    let mut fields = CategoryRecord::new();
    fields.insert("bytes_sent", counters.bytes_sent as f64);
    fields.insert("bytes_recv", counters.bytes_recv as f64);
    fields.insert("packets_sent", counters.packets_sent as f64);
    fields.insert("packets_recv", counters.packets_recv as f64);
    fields.insert("errin", counters.errin as f64);
    fields.insert("errout", counters.errout as f64);
    fields.insert("dropin", counters.dropin as f64);
    fields.insert("dropout", counters.dropout as f64);
    NetworkRecord {
        interface: interface.to_string(),
        fields,
    }
}

/// Read per-interface counters from a `net/dev` style file.
///
/// Interfaces are sorted by name so the snapshot shape is deterministic.
fn read_interface_counters(path: &Path) -> anyhow::Result<Vec<NetworkRecord>> {
    use procfs::FromBufRead;
    use procfs::net::InterfaceDeviceStatus;

    let file = std::fs::File::open(path)?;
    let status = InterfaceDeviceStatus::from_buf_read(std::io::BufReader::new(file))?;

    let mut records: Vec<NetworkRecord> = status
        .0
        .into_iter()
        .map(|(name, dev)| {
            network_record(
                &name,
                &InterfaceCounters {
                    bytes_sent: dev.sent_bytes,
                    bytes_recv: dev.recv_bytes,
                    packets_sent: dev.sent_packets,
                    packets_recv: dev.recv_packets,
                    errin: dev.recv_errs,
                    errout: dev.sent_errs,
                    dropin: dev.recv_drop,
                    dropout: dev.sent_drop,
                },
            )
        })
        .collect();
    records.sort_by(|a, b| a.interface.cmp(&b.interface));
    Ok(records)
}

fn percent_of(part: u64, total: u64) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}
