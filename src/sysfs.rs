//! Readers for the handful of sysfs files the agent consumes directly.
//!
//! Everything here takes explicit paths so the sysfs root can be redirected
//! (containerised deployments mount the host tree elsewhere) and so tests can
//! point the readers at temporary files.

use std::path::{Path, PathBuf};
use tracing::debug;

/// CPU frequency range in MHz, as reported by cpufreq scaling limits.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CpuFreqRange {
    pub min_mhz: Option<f64>,
    pub max_mhz: Option<f64>,
}

/// Read a thermal zone file (integer millidegrees Celsius) as Celsius.
///
/// Returns `None` when the file is unreadable or its content is not an
/// integer. Neither case is an error for the caller.
pub fn read_millidegrees(path: &Path) -> Option<f64> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Thermal zone not readable");
            return None;
        }
    };
    match content.trim().parse::<i64>() {
        Ok(milli) => Some(milli as f64 / 1000.0),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Thermal zone content not an integer");
            None
        }
    }
}

/// Read the CPU temperature, preferring `primary` and falling back to
/// `fallback` when the primary path does not exist.
pub fn read_cpu_temperature(primary: &Path, fallback: &Path) -> Option<f64> {
    let path = if primary.exists() { primary } else { fallback };
    read_millidegrees(path)
}

/// Read the cpufreq scaling limits for cpu0 under the given sysfs root.
///
/// Values in the kernel files are kHz; the returned range is MHz to match
/// the current-frequency unit. Fields are absent on platforms without
/// cpufreq support.
pub fn cpu_freq_range(sys_root: &Path) -> CpuFreqRange {
    let cpufreq = cpufreq_dir(sys_root);
    CpuFreqRange {
        min_mhz: read_khz_as_mhz(&cpufreq.join("scaling_min_freq")),
        max_mhz: read_khz_as_mhz(&cpufreq.join("scaling_max_freq")),
    }
}

fn cpufreq_dir(sys_root: &Path) -> PathBuf {
    sys_root.join("devices/system/cpu/cpu0/cpufreq")
}

fn read_khz_as_mhz(path: &Path) -> Option<f64> {
    let content = std::fs::read_to_string(path).ok()?;
    let khz = content.trim().parse::<u64>().ok()?;
    Some(khz as f64 / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_read_millidegrees() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "temp", "45000\n");
        assert_eq!(read_millidegrees(&path), Some(45.0));
    }

    #[test]
    fn test_read_millidegrees_unparsable() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "temp", "not-a-number\n");
        assert_eq!(read_millidegrees(&path), None);
    }

    #[test]
    fn test_read_millidegrees_missing_file() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_millidegrees(&dir.path().join("nope")), None);
    }

    #[test]
    fn test_temperature_prefers_primary() {
        let dir = TempDir::new().unwrap();
        let primary = write_file(&dir, "primary", "45000");
        let fallback = write_file(&dir, "fallback", "50000");
        assert_eq!(read_cpu_temperature(&primary, &fallback), Some(45.0));
    }

    #[test]
    fn test_temperature_falls_back() {
        let dir = TempDir::new().unwrap();
        let fallback = write_file(&dir, "fallback", "50000");
        assert_eq!(
            read_cpu_temperature(&dir.path().join("missing"), &fallback),
            Some(50.0)
        );
    }

    #[test]
    fn test_temperature_absent_when_nothing_readable() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            read_cpu_temperature(&dir.path().join("a"), &dir.path().join("b")),
            None
        );
    }

    #[test]
    fn test_cpu_freq_range() {
        let dir = TempDir::new().unwrap();
        let cpufreq = dir.path().join("devices/system/cpu/cpu0/cpufreq");
        fs::create_dir_all(&cpufreq).unwrap();
        fs::write(cpufreq.join("scaling_min_freq"), "600000\n").unwrap();
        fs::write(cpufreq.join("scaling_max_freq"), "1500000\n").unwrap();

        let range = cpu_freq_range(dir.path());
        assert_eq!(range.min_mhz, Some(600.0));
        assert_eq!(range.max_mhz, Some(1500.0));
    }

    #[test]
    fn test_cpu_freq_range_absent_without_cpufreq() {
        let dir = TempDir::new().unwrap();
        let range = cpu_freq_range(dir.path());
        assert_eq!(range, CpuFreqRange::default());
    }
}
