//! Write point construction and line protocol encoding.
//!
//! `Snapshot -> Vec<WritePoint>` is a pure, stateless transform. Single
//! instance categories (cpu, memory, temperature) yield at most one point,
//! tagged only with `host`; multi-instance categories yield one point per
//! partition or interface with the identifying tags added.

use influxdb_line_protocol::LineProtocolBuilder;

use crate::metrics::{CategoryRecord, CategoryResult, Snapshot};

/// One tagged, field-bearing record for the backend.
///
/// Tags are an ordered list; the `host` tag always comes first. The
/// timestamp is attached per batch at encoding time.
#[derive(Debug, Clone, PartialEq)]
pub struct WritePoint {
    pub measurement: &'static str,
    pub tags: Vec<(&'static str, String)>,
    pub fields: CategoryRecord,
}

/// Map one snapshot to its write points.
///
/// Disabled or unavailable categories and empty records yield no point at
/// all, never a point with zero fields.
pub fn build_points(snapshot: &Snapshot, host: &str) -> Vec<WritePoint> {
    let mut points = Vec::new();

    if let Some(point) = simple_point("cpu", host, &snapshot.cpu) {
        points.push(point);
    }
    if let Some(point) = simple_point("memory", host, &snapshot.memory) {
        points.push(point);
    }
    if let Some(point) = simple_point("temperature", host, &snapshot.temperature) {
        points.push(point);
    }

    if let Some(disks) = snapshot.disk.as_collected() {
        for disk in disks {
            if disk.fields.is_empty() {
                continue;
            }
            points.push(WritePoint {
                measurement: "disk",
                tags: vec![
                    ("host", host.to_string()),
                    ("device", disk.device.clone()),
                    ("mountpoint", disk.mountpoint.clone()),
                ],
                fields: disk.fields.clone(),
            });
        }
    }

    if let Some(interfaces) = snapshot.network.as_collected() {
        for iface in interfaces {
            if iface.fields.is_empty() {
                continue;
            }
            points.push(WritePoint {
                measurement: "network",
                tags: vec![
                    ("host", host.to_string()),
                    ("interface", iface.interface.clone()),
                ],
                fields: iface.fields.clone(),
            });
        }
    }

    points
}

fn simple_point(
    measurement: &'static str,
    host: &str,
    category: &CategoryResult<CategoryRecord>,
) -> Option<WritePoint> {
    let record = category.as_collected()?;
    if record.is_empty() {
        return None;
    }
    Some(WritePoint {
        measurement,
        tags: vec![("host", host.to_string())],
        fields: record.clone(),
    })
}

/// Encode a batch as InfluxDB line protocol, one line per point, all sharing
/// the batch timestamp (nanoseconds).
pub fn encode_lines(points: &[WritePoint], timestamp_ns: i64) -> String {
    let mut builder = LineProtocolBuilder::new();

    for point in points {
        let mut fields = point.fields.iter();
        // build_points never emits field-less points; skip just in case
        let Some((first_name, first_value)) = fields.next() else {
            continue;
        };

        let mut after_tags = builder.measurement(point.measurement);
        for (key, value) in &point.tags {
            after_tags = after_tags.tag(key, value.as_str());
        }

        let mut after_field = after_tags.field(first_name, first_value);
        for (name, value) in fields {
            after_field = after_field.field(name, value);
        }

        builder = after_field.timestamp(timestamp_ns).close_line();
    }

    String::from_utf8(builder.build()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{DiskRecord, NetworkRecord};

    fn record(entries: &[(&str, f64)]) -> CategoryRecord {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    fn empty_snapshot() -> Snapshot {
        Snapshot {
            cpu: CategoryResult::Disabled,
            memory: CategoryResult::Disabled,
            disk: CategoryResult::Disabled,
            network: CategoryResult::Disabled,
            temperature: CategoryResult::Disabled,
        }
    }

    fn full_snapshot() -> Snapshot {
        Snapshot {
            cpu: CategoryResult::Collected(record(&[
                ("cpu_usage_percent", 12.5),
                ("cpu_count", 4.0),
            ])),
            memory: CategoryResult::Collected(record(&[
                ("memory_total", 1024.0),
                ("memory_percent", 40.0),
            ])),
            disk: CategoryResult::Collected(vec![DiskRecord {
                device: "/dev/mmcblk0p2".to_string(),
                mountpoint: "/".to_string(),
                fields: record(&[("disk_total", 1000.0), ("disk_percent", 75.0)]),
            }]),
            network: CategoryResult::Collected(vec![NetworkRecord {
                interface: "eth0".to_string(),
                fields: record(&[("bytes_sent", 2000.0), ("bytes_recv", 1000.0)]),
            }]),
            temperature: CategoryResult::Collected(record(&[("cpu_temperature", 45.0)])),
        }
    }

    #[test]
    fn test_disabled_snapshot_yields_no_points() {
        assert!(build_points(&empty_snapshot(), "pi4").is_empty());
    }

    #[test]
    fn test_empty_record_yields_no_point() {
        let mut snapshot = empty_snapshot();
        snapshot.cpu = CategoryResult::Collected(CategoryRecord::new());
        assert!(build_points(&snapshot, "pi4").is_empty());
    }

    #[test]
    fn test_full_snapshot_yields_five_points() {
        let points = build_points(&full_snapshot(), "pi4");
        assert_eq!(points.len(), 5);
        let measurements: Vec<&str> = points.iter().map(|p| p.measurement).collect();
        assert_eq!(
            measurements,
            vec!["cpu", "memory", "temperature", "disk", "network"]
        );
        // Every point carries the host tag first
        for point in &points {
            assert_eq!(point.tags[0], ("host", "pi4".to_string()));
        }
    }

    #[test]
    fn test_disk_points_one_per_partition_with_tags() {
        let mut snapshot = empty_snapshot();
        snapshot.disk = CategoryResult::Collected(vec![
            DiskRecord {
                device: "/dev/sda1".to_string(),
                mountpoint: "/".to_string(),
                fields: record(&[("disk_total", 1.0)]),
            },
            DiskRecord {
                device: "/dev/sda2".to_string(),
                mountpoint: "/home".to_string(),
                fields: record(&[("disk_total", 2.0)]),
            },
        ]);

        let points = build_points(&snapshot, "pi4");
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].tags[1], ("device", "/dev/sda1".to_string()));
        assert_eq!(points[0].tags[2], ("mountpoint", "/".to_string()));
        assert_eq!(points[1].tags[1], ("device", "/dev/sda2".to_string()));
        assert_eq!(points[1].tags[2], ("mountpoint", "/home".to_string()));
    }

    #[test]
    fn test_network_points_one_per_interface_with_tags() {
        let mut snapshot = empty_snapshot();
        snapshot.network = CategoryResult::Collected(vec![
            NetworkRecord {
                interface: "eth0".to_string(),
                fields: record(&[("bytes_sent", 1.0)]),
            },
            NetworkRecord {
                interface: "wlan0".to_string(),
                fields: record(&[("bytes_sent", 2.0)]),
            },
        ]);

        let points = build_points(&snapshot, "pi4");
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].tags[1], ("interface", "eth0".to_string()));
        assert_eq!(points[1].tags[1], ("interface", "wlan0".to_string()));
    }

    #[test]
    fn test_build_points_is_stateless() {
        let snapshot = full_snapshot();
        assert_eq!(
            build_points(&snapshot, "pi4"),
            build_points(&snapshot, "pi4")
        );
    }

    #[test]
    fn test_encode_lines_basic() {
        let points = vec![WritePoint {
            measurement: "cpu",
            tags: vec![("host", "pi4".to_string())],
            fields: record(&[("cpu_usage_percent", 12.5), ("cpu_count", 4.0)]),
        }];

        let encoded = encode_lines(&points, 1609459200000000000);
        assert!(encoded.starts_with("cpu,host=pi4 "));
        assert!(encoded.contains("cpu_usage_percent=12.5"));
        assert!(encoded.contains("cpu_count=4"));
        assert!(encoded.contains("1609459200000000000"));
    }

    #[test]
    fn test_encode_lines_one_line_per_point() {
        let points = build_points(&full_snapshot(), "pi4");
        let encoded = encode_lines(&points, 1609459200000000000);
        assert_eq!(encoded.trim_end().lines().count(), 5);
        assert!(encoded.contains("disk,host=pi4,device=/dev/mmcblk0p2,mountpoint=/ "));
        assert!(encoded.contains("network,host=pi4,interface=eth0 "));
        assert!(encoded.contains("temperature,host=pi4 cpu_temperature=45"));
    }

    #[test]
    fn test_encode_lines_empty_batch() {
        assert!(encode_lines(&[], 0).is_empty());
    }
}
