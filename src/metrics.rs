//! Snapshot data model.
//!
//! One collection cycle produces one [`Snapshot`]. Categories that are
//! single-instance (cpu, memory, temperature) carry a [`CategoryRecord`];
//! multi-instance categories (disk, network) carry one tagged record per
//! partition or interface. Records are created fresh each cycle and never
//! mutated afterwards.

use std::collections::BTreeMap;

/// One category's field set at one point in time: metric name -> value.
///
/// All values are `f64`, including byte counts, so the whole pipeline carries
/// a single numeric type. BTreeMap keeps field order deterministic in the
/// encoded output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryRecord(BTreeMap<String, f64>);

impl CategoryRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, f64)> for CategoryRecord {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Usage fields for one mounted partition.
#[derive(Debug, Clone, PartialEq)]
pub struct DiskRecord {
    pub device: String,
    pub mountpoint: String,
    pub fields: CategoryRecord,
}

/// Cumulative I/O counters for one network interface.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkRecord {
    pub interface: String,
    pub fields: CategoryRecord,
}

/// Outcome of one adapter for one cycle.
///
/// All three variants are non-fatal; the distinction only matters for
/// diagnostics and tests. `Disabled` is policy, `Unavailable` means the
/// platform had no data (or the read failed) this cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryResult<T> {
    Disabled,
    Unavailable,
    Collected(T),
}

impl<T> CategoryResult<T> {
    pub fn is_collected(&self) -> bool {
        matches!(self, CategoryResult::Collected(_))
    }

    pub fn as_collected(&self) -> Option<&T> {
        match self {
            CategoryResult::Collected(v) => Some(v),
            _ => None,
        }
    }
}

/// The composite result of one collection cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub cpu: CategoryResult<CategoryRecord>,
    pub memory: CategoryResult<CategoryRecord>,
    pub disk: CategoryResult<Vec<DiskRecord>>,
    pub network: CategoryResult<Vec<NetworkRecord>>,
    pub temperature: CategoryResult<CategoryRecord>,
}
