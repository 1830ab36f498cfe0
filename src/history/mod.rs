//! Bounded sample history for charting
//!
//! Keeps one ring buffer per tracked (entity, metric) pair. Every accepted
//! snapshot appends exactly one sample to each series it carries; series for
//! devices missing from a snapshot are left as they are.

mod series;

pub use series::HistorySeries;

use crate::telemetry::{GpuReading, HostReading, TelemetrySnapshot};
use std::collections::HashMap;
use std::fmt;

/// Number of samples retained per series.
pub const MAX_HISTORY: usize = 60;

/// Identifies one series in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SeriesKey {
    /// Core utilization percent of one GPU
    GpuUtilization(u32),
    /// Memory used as percent of total for one GPU
    GpuMemory(u32),
    /// Host CPU percent
    HostCpu,
    /// Host memory percent
    HostMemory,
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesKey::GpuUtilization(id) => write!(f, "gpu{}.utilization", id),
            SeriesKey::GpuMemory(id) => write!(f, "gpu{}.memory", id),
            SeriesKey::HostCpu => f.write_str("host.cpu"),
            SeriesKey::HostMemory => f.write_str("host.memory"),
        }
    }
}

/// Utilization sample for one GPU, clamped to `[0, 100]`.
pub fn utilization_sample(gpu: &GpuReading) -> f64 {
    finite_or_zero(gpu.utilization).clamp(0.0, 100.0)
}

/// Memory-used percent for one GPU, clamped to `[0, 100]`.
///
/// Zero or missing totals and a missing used value all yield 0.
pub fn memory_sample(gpu: &GpuReading) -> f64 {
    let total = finite_or_zero(gpu.memory_total);
    let used = match gpu.memory_used {
        Some(used) if used.is_finite() => used,
        _ => return 0.0,
    };
    if total <= 0.0 {
        return 0.0;
    }
    (used / total * 100.0).round().clamp(0.0, 100.0)
}

/// Host `(cpu, memory)` samples. Missing values chart as 0.
pub fn host_samples(host: &HostReading) -> (f64, f64) {
    (finite_or_zero(host.cpu_usage), finite_or_zero(host.memory_usage))
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// One bounded series per tracked key.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    series: HashMap<SeriesKey, HistorySeries>,
    capacity: usize,
}

impl HistoryStore {
    /// Creates an empty store retaining [`MAX_HISTORY`] samples per series.
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY)
    }

    /// Creates an empty store with a custom per-series bound.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            series: HashMap::new(),
            capacity,
        }
    }

    /// Fold one accepted snapshot into every series it carries.
    pub fn update(&mut self, snapshot: &TelemetrySnapshot) {
        for gpu in &snapshot.gpus {
            self.push(SeriesKey::GpuUtilization(gpu.id), utilization_sample(gpu));
            self.push(SeriesKey::GpuMemory(gpu.id), memory_sample(gpu));
        }

        if let Some(host) = &snapshot.system {
            let (cpu, memory) = host_samples(host);
            self.push(SeriesKey::HostCpu, cpu);
            self.push(SeriesKey::HostMemory, memory);
        }
    }

    fn push(&mut self, key: SeriesKey, sample: f64) {
        let capacity = self.capacity;
        self.series
            .entry(key)
            .or_insert_with(|| HistorySeries::new(capacity))
            .push(sample);
    }

    /// Returns the samples for `key` oldest first, empty when the key is unknown.
    pub fn series(&self, key: SeriesKey) -> Vec<f64> {
        self.series
            .get(&key)
            .map(HistorySeries::get_all)
            .unwrap_or_default()
    }

    /// Ids of every GPU that has ever reported, ascending.
    pub fn gpu_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self
            .series
            .keys()
            .filter_map(|key| match key {
                SeriesKey::GpuUtilization(id) => Some(*id),
                _ => None,
            })
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Copy of every series, for publishing to observers.
    pub fn export(&self) -> HashMap<SeriesKey, Vec<f64>> {
        self.series
            .iter()
            .map(|(key, series)| (*key, series.get_all()))
            .collect()
    }

    /// Number of tracked series.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Returns true if nothing has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}
