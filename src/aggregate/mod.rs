//! Fleet-wide aggregates derived from the current snapshot.
//!
//! Aggregates are never computed from history: each accepted snapshot
//! replaces the previous figures outright.

use crate::telemetry::TelemetrySnapshot;
use serde::{Deserialize, Serialize};

/// Fleet-level scalars for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FleetAggregate {
    /// Number of GPUs in the snapshot
    pub gpu_count: usize,
    /// Arithmetic mean utilization percent, 0 for an empty fleet
    pub average_utilization: f64,
    /// Sum of memory used across GPUs (MiB)
    pub memory_used_mib: f64,
    /// Sum of memory capacity across GPUs (MiB)
    pub memory_total_mib: f64,
}

impl FleetAggregate {
    /// `(used, total)` memory pair in MiB.
    pub fn total_memory(&self) -> (f64, f64) {
        (self.memory_used_mib, self.memory_total_mib)
    }
}

/// Recomputes [`FleetAggregate`] whenever a snapshot is accepted.
#[derive(Debug, Default)]
pub struct AggregateComputer {
    current: FleetAggregate,
    recomputations: u64,
}

impl AggregateComputer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current aggregate with figures derived from `snapshot`.
    pub fn recompute(&mut self, snapshot: &TelemetrySnapshot) -> FleetAggregate {
        self.current = compute(snapshot);
        self.recomputations += 1;
        self.current
    }

    pub fn current(&self) -> FleetAggregate {
        self.current
    }

    /// How many snapshots have been folded in so far.
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }
}

/// Derive fleet aggregates from a single snapshot. Missing readings count as 0.
pub fn compute(snapshot: &TelemetrySnapshot) -> FleetAggregate {
    let gpu_count = snapshot.gpus.len();

    let utilization_sum: f64 = snapshot
        .gpus
        .iter()
        .map(|gpu| reading(gpu.utilization))
        .sum();
    let memory_used_mib = snapshot
        .gpus
        .iter()
        .map(|gpu| reading(gpu.memory_used))
        .sum();
    let memory_total_mib = snapshot
        .gpus
        .iter()
        .map(|gpu| reading(gpu.memory_total))
        .sum();

    FleetAggregate {
        gpu_count,
        average_utilization: utilization_sum / gpu_count.max(1) as f64,
        memory_used_mib,
        memory_total_mib,
    }
}

fn reading(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}
