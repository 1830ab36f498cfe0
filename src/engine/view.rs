//! Read-only state published to observers

use crate::aggregate::FleetAggregate;
use crate::history::SeriesKey;
use crate::telemetry::TelemetrySnapshot;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Frame counters since the engine was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IngestStats {
    pub accepted: u64,
    pub duplicates: u64,
    pub malformed: u64,
}

/// Everything a render layer needs, captured after one accepted snapshot.
#[derive(Debug, Clone, Default)]
pub struct EngineView {
    /// Latest accepted snapshot, kept across disconnects
    pub latest: Option<Arc<TelemetrySnapshot>>,
    pub aggregate: FleetAggregate,
    pub history: HashMap<SeriesKey, Vec<f64>>,
    pub stats: IngestStats,
}

impl EngineView {
    /// Samples for `key` oldest first, empty when unknown.
    pub fn series(&self, key: SeriesKey) -> &[f64] {
        self.history.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }
}
