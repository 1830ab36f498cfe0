//! Synthetic producer configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the offline snapshot generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    /// Default source when no preference has been stored
    pub enabled: bool,
    /// Number of simulated GPUs
    pub device_count: usize,
    /// Milliseconds between generated snapshots
    pub interval_ms: u64,
    /// Fixed RNG seed for reproducible runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl SyntheticConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            device_count: crate::synthetic::DEFAULT_DEVICE_COUNT,
            interval_ms: 2000,
            seed: None,
        }
    }
}
