//! Persisted user preferences
//!
//! The synthetic-mode toggle survives restarts. Storage is injected through
//! the [`PreferenceStore`] trait so the engine never reaches for ambient
//! state; a TOML file backs the CLI and an in-memory map backs tests.

mod error;
mod store;

pub use error::PreferenceError;
pub use store::{FilePreferences, MemoryPreferences};

use crate::config::ObservatoryConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Preference key for the synthetic data source toggle.
pub const SYNTHETIC_MODE_KEY: &str = "synthetic_mode";

/// Boolean preference storage.
pub trait PreferenceStore: Send + Sync {
    /// Read a stored flag. `Ok(None)` means it was never set.
    fn get_bool(&self, key: &str) -> Result<Option<bool>, PreferenceError>;

    /// Store a flag, replacing any previous value.
    fn set_bool(&self, key: &str, value: bool) -> Result<(), PreferenceError>;
}

/// Where the client sources its snapshots from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Live producer over WebSocket
    Live,
    /// Locally generated telemetry
    Synthetic,
}

impl DataSource {
    /// Pick the data source.
    ///
    /// An explicit choice (CLI flag) wins, then the stored preference, then
    /// the configured default. Unreadable preferences fall back to config.
    pub fn resolve(
        explicit: Option<DataSource>,
        store: &dyn PreferenceStore,
        config: &ObservatoryConfig,
    ) -> DataSource {
        if let Some(source) = explicit {
            return source;
        }

        let synthetic = match store.get_bool(SYNTHETIC_MODE_KEY) {
            Ok(Some(value)) => value,
            Ok(None) => config.synthetic.enabled,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read preferences, using config default");
                config.synthetic.enabled
            }
        };

        DataSource::from_synthetic_flag(synthetic)
    }

    pub fn from_synthetic_flag(synthetic: bool) -> Self {
        if synthetic {
            DataSource::Synthetic
        } else {
            DataSource::Live
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, DataSource::Synthetic)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Live => f.write_str("live"),
            DataSource::Synthetic => f.write_str("synthetic"),
        }
    }
}
