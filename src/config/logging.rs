//! `[logging]` section

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Modules that accept a per-component level under `[logging.component_levels]`.
pub const LOG_COMPONENTS: &[&str] = &[
    "aggregate",
    "cli",
    "client",
    "engine",
    "history",
    "preferences",
    "stream",
    "synthetic",
];

/// How log lines are written to stderr while `watch` owns stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    /// One JSON object per line, for log shippers
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("unknown log format '{}' (expected pretty or json)", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    /// Per-component overrides, keyed by an entry of [`LOG_COMPONENTS`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_levels: Option<HashMap<String, String>>,
    /// Log every raw frame at trace level (noisy, off by default)
    #[serde(default)]
    pub log_frames: bool,
}

impl LoggingConfig {
    /// First configured component that is not a module of this crate.
    pub fn unknown_component(&self) -> Option<&str> {
        let levels = self.component_levels.as_ref()?;
        let mut names: Vec<&str> = levels.keys().map(String::as_str).collect();
        names.sort_unstable();
        names.into_iter().find(|name| !LOG_COMPONENTS.contains(name))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            component_levels: None,
            log_frames: false,
        }
    }
}
