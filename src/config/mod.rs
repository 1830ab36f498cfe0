//! Configuration module for the observatory client
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`OBSERVATORY_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use observatory::config::ObservatoryConfig;
//!
//! // Load defaults
//! let config = ObservatoryConfig::default();
//! assert_eq!(config.stream.path, "/ws/gpu");
//!
//! // Parse from TOML
//! let toml = r#"
//! [stream]
//! host = "gpu-rig:8000"
//! "#;
//! let config: ObservatoryConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.stream.host, "gpu-rig:8000");
//! ```

pub mod error;
pub mod logging;
pub mod preferences;
pub mod stream;
pub mod synthetic;

pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use preferences::PreferencesConfig;
pub use stream::StreamConfig;
pub use synthetic::SyntheticConfig;

use crate::preferences::DataSource;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Smallest accepted synthetic cadence.
pub const MIN_SYNTHETIC_INTERVAL_MS: u64 = 100;

/// Unified configuration for the observatory client.
///
/// # Example
///
/// ```rust
/// use observatory::config::ObservatoryConfig;
///
/// let config = ObservatoryConfig::default();
/// assert_eq!(config.stream.reconnect_delay_ms, 4000);
/// assert_eq!(config.synthetic.device_count, 4);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ObservatoryConfig {
    /// Producer connection settings
    pub stream: StreamConfig,
    /// Offline generator settings
    pub synthetic: SyntheticConfig,
    /// Persisted preference storage
    pub preferences: PreferencesConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ObservatoryConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p).map_err(|source| ConfigError::Read {
                    path: p.to_path_buf(),
                    source,
                })?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse {
                    path: p.to_path_buf(),
                    message: e.to_string(),
                })
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports OBSERVATORY_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        // Stream settings
        if let Ok(url) = std::env::var("OBSERVATORY_URL") {
            if !url.is_empty() {
                self.stream.url = Some(url);
            }
        }
        if let Ok(host) = std::env::var("OBSERVATORY_HOST") {
            self.stream.host = host;
        }
        if let Ok(delay) = std::env::var("OBSERVATORY_RECONNECT_DELAY_MS") {
            if let Ok(d) = delay.parse() {
                self.stream.reconnect_delay_ms = d;
            }
        }

        // Logging settings
        if let Ok(level) = std::env::var("OBSERVATORY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("OBSERVATORY_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        // Synthetic source default
        if let Ok(synthetic) = std::env::var("OBSERVATORY_SYNTHETIC") {
            self.synthetic.enabled = synthetic.to_lowercase() == "true";
        }

        self
    }

    /// Validate every section, including the live endpoint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_for(DataSource::Live)
    }

    /// Validate the settings `source` depends on. The producer endpoint is
    /// only checked for live data.
    pub fn validate_for(&self, source: DataSource) -> Result<(), ConfigError> {
        if self.stream.reconnect_delay_ms == 0 {
            return Err(ConfigError::Validation {
                field: "stream.reconnect_delay_ms".to_string(),
                message: "reconnect delay must be non-zero".to_string(),
            });
        }

        if !self.stream.path.starts_with('/') {
            return Err(ConfigError::Validation {
                field: "stream.path".to_string(),
                message: "path must start with '/'".to_string(),
            });
        }

        if !source.is_synthetic() {
            if let Err(e) = crate::stream::resolve_endpoint(&self.stream) {
                let field = if self.stream.url.is_some() {
                    "stream.url"
                } else {
                    "stream.host"
                };
                return Err(ConfigError::Validation {
                    field: field.to_string(),
                    message: e.to_string(),
                });
            }
        }

        if let Some(component) = self.logging.unknown_component() {
            return Err(ConfigError::Validation {
                field: "logging.component_levels".to_string(),
                message: format!(
                    "unknown component '{}' (expected one of: {})",
                    component,
                    logging::LOG_COMPONENTS.join(", ")
                ),
            });
        }

        if self.synthetic.device_count == 0 {
            return Err(ConfigError::Validation {
                field: "synthetic.device_count".to_string(),
                message: "at least one device is required".to_string(),
            });
        }

        if self.synthetic.interval_ms < MIN_SYNTHETIC_INTERVAL_MS {
            return Err(ConfigError::Validation {
                field: "synthetic.interval_ms".to_string(),
                message: format!("interval must be at least {}ms", MIN_SYNTHETIC_INTERVAL_MS),
            });
        }

        Ok(())
    }
}
