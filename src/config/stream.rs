//! Producer stream configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where and how to reach the telemetry producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Producer host, optionally with port (e.g. "localhost:8000")
    pub host: String,
    /// Socket path on the producer
    pub path: String,
    /// Use `wss://` (the producer is served over TLS)
    pub secure: bool,
    /// Full endpoint URL; overrides host/path/secure when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Delay before a dropped connection is retried
    pub reconnect_delay_ms: u64,
}

impl StreamConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            host: "localhost:8000".to_string(),
            path: crate::stream::DEFAULT_STREAM_PATH.to_string(),
            secure: false,
            url: None,
            reconnect_delay_ms: crate::stream::DEFAULT_RECONNECT_DELAY.as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_config_defaults() {
        let config = StreamConfig::default();
        assert_eq!(config.host, "localhost:8000");
        assert_eq!(config.path, "/ws/gpu");
        assert!(!config.secure);
        assert!(config.url.is_none());
        assert_eq!(config.reconnect_delay(), Duration::from_millis(4000));
    }

    #[test]
    fn test_stream_config_partial_toml() {
        let config: StreamConfig = toml::from_str("secure = true").unwrap();
        assert!(config.secure);
        assert_eq!(config.reconnect_delay_ms, 4000);
    }
}
