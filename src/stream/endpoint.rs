//! Producer endpoint resolution.

use super::StreamError;
use crate::config::StreamConfig;

/// Path the producer serves its telemetry socket on.
pub const DEFAULT_STREAM_PATH: &str = "/ws/gpu";

/// Resolve the WebSocket URL to connect to.
///
/// An explicit `url` wins. Otherwise the scheme follows the security context
/// of the host (`wss` when `secure`, `ws` otherwise) and the configured path
/// is appended.
pub fn resolve_endpoint(config: &StreamConfig) -> Result<String, StreamError> {
    if let Some(url) = &config.url {
        check_scheme(url)?;
        return Ok(url.clone());
    }

    if config.host.is_empty() {
        return Err(StreamError::InvalidEndpoint("host cannot be empty".to_string()));
    }

    let scheme = if config.secure { "wss" } else { "ws" };
    Ok(format!("{}://{}{}", scheme, config.host, config.path))
}

/// Derive `(host, secure)` from a page origin such as `https://gpu.example.com`.
pub fn origin_host(origin: &str) -> Result<(String, bool), StreamError> {
    let (secure, rest) = if let Some(rest) = origin.strip_prefix("https://") {
        (true, rest)
    } else if let Some(rest) = origin.strip_prefix("http://") {
        (false, rest)
    } else {
        return Err(StreamError::InvalidEndpoint(format!(
            "origin must start with http:// or https://: {}",
            origin
        )));
    };

    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() {
        return Err(StreamError::InvalidEndpoint(format!(
            "origin has no host: {}",
            origin
        )));
    }

    Ok((host.to_string(), secure))
}

fn check_scheme(url: &str) -> Result<(), StreamError> {
    if url.starts_with("ws://") || url.starts_with("wss://") {
        Ok(())
    } else {
        Err(StreamError::InvalidEndpoint(format!(
            "expected ws:// or wss:// URL: {}",
            url
        )))
    }
}
