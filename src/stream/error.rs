//! Error types for the telemetry stream.

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors raised by connectors and endpoint resolution.
///
/// None of these escape the connection manager; they are folded into
/// [`ConnectionStatus`](super::ConnectionStatus) messages.
#[derive(Debug, Clone, Error)]
pub enum StreamError {
    /// Handshake or socket setup failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Established connection reported an error
    #[error("transport error: {0}")]
    Transport(String),

    /// Endpoint could not be derived or has the wrong scheme
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// A synthetic snapshot could not be serialized
    #[error("failed to encode frame: {0}")]
    Encode(String),
}

impl StreamError {
    /// Classify a tungstenite error.
    pub fn from_ws_error(error: tungstenite::Error) -> Self {
        match error {
            tungstenite::Error::Io(e) => StreamError::ConnectionFailed(e.to_string()),
            tungstenite::Error::Http(response) => {
                StreamError::ConnectionFailed(format!("HTTP {}", response.status()))
            }
            tungstenite::Error::Url(e) => StreamError::InvalidEndpoint(e.to_string()),
            other => StreamError::Transport(other.to_string()),
        }
    }
}
