//! Connection status as observed by the render layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of the producer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Attempt in flight (initial state)
    #[default]
    Connecting,
    /// Connection established, frames flowing
    Online,
    /// No connection; a reconnect may be pending
    Offline,
    /// Transport reported an error. Always followed by `Offline`.
    Error,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Online => "online",
            ConnectionState::Offline => "offline",
            ConnectionState::Error => "error",
        };
        f.write_str(label)
    }
}

impl ConnectionState {
    /// True for states in which the last known snapshot is stale.
    pub fn is_degraded(&self) -> bool {
        matches!(self, ConnectionState::Offline | ConnectionState::Error)
    }
}

/// Current state plus the last error message, if any.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectionStatus {
    pub fn connecting() -> Self {
        Self {
            state: ConnectionState::Connecting,
            error: None,
        }
    }

    pub fn online() -> Self {
        Self {
            state: ConnectionState::Online,
            error: None,
        }
    }

    pub fn offline(error: Option<String>) -> Self {
        Self {
            state: ConnectionState::Offline,
            error,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            state: ConnectionState::Error,
            error: Some(message.into()),
        }
    }

    pub fn is_online(&self) -> bool {
        self.state == ConnectionState::Online
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(error) => write!(f, "{} ({})", self.state, error),
            None => write!(f, "{}", self.state),
        }
    }
}
