use std::fmt;

use serde::{Deserialize, Serialize};

/// Connection lifecycle of the broker client.
///
/// ```text
/// disconnected ──► connecting ──► connected ──► disconnected
///                      │
///                      ▼ (retry ceiling reached; retries continue)
///                    failed ──► connected
/// ```
///
/// The state is owned by the client's reconnection loop. `failed` is
/// sticky: once the retry ceiling is reached the client stays in
/// `failed` through further attempts until one of them succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

impl ConnectionState {
    /// True once a connection is live.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// True while the client is buffering instead of sending.
    pub fn is_degraded(&self) -> bool {
        !self.is_connected()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Failed => "failed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
