//! Connection state types for the relay client

/// Lifecycle of the tracked relay connection
///
/// `Disconnected` → `Connecting` → `Open` → `Closed`. A closed connection is
/// replaced, never reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection tracked
    Disconnected,
    /// WebSocket handshake in progress
    Connecting,
    /// Handshake done, frames flowing
    Open,
    /// Closed locally, by the relay, or by a transport error
    Closed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
        };
        f.write_str(name)
    }
}
