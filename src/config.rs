//! Relay client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Relay used when nothing else is configured
pub const DEFAULT_RELAY_URL: &str = "wss://relay.wikifreedia.xyz";

/// Default number of articles requested by the latest flow
pub const DEFAULT_LIMIT: u32 = 20;

/// Default bound on the WebSocket handshake, in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Relay client configuration
///
/// Holds the user-facing inputs (relay address, result-count bound) together
/// with transport settings.
///
/// # Example
///
/// ```
/// use wiki_relay::ClientConfig;
///
/// // Recommended: use the constructor methods
/// let config = ClientConfig::new("wss://relay.example.com");
///
/// // Or construct manually
/// let config = ClientConfig {
///     relay_url: "wss://relay.example.com".to_string(),
///     limit: 50,
///     connect_timeout_secs: 5,
///     allow_insecure_tls: false,
/// };
/// ```
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Relay endpoint (e.g., "wss://relay.example.com")
    pub relay_url: String,

    /// Number of articles requested by the latest flow
    ///
    /// Clamped to `1..=100` when a request is built.
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// WebSocket handshake timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Allow insecure TLS connections (self-signed certificates, expired certificates)
    ///
    /// **Security Warning:** Setting this to `true` disables certificate validation,
    /// making your connection vulnerable to man-in-the-middle attacks. Only use this
    /// for testing or with relays you trust on a secure network.
    ///
    /// Default: `false` (secure certificate validation enabled)
    #[serde(default)]
    pub allow_insecure_tls: bool,
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

impl ClientConfig {
    /// Create a configuration for the given relay with default settings
    pub fn new(relay_url: impl Into<String>) -> Self {
        Self {
            relay_url: relay_url.into(),
            limit: DEFAULT_LIMIT,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            allow_insecure_tls: false,
        }
    }

    /// Create a configuration that accepts self-signed certificates
    ///
    /// **Security Warning:** This configuration disables certificate validation.
    /// Only use this for local relays or testing.
    pub fn insecure(relay_url: impl Into<String>) -> Self {
        let mut config = Self::new(relay_url);
        config.allow_insecure_tls = true;
        config
    }

    /// Handshake timeout as a [`Duration`]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_RELAY_URL)
    }
}
