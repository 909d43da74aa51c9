//! Relay client error types

use thiserror::Error;

/// Relay transport, protocol and input errors
#[derive(Error, Debug)]
pub enum WikiError {
    /// IO error during network operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket handshake or transport failure
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// TLS configuration error
    #[error("TLS error: {0}")]
    Tls(String),

    /// Connection timeout
    #[error("Connection timeout")]
    Timeout,

    /// Relay endpoint is not a usable ws:// or wss:// address
    #[error("Invalid relay URL: {0}")]
    InvalidUrl(String),

    /// Subscription attempted without an open connection
    #[error("Not connected to relay")]
    NotConnected,

    /// Connection closed before the relay finished sending
    #[error("Connection closed")]
    ConnectionClosed,

    /// Topic input normalized to an empty key
    #[error("Invalid topic: {0:?} does not contain any letters")]
    InvalidTopic(String),

    /// List position that holds no article
    #[error("No article at position {0}")]
    NoSuchArticle(usize),

    /// Frame cannot be encoded for the wire
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using WikiError
pub type Result<T> = std::result::Result<T, WikiError>;
