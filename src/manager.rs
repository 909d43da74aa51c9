//! Single-connection relay manager
//!
//! Tracks at most one relay connection, keyed by endpoint. Every query flow
//! calls [`RelayManager::ensure_connected`] first: the same open endpoint is
//! reused, anything else replaces the tracked connection.

use crate::client::{ConnectionState, RelayConnection, Subscription, validate_endpoint};
use crate::config::ClientConfig;
use crate::error::{Result, WikiError};
use crate::protocol::Filter;
use tracing::{debug, info, warn};

/// Close reason sent when the manager moves to another relay
pub const SWITCH_RELAY_REASON: &str = "switching relay";

/// Close reason sent on an explicit disconnect
pub const DISCONNECT_REASON: &str = "client disconnect";

/// Owner of the one live relay connection
///
/// # Example
///
/// ```no_run
/// use wiki_relay::{ClientConfig, Filter, RelayManager};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut manager = RelayManager::new(ClientConfig::default());
///
/// // First call connects, the second is a no-op
/// manager.ensure_connected("wss://relay.example.com").await?;
/// manager.ensure_connected("wss://relay.example.com").await?;
///
/// let articles = manager.subscribe(Filter::latest_articles(5))?.collect().await?;
/// println!("{} articles", articles.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RelayManager {
    config: ClientConfig,
    current: Option<RelayConnection>,
    connecting: bool,
    connect_attempts: u64,
}

impl RelayManager {
    /// Create a manager with no connection
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            current: None,
            connecting: false,
            connect_attempts: 0,
        }
    }

    /// Transport settings used for new connections
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Make sure an open connection to `endpoint` is tracked
    ///
    /// No-op when the tracked connection is open and was opened for exactly
    /// this endpoint string. Otherwise the old connection (if any) is closed
    /// with a normal-closure code and a new one is established. A failed
    /// handshake leaves the manager disconnected; an endpoint that is not a
    /// ws:// or wss:// URL is rejected before the old connection is touched.
    ///
    /// # Errors
    ///
    /// Any error from [`RelayConnection::connect`].
    pub async fn ensure_connected(&mut self, endpoint: &str) -> Result<&RelayConnection> {
        let reusable = self
            .current
            .as_ref()
            .is_some_and(|conn| conn.endpoint() == endpoint && conn.is_open());

        if reusable {
            debug!("Reusing connection to {}", endpoint);
        } else {
            validate_endpoint(endpoint)?;
            if let Some(old) = self.current.take() {
                if old.endpoint() != endpoint {
                    info!("Switching relay from {} to {}", old.endpoint(), endpoint);
                }
                old.close(SWITCH_RELAY_REASON);
            }

            self.connect_attempts += 1;
            let attempt = ConnectAttempt::start(&mut self.connecting);
            let result = RelayConnection::connect(endpoint, &self.config).await;
            drop(attempt);

            match result {
                Ok(conn) => {
                    self.current = Some(conn);
                }
                Err(e) => {
                    warn!("Failed to connect to {}: {}", endpoint, e);
                    return Err(e);
                }
            }
        }

        self.current.as_ref().ok_or(WikiError::NotConnected)
    }

    /// The tracked connection, if any
    pub fn current(&self) -> Option<&RelayConnection> {
        self.current.as_ref()
    }

    /// Lifecycle state of the tracked connection
    pub fn state(&self) -> ConnectionState {
        if self.connecting {
            return ConnectionState::Connecting;
        }
        match &self.current {
            Some(conn) => conn.state(),
            None => ConnectionState::Disconnected,
        }
    }

    /// Number of handshakes attempted so far
    pub fn connect_attempts(&self) -> u64 {
        self.connect_attempts
    }

    /// Open a subscription on the tracked connection
    ///
    /// # Errors
    ///
    /// [`WikiError::NotConnected`] if there is no open connection. Nothing is
    /// sent in that case.
    pub fn subscribe(&self, filter: Filter) -> Result<Subscription> {
        match &self.current {
            Some(conn) => conn.subscribe(filter),
            None => Err(WikiError::NotConnected),
        }
    }

    /// Close and forget the tracked connection
    pub fn disconnect(&mut self) {
        if let Some(conn) = self.current.take() {
            conn.close(DISCONNECT_REASON);
        }
    }
}

/// Marks a handshake in progress; cleared on drop, including when the
/// connecting future is cancelled
struct ConnectAttempt<'a> {
    connecting: &'a mut bool,
}

impl<'a> ConnectAttempt<'a> {
    fn start(connecting: &'a mut bool) -> Self {
        *connecting = true;
        Self { connecting }
    }
}

impl Drop for ConnectAttempt<'_> {
    fn drop(&mut self) {
        *self.connecting = false;
    }
}
