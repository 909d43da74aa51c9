//! Relay client: one WebSocket connection and the subscriptions on it

mod connection;
mod io;
mod state;
mod subscription;

pub use connection::validate_endpoint;
pub use state::ConnectionState;
pub use subscription::{CancelHandle, Subscription, generate_subscription_id};

use crate::error::{Result, WikiError};
use crate::protocol::{Filter, Frame};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use subscription::Routes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tracing::{debug, info};

/// Close reason sent when an open connection is dropped
const DROP_REASON: &str = "connection dropped";

/// Live connection to a single relay
///
/// Outbound frames go through a writer task; inbound frames are decoded by a
/// reader task and routed to the matching [`Subscription`] by identifier.
///
/// # Example
///
/// ```no_run
/// use wiki_relay::{ClientConfig, Filter, RelayConnection};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ClientConfig::default();
/// let conn = RelayConnection::connect(&config.relay_url, &config).await?;
///
/// let mut sub = conn.subscribe(Filter::latest_articles(10))?;
/// while let Some(article) = sub.next().await? {
///     println!("{} ({})", article.display_title(), article.created_at);
/// }
/// sub.cancel_handle().cancel();
/// # Ok(())
/// # }
/// ```
#[must_use]
pub struct RelayConnection {
    /// Endpoint string exactly as it was requested
    endpoint: String,
    /// Frames waiting for the writer task
    outbound: mpsc::UnboundedSender<Message>,
    /// Active subscriptions keyed by identifier
    routes: Arc<Routes>,
    /// Cleared on local close, relay close, or transport error
    open: Arc<AtomicBool>,
    /// Set once a close frame has been handed to the writer
    close_queued: AtomicBool,
    /// Receive loop task handle
    reader: JoinHandle<()>,
    /// Send loop task handle
    writer: JoinHandle<()>,
}

impl RelayConnection {
    /// Endpoint this connection was opened for
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether frames can still be exchanged
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        if self.is_open() {
            ConnectionState::Open
        } else {
            ConnectionState::Closed
        }
    }

    /// Number of subscriptions still waiting for records or end-of-stream
    pub fn active_subscriptions(&self) -> usize {
        self.routes.len()
    }

    /// Open a subscription with a single filter
    ///
    /// See [`subscribe_filters`](Self::subscribe_filters).
    pub fn subscribe(&self, filter: Filter) -> Result<Subscription> {
        self.subscribe_filters(vec![filter])
    }

    /// Open a subscription
    ///
    /// Sends one `REQ` frame under a fresh identifier. The route for that
    /// identifier is registered before the frame is queued, so no record can
    /// arrive unobserved.
    ///
    /// # Errors
    ///
    /// - [`WikiError::NotConnected`] - the connection is not open; nothing is sent
    /// - [`WikiError::ConnectionClosed`] - the writer task is gone
    pub fn subscribe_filters(&self, filters: Vec<Filter>) -> Result<Subscription> {
        if !self.is_open() {
            return Err(WikiError::NotConnected);
        }

        let id = generate_subscription_id();
        let request = Frame::Request {
            subscription_id: id.clone(),
            filters,
        }
        .encode()?;

        let rx = self.routes.register(&id);
        if self.outbound.send(Message::Text(request.into())).is_err() {
            self.routes.remove(&id);
            return Err(WikiError::ConnectionClosed);
        }
        debug!("Opened subscription {} on {}", id, self.endpoint);

        let cancel = CancelHandle::new(id.clone(), self.outbound.clone());
        Ok(Subscription::new(id, rx, Arc::clone(&self.routes), cancel))
    }

    /// Close the connection with a normal-closure code
    ///
    /// Pending subscriptions end with [`WikiError::ConnectionClosed`]. Calling
    /// this on an already closed connection does nothing.
    pub fn close(&self, reason: &str) {
        if !self.open.swap(false, Ordering::SeqCst) {
            return;
        }
        info!("Closing relay connection {}: {}", self.endpoint, reason);

        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: reason.to_owned().into(),
        };
        if self.outbound.send(Message::Close(Some(frame))).is_err() {
            debug!("Writer for {} already stopped", self.endpoint);
        } else {
            self.close_queued.store(true, Ordering::SeqCst);
        }
        self.routes.clear();
    }
}

impl Drop for RelayConnection {
    fn drop(&mut self) {
        if self.is_open() {
            self.close(DROP_REASON);
        }
        // A queued close frame is the writer's last message; it exits after
        // sending it. Otherwise outstanding cancel handles would keep it alive.
        if !self.close_queued.load(Ordering::SeqCst) {
            self.writer.abort();
        }
        self.reader.abort();
        self.routes.clear();
        debug!("RelayConnection to {} dropped", self.endpoint);
    }
}

impl std::fmt::Debug for RelayConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConnection")
            .field("endpoint", &self.endpoint)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use futures_util::StreamExt;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Relay that accepts one client, reads up to the first text or close
    /// frame, reports what it saw, then hangs up
    async fn single_frame_relay() -> (String, oneshot::Receiver<Vec<Message>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            let mut seen = Vec::new();
            while let Some(Ok(message)) = ws.next().await {
                let last = message.is_text() || message.is_close();
                seen.push(message);
                if last {
                    break;
                }
            }
            let _ = tx.send(seen);
        });

        (url, rx)
    }

    async fn wait_until(check: impl Fn() -> bool) -> bool {
        for _ in 0..200 {
            if check() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_drop_stops_writer_while_cancel_handles_live() {
        let (url, seen) = single_frame_relay().await;
        let conn = RelayConnection::connect(&url, &ClientConfig::new(url.as_str()))
            .await
            .unwrap();
        let sub = conn.subscribe(Filter::latest_articles(1)).unwrap();
        let cancel = sub.cancel_handle();

        assert_eq!(seen.await.unwrap().len(), 1);
        assert!(wait_until(|| !conn.is_open()).await);

        let writer = conn.writer.abort_handle();
        drop(sub);
        drop(conn);
        assert!(wait_until(|| writer.is_finished()).await);

        cancel.cancel();
    }

    #[tokio::test]
    async fn test_drop_open_connection_sends_close_frame() {
        let (url, seen) = single_frame_relay().await;
        let conn = RelayConnection::connect(&url, &ClientConfig::new(url.as_str()))
            .await
            .unwrap();

        drop(conn);

        let seen = seen.await.unwrap();
        match seen.last() {
            Some(Message::Close(Some(frame))) => {
                assert_eq!(frame.code, CloseCode::Normal);
                assert_eq!(frame.reason.as_str(), DROP_REASON);
            }
            other => panic!("expected close frame, got {:?}", other),
        }
    }
}
