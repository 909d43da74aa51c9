//! Subscriptions and routing of inbound frames by subscription identifier

use crate::article::Article;
use crate::error::{Result, WikiError};
use crate::protocol::Frame;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace, warn};

static SUBSCRIPTION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a process-unique subscription identifier
///
/// Combines the current time in milliseconds with a monotonically increasing
/// counter, e.g. `wiki-18f3a2b4c10-7`.
pub fn generate_subscription_id() -> String {
    let n = SUBSCRIPTION_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("wiki-{:x}-{}", millis, n)
}

/// What the reader hands to a subscription
#[derive(Debug)]
pub(crate) enum Delivery {
    Record(Article),
    EndOfStream,
}

/// Active subscription routes keyed by identifier
///
/// A route exists from `REQ` until end-of-stream, until its [`Subscription`]
/// is dropped, or until the connection goes away, whichever comes first.
#[derive(Debug, Default)]
pub(crate) struct Routes {
    inner: Mutex<HashMap<String, mpsc::UnboundedSender<Delivery>>>,
}

impl Routes {
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, mpsc::UnboundedSender<Delivery>>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start routing frames for `id`
    pub(crate) fn register(&self, id: &str) -> mpsc::UnboundedReceiver<Delivery> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().insert(id.to_string(), tx);
        rx
    }

    /// Stop routing frames for `id`
    pub(crate) fn remove(&self, id: &str) {
        self.lock().remove(id);
    }

    /// Drop every route; their subscriptions see the connection as closed
    pub(crate) fn clear(&self) {
        self.lock().clear();
    }

    /// Number of active routes
    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    /// Route one decoded frame
    ///
    /// Returns `true` when the frame reached a subscription. End-of-stream
    /// detaches the route after delivery, so later frames for the same
    /// identifier are ignored.
    pub(crate) fn dispatch(&self, frame: Frame) -> bool {
        match frame {
            Frame::Event {
                subscription_id,
                article,
            } => {
                let routes = self.lock();
                let Some(tx) = routes.get(&subscription_id) else {
                    trace!("Dropping event for inactive subscription {}", subscription_id);
                    return false;
                };
                tx.send(Delivery::Record(article)).is_ok()
            }
            Frame::EndOfStream { subscription_id } => {
                let Some(tx) = self.lock().remove(&subscription_id) else {
                    trace!("Dropping EOSE for inactive subscription {}", subscription_id);
                    return false;
                };
                debug!("End of stored events for subscription {}", subscription_id);
                tx.send(Delivery::EndOfStream).is_ok()
            }
            other => {
                trace!("Ignoring frame from relay: {:?}", other);
                false
            }
        }
    }
}

/// Handle that tells the relay to stop sending for one subscription
///
/// Cheap to clone. Each [`cancel`](Self::cancel) call queues one `CLOSE`
/// frame; calling it after completion, more than once, or after the
/// connection is gone is harmless.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    subscription_id: String,
    outbound: mpsc::UnboundedSender<Message>,
}

impl CancelHandle {
    pub(super) fn new(subscription_id: String, outbound: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            subscription_id,
            outbound,
        }
    }

    /// Subscription this handle cancels
    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// Send `["CLOSE", <id>]`
    pub fn cancel(&self) {
        let frame = Frame::Close {
            subscription_id: self.subscription_id.clone(),
        };
        let text = match frame.encode() {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to encode CLOSE for {}: {}", self.subscription_id, e);
                return;
            }
        };

        if self.outbound.send(Message::Text(text.into())).is_err() {
            debug!(
                "Connection gone, CLOSE for {} not sent",
                self.subscription_id
            );
        } else {
            debug!("Cancelled subscription {}", self.subscription_id);
        }
    }
}

/// A live request for matching records
///
/// Yields records in arrival order and then `None` once the relay signals
/// end-of-stream. Dropping the subscription stops routing for its
/// identifier; it does not send `CLOSE` (use [`CancelHandle::cancel`]).
#[must_use]
#[derive(Debug)]
pub struct Subscription {
    id: String,
    rx: mpsc::UnboundedReceiver<Delivery>,
    routes: Arc<Routes>,
    cancel: CancelHandle,
    complete: bool,
}

impl Subscription {
    pub(super) fn new(
        id: String,
        rx: mpsc::UnboundedReceiver<Delivery>,
        routes: Arc<Routes>,
        cancel: CancelHandle,
    ) -> Self {
        Self {
            id,
            rx,
            routes,
            cancel,
            complete: false,
        }
    }

    /// Subscription identifier sent in the `REQ` frame
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether end-of-stream has been received
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Handle for cancelling this subscription
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Wait for the next record
    ///
    /// Returns `Ok(None)` after end-of-stream, on this and every later call.
    ///
    /// # Errors
    ///
    /// [`WikiError::ConnectionClosed`] if the connection ended before the
    /// relay signalled end-of-stream.
    pub async fn next(&mut self) -> Result<Option<Article>> {
        if self.complete {
            return Ok(None);
        }
        match self.rx.recv().await {
            Some(Delivery::Record(article)) => Ok(Some(article)),
            Some(Delivery::EndOfStream) => {
                self.complete = true;
                Ok(None)
            }
            None => Err(WikiError::ConnectionClosed),
        }
    }

    /// Drive the subscription with callbacks
    ///
    /// `on_record` runs once per record in arrival order; `on_complete` runs
    /// once, after the last record, when end-of-stream arrives. Pass `|| ()`
    /// when completion is not interesting.
    pub async fn for_each<F, C>(mut self, mut on_record: F, on_complete: C) -> Result<()>
    where
        F: FnMut(Article),
        C: FnOnce(),
    {
        while let Some(article) = self.next().await? {
            on_record(article);
        }
        on_complete();
        Ok(())
    }

    /// Gather every record up to end-of-stream, then cancel
    pub async fn collect(mut self) -> Result<Vec<Article>> {
        let mut records = Vec::new();
        while let Some(article) = self.next().await? {
            records.push(article);
        }
        self.cancel.cancel();
        Ok(records)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.routes.remove(&self.id);
    }
}
