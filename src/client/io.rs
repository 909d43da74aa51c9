//! Reader and writer tasks for a relay WebSocket
//!
//! - The writer drains an unbounded channel into the socket, so callers can
//!   queue frames (REQ, CLOSE) without awaiting.
//! - The reader decodes each text frame and hands it to the subscription
//!   routes in arrival order. Malformed frames are dropped here.
//!
//! When either side fails the connection is marked not-open; when the reader
//! stops, every pending subscription is ended.

use super::subscription::Routes;
use crate::protocol::Frame;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

pub(super) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Forward queued frames to the relay until a close frame is sent
pub(super) fn spawn_writer(
    mut sink: SplitSink<WsStream, Message>,
    mut outbound: mpsc::UnboundedReceiver<Message>,
    open: Arc<AtomicBool>,
    endpoint: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            let closing = message.is_close();
            trace!("Sending to {}: {}", endpoint, message);

            if let Err(e) = sink.send(message).await {
                warn!("Failed to send to relay {}: {}", endpoint, e);
                open.store(false, Ordering::SeqCst);
                break;
            }
            if closing {
                break;
            }
        }
        debug!("Writer for {} stopped", endpoint);
    })
}

/// Decode inbound frames and route them until the stream ends
pub(super) fn spawn_reader(
    mut source: SplitStream<WsStream>,
    routes: Arc<Routes>,
    open: Arc<AtomicBool>,
    endpoint: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = source.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    trace!("Received from {}: {}", endpoint, text.as_str());
                    routes.dispatch(Frame::decode(text.as_str()));
                }
                Ok(Message::Close(frame)) => {
                    info!("Relay {} closed connection: {:?}", endpoint, frame);
                    break;
                }
                // Ping/pong are answered by tungstenite; binary frames are not part of the protocol
                Ok(_) => {}
                Err(e) => {
                    warn!("WebSocket error from {}: {}", endpoint, e);
                    break;
                }
            }
        }

        open.store(false, Ordering::SeqCst);
        routes.clear();
        debug!("Reader for {} stopped", endpoint);
    })
}
