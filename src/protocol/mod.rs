//! Relay wire vocabulary
//!
//! Frames are JSON arrays sent as WebSocket text messages:
//! - Client to relay: `["REQ", <id>, <filter>...]`, `["CLOSE", <id>]`
//! - Relay to client: `["EVENT", <id>, <record>]`, `["EOSE", <id>]`
//!
//! Anything else received from the relay decodes to [`Frame::Unknown`] and is
//! dropped by the client.

pub mod filter;
pub mod frame;

pub use filter::Filter;
pub use frame::Frame;

/// Event kind of long-form wiki articles
pub const WIKI_ARTICLE_KIND: u16 = 30818;
