//! Frame encoding and lenient decoding

use super::Filter;
use crate::article::Article;
use crate::error::{Result, WikiError};
use serde_json::{Value, json};

/// One protocol frame in either direction
///
/// Decoding never fails: the relay is an untrusted peer, so anything that is
/// not a well-formed frame of a known type becomes [`Frame::Unknown`].
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Open a subscription: `["REQ", <id>, <filter>...]`
    Request {
        /// Subscription identifier chosen by the client
        subscription_id: String,
        /// One or more filters
        filters: Vec<Filter>,
    },

    /// Cancel a subscription: `["CLOSE", <id>]`
    Close {
        /// Subscription identifier
        subscription_id: String,
    },

    /// Matching record: `["EVENT", <id>, <record>]`
    Event {
        /// Subscription identifier
        subscription_id: String,
        /// The record
        article: Article,
    },

    /// End of stored results: `["EOSE", <id>]`
    EndOfStream {
        /// Subscription identifier
        subscription_id: String,
    },

    /// Anything unparseable, of the wrong arity, or of an unhandled type
    Unknown,
}

impl Frame {
    /// Decode a text frame
    ///
    /// # Examples
    ///
    /// ```
    /// use wiki_relay::Frame;
    ///
    /// let frame = Frame::decode(r#"["EOSE","sub1"]"#);
    /// assert_eq!(frame, Frame::EndOfStream { subscription_id: "sub1".into() });
    ///
    /// assert_eq!(Frame::decode("not json"), Frame::Unknown);
    /// assert_eq!(Frame::decode(r#"["NOTICE","hello"]"#), Frame::Unknown);
    /// ```
    pub fn decode(text: &str) -> Self {
        let Ok(Value::Array(items)) = serde_json::from_str::<Value>(text) else {
            return Frame::Unknown;
        };
        Self::from_items(items).unwrap_or(Frame::Unknown)
    }

    fn from_items(items: Vec<Value>) -> Option<Self> {
        let mut items = items.into_iter();
        let kind = match items.next()? {
            Value::String(kind) => kind,
            _ => return None,
        };
        let subscription_id = match items.next()? {
            Value::String(id) => id,
            _ => return None,
        };
        let rest: Vec<Value> = items.collect();

        match (kind.as_str(), rest.len()) {
            ("EVENT", 1) => {
                let article = serde_json::from_value(rest.into_iter().next()?).ok()?;
                Some(Frame::Event {
                    subscription_id,
                    article,
                })
            }
            ("EOSE", 0) => Some(Frame::EndOfStream { subscription_id }),
            ("CLOSE", 0) => Some(Frame::Close { subscription_id }),
            ("REQ", n) if n > 0 => {
                let filters = rest
                    .into_iter()
                    .map(serde_json::from_value)
                    .collect::<std::result::Result<Vec<Filter>, _>>()
                    .ok()?;
                Some(Frame::Request {
                    subscription_id,
                    filters,
                })
            }
            _ => None,
        }
    }

    /// Encode as a JSON text frame
    ///
    /// # Errors
    ///
    /// Returns [`WikiError::InvalidFrame`] for [`Frame::Unknown`], which has
    /// no wire form.
    pub fn encode(&self) -> Result<String> {
        let value = match self {
            Frame::Request {
                subscription_id,
                filters,
            } => {
                let mut arr = Vec::with_capacity(filters.len() + 2);
                arr.push(Value::String("REQ".to_string()));
                arr.push(Value::String(subscription_id.clone()));
                for filter in filters {
                    arr.push(serde_json::to_value(filter)?);
                }
                Value::Array(arr)
            }
            Frame::Close { subscription_id } => json!(["CLOSE", subscription_id]),
            Frame::Event {
                subscription_id,
                article,
            } => json!(["EVENT", subscription_id, serde_json::to_value(article)?]),
            Frame::EndOfStream { subscription_id } => json!(["EOSE", subscription_id]),
            Frame::Unknown => {
                return Err(WikiError::InvalidFrame(
                    "unknown frames have no wire form".to_string(),
                ));
            }
        };
        Ok(value.to_string())
    }

    /// Subscription identifier carried by the frame, if any
    pub fn subscription_id(&self) -> Option<&str> {
        match self {
            Frame::Request {
                subscription_id, ..
            }
            | Frame::Close { subscription_id }
            | Frame::Event {
                subscription_id, ..
            }
            | Frame::EndOfStream { subscription_id } => Some(subscription_id),
            Frame::Unknown => None,
        }
    }
}
