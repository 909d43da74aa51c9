//! Subscription filter object

use super::WIKI_ARTICLE_KIND;
use serde::{Deserialize, Serialize};

/// Filter sent in a `REQ` frame
///
/// Only the fields this client asks for are modelled. Absent fields are not
/// serialized, so a bare kind filter encodes as `{"kinds":[30818]}`.
///
/// # Examples
///
/// ```
/// use wiki_relay::Filter;
///
/// let filter = Filter::topic_articles("rust");
/// let json = serde_json::to_string(&filter).unwrap();
/// assert_eq!(json, r##"{"kinds":[30818],"#d":["rust"]}"##);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filter {
    /// Event kinds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kinds: Option<Vec<u16>>,

    /// Exact-match values for the `d` tag
    #[serde(rename = "#d", skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<String>>,

    /// Maximum number of records the relay should return
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl Filter {
    /// Create a new empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by kinds
    pub fn kinds(mut self, kinds: Vec<u16>) -> Self {
        self.kinds = Some(kinds);
        self
    }

    /// Require the `d` tag to equal `topic`
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topics.get_or_insert_with(Vec::new).push(topic.into());
        self
    }

    /// Limit number of results
    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    /// Most recent wiki articles, at most `limit` of them
    pub fn latest_articles(limit: u32) -> Self {
        Self::new().kinds(vec![WIKI_ARTICLE_KIND]).limit(limit)
    }

    /// Wiki articles whose topic key equals `topic`
    ///
    /// `topic` must already be normalized.
    pub fn topic_articles(topic: impl Into<String>) -> Self {
        Self::new().kinds(vec![WIKI_ARTICLE_KIND]).topic(topic)
    }
}
