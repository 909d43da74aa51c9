//! Article type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tag holding the normalized topic key
pub const TOPIC_TAG: &str = "d";

/// Tag holding the human-readable title
pub const TITLE_TAG: &str = "title";

/// Placeholder shown when an article carries neither a title nor a topic
pub const UNTITLED: &str = "(untitled)";

/// A wiki article event as delivered by the relay
///
/// Only `id`, `created_at`, `content` and `tags` are consumed; `pubkey` and
/// `kind` are kept when present so they can be displayed or re-encoded.
/// Signatures are not verified.
///
/// # Examples
///
/// ```
/// use wiki_relay::Article;
///
/// let json = r#"{"id":"abc","created_at":100,"content":"Hi",
///                "tags":[["d","greeting"],["title","Greeting"]]}"#;
/// let article: Article = serde_json::from_str(json).unwrap();
///
/// assert_eq!(article.topic(), Some("greeting"));
/// assert_eq!(article.display_title(), "Greeting");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Event identifier (hex)
    pub id: String,

    /// Author public key (hex), if the relay sent one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<String>,

    /// Creation time in seconds since the Unix epoch
    pub created_at: u64,

    /// Event kind, if the relay sent one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<u16>,

    /// Raw article body (wiki markup)
    pub content: String,

    /// Ordered tag entries; the first element of each entry is the tag name
    #[serde(default)]
    pub tags: Vec<Vec<String>>,
}

impl Article {
    /// Value of the first tag named `name`
    ///
    /// Entries without a value (a bare tag name) are skipped.
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .filter(|entry| entry.first().map(String::as_str) == Some(name))
            .find_map(|entry| entry.get(1))
            .map(String::as_str)
    }

    /// Topic key from the `d` tag
    pub fn topic(&self) -> Option<&str> {
        self.tag(TOPIC_TAG)
    }

    /// Title from the `title` tag
    pub fn title(&self) -> Option<&str> {
        self.tag(TITLE_TAG)
    }

    /// Title for display: the title tag, else the topic key, else a placeholder
    pub fn display_title(&self) -> &str {
        self.title()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.topic().filter(|t| !t.is_empty()))
            .unwrap_or(UNTITLED)
    }

    /// Topic key for display, falling back to a placeholder
    pub fn display_topic(&self) -> &str {
        self.topic().filter(|t| !t.is_empty()).unwrap_or("-")
    }

    /// Creation time as a UTC timestamp
    ///
    /// Returns `None` for values chrono cannot represent.
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.created_at).ok()?;
        DateTime::from_timestamp(secs, 0)
    }
}

/// Sort articles most recent first
///
/// The sort is stable, so articles with equal timestamps keep their arrival
/// order.
pub fn sort_newest_first(articles: &mut [Article]) {
    articles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
