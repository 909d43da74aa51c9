//! Article builder for constructing records by hand
//!
//! Records normally come off the wire; the builder is for fixtures, demos and
//! any front end that wants to preview markup without a relay.

use super::types::{Article, TITLE_TAG, TOPIC_TAG};
use crate::protocol::WIKI_ARTICLE_KIND;
use crate::topic::normalize_topic;

/// Builder for [`Article`] values
///
/// # Examples
///
/// ```
/// use wiki_relay::ArticleBuilder;
///
/// let article = ArticleBuilder::new()
///     .id("abc123")
///     .created_at(1_700_000_000)
///     .topic("Rust Language")
///     .title("Rust")
///     .content("Rust is a [[systems programming]] language.")
///     .build();
///
/// assert_eq!(article.topic(), Some("rust-language"));
/// assert_eq!(article.kind, Some(30818));
/// ```
#[must_use]
#[derive(Debug, Clone, Default)]
pub struct ArticleBuilder {
    id: String,
    pubkey: Option<String>,
    created_at: u64,
    content: String,
    tags: Vec<Vec<String>>,
}

impl ArticleBuilder {
    /// Create a new builder with empty values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the event identifier
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the author public key
    pub fn pubkey(mut self, pubkey: impl Into<String>) -> Self {
        self.pubkey = Some(pubkey.into());
        self
    }

    /// Set the creation timestamp (seconds since epoch)
    pub fn created_at(mut self, created_at: u64) -> Self {
        self.created_at = created_at;
        self
    }

    /// Set the body
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Add a `d` tag holding the normalized form of `topic`
    pub fn topic(self, topic: &str) -> Self {
        let key = normalize_topic(topic);
        self.tag(TOPIC_TAG, key)
    }

    /// Add a `title` tag
    pub fn title(self, title: impl Into<String>) -> Self {
        self.tag(TITLE_TAG, title)
    }

    /// Add an arbitrary `[name, value]` tag
    pub fn tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(vec![name.into(), value.into()]);
        self
    }

    /// Build the article with the wiki article kind
    pub fn build(self) -> Article {
        Article {
            id: self.id,
            pubkey: self.pubkey,
            created_at: self.created_at,
            kind: Some(WIKI_ARTICLE_KIND),
            content: self.content,
            tags: self.tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_normalizes_topic() {
        let article = ArticleBuilder::new().topic("Foo Bar!").build();
        assert_eq!(article.topic(), Some("foo-bar"));
    }

    #[test]
    fn test_builder_keeps_tag_order() {
        let article = ArticleBuilder::new()
            .title("T")
            .tag("summary", "S")
            .topic("t")
            .build();

        let names: Vec<_> = article.tags.iter().map(|t| t[0].as_str()).collect();
        assert_eq!(names, vec!["title", "summary", "d"]);
    }

    #[test]
    fn test_builder_defaults() {
        let article = ArticleBuilder::new().build();
        assert_eq!(article.id, "");
        assert_eq!(article.created_at, 0);
        assert!(article.pubkey.is_none());
        assert_eq!(article.kind, Some(WIKI_ARTICLE_KIND));
    }
}
