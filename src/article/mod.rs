//! Wiki article records
//!
//! Articles arrive from the relay as immutable events of the wiki article
//! kind. Two attributes are read from the tag list by name: the topic key
//! (`d`) and the display title (`title`). Either may be missing; display
//! helpers fall back to placeholders instead of failing.
//!
//! This module is organized into:
//! - `types`: the `Article` record and its tag lookups
//! - `builder`: `ArticleBuilder` for constructing records by hand

mod builder;
mod types;

pub use self::builder::ArticleBuilder;
pub use self::types::{Article, TITLE_TAG, TOPIC_TAG, UNTITLED, sort_newest_first};
