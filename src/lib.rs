#![doc = include_str!("../README.md")]

/// Wiki article records and tag lookups
pub mod article;
/// Latest and topic query flows driving a view
pub mod browser;
mod client;
mod config;
mod error;
/// Single-connection relay manager
pub mod manager;
/// Relay frames and subscription filters
pub mod protocol;
/// Article body to HTML rendering
pub mod render;
/// Topic key normalization
pub mod topic;

pub use article::{Article, ArticleBuilder, sort_newest_first};
pub use browser::{Action, Browser, FlowState, MAX_LIMIT, View, clamp_limit};
pub use client::{
    CancelHandle, ConnectionState, RelayConnection, Subscription, generate_subscription_id,
    validate_endpoint,
};
pub use config::{ClientConfig, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_LIMIT, DEFAULT_RELAY_URL};
pub use error::{Result, WikiError};
pub use manager::RelayManager;
pub use protocol::{Filter, Frame, WIKI_ARTICLE_KIND};
pub use render::{CrossReference, cross_references, escape_html, render, render_paragraphs};
pub use topic::{is_topic_key, normalize_topic};
