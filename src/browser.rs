//! Query orchestration
//!
//! Two user-triggered flows share one shape, Idle → Connecting → Streaming →
//! Complete:
//!
//! - **latest**: the newest wiki articles, bounded by the limit input
//! - **topic**: articles whose `d` tag equals the normalized topic input; the
//!   newest match is displayed straight away
//!
//! Both re-enter [`RelayManager::ensure_connected`], so repeating a query on
//! the same relay reuses the socket while a changed relay address migrates to
//! a new one. Results are buffered until end-of-stream, sorted newest first
//! and pushed to a [`View`].

use crate::article::{Article, sort_newest_first};
use crate::config::ClientConfig;
use crate::error::{Result, WikiError};
use crate::manager::RelayManager;
use crate::protocol::Filter;
use crate::render::render;
use crate::topic::normalize_topic;
use tracing::{debug, info};

/// Smallest accepted result-count bound
pub const MIN_LIMIT: u32 = 1;

/// Largest accepted result-count bound
pub const MAX_LIMIT: u32 = 100;

/// Clamp a user-chosen result count to `MIN_LIMIT..=MAX_LIMIT`
pub fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(MIN_LIMIT, MAX_LIMIT)
}

/// Progress of the most recent flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// Nothing running (initial state, and after a failure)
    Idle,
    /// Waiting for the relay connection
    Connecting,
    /// Subscription open, records arriving
    Streaming,
    /// End-of-stream received and results handed to the view
    Complete,
}

/// Presentation surface driven by the [`Browser`]
///
/// Implementations receive ready-made view models; link clicks come back as
/// [`Action::SelectTopic`].
pub trait View {
    /// Progress message (connecting, loading)
    fn show_status(&mut self, _message: &str) {}

    /// Result list, newest first
    fn show_list(&mut self, articles: &[Article]);

    /// One article with its body rendered to HTML
    fn show_article(&mut self, article: &Article, html: &str);

    /// Placeholder for a topic query that matched nothing
    fn show_no_results(&mut self, topic: &str);

    /// Failure message from any flow
    fn show_error(&mut self, message: &str);
}

/// User actions accepted by [`Browser::dispatch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Show the newest articles
    ShowLatest,
    /// Show articles for free-form topic input
    ShowTopic(String),
    /// Display entry `n` (zero-based) of the current list
    Open(usize),
    /// A cross-reference link was clicked
    SelectTopic(String),
}

/// Wiki browser: relay inputs, the last result list, and a view
pub struct Browser<V: View> {
    manager: RelayManager,
    view: V,
    endpoint: String,
    limit: u32,
    articles: Vec<Article>,
    shown: Option<Article>,
    state: FlowState,
}

impl<V: View> Browser<V> {
    /// Create a browser using the relay and limit from `config`
    pub fn new(config: ClientConfig, view: V) -> Self {
        let endpoint = config.relay_url.clone();
        let limit = clamp_limit(config.limit);
        Self {
            manager: RelayManager::new(config),
            view,
            endpoint,
            limit,
            articles: Vec::new(),
            shown: None,
            state: FlowState::Idle,
        }
    }

    /// Relay address used by the next flow
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Change the relay address; takes effect on the next flow
    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) {
        self.endpoint = endpoint.into();
    }

    /// Result-count bound for the latest flow
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Set the result-count bound, clamped to `1..=100`
    pub fn set_limit(&mut self, limit: u32) {
        self.limit = clamp_limit(limit);
    }

    /// State of the most recent flow
    pub fn state(&self) -> FlowState {
        self.state
    }

    /// Last result list, newest first
    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    /// Article currently displayed, if any
    pub fn shown(&self) -> Option<&Article> {
        self.shown.as_ref()
    }

    /// The connection manager
    pub fn manager(&self) -> &RelayManager {
        &self.manager
    }

    /// The view
    pub fn view(&self) -> &V {
        &self.view
    }

    /// Mutable access to the view
    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Close the relay connection, if any
    pub fn disconnect(&mut self) {
        self.manager.disconnect();
        self.state = FlowState::Idle;
    }

    /// Run an action, reporting any failure through [`View::show_error`]
    pub async fn dispatch(&mut self, action: Action) {
        debug!("Dispatching {:?}", action);
        let result = match action {
            Action::ShowLatest => self.show_latest().await,
            Action::ShowTopic(query) | Action::SelectTopic(query) => self.show_topic(&query).await,
            Action::Open(index) => self.open(index),
        };

        if let Err(e) = result {
            self.view.show_error(&e.to_string());
        }
    }

    /// Latest flow: newest articles, at most `limit`
    pub async fn show_latest(&mut self) -> Result<()> {
        let articles = self.query(Filter::latest_articles(self.limit)).await?;
        info!("Loaded {} latest articles from {}", articles.len(), self.endpoint);

        self.view.show_list(&articles);
        self.articles = articles;
        Ok(())
    }

    /// Topic flow: articles whose topic key matches `query`
    ///
    /// # Errors
    ///
    /// [`WikiError::InvalidTopic`] when `query` normalizes to an empty key;
    /// nothing touches the network in that case.
    pub async fn show_topic(&mut self, query: &str) -> Result<()> {
        let topic = normalize_topic(query);
        if topic.is_empty() {
            return Err(WikiError::InvalidTopic(query.to_string()));
        }

        let articles = self.query(Filter::topic_articles(topic.as_str())).await?;
        info!("Loaded {} articles for topic {}", articles.len(), topic);

        self.view.show_list(&articles);
        match articles.first() {
            Some(newest) => {
                let newest = newest.clone();
                self.display(newest);
            }
            None => self.view.show_no_results(&topic),
        }
        self.articles = articles;
        Ok(())
    }

    /// Display entry `index` of the current list
    ///
    /// # Errors
    ///
    /// [`WikiError::NoSuchArticle`] when the list has no such entry.
    pub fn open(&mut self, index: usize) -> Result<()> {
        let article = self
            .articles
            .get(index)
            .cloned()
            .ok_or(WikiError::NoSuchArticle(index))?;
        self.display(article);
        Ok(())
    }

    fn display(&mut self, article: Article) {
        let html = render(&article.content);
        self.view.show_article(&article, &html);
        self.shown = Some(article);
    }

    async fn query(&mut self, filter: Filter) -> Result<Vec<Article>> {
        let result = self.collect_sorted(filter).await;
        if result.is_err() {
            self.state = FlowState::Idle;
        }
        result
    }

    async fn collect_sorted(&mut self, filter: Filter) -> Result<Vec<Article>> {
        self.state = FlowState::Connecting;
        self.view
            .show_status(&format!("Connecting to {}...", self.endpoint));
        let subscription = self
            .manager
            .ensure_connected(&self.endpoint)
            .await?
            .subscribe(filter)?;

        self.state = FlowState::Streaming;
        self.view.show_status("Loading articles...");
        let mut articles = subscription.collect().await?;
        sort_newest_first(&mut articles);

        self.state = FlowState::Complete;
        Ok(articles)
    }
}
