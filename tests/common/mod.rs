//! In-process relay for integration tests
//!
//! Speaks just enough of the relay protocol to answer `REQ` frames from a
//! fixed article set, and records everything the client sends.

#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use wiki_relay::{Article, ArticleBuilder, Filter, Frame};

/// How the relay answers a request
#[derive(Debug, Clone, Default)]
pub struct Behaviour {
    /// Stored articles, sent in this order
    pub articles: Vec<Article>,
    /// Send malformed and unhandled frames before the results
    pub noise: bool,
    /// Send an event for a subscription the client never opened
    pub unrelated_events: bool,
    /// Send one more event for the same subscription after `EOSE`
    pub events_after_eose: bool,
    /// Drop the socket after the results, without `EOSE`
    pub hang_up_before_eose: bool,
}

/// What the relay has seen so far
#[derive(Debug, Clone, Default)]
pub struct RelayLog {
    /// Accepted WebSocket handshakes
    pub connections: usize,
    /// Text frames received from clients, in order
    pub frames: Vec<String>,
    /// Close frames received: (code, reason)
    pub close_frames: Vec<(u16, String)>,
}

impl RelayLog {
    /// Received frames that decode as `REQ`
    pub fn requests(&self) -> Vec<(String, Vec<Filter>)> {
        self.frames
            .iter()
            .filter_map(|text| match Frame::decode(text) {
                Frame::Request {
                    subscription_id,
                    filters,
                } => Some((subscription_id, filters)),
                _ => None,
            })
            .collect()
    }

    /// Subscription ids named in received `CLOSE` frames
    pub fn cancelled(&self) -> Vec<String> {
        self.frames
            .iter()
            .filter_map(|text| match Frame::decode(text) {
                Frame::Close { subscription_id } => Some(subscription_id),
                _ => None,
            })
            .collect()
    }
}

pub struct MockRelay {
    addr: SocketAddr,
    log: Arc<Mutex<RelayLog>>,
    task: JoinHandle<()>,
}

impl MockRelay {
    pub async fn start(behaviour: Behaviour) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let log = Arc::new(Mutex::new(RelayLog::default()));
        let behaviour = Arc::new(behaviour);

        let task_log = Arc::clone(&log);
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(
                    stream,
                    Arc::clone(&behaviour),
                    Arc::clone(&task_log),
                ));
            }
        });

        Self { addr, log, task }
    }

    pub async fn with_articles(articles: Vec<Article>) -> Self {
        Self::start(Behaviour {
            articles,
            ..Behaviour::default()
        })
        .await
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub fn log(&self) -> RelayLog {
        self.log.lock().unwrap().clone()
    }

    /// Poll the log until `check` holds, for up to two seconds
    pub async fn wait_for(&self, check: impl Fn(&RelayLog) -> bool) -> bool {
        for _ in 0..200 {
            if check(&self.log.lock().unwrap()) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

impl Drop for MockRelay {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(stream: TcpStream, behaviour: Arc<Behaviour>, log: Arc<Mutex<RelayLog>>) {
    let Ok(mut ws) = accept_async(stream).await else {
        return;
    };
    log.lock().unwrap().connections += 1;

    while let Some(Ok(message)) = ws.next().await {
        match message {
            Message::Text(text) => {
                log.lock().unwrap().frames.push(text.as_str().to_string());
                if let Frame::Request {
                    subscription_id,
                    filters,
                } = Frame::decode(text.as_str())
                {
                    for reply in replies(&behaviour, &subscription_id, &filters) {
                        if ws.send(Message::Text(reply.into())).await.is_err() {
                            return;
                        }
                    }
                    if behaviour.hang_up_before_eose {
                        return;
                    }
                }
            }
            Message::Close(frame) => {
                let entry = frame
                    .map(|f| (u16::from(f.code), f.reason.as_str().to_string()))
                    .unwrap_or((1005, String::new()));
                log.lock().unwrap().close_frames.push(entry);
                let _ = ws.close(None).await;
                return;
            }
            _ => {}
        }
    }
}

fn matches(article: &Article, filter: &Filter) -> bool {
    let kind_ok = filter
        .kinds
        .as_ref()
        .is_none_or(|kinds| article.kind.is_some_and(|k| kinds.contains(&k)));
    let topic_ok = filter.topics.as_ref().is_none_or(|topics| {
        article
            .topic()
            .is_some_and(|t| topics.iter().any(|wanted| wanted == t))
    });
    kind_ok && topic_ok
}

fn event(subscription_id: &str, article: &Article) -> String {
    Frame::Event {
        subscription_id: subscription_id.to_string(),
        article: article.clone(),
    }
    .encode()
    .unwrap()
}

fn replies(behaviour: &Behaviour, subscription_id: &str, filters: &[Filter]) -> Vec<String> {
    let mut out = Vec::new();

    if behaviour.noise {
        out.push("not json at all".to_string());
        out.push(r#"{"EVENT":1}"#.to_string());
        out.push(r#"["EVENT"]"#.to_string());
        out.push(format!(r#"["EVENT","{}"]"#, subscription_id));
        out.push(format!(r#"["EVENT","{}",{{"bogus":true}}]"#, subscription_id));
        out.push(format!(r#"["EOSE","{}","extra"]"#, subscription_id));
        out.push(r#"["NOTICE","slow down"]"#.to_string());
    }

    if behaviour.unrelated_events {
        let stray = ArticleBuilder::new()
            .id("stray")
            .created_at(4_000_000_000)
            .topic("stray")
            .build();
        out.push(event("someone-else", &stray));
    }

    let limit = filters
        .iter()
        .filter_map(|f| f.limit)
        .max()
        .map_or(usize::MAX, |n| n as usize);
    let selected: Vec<&Article> = behaviour
        .articles
        .iter()
        .filter(|a| filters.iter().any(|f| matches(a, f)))
        .take(limit)
        .collect();
    for article in &selected {
        out.push(event(subscription_id, article));
    }

    if behaviour.hang_up_before_eose {
        return out;
    }

    out.push(
        Frame::EndOfStream {
            subscription_id: subscription_id.to_string(),
        }
        .encode()
        .unwrap(),
    );

    if behaviour.events_after_eose {
        let late = ArticleBuilder::new()
            .id("late")
            .created_at(4_000_000_000)
            .topic("late")
            .build();
        out.push(event(subscription_id, &late));
    }

    out
}

/// Wiki article with a title derived from its topic
pub fn article(id: &str, topic: &str, created_at: u64) -> Article {
    ArticleBuilder::new()
        .id(id)
        .created_at(created_at)
        .topic(topic)
        .title(format!("About {}", topic))
        .content(format!("Body of {}", id))
        .build()
}

/// Free port on localhost with nothing listening
pub async fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}
