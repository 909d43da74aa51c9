//! Terminal wiki browser
//!
//! Runs one action from the command line flags, or an interactive prompt:
//!
//! ```text
//! latest [n]     newest articles (n clamped to 1..=100)
//! topic <text>   articles for a topic, newest shown
//! open <n>       show entry n of the list
//! link <n>       follow cross-reference n of the shown article
//! relay [url]    show or change the relay
//! help, quit
//! ```

use clap::Parser;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use wiki_relay::{
    Action, Article, Browser, ClientConfig, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_LIMIT,
    DEFAULT_RELAY_URL, Result, View, cross_references,
};

#[derive(Parser, Debug)]
#[command(name = "wiki-relay", version, about = "Browse wiki articles published on a relay")]
struct Args {
    /// Relay WebSocket URL
    #[arg(short, long, default_value = DEFAULT_RELAY_URL)]
    relay: String,

    /// Number of articles for `latest`
    #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
    limit: u32,

    /// Handshake timeout in seconds
    #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS)]
    connect_timeout: u64,

    /// Accept any TLS certificate
    #[arg(long)]
    insecure: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Show the latest articles and exit
    #[arg(long, conflicts_with = "topic")]
    latest: bool,

    /// Show articles for a topic and exit
    #[arg(long)]
    topic: Option<String>,
}

impl Args {
    fn config(&self) -> ClientConfig {
        ClientConfig {
            relay_url: self.relay.clone(),
            limit: self.limit,
            connect_timeout_secs: self.connect_timeout,
            allow_insecure_tls: self.insecure,
        }
    }
}

/// Plain-text view on stdout; progress and errors go to stderr
struct TerminalView;

impl View for TerminalView {
    fn show_status(&mut self, message: &str) {
        eprintln!("{}", message);
    }

    fn show_list(&mut self, articles: &[Article]) {
        println!("{} article(s)", articles.len());
        for (i, article) in articles.iter().enumerate() {
            println!(
                "{:>3}. {}  [{}]  {}",
                i + 1,
                article.display_title(),
                article.display_topic(),
                published(article)
            );
        }
    }

    fn show_article(&mut self, article: &Article, html: &str) {
        println!();
        println!("== {} ==", article.display_title());
        println!("topic: {}  published: {}", article.display_topic(), published(article));
        println!();
        println!("{}", html);

        let links = cross_references(&article.content);
        if !links.is_empty() {
            println!();
            println!("Links:");
            for (i, link) in links.iter().enumerate() {
                println!("  [{}] {} -> {}", i + 1, link.label, link.target);
            }
        }
    }

    fn show_no_results(&mut self, topic: &str) {
        println!("No results for topic \"{}\".", topic);
    }

    fn show_error(&mut self, message: &str) {
        eprintln!("Error: {}", message);
    }
}

fn published(article: &Article) -> String {
    article
        .published_at()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// One-based list position from user input
fn position(arg: &str) -> Option<usize> {
    arg.parse::<usize>().ok()?.checked_sub(1)
}

fn link_target(browser: &Browser<TerminalView>, index: usize) -> Option<String> {
    let article = browser.shown()?;
    cross_references(&article.content)
        .into_iter()
        .nth(index)
        .map(|link| link.target)
}

fn print_help() {
    println!("Commands:");
    println!("  latest [n]     newest articles");
    println!("  topic <text>   articles for a topic");
    println!("  open <n>       show entry n of the list");
    println!("  link <n>       follow link n of the shown article");
    println!("  relay [url]    show or change the relay");
    println!("  help           this text");
    println!("  quit           exit");
}

async fn repl(browser: &mut Browser<TerminalView>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_help();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        let (command, arg) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(c, a)| (c, a.trim()));
        debug!("Command {:?} with argument {:?}", command, arg);

        match command {
            "" => {}
            "latest" => {
                if !arg.is_empty() {
                    match arg.parse::<u32>() {
                        Ok(n) => browser.set_limit(n),
                        Err(_) => {
                            eprintln!("Invalid count: {}", arg);
                            continue;
                        }
                    }
                }
                browser.dispatch(Action::ShowLatest).await;
            }
            "topic" => browser.dispatch(Action::ShowTopic(arg.to_string())).await,
            "open" => match position(arg) {
                Some(index) => browser.dispatch(Action::Open(index)).await,
                None => eprintln!("Usage: open <n>"),
            },
            "link" => match position(arg).and_then(|i| link_target(browser, i)) {
                Some(target) => browser.dispatch(Action::SelectTopic(target)).await,
                None => eprintln!("No link {} in the shown article", arg),
            },
            "relay" => {
                if arg.is_empty() {
                    println!("Relay: {}", browser.endpoint());
                } else {
                    browser.set_endpoint(arg);
                    println!("Relay set to {}", arg);
                }
            }
            "help" | "?" => print_help(),
            "quit" | "exit" => break,
            other => eprintln!("Unknown command: {} (try 'help')", other),
        }
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = match args.verbose {
        0 => "warn",
        1 => "wiki_relay=debug",
        _ => "wiki_relay=trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut browser = Browser::new(args.config(), TerminalView);

    if args.latest {
        browser.dispatch(Action::ShowLatest).await;
    } else if let Some(topic) = &args.topic {
        browser.dispatch(Action::ShowTopic(topic.clone())).await;
    } else {
        repl(&mut browser).await?;
    }

    browser.disconnect();
    Ok(())
}
