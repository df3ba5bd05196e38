//! In-memory collaborators for unit tests.
//!
//! - [`MockTranslator`] prefixes text with `[KO] ` and fails on a marker substring
//! - [`MockSummarizer`] prefixes text with `SUMMARY: ` and fails on a marker substring
//! - [`MockFeed`] serves a fixed page or a fixed error
//!
//! All of them append to a shared [`CallLog`] so tests can assert on call
//! order and counts, and track how many calls were in flight at once.
//!
//! [`CannedServer`] is for the HTTP clients themselves: a local socket that
//! answers with fixed status lines and bodies.

use crate::errors::ServiceError;
use crate::models::{FeedQuery, RawArticle};
use crate::services::retry::RetryPolicy;
use crate::services::{NewsFeed, Summarizer, Translator};
use reqwest::StatusCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::sleep;

/// Text containing this marker is delayed by [`SLOW_DELAY`].
pub const SLOW_MARKER: &str = "SLOW";
pub const SLOW_DELAY: Duration = Duration::from_millis(60);

#[derive(Debug, Clone, Default)]
pub struct CallLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn push(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.events().iter().filter(|e| e.starts_with(prefix)).count()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }
}

#[derive(Debug, Default)]
struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlight {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

fn failure() -> ServiceError {
    ServiceError::Status { status: 500, body: "mock failure".to_string() }
}

#[derive(Debug)]
pub struct MockTranslator {
    log: CallLog,
    fail_marker: Option<String>,
    delay: Duration,
    in_flight: Arc<InFlight>,
}

impl MockTranslator {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            fail_marker: None,
            delay: Duration::from_millis(1),
            in_flight: Arc::default(),
        }
    }

    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_marker = Some(marker.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn peak_in_flight(&self) -> usize {
        self.in_flight.peak.load(Ordering::SeqCst)
    }
}

impl Translator for MockTranslator {
    async fn translate(&self, text: &str) -> Result<String, ServiceError> {
        self.log.push(format!("translate:start:{text}"));
        self.in_flight.enter();
        let delay = if text.contains(SLOW_MARKER) { SLOW_DELAY } else { self.delay };
        sleep(delay).await;
        self.in_flight.leave();

        if self.fail_marker.as_deref().is_some_and(|m| text.contains(m)) {
            self.log.push(format!("translate:fail:{text}"));
            return Err(failure());
        }
        self.log.push(format!("translate:end:{text}"));
        Ok(format!("[KO] {text}"))
    }
}

#[derive(Debug)]
pub struct MockSummarizer {
    log: CallLog,
    fail_marker: Option<String>,
}

impl MockSummarizer {
    pub fn new(log: CallLog) -> Self {
        Self { log, fail_marker: None }
    }

    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_marker = Some(marker.to_string());
        self
    }
}

impl Summarizer for MockSummarizer {
    async fn summarize(&self, text: &str) -> Result<String, ServiceError> {
        self.log.push(format!("summarize:start:{text}"));
        sleep(Duration::from_millis(1)).await;

        if self.fail_marker.as_deref().is_some_and(|m| text.contains(m)) {
            return Err(failure());
        }
        Ok(format!("SUMMARY: {text}"))
    }
}

#[derive(Debug)]
pub struct MockFeed {
    log: CallLog,
    articles: Option<Vec<RawArticle>>,
}

impl MockFeed {
    pub fn serving(log: CallLog, articles: Vec<RawArticle>) -> Self {
        Self { log, articles: Some(articles) }
    }

    pub fn failing(log: CallLog) -> Self {
        Self { log, articles: None }
    }
}

impl NewsFeed for MockFeed {
    async fn fetch_page(&self, query: &FeedQuery) -> Result<Vec<RawArticle>, ServiceError> {
        self.log.push(format!("feed:{}:{}", query.country, query.page));
        self.articles.clone().ok_or_else(failure)
    }
}

/// An article whose body is long enough to be translated as-is and does
/// not mention the title.
pub fn long_article(title: &str) -> RawArticle {
    RawArticle {
        title: title.to_string(),
        url: format!("https://news.example/{}", title.to_lowercase().replace(' ', "-")),
        image: Some(format!("https://news.example/{title}.jpg")),
        content: Some(format!("Full story body. {}", "lorem ipsum ".repeat(30))),
        description: Some(format!("{title} description")),
    }
}

/// Retry policy with millisecond backoff and no jitter.
pub fn fast_retry(max_retries: usize) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(4),
        max_jitter: Duration::ZERO,
    }
}

/// Local HTTP server answering request `n` with `replies[n]`; the last reply
/// repeats once the list runs out. Every connection carries one request.
#[derive(Debug)]
pub struct CannedServer {
    base_url: String,
    hits: Arc<AtomicUsize>,
}

impl CannedServer {
    pub async fn start(replies: Vec<(u16, &'static str)>) -> Self {
        assert!(!replies.is_empty());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let (status, body) = replies[n.min(replies.len() - 1)];
                read_request(&mut socket).await;

                let reason = StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("Unknown");
                let reply = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        Self { base_url, hits }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Requests answered so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Read one request, headers and `Content-Length` body, off the socket.
async fn read_request(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
        let body_len = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= end + 4 + body_len {
            return;
        }
    }
}
