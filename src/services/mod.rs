//! External collaborators reached over HTTP.
//!
//! The pipeline only sees three capability traits:
//!
//! | Trait | Module | Provider |
//! |-------|--------|----------|
//! | [`NewsFeed`] | [`feed`] | GNews top headlines |
//! | [`Translator`] | [`translator`] | DeepL |
//! | [`Summarizer`] | [`summarizer`] | OpenAI-compatible chat completions |
//!
//! Each client is constructed once at start-up from its config section and
//! handed to the pipeline. Transient failures are retried inside the client
//! by a [`retry::RetryPolicy`]; callers see a single `Result`.

use crate::errors::ServiceError;
use crate::models::{FeedQuery, RawArticle};
use crate::utils::truncate_for_log;
use reqwest::{Client, Response};
use std::time::Duration;

pub mod feed;
pub mod retry;
pub mod summarizer;
pub mod translator;

/// Source of raw articles, one page at a time.
pub trait NewsFeed {
    async fn fetch_page(&self, query: &FeedQuery) -> Result<Vec<RawArticle>, ServiceError>;
}

/// Translates text into the configured target language.
pub trait Translator {
    async fn translate(&self, text: &str) -> Result<String, ServiceError>;
}

/// Produces a one-paragraph summary of a text.
pub trait Summarizer {
    async fn summarize(&self, text: &str) -> Result<String, ServiceError>;
}

/// Build the HTTP client shared by all requests of one collaborator.
pub fn http_client(timeout: Duration) -> Result<Client, ServiceError> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Turn a non-2xx response into [`ServiceError::Status`].
pub async fn check_status(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Status {
        status: status.as_u16(),
        body: truncate_for_log(&body, 300),
    })
}

/// Join a path onto a configured base URL, tolerating a trailing slash.
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
