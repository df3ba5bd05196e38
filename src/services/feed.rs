//! GNews top-headlines client.
//!
//! One request per page: `GET {base_url}/top-headlines?country=..&pageSize=..&page=..&apikey=..`.
//! A response without an `articles` array is an empty page, not an error.

use super::retry::RetryPolicy;
use super::{NewsFeed, check_status, endpoint, http_client};
use crate::errors::ServiceError;
use crate::models::{FeedPage, FeedQuery, RawArticle};
use reqwest::{Client, RequestBuilder};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

pub const DEFAULT_BASE_URL: &str = "https://gnews.io/api/v4";
pub const DEFAULT_PAGE_SIZE: u32 = 5;

pub struct GNewsFeed {
    client: Client,
    base_url: String,
    api_key: String,
    page_size: u32,
    retry: RetryPolicy,
}

impl GNewsFeed {
    /// Create a feed client that makes a single attempt per page.
    ///
    /// # Arguments
    /// * `base_url` - API root, e.g. [`DEFAULT_BASE_URL`]
    /// * `api_key` - Sent as the `apikey` query parameter
    /// * `timeout` - Per-request timeout
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into(),
            api_key: api_key.into(),
            page_size: DEFAULT_PAGE_SIZE,
            retry: RetryPolicy::none(),
        })
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Retry transient failures with `retry`.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn request(&self, query: &FeedQuery) -> RequestBuilder {
        self.client
            .get(endpoint(&self.base_url, "top-headlines"))
            .query(&[
                ("country", query.country.clone()),
                ("pageSize", self.page_size.to_string()),
                ("page", query.page.to_string()),
                ("apikey", self.api_key.clone()),
            ])
    }

    async fn fetch_once(&self, query: &FeedQuery) -> Result<Vec<RawArticle>, ServiceError> {
        let response = check_status(self.request(query).send().await?).await?;
        let page = response.json::<FeedPage>().await?;
        Ok(page.articles)
    }
}

impl fmt::Debug for GNewsFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GNewsFeed")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("page_size", &self.page_size)
            .field("retry", &self.retry)
            .finish()
    }
}

impl NewsFeed for GNewsFeed {
    #[instrument(level = "info", skip_all, fields(country = %query.country, page = query.page))]
    async fn fetch_page(&self, query: &FeedQuery) -> Result<Vec<RawArticle>, ServiceError> {
        let t0 = Instant::now();
        let articles = self.retry.run("feed.fetch_page", || self.fetch_once(query)).await?;
        info!(
            count = articles.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "Fetched feed page"
        );
        debug!(urls = ?articles.iter().map(|a| a.url.as_str()).collect::<Vec<_>>(), "Feed URLs");
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CannedServer, fast_retry};

    #[test]
    fn test_request_carries_page_parameters() {
        let feed = GNewsFeed::new("https://gnews.example/api/v4/", "secret", Duration::from_secs(5))
            .unwrap()
            .with_page_size(7);
        let query = FeedQuery { country: "kr".to_string(), page: 3 };
        let request = feed.request(&query).build().unwrap();
        let url = request.url();

        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(url.path(), "/api/v4/top-headlines");

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("country".to_string(), "kr".to_string()),
                ("pageSize".to_string(), "7".to_string()),
                ("page".to_string(), "3".to_string()),
                ("apikey".to_string(), "secret".to_string()),
            ]
        );
    }

    #[test]
    fn test_default_page_size_is_five() {
        let feed = GNewsFeed::new(DEFAULT_BASE_URL, "k", Duration::from_secs(5)).unwrap();
        let query = FeedQuery { country: "us".to_string(), page: 1 };
        let request = feed.request(&query).build().unwrap();

        assert!(request.url().query().unwrap().contains("pageSize=5"));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let feed = GNewsFeed::new(DEFAULT_BASE_URL, "super-secret", Duration::from_secs(5)).unwrap();
        let rendered = format!("{:?}", feed);

        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[tokio::test]
    async fn test_server_error_is_retried_then_page_returned() {
        let server = CannedServer::start(vec![
            (503, r#"{"errors":["busy"]}"#),
            (200, r#"{"totalArticles":1,"articles":[{"title":"A","url":"https://a.example"}]}"#),
        ])
        .await;
        let feed = GNewsFeed::new(server.base_url(), "k", Duration::from_secs(5))
            .unwrap()
            .with_retry(fast_retry(2));

        let articles = feed.fetch_page(&FeedQuery { country: "us".to_string(), page: 1 }).await.unwrap();

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "A");
        assert_eq!(server.hits(), 2);
    }

    #[tokio::test]
    async fn test_undecodable_page_fails_without_retry() {
        let server = CannedServer::start(vec![(200, "<html>maintenance</html>")]).await;
        let feed = GNewsFeed::new(server.base_url(), "k", Duration::from_secs(5))
            .unwrap()
            .with_retry(fast_retry(2));

        let err = feed
            .fetch_page(&FeedQuery { country: "us".to_string(), page: 1 })
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Http(ref e) if e.is_decode()));
        assert_eq!(server.hits(), 1);
    }
}
