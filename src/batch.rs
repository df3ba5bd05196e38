//! Batch coordination: run the article pipeline over a whole page.
//!
//! Articles are processed as independent units of work with a bounded
//! number in flight. Results are delivered in **input order** regardless of
//! completion order (`buffered`, not `buffer_unordered`). Failed articles
//! are left out of the returned articles and reported through
//! [`BatchOutcome::failures`] and a `warn!` event each, so a bad article
//! never aborts its siblings.
//!
//! Ordering has a cost: a finished article waiting behind a slower, earlier
//! one still holds its slot until it is yielded, so a slow head of the
//! batch lowers the effective concurrency below `max_concurrency` for a
//! while. The limit is an upper bound, never a target.

use crate::errors::{ArticleFailure, FetchError};
use crate::models::{EnrichedArticle, FeedQuery, RawArticle};
use crate::pipeline::ArticlePipeline;
use crate::services::{NewsFeed, Summarizer, Translator};
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// How many articles of a batch may be in the pipeline at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// One article at a time.
    Sequential,
    /// Up to `max_concurrency` articles at a time (at least one).
    Parallel { max_concurrency: usize },
}

impl ExecutionStrategy {
    /// Number of articles allowed in flight; never below one.
    pub fn limit(&self) -> usize {
        match self {
            ExecutionStrategy::Sequential => 1,
            ExecutionStrategy::Parallel { max_concurrency } => (*max_concurrency).max(1),
        }
    }
}

/// Result of one batch: the enriched articles plus the out-of-band failures.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub articles: Vec<EnrichedArticle>,
    pub failures: Vec<ArticleFailure>,
}

impl BatchOutcome {
    /// Number of raw articles the batch started with.
    pub fn total(&self) -> usize {
        self.articles.len() + self.failures.len()
    }
}

#[derive(Debug)]
pub struct BatchCoordinator<T, S> {
    pipeline: ArticlePipeline<T, S>,
    strategy: ExecutionStrategy,
}

impl<T, S> BatchCoordinator<T, S>
where
    T: Translator,
    S: Summarizer,
{
    /// Create a coordinator around an already configured pipeline.
    ///
    /// # Arguments
    /// * `pipeline` - Per-article pipeline shared by every unit of work
    /// * `strategy` - Bound on how many articles run at once
    pub fn new(pipeline: ArticlePipeline<T, S>, strategy: ExecutionStrategy) -> Self {
        Self { pipeline, strategy }
    }

    /// Process every article; never fails as a whole.
    #[instrument(level = "info", skip_all, fields(count = articles.len(), limit = self.strategy.limit()))]
    pub async fn run(&self, articles: &[RawArticle]) -> BatchOutcome {
        let t0 = Instant::now();

        let (enriched, failures): (Vec<_>, Vec<_>) = stream::iter(articles.iter().enumerate())
            .map(|(index, article)| self.pipeline.process(index, article))
            .buffered(self.strategy.limit())
            .inspect(|result| match result {
                Ok(article) => info!(url = %article.url, "Article enriched"),
                Err(failure) => warn!(
                    index = failure.index,
                    url = %failure.url,
                    stage = %failure.stage,
                    error = %failure.source,
                    "Article dropped"
                ),
            })
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .partition_result();

        let outcome = BatchOutcome {
            articles: enriched,
            failures,
        };
        info!(
            total = outcome.total(),
            successful = outcome.articles.len(),
            failed = outcome.failures.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "Completed article batch"
        );
        outcome
    }

    /// Fetch one page from the feed and process it.
    ///
    /// Only a failed fetch is an error; per-article failures are in the outcome.
    pub async fn collect_page<F>(&self, feed: &F, query: &FeedQuery) -> Result<BatchOutcome, FetchError>
    where
        F: NewsFeed,
    {
        let articles = feed.fetch_page(query).await.map_err(|source| FetchError {
            country: query.country.clone(),
            page: query.page,
            source,
        })?;
        Ok(self.run(&articles).await)
    }
}
