//! Per-article processing: normalize → translate (title ∥ body) → summarize.
//!
//! ```text
//! Fetched → Normalizing → Translating → Summarizing → Enriched
//!                              │              │
//!                              └──────────────┴──→ Failed
//! ```
//!
//! The title and body translations are independent and run concurrently.
//! Summarization consumes the translated body, so it only starts once both
//! translations have succeeded. The first failing call ends processing for
//! the article; nothing is retried here and no partial article is built.
//!
//! Every collaborator call is bounded by `call_timeout`. A timeout is reported
//! like any other failure of that stage.

use crate::errors::{ArticleFailure, ServiceError, Stage};
use crate::models::{EnrichedArticle, RawArticle};
use crate::normalize::normalize;
use crate::services::{Summarizer, Translator};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, instrument};

#[derive(Debug)]
pub struct ArticlePipeline<T, S> {
    translator: T,
    summarizer: S,
    call_timeout: Duration,
}

impl<T, S> ArticlePipeline<T, S>
where
    T: Translator,
    S: Summarizer,
{
    /// Create a pipeline over the given collaborators.
    ///
    /// # Arguments
    /// * `translator` - Used for both title and body
    /// * `summarizer` - Receives the translated body
    /// * `call_timeout` - Deadline for each collaborator call, retries included
    pub fn new(translator: T, summarizer: S, call_timeout: Duration) -> Self {
        Self {
            translator,
            summarizer,
            call_timeout,
        }
    }

    /// Enrich one article, or report the stage at which it failed.
    ///
    /// `index` is the article's position in its page and is only used to
    /// label the failure and log events.
    #[instrument(level = "info", skip_all, fields(index = index, url = %article.url))]
    pub async fn process(
        &self,
        index: usize,
        article: &RawArticle,
    ) -> Result<EnrichedArticle, ArticleFailure> {
        let url = &article.url;
        let fail = move |stage: Stage| {
            move |source: ServiceError| ArticleFailure {
                index,
                url: url.clone(),
                stage,
                source,
            }
        };

        debug!(state = "normalizing");
        let body = normalize(article);

        debug!(state = "translating", body_chars = body.chars().count());
        let (title, translated) = tokio::try_join!(
            async {
                self.bounded(self.translator.translate(&article.title))
                    .await
                    .map_err(fail(Stage::TranslateTitle))
            },
            async {
                self.bounded(self.translator.translate(&body))
                    .await
                    .map_err(fail(Stage::TranslateBody))
            },
        )?;

        debug!(state = "summarizing");
        let summary = self
            .bounded(self.summarizer.summarize(&translated))
            .await
            .map_err(fail(Stage::Summarize))?;

        debug!(state = "enriched");
        Ok(EnrichedArticle {
            title,
            url: article.url.clone(),
            image: article.image.clone(),
            translated,
            summary,
        })
    }

    #[cfg(test)]
    pub fn translator(&self) -> &T {
        &self.translator
    }

    async fn bounded<F>(&self, call: F) -> Result<String, ServiceError>
    where
        F: Future<Output = Result<String, ServiceError>>,
    {
        timeout(self.call_timeout, call)
            .await
            .unwrap_or(Err(ServiceError::Timeout(self.call_timeout)))
    }
}
