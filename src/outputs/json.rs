//! JSON serialization of the enriched articles.
//!
//! The array holds one `{title, url, image, translated, summary}` object per
//! article that survived the pipeline, in feed order. Dropped articles are
//! not represented.

use crate::models::{EnrichedArticle, FeedQuery};
use chrono::Local;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Render the articles as a pretty-printed JSON array.
pub fn render(articles: &[EnrichedArticle]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(articles)
}

/// Path of the saved result for `query` on `date`.
pub fn output_path(json_output_dir: &str, date: &str, query: &FeedQuery) -> PathBuf {
    Path::new(json_output_dir)
        .join(date)
        .join(format!("{}-page{}.json", query.country, query.page))
}

/// Write the articles to `{json_output_dir}/{local date}/{country}-page{page}.json`.
///
/// Creates the date directory if needed and returns the written path.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_articles(
    articles: &[EnrichedArticle],
    json_output_dir: &str,
    query: &FeedQuery,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = render(articles)?;
    let local_date = Local::now().date_naive().to_string();
    let path = output_path(json_output_dir, &local_date, query);

    if let Some(dir) = path.parent() {
        info!(dir = %dir.display(), "Ensuring JSON directory exists");
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create JSON dir");
            return Err(e.into());
        }
    }

    fs::write(&path, json).await?;
    info!(path = %path.display(), count = articles.len(), "Wrote JSON file");
    Ok(path)
}
