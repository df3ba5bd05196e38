//! # Awful KO News
//!
//! Fetches a page of top headlines, translates each title and body into
//! Korean and writes a one-paragraph summary of every story, returning the
//! result as a JSON array.
//!
//! ## Usage
//!
//! ```sh
//! GNEWS_API_KEY=.. DEEPL_API_KEY=.. OPENAI_API_KEY=.. awful_ko_news --country us --page 1
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: One page of raw articles from the feed provider
//! 2. **Normalizing**: Pick the body text worth translating (see [`normalize`])
//! 3. **Translating**: Title and body in parallel
//! 4. **Summarizing**: One paragraph from the translated body
//! 5. **Output**: Surviving articles as JSON on stdout (and optionally on disk)
//!
//! Articles run through steps 2–4 concurrently, a bounded number at a time.
//! An article that fails any step is logged and left out; it never takes the
//! rest of the page down with it.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod batch;
mod cli;
mod config;
mod errors;
mod models;
mod normalize;
mod outputs;
mod pipeline;
mod services;
#[cfg(test)]
mod testing;
mod utils;

use batch::BatchCoordinator;
use cli::Cli;
use config::AppConfig;
use outputs::json;
use pipeline::ArticlePipeline;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init (stderr; stdout carries the JSON) ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("awful_ko_news starting up");

    let args = Cli::parse();
    debug!(country = %args.country, page = args.page, ?args.config, ?args.json_output_dir, "Parsed CLI arguments");

    let query = args.query()?;

    // ---- Configuration ----
    let mut config = AppConfig::load(args.config.as_deref())?;
    config.apply_cli(&args);
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    // Early check: ensure JSON output dir is writable
    if let Some(dir) = &args.json_output_dir {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "JSON output directory is not writable");
            return Err(e);
        }
    }

    // ---- Collaborators, built once ----
    let feed = config.build_feed()?;
    let translator = config.build_translator()?;
    let summarizer = config.build_summarizer()?;
    debug!(?feed, ?translator, ?summarizer, "Collaborators ready");

    let strategy = config.pipeline.strategy();
    let pipeline = ArticlePipeline::new(translator, summarizer, config.pipeline.call_timeout());
    let coordinator = BatchCoordinator::new(pipeline, strategy);
    info!(?strategy, call_timeout = ?config.pipeline.call_timeout(), "Pipeline configured");

    // ---- Fetch and process one page ----
    let outcome = match coordinator.collect_page(&feed, &query).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "Feed fetch failed; no results");
            return Err(e.into());
        }
    };

    // ---- Output ----
    println!("{}", json::render(&outcome.articles)?);

    if let Some(dir) = &args.json_output_dir {
        if let Err(e) = json::write_articles(&outcome.articles, dir, &query).await {
            error!(error = %e, "Failed to write JSON file");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        articles = outcome.articles.len(),
        dropped = outcome.failures.len(),
        "Execution complete"
    );

    Ok(())
}
