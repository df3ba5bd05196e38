//! Command-line interface definitions.
//!
//! The binary answers a single query: translated and summarized top
//! headlines for one country and page. API keys may be passed as flags but
//! are normally read from the environment.

use crate::config::StrategyKind;
use crate::errors::ConfigError;
use crate::models::FeedQuery;
use clap::Parser;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # First page of US headlines, JSON on stdout
/// awful_ko_news
///
/// # Second page of UK headlines, also saved under ./json/<date>/
/// awful_ko_news --country GB --page 2 -j ./json
///
/// # One article at a time
/// awful_ko_news --strategy sequential
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Two-letter country code of the headlines
    #[arg(long, default_value = "us")]
    pub country: String,

    /// Page of headlines to fetch (1-indexed)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,

    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Also write the result to <DIR>/<date>/<country>-page<page>.json
    #[arg(short, long)]
    pub json_output_dir: Option<String>,

    /// Process articles one at a time or concurrently
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyKind>,

    /// Maximum articles processed at once with the parallel strategy
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// GNews API key
    #[arg(long, env = "GNEWS_API_KEY", hide_env_values = true)]
    pub gnews_api_key: Option<String>,

    /// DeepL API key
    #[arg(long, env = "DEEPL_API_KEY", hide_env_values = true)]
    pub deepl_api_key: Option<String>,

    /// OpenAI (or compatible) API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,
}

impl Cli {
    /// The feed query described by `--country` and `--page`.
    pub fn query(&self) -> Result<FeedQuery, ConfigError> {
        let country = self.country.trim().to_lowercase();
        if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::Invalid {
                field: "country",
                reason: format!("expected a two-letter code, got `{}`", self.country),
            });
        }
        Ok(FeedQuery {
            country,
            page: self.page,
        })
    }
}
