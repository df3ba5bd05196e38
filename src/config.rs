//! Runtime configuration.
//!
//! Settings come from an optional YAML file whose sections all have
//! defaults, then CLI flags and environment variables on top. API keys are
//! normally supplied through the environment:
//!
//! ```yaml
//! feed:
//!   base_url: https://gnews.io/api/v4
//!   page_size: 5
//! translator:
//!   target_lang: KO
//! summarizer:
//!   model: gpt-3.5-turbo
//! pipeline:
//!   strategy: parallel
//!   max_concurrency: 4
//!   call_timeout_secs: 90
//! ```
//!
//! Each collaborator client is built exactly once from its section.
//!
//! `call_timeout_secs` bounds every collaborator call including the client's
//! own retries, so [`AppConfig::validate`] rejects a section whose
//! `timeout_secs` times its attempts, plus backoff, would not fit inside it.

use crate::batch::ExecutionStrategy;
use crate::cli::Cli;
use crate::errors::ConfigError;
use crate::services::feed::{self, GNewsFeed};
use crate::services::retry::RetryPolicy;
use crate::services::summarizer::{self, OpenAiSummarizer};
use crate::services::translator::{self, DeepLTranslator};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub translator: TranslatorConfig,
    pub summarizer: SummarizerConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub page_size: u32,
    pub timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: feed::DEFAULT_BASE_URL.to_string(),
            api_key: None,
            page_size: feed::DEFAULT_PAGE_SIZE,
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub target_lang: String,
    pub timeout_secs: u64,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            base_url: translator::DEFAULT_BASE_URL.to_string(),
            api_key: None,
            target_lang: translator::DEFAULT_TARGET_LANG.to_string(),
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub system_prompt: String,
    pub timeout_secs: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            base_url: summarizer::DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: summarizer::DEFAULT_MODEL.to_string(),
            system_prompt: summarizer::DEFAULT_SYSTEM_PROMPT.to_string(),
            timeout_secs: 25,
        }
    }
}

/// Execution strategy as named in config files and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Sequential,
    Parallel,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub strategy: StrategyKind,
    pub max_concurrency: usize,
    /// Deadline for each collaborator call, retries included.
    pub call_timeout_secs: u64,
    pub max_retries: usize,
    pub retry_base_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Parallel,
            max_concurrency: 4,
            call_timeout_secs: 90,
            max_retries: 2,
            retry_base_delay_ms: 500,
        }
    }
}

impl PipelineConfig {
    /// Resolve the configured strategy into the coordinator's
    /// [`ExecutionStrategy`].
    pub fn strategy(&self) -> ExecutionStrategy {
        match self.strategy {
            StrategyKind::Sequential => ExecutionStrategy::Sequential,
            StrategyKind::Parallel => ExecutionStrategy::Parallel {
                max_concurrency: self.max_concurrency,
            },
        }
    }

    /// Deadline applied by the pipeline to each collaborator call.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Retry policy shared by all three HTTP clients.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_base_delay_ms))
    }
}

fn required_key<'a>(key: &'a Option<String>, provider: &'static str) -> Result<&'a str, ConfigError> {
    match key.as_deref().map(str::trim) {
        Some(k) if !k.is_empty() => Ok(k),
        _ => Err(ConfigError::MissingApiKey(provider)),
    }
}

fn valid_url(value: &str, field: &'static str) -> Result<(), ConfigError> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        Ok(url) => Err(ConfigError::Invalid {
            field,
            reason: format!("unsupported scheme `{}`", url.scheme()),
        }),
        Err(e) => Err(ConfigError::Invalid {
            field,
            reason: e.to_string(),
        }),
    }
}

/// Reject a client whose retries could not all run before the call deadline.
fn fits_deadline(
    timeout_secs: u64,
    field: &'static str,
    pipeline: &PipelineConfig,
) -> Result<(), ConfigError> {
    let worst = pipeline
        .retry_policy()
        .worst_case(Duration::from_secs(timeout_secs));
    if worst > pipeline.call_timeout() {
        return Err(ConfigError::Invalid {
            field,
            reason: format!(
                "{} attempts of {}s need up to {}ms, more than call_timeout_secs ({}s)",
                pipeline.max_retries + 1,
                timeout_secs,
                worst.as_millis(),
                pipeline.call_timeout_secs
            ),
        });
    }
    Ok(())
}

fn positive(value: u64, field: &'static str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            field,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}

impl AppConfig {
    /// Load from `path`, or use defaults when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            info!("No config file given; using defaults");
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(Path::new(path)).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let config = Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        info!(path, "Loaded configuration");
        Ok(config)
    }

    /// Parse a YAML document; a blank document yields the defaults.
    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Apply command-line and environment overrides.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(key) = &cli.gnews_api_key {
            self.feed.api_key = Some(key.clone());
        }
        if let Some(key) = &cli.deepl_api_key {
            self.translator.api_key = Some(key.clone());
        }
        if let Some(key) = &cli.openai_api_key {
            self.summarizer.api_key = Some(key.clone());
        }
        if let Some(strategy) = cli.strategy {
            self.pipeline.strategy = strategy;
        }
        if let Some(n) = cli.max_concurrency {
            self.pipeline.max_concurrency = n;
        }
    }

    /// Check keys, URLs, limits and the timeout budget before any client
    /// is built.
    ///
    /// # Returns
    /// The first problem found, as a [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        required_key(&self.feed.api_key, "the news feed")?;
        required_key(&self.translator.api_key, "the translator")?;
        required_key(&self.summarizer.api_key, "the summarizer")?;

        valid_url(&self.feed.base_url, "feed.base_url")?;
        valid_url(&self.translator.base_url, "translator.base_url")?;
        valid_url(&self.summarizer.base_url, "summarizer.base_url")?;

        positive(self.feed.page_size as u64, "feed.page_size")?;
        positive(self.feed.timeout_secs, "feed.timeout_secs")?;
        positive(self.translator.timeout_secs, "translator.timeout_secs")?;
        positive(self.summarizer.timeout_secs, "summarizer.timeout_secs")?;
        positive(self.pipeline.call_timeout_secs, "pipeline.call_timeout_secs")?;
        positive(self.pipeline.max_concurrency as u64, "pipeline.max_concurrency")?;

        fits_deadline(self.translator.timeout_secs, "translator.timeout_secs", &self.pipeline)?;
        fits_deadline(self.summarizer.timeout_secs, "summarizer.timeout_secs", &self.pipeline)?;

        if self.translator.target_lang.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "translator.target_lang",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Build the news feed client.
    ///
    /// # Returns
    /// A [`GNewsFeed`] with the configured page size and retry policy, or
    /// [`ConfigError::MissingApiKey`] when no key is set.
    pub fn build_feed(&self) -> Result<GNewsFeed, ConfigError> {
        let c = &self.feed;
        Ok(GNewsFeed::new(
            &c.base_url,
            required_key(&c.api_key, "the news feed")?,
            Duration::from_secs(c.timeout_secs),
        )?
        .with_page_size(c.page_size)
        .with_retry(self.pipeline.retry_policy()))
    }

    /// Build the translation client for the configured target language.
    pub fn build_translator(&self) -> Result<DeepLTranslator, ConfigError> {
        let c = &self.translator;
        Ok(DeepLTranslator::new(
            &c.base_url,
            required_key(&c.api_key, "the translator")?,
            Duration::from_secs(c.timeout_secs),
        )?
        .with_target_lang(&c.target_lang)
        .with_retry(self.pipeline.retry_policy()))
    }

    /// Build the summarization client with its model and system instruction.
    pub fn build_summarizer(&self) -> Result<OpenAiSummarizer, ConfigError> {
        let c = &self.summarizer;
        Ok(OpenAiSummarizer::new(
            &c.base_url,
            required_key(&c.api_key, "the summarizer")?,
            Duration::from_secs(c.timeout_secs),
        )?
        .with_model(&c.model)
        .with_system_prompt(&c.system_prompt)
        .with_retry(self.pipeline.retry_policy()))
    }
}
