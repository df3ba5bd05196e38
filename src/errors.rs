//! Error types for collaborator calls and per-article failures.
//!
//! Per-article failures never escape the pipeline as errors that abort a
//! batch. They are returned as [`ArticleFailure`] values carrying the stage
//! that failed and the underlying [`ServiceError`], so the coordinator can
//! log them and report them out-of-band. Only a failed feed fetch
//! ([`FetchError`]) fails a whole batch.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by an external collaborator (feed, translator, summarizer).
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Transport failure or undecodable body.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("provider responded with {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, shortened for logging
        body: String,
    },

    /// The response parsed but lacked the field we need.
    #[error("response is missing `{0}`")]
    MissingField(&'static str),

    /// The call did not finish within its deadline.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),
}

impl ServiceError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ServiceError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ServiceError::Status { status, .. } => *status == 429 || *status >= 500,
            ServiceError::MissingField(_) => false,
            ServiceError::Timeout(_) => true,
        }
    }
}

/// Pipeline stage at which an article failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    TranslateTitle,
    TranslateBody,
    Summarize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::TranslateTitle => "translate_title",
            Stage::TranslateBody => "translate_body",
            Stage::Summarize => "summarize",
        };
        f.write_str(name)
    }
}

/// A single article that could not be enriched.
#[derive(Error, Debug)]
#[error("article {index} ({url}) failed at {stage}: {source}")]
pub struct ArticleFailure {
    /// Position of the article in the fetched page.
    pub index: usize,
    /// Original article link, for correlating with the feed.
    pub url: String,
    /// Stage that failed first.
    pub stage: Stage,
    /// Underlying collaborator error.
    #[source]
    pub source: ServiceError,
}

/// The feed could not be fetched, so there is no batch to process.
#[derive(Error, Debug)]
#[error("failed to fetch feed page {page} for `{country}`: {source}")]
pub struct FetchError {
    pub country: String,
    pub page: u32,
    #[source]
    pub source: ServiceError,
}

/// Invalid or incomplete start-up configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("missing API key for {0} (set it in the config file, via flag or environment)")]
    MissingApiKey(&'static str),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] ServiceError),
}
