//! Chat-completions summarization client (OpenAI-compatible).
//!
//! Sends a fixed system instruction plus the translated body as the user
//! message and returns `choices[0].message.content`.

use super::retry::RetryPolicy;
use super::{Summarizer, check_status, endpoint, http_client};
use crate::errors::ServiceError;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
/// "Summarize the following news into one paragraph."
pub const DEFAULT_SYSTEM_PROMPT: &str = "다음 뉴스를 한 문단으로 요약해줘.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

impl ChatResponse {
    fn into_content(self) -> Result<String, ServiceError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ServiceError::MissingField("choices[0].message.content"))
    }
}

pub struct OpenAiSummarizer {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    system_prompt: String,
    retry: RetryPolicy,
}

impl OpenAiSummarizer {
    /// Create a chat-completions client with the default model and
    /// instruction.
    ///
    /// # Arguments
    /// * `base_url` - Any OpenAI-compatible API root
    /// * `api_key` - Sent as a bearer token
    /// * `timeout` - Per-request timeout; every retry gets its own
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            retry: RetryPolicy::none(),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Replace the instruction sent as the system message.
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn request(&self, text: &str) -> RequestBuilder {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: &self.system_prompt },
                ChatMessage { role: "user", content: text },
            ],
        };
        self.client
            .post(endpoint(&self.base_url, "chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&body)
    }

    async fn summarize_once(&self, text: &str) -> Result<String, ServiceError> {
        let response = check_status(self.request(text).send().await?).await?;
        response.json::<ChatResponse>().await?.into_content()
    }
}

impl fmt::Debug for OpenAiSummarizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiSummarizer")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("retry", &self.retry)
            .finish()
    }
}

impl Summarizer for OpenAiSummarizer {
    #[instrument(level = "debug", skip_all, fields(chars = text.chars().count(), model = %self.model))]
    async fn summarize(&self, text: &str) -> Result<String, ServiceError> {
        let t0 = Instant::now();
        let summary = self.retry.run("summarizer.summarize", || self.summarize_once(text)).await?;
        debug!(elapsed_ms = t0.elapsed().as_millis(), "Summary received");
        Ok(summary)
    }
}
