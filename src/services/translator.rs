//! DeepL translation client.
//!
//! `POST {base_url}/translate` with a form body of `text` and `target_lang`,
//! authenticated by a `DeepL-Auth-Key` header. The free tier rejects large
//! requests, which is why bodies are capped before they get here.

use super::retry::RetryPolicy;
use super::{Translator, check_status, endpoint, http_client};
use crate::errors::ServiceError;
use reqwest::{Client, RequestBuilder, header};
use serde::Deserialize;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

pub const DEFAULT_BASE_URL: &str = "https://api-free.deepl.com/v2";
pub const DEFAULT_TARGET_LANG: &str = "KO";

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    text: String,
}

impl TranslateResponse {
    fn into_text(self) -> Result<String, ServiceError> {
        self.translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or(ServiceError::MissingField("translations[0].text"))
    }
}

pub struct DeepLTranslator {
    client: Client,
    base_url: String,
    api_key: String,
    target_lang: String,
    retry: RetryPolicy,
}

impl DeepLTranslator {
    /// Create a client translating into [`DEFAULT_TARGET_LANG`].
    ///
    /// # Arguments
    /// * `base_url` - API root, free or pro endpoint
    /// * `api_key` - Sent as `DeepL-Auth-Key`
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
            target_lang: DEFAULT_TARGET_LANG.to_string(),
            retry: RetryPolicy::none(),
        })
    }

    pub fn with_target_lang(mut self, target_lang: impl Into<String>) -> Self {
        self.target_lang = target_lang.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn request(&self, text: &str) -> RequestBuilder {
        self.client
            .post(endpoint(&self.base_url, "translate"))
            .header(header::AUTHORIZATION, format!("DeepL-Auth-Key {}", self.api_key))
            .form(&[("text", text), ("target_lang", self.target_lang.as_str())])
    }

    async fn translate_once(&self, text: &str) -> Result<String, ServiceError> {
        let response = check_status(self.request(text).send().await?).await?;
        response.json::<TranslateResponse>().await?.into_text()
    }
}

impl fmt::Debug for DeepLTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeepLTranslator")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("target_lang", &self.target_lang)
            .field("retry", &self.retry)
            .finish()
    }
}

impl Translator for DeepLTranslator {
    #[instrument(level = "debug", skip_all, fields(chars = text.chars().count(), target = %self.target_lang))]
    async fn translate(&self, text: &str) -> Result<String, ServiceError> {
        let t0 = Instant::now();
        let translated = self.retry.run("translator.translate", || self.translate_once(text)).await?;
        debug!(elapsed_ms = t0.elapsed().as_millis(), "Translation received");
        Ok(translated)
    }
}
