//! Data models for feed articles and their translated representations.
//!
//! This module defines the data structures that flow through the pipeline:
//! - [`RawArticle`]: An article exactly as the feed provider returned it
//! - [`EnrichedArticle`]: A translated and summarized article, the unit returned to callers
//! - [`FeedQuery`]: The page request sent to the feed provider
//!
//! Provider payloads are loose: any field may be missing or `null`, so the
//! raw model tolerates both.

use serde::{Deserialize, Deserializer, Serialize};

/// A raw headline as returned by the feed provider.
///
/// Immutable once fetched. `content` is frequently truncated by the provider
/// with a `"[+N chars]"` suffix, which is why [`crate::normalize`] may
/// discard it.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RawArticle {
    /// The headline text.
    #[serde(default, deserialize_with = "nullable_string")]
    pub title: String,
    /// Link to the full story.
    #[serde(default, deserialize_with = "nullable_string")]
    pub url: String,
    /// Optional lead image URL.
    #[serde(default)]
    pub image: Option<String>,
    /// Optional body text, possibly truncated by the provider.
    #[serde(default)]
    pub content: Option<String>,
    /// Optional short description.
    #[serde(default)]
    pub description: Option<String>,
}

/// A fully processed article.
///
/// Only ever built once every stage of [`crate::pipeline::ArticlePipeline`]
/// succeeded; there is no partially populated form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedArticle {
    /// The translated headline.
    pub title: String,
    /// The original story link.
    pub url: String,
    /// The original lead image, if any.
    pub image: Option<String>,
    /// The normalized body, translated.
    pub translated: String,
    /// One-paragraph summary of the translated body.
    pub summary: String,
}

/// Parameters for a single page request to the feed provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    /// Two-letter lower-case country code.
    pub country: String,
    /// 1-indexed page number.
    pub page: u32,
}

/// Envelope of the feed provider's top-headlines response.
#[derive(Debug, Default, Deserialize)]
pub struct FeedPage {
    #[serde(default)]
    pub articles: Vec<RawArticle>,
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
