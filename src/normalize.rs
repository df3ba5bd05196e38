//! Content normalization: decides what body text is sent for translation.
//!
//! Feed providers often return a body cut short with a `"[+N chars]"`
//! suffix, or a body too short to be worth translating. In both cases the
//! description and title are used instead. The result is always capped at
//! [`MAX_CONTENT_CHARS`], the translation provider's request-size ceiling.
//!
//! Lengths are counted in Unicode scalar values, never bytes, so truncation
//! cannot split a character.

use crate::models::RawArticle;

/// Provider marker for a truncated body (`"... [+1234 chars]"`).
pub const TRUNCATION_MARKER: &str = "[+";

/// Bodies shorter than this are replaced by description and title.
pub const MIN_CONTENT_CHARS: usize = 200;

/// Hard ceiling on the text sent to the translator.
pub const MAX_CONTENT_CHARS: usize = 4900;

/// Compute the text eligible for translation. Total: never fails.
pub fn normalize(article: &RawArticle) -> String {
    let content = article.content.as_deref().unwrap_or_default();

    let text = if content.contains(TRUNCATION_MARKER)
        || content.chars().count() < MIN_CONTENT_CHARS
    {
        format!(
            "{} {}",
            article.description.as_deref().unwrap_or_default(),
            article.title
        )
    } else {
        content.to_string()
    };

    truncate_chars(text, MAX_CONTENT_CHARS)
}

fn truncate_chars(mut text: String, max: usize) -> String {
    if let Some((byte_idx, _)) = text.char_indices().nth(max) {
        text.truncate(byte_idx);
    }
    text
}
