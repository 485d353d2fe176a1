//! Data models for raw, extracted, and exported articles.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Article`]: A normalized article from NewsAPI or an RSS feed
//! - [`FieldText`]: The loosely-typed shape of upstream text fields
//! - [`Extraction`]: Structured fields pulled out of an article by the LLM
//! - [`ProcessedArticle`]: An article merged with its extraction, ready for export
//!
//! Upstream feeds disagree about field shapes (NewsAPI sometimes returns a
//! list of content fragments, RSS items omit fields entirely), so the text
//! fields are kept as [`FieldText`] until a consumer normalizes them.

use serde::{Deserialize, Serialize};

/// A text-bearing article field as it arrives from upstream.
///
/// NewsAPI and RSS feeds deliver `title`/`description`/`content` as a plain
/// string, occasionally as a list of fragments, and sometimes as another
/// JSON scalar. The untagged union keeps whatever arrived; turning it into
/// a clean string is the job of [`crate::text::normalize_field`], the single
/// place shape inspection is allowed.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FieldText {
    /// The common case: one string.
    One(String),
    /// A list of fragments, joined with spaces on normalization.
    Many(Vec<serde_json::Value>),
    /// Anything else a feed managed to produce; stringified on normalization.
    Other(serde_json::Value),
}

impl From<&str> for FieldText {
    fn from(s: &str) -> Self {
        FieldText::One(s.to_string())
    }
}

/// A news article after source-specific normalization, before extraction.
///
/// Every field is optional: feeds drop fields freely and the pipeline is
/// required to degrade gracefully rather than reject an item. The article
/// is treated as immutable once fetched; extraction results live alongside
/// it in [`ProcessedArticle`] rather than being merged into it.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Article {
    /// Publisher name, when the feed supplies one.
    pub source: Option<String>,
    /// Article headline.
    pub title: Option<FieldText>,
    /// Short summary or teaser.
    pub description: Option<FieldText>,
    /// Body text, usually truncated by the upstream API.
    pub content: Option<FieldText>,
    /// Canonical link to the story.
    pub url: Option<String>,
    /// Publication timestamp as an RFC 3339 string where the feed allows it.
    pub published_at: Option<String>,
}

impl Article {
    /// Extract the domain label (before .com/.org/etc) from the article URL.
    /// For example: "https://lite.cnn.com/article" -> "cnn".
    ///
    /// Used as a stand-in source name when the feed omits one.
    pub fn source_domain(&self) -> Option<String> {
        self.url.as_ref().and_then(|url| {
            if let Ok(parsed) = url::Url::parse(url) {
                if let Some(host) = parsed.host_str() {
                    let parts: Vec<&str> = host.split('.').collect();
                    // Handles "lite.cnn.com" -> "cnn" as well as "cnn.com" -> "cnn"
                    if parts.len() >= 2 {
                        return Some(parts[parts.len() - 2].to_string());
                    }
                }
            }
            None
        })
    }
}

/// Structured fields the LLM extracts from one article.
///
/// Decoded leniently: any missing or malformed field falls back to the
/// default rather than discarding the whole batch, so the output of the
/// extraction stage always lines up one-to-one with its input articles.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Extraction {
    /// Primary company the story is about, if the model found one.
    pub company_name: Option<String>,
    /// Coarse category label (e.g. "Funding", "Product", "Unknown").
    pub category: String,
    /// Sentiment in [-1.0, 1.0] as judged by the model.
    pub sentiment_score: f64,
    /// Whether the story reports a funding round.
    pub is_funding_news: bool,
}

impl Default for Extraction {
    fn default() -> Self {
        Extraction {
            company_name: None,
            category: "Unknown".to_string(),
            sentiment_score: 0.0,
            is_funding_news: false,
        }
    }
}

impl Extraction {
    /// Build an extraction from one element of the model's JSON reply.
    ///
    /// Non-object elements and wrongly-typed fields degrade to defaults.
    pub fn from_value(value: &serde_json::Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Extraction::default();
        };
        Extraction {
            company_name: obj
                .get("company_name")
                .and_then(|v| v.as_str())
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().to_string()),
            category: obj
                .get("category")
                .and_then(|v| v.as_str())
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            sentiment_score: obj
                .get("sentiment_score")
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0),
            is_funding_news: obj
                .get("is_funding_news")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
        }
    }
}

/// An article paired with its extraction; the unit of export.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedArticle {
    pub article: Article,
    pub extraction: Extraction,
}
