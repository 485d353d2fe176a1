//! NewsAPI `everything` endpoint client.
//!
//! Fetches one page of search results at a time, sorted newest-first.
//! The deduplicator keeps the earliest occurrence per fingerprint, so
//! fetch order doubles as the canonical-article preference.

use std::error::Error;

use serde::Deserialize;
use tracing::{info, instrument};

use crate::models::{Article, FieldText};
use crate::sources::get_with_backoff;

const NEWSAPI_URL: &str = "https://newsapi.org/v2/everything";

/// One page of the NewsAPI `everything` response.
#[derive(Debug, Deserialize)]
struct EverythingResponse {
    #[serde(default)]
    articles: Vec<RawArticle>,
}

/// An article exactly as NewsAPI ships it.
#[derive(Debug, Deserialize)]
struct RawArticle {
    source: Option<RawSource>,
    title: Option<FieldText>,
    description: Option<FieldText>,
    content: Option<FieldText>,
    url: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    name: Option<String>,
}

/// Fetch one page of search results for `query`.
///
/// Retries transient failures with backoff; a final failure is returned
/// to the caller, which falls back to RSS.
#[instrument(level = "info", skip(client, api_key))]
pub async fn fetch_page(
    client: &reqwest::Client,
    api_key: &str,
    query: &str,
    page: usize,
    page_size: usize,
) -> Result<Vec<Article>, Box<dyn Error>> {
    let page_param = page.to_string();
    let page_size_param = page_size.to_string();
    let request = client.get(NEWSAPI_URL).query(&[
        ("q", query),
        ("page", page_param.as_str()),
        ("pageSize", page_size_param.as_str()),
        ("language", "en"),
        ("sortBy", "publishedAt"),
        ("apiKey", api_key),
    ]);

    let response = get_with_backoff(request, 3).await?;
    let page_data: EverythingResponse = response.json().await?;

    let articles: Vec<Article> = page_data.articles.into_iter().map(normalize).collect();
    info!(count = articles.len(), page, "Fetched NewsAPI page");
    Ok(articles)
}

fn normalize(raw: RawArticle) -> Article {
    let mut article = Article {
        source: raw.source.and_then(|s| s.name),
        title: raw.title,
        description: raw.description,
        content: raw.content,
        url: raw.url,
        published_at: raw.published_at,
    };
    if article.source.is_none() {
        article.source = article.source_domain();
    }
    article
}
