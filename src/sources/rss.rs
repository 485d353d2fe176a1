//! RSS 2.0 feed source, the fallback when NewsAPI is unavailable.
//!
//! Feed items carry HTML in their descriptions and RFC 2822 timestamps in
//! `pubDate`; both are normalized here so downstream stages see the same
//! [`Article`] shape NewsAPI produces.

use std::error::Error;

use chrono::DateTime;
use tracing::{info, instrument, warn};

use crate::models::Article;
use crate::sources::get_with_backoff;
use crate::text::strip_html;

/// Fetch a feed and map its items to articles, keeping at most
/// `max_items` in feed order.
#[instrument(level = "info", skip(client), fields(feed_url = %feed_url))]
pub async fn fetch_feed(
    client: &reqwest::Client,
    feed_url: &str,
    max_items: usize,
) -> Result<Vec<Article>, Box<dyn Error>> {
    let response = get_with_backoff(client.get(feed_url), 3).await?;
    let body = response.bytes().await?;
    let channel = rss::Channel::read_from(&body[..])?;

    let articles: Vec<Article> = channel
        .items()
        .iter()
        .take(max_items)
        .map(|item| normalize(item, feed_url))
        .collect();

    info!(count = articles.len(), "Fetched RSS feed");
    Ok(articles)
}

fn normalize(item: &rss::Item, feed_url: &str) -> Article {
    let mut article = Article {
        source: item
            .source()
            .and_then(|s| s.title().map(str::to_string)),
        title: item.title().map(|t| t.trim().into()),
        description: item
            .description()
            .map(|html| strip_html(html).as_str().into()),
        content: item
            .content()
            .map(|html| strip_html(html).as_str().into()),
        url: item.link().map(str::to_string),
        published_at: item.pub_date().map(|d| normalize_pub_date(d, feed_url)),
    };
    if article.source.is_none() {
        article.source = article.source_domain();
    }
    article
}

/// RSS dates are RFC 2822; the rest of the pipeline speaks RFC 3339.
/// Unparseable dates pass through untouched rather than being discarded.
fn normalize_pub_date(raw: &str, feed_url: &str) -> String {
    match DateTime::parse_from_rfc2822(raw).or_else(|_| DateTime::parse_from_rfc3339(raw)) {
        Ok(parsed) => parsed.to_rfc3339(),
        Err(e) => {
            warn!(raw, feed_url, error = %e, "Unparseable pubDate; keeping raw value");
            raw.to_string()
        }
    }
}
