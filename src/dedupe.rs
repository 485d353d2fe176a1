//! Content-fingerprint deduplication.
//!
//! Feeds overlap heavily: the same story arrives from NewsAPI on several
//! pages, or from both the API and the RSS fallback with cosmetic
//! differences in the tail of the body. Rather than compare full texts,
//! each article is reduced to a fingerprint, a SHA-256 digest of a fixed
//! prefix of its comparison text, and only the first article per
//! fingerprint survives.
//!
//! Fingerprints exist only for the duration of one [`deduplicate`] call;
//! nothing is persisted between runs.

use std::collections::HashSet;

use sha2::{Digest, Sha256};
use tracing::info;

use crate::models::Article;
use crate::text::comparison_text;

/// How many characters of the comparison text feed the fingerprint.
///
/// A prefix is hashed instead of the full body as a latency/false-negative
/// tradeoff: long enough to tell distinct stories apart, short enough to
/// avoid hashing entire articles. Tunable if false-duplicate collapses
/// show up in practice.
pub const FINGERPRINT_WINDOW: usize = 250;

/// Hex-encoded SHA-256 digest of the first [`FINGERPRINT_WINDOW`]
/// characters of `text`.
pub fn fingerprint(text: &str) -> String {
    let prefix: String = text.chars().take(FINGERPRINT_WINDOW).collect();
    let mut hasher = Sha256::new();
    hasher.update(prefix.as_bytes());
    hex::encode(hasher.finalize())
}

/// Drop articles whose fingerprint has already been seen, keeping input
/// order.
///
/// Input arrives newest-first, so the earliest occurrence is the one kept.
/// Duplicates are dropped silently; a duplicate is expected, not an
/// error. Articles whose comparison text agrees for the first
/// [`FINGERPRINT_WINDOW`] characters collapse to one entry even if they
/// diverge later; that false positive is an accepted cost of prefix
/// hashing.
pub fn deduplicate(articles: Vec<Article>) -> Vec<Article> {
    let input_count = articles.len();
    let mut seen = HashSet::new();

    let unique: Vec<Article> = articles
        .into_iter()
        .filter(|article| seen.insert(fingerprint(&comparison_text(article))))
        .collect();

    info!(
        input = input_count,
        output = unique.len(),
        "Deduplicated articles"
    );
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldText;

    fn article(title: &str, description: &str, content: &str) -> Article {
        let field = |s: &str| -> Option<FieldText> {
            if s.is_empty() { None } else { Some(s.into()) }
        };
        Article {
            source: None,
            title: field(title),
            description: field(description),
            content: field(content),
            url: None,
            published_at: None,
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(deduplicate(Vec::new()).is_empty());
    }

    #[test]
    fn test_identical_articles_collapse() {
        let articles = vec![
            article("A", "Funding of $5M raised", ""),
            article("A", "Funding of $5M raised", ""),
        ];
        assert_eq!(deduplicate(articles).len(), 1);
    }

    #[test]
    fn test_distinct_articles_survive_in_order() {
        let articles = vec![
            article("First story", "", ""),
            article("Second story", "", ""),
            article("First story", "", ""),
            article("Third story", "", ""),
        ];
        let unique = deduplicate(articles);
        let titles: Vec<String> = unique
            .iter()
            .map(|a| crate::text::normalize_field(a.title.as_ref()))
            .collect();
        assert_eq!(titles, vec!["First story", "Second story", "Third story"]);
    }

    #[test]
    fn test_output_never_longer_than_input() {
        let articles = vec![
            article("A", "x", ""),
            article("B", "y", ""),
            article("A", "x", ""),
        ];
        let input_len = articles.len();
        assert!(deduplicate(articles).len() <= input_len);
    }

    #[test]
    fn test_idempotent() {
        let articles = vec![
            article("A", "one", ""),
            article("B", "two", ""),
            article("A", "one", ""),
        ];
        let once = deduplicate(articles);
        let twice = deduplicate(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_divergence_beyond_window_is_ignored() {
        let shared: String = "x".repeat(FINGERPRINT_WINDOW);
        let a = article(&format!("{shared} tail one"), "", "");
        let b = article(&format!("{shared} a completely different ending"), "", "");
        assert_eq!(deduplicate(vec![a, b]).len(), 1);
    }

    #[test]
    fn test_divergence_inside_window_is_detected() {
        let a = article("Acme raises $5M in seed funding", "", "");
        let b = article("Acme lays off 5% of staff", "", "");
        assert_eq!(deduplicate(vec![a, b]).len(), 2);
    }

    #[test]
    fn test_fingerprint_is_stable_and_hex() {
        let fp = fingerprint("some comparison text");
        assert_eq!(fp, fingerprint("some comparison text"));
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_window_is_chars_not_bytes() {
        // Multibyte input must not panic or depend on byte offsets.
        let long = "é".repeat(FINGERPRINT_WINDOW + 50);
        let fp1 = fingerprint(&long);
        let fp2 = fingerprint(&"é".repeat(FINGERPRINT_WINDOW));
        assert_eq!(fp1, fp2);
    }
}
