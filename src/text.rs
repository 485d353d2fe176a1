//! Text normalization for loosely-typed article fields.
//!
//! Feeds hand us `title`/`description`/`content` in whatever shape they
//! like (see [`FieldText`]). Everything downstream (fingerprinting, the
//! hype filter, CSV export) wants a plain string, and this module is the
//! one place the shape branching happens. All branches produce a string;
//! none of them can fail.

use itertools::Itertools;
use scraper::Html;

use crate::models::{Article, FieldText};

/// Flatten one upstream field into a clean string.
///
/// - a string is trimmed;
/// - a list is stringified element-by-element and joined with single spaces;
/// - an absent or null field becomes the empty string;
/// - any other JSON scalar is stringified and trimmed.
pub fn normalize_field(field: Option<&FieldText>) -> String {
    match field {
        None => String::new(),
        Some(FieldText::One(s)) => s.trim().to_string(),
        Some(FieldText::Many(items)) => items
            .iter()
            .map(|v| value_to_text(v).trim().to_string())
            .join(" "),
        Some(FieldText::Other(v)) => value_to_text(v).trim().to_string(),
    }
}

/// Build the canonical comparison string for an article.
///
/// Title, description, and content are normalized independently; empty
/// parts are discarded and the survivors joined with single spaces. This
/// is the text the deduplicator fingerprints.
pub fn comparison_text(article: &Article) -> String {
    [
        normalize_field(article.title.as_ref()),
        normalize_field(article.description.as_ref()),
        normalize_field(article.content.as_ref()),
    ]
    .into_iter()
    .filter(|part| !part.is_empty())
    .join(" ")
}

/// Reduce an HTML fragment to whitespace-normalized text.
///
/// RSS descriptions routinely carry markup; feed items are compared and
/// exported as plain text, so tags are dropped and runs of whitespace
/// collapsed to single spaces.
pub fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect();
    text.split_whitespace().join(" ")
}

fn value_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: Option<FieldText>, description: Option<FieldText>, content: Option<FieldText>) -> Article {
        Article {
            source: None,
            title,
            description,
            content,
            url: None,
            published_at: None,
        }
    }

    #[test]
    fn test_normalize_field_trims_strings() {
        assert_eq!(normalize_field(Some(&"  hello world \n".into())), "hello world");
    }

    #[test]
    fn test_normalize_field_absent_is_empty() {
        assert_eq!(normalize_field(None), "");
    }

    #[test]
    fn test_normalize_field_null_is_empty() {
        let f = FieldText::Other(serde_json::Value::Null);
        assert_eq!(normalize_field(Some(&f)), "");
    }

    #[test]
    fn test_normalize_field_joins_lists() {
        let f: FieldText = serde_json::from_str(r#"[" first ", "second", 3]"#).unwrap();
        assert_eq!(normalize_field(Some(&f)), "first second 3");
    }

    #[test]
    fn test_normalize_field_stringifies_scalars() {
        let f: FieldText = serde_json::from_str("42").unwrap();
        assert_eq!(normalize_field(Some(&f)), "42");
    }

    #[test]
    fn test_comparison_text_skips_empty_parts() {
        let a = article(Some("Headline".into()), None, Some("Body text".into()));
        assert_eq!(comparison_text(&a), "Headline Body text");
    }

    #[test]
    fn test_comparison_text_all_empty() {
        let a = article(None, Some("   ".into()), None);
        assert_eq!(comparison_text(&a), "");
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<p>Hello <b>world</b>!</p>"), "Hello world!");
        assert_eq!(strip_html("plain  text\n here"), "plain text here");
    }
}
