//! Information-density scoring and the hype filter.
//!
//! LLM calls are the expensive stage of the pipeline, so articles that are
//! mostly marketing language get dropped before they reach it. The score
//! is a cheap heuristic over the raw text: numeric tokens (figures, dates,
//! percentages) push it up, promotional vocabulary pulls it down.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Marketing clichés that flag low-substance copy.
///
/// Matched case-insensitively as substrings anywhere in the text, not as
/// whole words. The membership is a tunable constant, not derived.
pub const PROMO_WORDS: &[&str] = &[
    "innovative",
    "leading",
    "world-class",
    "revolutionary",
    "cutting-edge",
    "exclusive",
    "exciting",
    "amazing",
    "state-of-the-art",
    "best-in-class",
    "industry-leading",
    "groundbreaking",
    "transformative",
];

/// Upper bound on the density score. The two terms of the score are not a
/// probability and can sum past 1 without the clamp.
pub const DENSITY_CEILING: f64 = 1.0;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d[\d,.]*").unwrap());

/// Score how information-dense a text blob is, in [0.0, 1.0].
///
/// Missing, empty, or word-free text scores 0.0. Otherwise the score is
/// the numeric-token ratio plus the promo-penalized word ratio:
///
/// ```text
/// density = numbers/max(1, words) + max(0, (words - promo)/words)
/// ```
///
/// clamped to [`DENSITY_CEILING`]. Text saturated with promotional
/// vocabulary drives the second term toward zero; quantitative text
/// (revenue figures, dates, percentages) lifts the first.
pub fn information_density(text: Option<&str>) -> f64 {
    let Some(text) = text else {
        return 0.0;
    };
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }

    let words = WORD_RE.find_iter(text).count();
    if words == 0 {
        return 0.0;
    }
    let numbers = NUMBER_RE.find_iter(text).count();
    let lowered = text.to_lowercase();
    let promo = PROMO_WORDS
        .iter()
        .filter(|word| lowered.contains(**word))
        .count();

    let density = numbers as f64 / words.max(1) as f64
        + ((words as f64 - promo as f64) / words as f64).max(0.0);
    let density = density.min(DENSITY_CEILING);

    debug!(words, numbers, promo, density, "Computed information density");
    density
}

/// Threshold gate over [`information_density`].
///
/// The caller supplies the threshold (it is configuration, not policy of
/// this function) and concatenates description + content before calling.
/// A `false` result means "drop the article".
pub fn is_high_info(text: Option<&str>, threshold: f64) -> bool {
    information_density(text) >= threshold
}
