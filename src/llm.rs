//! LLM batch extraction with retry and backend fallback.
//!
//! Surviving articles are sent to a language model in batches; the model
//! returns one JSON object per article with the structured fields defined
//! by [`Extraction`]. Two backends are supported:
//!
//! - [`ChatClient`]: any OpenAI-compatible `/chat/completions` endpoint
//! - [`GenerateClient`]: a local Ollama `/api/generate` endpoint
//!
//! The chat backend is tried first (unless the run prefers Ollama), the
//! generate backend is the fallback. Every call goes through [`RetryAsk`],
//! which adds exponential backoff with jitter.
//!
//! Extraction is deliberately infallible from the pipeline's point of
//! view: when no backend yields usable JSON, the batch comes back as
//! per-article defaults and the run continues.

use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};

use itertools::Itertools;
use rand::{Rng, rng};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use crate::models::{Article, Extraction};
use crate::text::normalize_field;
use crate::utils::{looks_truncated, truncate_for_log, widest_json_slice};

/// Instructions prepended to every batch. The numbered item list follows.
const BATCH_PROMPT: &str = "\
You are a JSON-only extractor. Given a numbered list of short news items,
return a JSON array where each element corresponds to the input article (same order).
Each element must be an object with exactly these keys:

- company_name (string or null)
- category (string)
- sentiment_score (number between -1 and 1)
- is_funding_news (boolean)

Return ONLY valid JSON. No explanation. No markdown.";

/// Trait for async LLM interaction.
///
/// Implementors send a prompt to some model and return its raw reply.
/// The abstraction exists so decorators like [`RetryAsk`] compose over
/// any backend.
pub trait AskAsync {
    /// The type of response returned by the LLM.
    type Response;

    /// Send a prompt and receive a response.
    async fn ask(&self, prompt: &str) -> Result<Self::Response, Box<dyn Error>>;
}

/// Wrapper that adds exponential backoff retry logic to any [`AskAsync`]
/// implementation.
///
/// The delay between retries follows:
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryAsk<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync + fmt::Debug,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, prompt: &str) -> Result<Self::Response, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.ask(prompt).await {
                Ok(resp) => {
                    return Ok(resp);
                }
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                            elapsed_ms_total = total_dt.as_millis() as u128,
                            error = %e,
                            "ask() exhausted retries"
                        );
                        return Err(e);
                    }

                    // backoff calc
                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                        elapsed_ms_total = total_dt.as_millis() as u128,
                        ?delay,
                        error = %e,
                        "ask() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// OpenAI-compatible chat completions client.
#[derive(Debug, Clone)]
pub struct ChatClient {
    pub http: reqwest::Client,
    /// API base without the endpoint path, e.g. `https://api.openai.com/v1`.
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
}

impl AskAsync for ChatClient {
    type Response = String;

    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn ask(&self, prompt: &str) -> Result<Self::Response, Box<dyn Error>> {
        let endpoint = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": self.temperature,
        });

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let reply: serde_json::Value = response.json().await?;
        reply["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| "chat response carried no message content".into())
    }
}

/// Ollama generate client, used as the local fallback backend.
#[derive(Debug, Clone)]
pub struct GenerateClient {
    pub http: reqwest::Client,
    /// Ollama host, e.g. `http://localhost:11434`.
    pub host: String,
    pub model: String,
}

impl AskAsync for GenerateClient {
    type Response = String;

    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn ask(&self, prompt: &str) -> Result<Self::Response, Box<dyn Error>> {
        let endpoint = format!("{}/api/generate", self.host.trim_end_matches('/'));
        // stream must stay off: the streaming API emits JSON lines
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });

        let response = self
            .http
            .post(&endpoint)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let reply: serde_json::Value = response.json().await?;
        reply["response"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| "generate response carried no response field".into())
    }
}

/// Credentials and backend preference for one pipeline run.
///
/// Which backend answers is decided here, not in configuration: the chat
/// backend needs `openai_api_key`, the fallback needs `ollama_host`, and
/// `prefer_ollama` skips the chat backend even when a key is present.
#[derive(Debug, Clone)]
pub struct LlmRuntime {
    pub http: reqwest::Client,
    pub openai_api_key: Option<String>,
    pub ollama_host: Option<String>,
    pub prefer_ollama: bool,
}

impl LlmRuntime {
    /// Ask whichever backend is available, chat first unless the run
    /// prefers Ollama. Returns `None` when every configured backend
    /// exhausted its retries.
    async fn ask_any(&self, cfg: &crate::config::LlmConfig, prompt: &str) -> Option<String> {
        if !self.prefer_ollama {
            if let Some(api_key) = &self.openai_api_key {
                let client = ChatClient {
                    http: self.http.clone(),
                    api_base: cfg.api_base.clone(),
                    api_key: api_key.clone(),
                    model: cfg.model.clone(),
                    temperature: cfg.temperature,
                };
                let api = RetryAsk::new(client, 5, StdDuration::from_secs(1));
                match api.ask(prompt).await {
                    Ok(reply) => return Some(reply),
                    Err(e) => warn!(error = %e, "Chat backend failed; trying fallback"),
                }
            } else {
                debug!("No OpenAI API key configured; skipping chat backend");
            }
        }

        if let Some(host) = &self.ollama_host {
            let client = GenerateClient {
                http: self.http.clone(),
                host: host.clone(),
                model: cfg.ollama_model.clone(),
            };
            let api = RetryAsk::new(client, 3, StdDuration::from_secs(1));
            match api.ask(prompt).await {
                Ok(reply) => return Some(reply),
                Err(e) => warn!(error = %e, "Ollama backend failed"),
            }
        }

        None
    }
}

/// Extract structured fields for a batch of articles.
///
/// Builds the numbered digest list, asks the available backend(s), and
/// parses the reply leniently. The returned vector always has exactly one
/// [`Extraction`] per input article; articles the model skipped or
/// garbled get [`Extraction::default`].
#[instrument(level = "info", skip_all, fields(batch_len = articles.len()))]
pub async fn extract_batch(
    runtime: &LlmRuntime,
    cfg: &crate::config::LlmConfig,
    articles: &[Article],
    max_summary_chars: usize,
) -> Vec<Extraction> {
    if articles.is_empty() {
        return Vec::new();
    }

    let items_text = articles
        .iter()
        .enumerate()
        .map(|(i, article)| format!("{}) {}", i + 1, short_summary(article, max_summary_chars)))
        .join("\n");
    let prompt = format!("{BATCH_PROMPT}\n\n{items_text}");

    let Some(raw) = runtime.ask_any(cfg, &prompt).await else {
        error!(
            batch_len = articles.len(),
            "No LLM backend produced a reply; emitting defaults for the batch"
        );
        return vec![Extraction::default(); articles.len()];
    };

    let mut parsed = parse_batch_response(&raw, articles.len());

    // A truncated reply is worth exactly one more attempt.
    if let Err(ref e) = parsed {
        if looks_truncated(e) {
            warn!(error = %e, "Reply looks truncated; re-asking once");
            if let Some(second) = runtime.ask_any(cfg, &prompt).await {
                parsed = parse_batch_response(&second, articles.len());
            }
        }
    }

    match parsed {
        Ok(extractions) => {
            info!(batch_len = articles.len(), "Extracted batch");
            extractions
        }
        Err(e) => {
            warn!(
                error = %e,
                reply_preview = %truncate_for_log(&raw, 300),
                "Model returned non-conforming JSON; emitting defaults for the batch"
            );
            vec![Extraction::default(); articles.len()]
        }
    }
}

/// One digest line for the prompt: headline plus a capped slice of the
/// description (or, failing that, the content), newlines flattened.
fn short_summary(article: &Article, max_chars: usize) -> String {
    let title = normalize_field(article.title.as_ref());
    let description = cap_chars(&normalize_field(article.description.as_ref()), max_chars);
    let content = cap_chars(&normalize_field(article.content.as_ref()), max_chars);

    let summary = if description.is_empty() { content } else { description };
    let summary = summary.replace('\n', " ");
    format!("{title} - {summary}").trim().to_string()
}

fn cap_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Parse a model reply into exactly `expected` extractions.
///
/// Accepts a bare JSON array, a `{"results": [...]}` wrapper, or either of
/// those buried in fences/prose (recovered via the widest bracketed
/// slice). Short arrays are padded with defaults, long ones truncated.
/// The error carries serde's classification so callers can spot
/// truncation.
fn parse_batch_response(raw: &str, expected: usize) -> Result<Vec<Extraction>, serde_json::Error> {
    let elements = parse_reply_elements(raw)?;
    Ok((0..expected)
        .map(|i| {
            elements
                .get(i)
                .map(Extraction::from_value)
                .unwrap_or_default()
        })
        .collect())
}

fn parse_reply_elements(raw: &str) -> Result<Vec<serde_json::Value>, serde_json::Error> {
    match serde_json::from_str::<serde_json::Value>(raw.trim()) {
        Ok(value) => Ok(elements_of(value)),
        Err(outer) => match widest_json_slice(raw) {
            // The inner error is the informative one (EOF on truncation).
            Some(slice) => serde_json::from_str::<serde_json::Value>(slice).map(elements_of),
            None => Err(outer),
        },
    }
}

fn elements_of(value: serde_json::Value) -> Vec<serde_json::Value> {
    match value {
        serde_json::Value::Array(elements) => elements,
        serde_json::Value::Object(mut map) => match map.remove("results") {
            Some(serde_json::Value::Array(elements)) => elements,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
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
    fn test_short_summary_prefers_description() {
        let a = article("Acme raises $5M", "Seed round led by XYZ", "Full body text");
        assert_eq!(short_summary(&a, 400), "Acme raises $5M - Seed round led by XYZ");
    }

    #[test]
    fn test_short_summary_falls_back_to_content() {
        let a = article("Acme raises $5M", "", "Full body text");
        assert_eq!(short_summary(&a, 400), "Acme raises $5M - Full body text");
    }

    #[test]
    fn test_short_summary_flattens_newlines() {
        let a = article("T", "line one\nline two", "");
        assert_eq!(short_summary(&a, 400), "T - line one line two");
    }

    #[test]
    fn test_short_summary_caps_field_length() {
        let a = article("T", &"x".repeat(600), "");
        let summary = short_summary(&a, 20);
        assert_eq!(summary, format!("T - {}", "x".repeat(20)));
    }

    #[test]
    fn test_parse_plain_array() {
        let raw = r#"[{"company_name": "Acme", "category": "Funding", "sentiment_score": 0.5, "is_funding_news": true}]"#;
        let parsed = parse_batch_response(raw, 1).unwrap();
        assert_eq!(parsed[0].company_name.as_deref(), Some("Acme"));
        assert!(parsed[0].is_funding_news);
    }

    #[test]
    fn test_parse_fenced_array() {
        let raw = "```json\n[{\"category\": \"Product\"}]\n```";
        let parsed = parse_batch_response(raw, 1).unwrap();
        assert_eq!(parsed[0].category, "Product");
    }

    #[test]
    fn test_parse_results_wrapper() {
        let raw = r#"{"results": [{"category": "Funding"}, {"category": "Hiring"}]}"#;
        let parsed = parse_batch_response(raw, 2).unwrap();
        assert_eq!(parsed[0].category, "Funding");
        assert_eq!(parsed[1].category, "Hiring");
    }

    #[test]
    fn test_parse_pads_short_arrays() {
        let raw = r#"[{"category": "Funding"}]"#;
        let parsed = parse_batch_response(raw, 3).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[1], Extraction::default());
        assert_eq!(parsed[2], Extraction::default());
    }

    #[test]
    fn test_parse_truncates_long_arrays() {
        let raw = r#"[{"category": "A"}, {"category": "B"}, {"category": "C"}]"#;
        let parsed = parse_batch_response(raw, 2).unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_parse_garbage_is_an_error() {
        assert!(parse_batch_response("the model had opinions instead", 2).is_err());
    }

    #[test]
    fn test_parse_truncated_reply_classifies_as_eof() {
        let raw = r#"[{"company_name": "Acme", "cat"#;
        let err = parse_batch_response(raw, 1).unwrap_err();
        assert!(looks_truncated(&err));
    }

    #[test]
    fn test_parse_non_object_elements_become_defaults() {
        let raw = r#"[42, {"category": "Funding"}]"#;
        let parsed = parse_batch_response(raw, 2).unwrap();
        assert_eq!(parsed[0], Extraction::default());
        assert_eq!(parsed[1].category, "Funding");
    }
}
