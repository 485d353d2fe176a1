//! # News Analyst
//!
//! A news analysis pipeline that fetches articles for a search query,
//! strips out duplicates and promotional fluff, extracts structured
//! company signals through an LLM, and exports the merged result to CSV.
//!
//! ## Features
//!
//! - Fetches articles from the NewsAPI `everything` endpoint (paged,
//!   newest-first), with an RSS-feed fallback when the API is down or
//!   unconfigured
//! - Deduplicates near-identical stories by fingerprinting a prefix of
//!   their normalized text
//! - Drops low-information articles with a density heuristic before they
//!   cost LLM tokens
//! - Extracts company name, category, sentiment, and a funding flag via
//!   an OpenAI-compatible API, falling back to local Ollama
//! - Writes a CSV export (and optionally a JSON snapshot)
//!
//! ## Usage
//!
//! ```sh
//! NEWSAPI_KEY=... OPENAI_API_KEY=... news_analyst -q "AI startups" -p 2
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Fetching**: Download one batch of articles (NewsAPI → RSS fallback)
//! 2. **Deduplication**: Keep the first article per content fingerprint
//! 3. **Hype filtering**: Gate articles on information density
//! 4. **Extraction**: Send survivors to the LLM in fixed-size batches
//! 5. **Export**: Merge extractions and write CSV/JSON

use std::error::Error;
use std::time::Duration;

use clap::Parser;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod dedupe;
mod hype;
mod llm;
mod models;
mod outputs;
mod sources;
mod text;
mod utils;

use cli::Cli;
use llm::LlmRuntime;
use models::{Article, ProcessedArticle};
use text::normalize_field;
use utils::ensure_writable_dir;

/// Pause between LLM batches, to avoid hammering the API in bursts.
const BATCH_PAUSE: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_analyst starting up");

    // Parse CLI and merge config
    let args = Cli::parse();
    debug!(?args.query, ?args.pages, ?args.output_dir, "Parsed CLI arguments");

    let mut config = config::load_config(args.config.as_deref())?;
    if let Some(threshold) = args.hype_threshold {
        config.hype_threshold = threshold;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(ref model) = args.model {
        config.llm.model = model.clone();
    }
    info!(
        hype_threshold = config.hype_threshold,
        batch_size = config.batch_size,
        "Effective configuration"
    );

    // Early check: ensure the output dir is writable
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()?;

    // ---- Fetch one batch of articles ----
    let articles = fetch_articles(&http, &args, &config).await?;
    info!(count = articles.len(), "Raw articles fetched");

    // ---- Dedupe early, before anything expensive ----
    let unique = dedupe::deduplicate(articles);

    // ---- Hype filter: drop low-info articles to save tokens ----
    let mut filtered = Vec::new();
    for article in unique {
        let summary = format!(
            "{} {}",
            normalize_field(article.description.as_ref()),
            normalize_field(article.content.as_ref())
        );
        if !hype::is_high_info(Some(&summary), config.hype_threshold) {
            info!(
                title = %normalize_field(article.title.as_ref()),
                "Hype filter: dropping low-info article"
            );
            continue;
        }
        filtered.push(article);
    }
    info!(count = filtered.len(), "Articles remaining after hype filter");

    // ---- Extract in batches and merge ----
    let runtime = LlmRuntime {
        http,
        openai_api_key: args.openai_api_key.clone(),
        ollama_host: args.ollama_host.clone(),
        prefer_ollama: args.use_ollama,
    };

    let mut processed: Vec<ProcessedArticle> = Vec::new();
    let batch_count = filtered.len().div_ceil(config.batch_size.max(1));
    for (batch_idx, batch) in filtered.chunks(config.batch_size.max(1)).enumerate() {
        info!(
            batch = batch_idx + 1,
            of = batch_count,
            size = batch.len(),
            "Processing batch"
        );
        let batch_t0 = std::time::Instant::now();
        let extractions =
            llm::extract_batch(&runtime, &config.llm, batch, config.max_summary_chars).await;
        info!(
            batch = batch_idx + 1,
            elapsed_ms = batch_t0.elapsed().as_millis() as u128,
            "Batch processed"
        );

        for (article, extraction) in batch.iter().cloned().zip(extractions) {
            processed.push(ProcessedArticle { article, extraction });
        }

        if batch_idx + 1 < batch_count {
            tokio::time::sleep(BATCH_PAUSE).await;
        }
    }

    if processed.is_empty() {
        info!("No articles to process after filtering");
    }

    // ---- Export ----
    let csv_path = outputs::csv::write_rows(&processed, &args.output_dir, &args.csv_filename)?;
    if args.json_snapshot {
        outputs::json::write_snapshot(&processed, &args.output_dir).await?;
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        processed = processed.len(),
        csv = %csv_path.display(),
        "Pipeline finished"
    );

    Ok(())
}

/// Fetch the run's article batch: NewsAPI pages when a key is present,
/// the configured RSS feed otherwise or on failure. Page order is
/// preserved so the deduplicator sees newest articles first.
async fn fetch_articles(
    http: &reqwest::Client,
    args: &Cli,
    config: &config::AppConfig,
) -> Result<Vec<Article>, Box<dyn Error>> {
    if let Some(api_key) = &args.newsapi_key {
        match fetch_newsapi_pages(http, api_key, args, config).await {
            Ok(articles) => return Ok(articles),
            Err(e) => {
                warn!(error = %e, "Primary fetch failed; falling back to RSS");
            }
        }
    } else {
        warn!("NEWSAPI_KEY not set; falling back to RSS");
    }

    sources::rss::fetch_feed(http, &config.rss_fallback_url, config.rss_max_items).await
}

async fn fetch_newsapi_pages(
    http: &reqwest::Client,
    api_key: &str,
    args: &Cli,
    config: &config::AppConfig,
) -> Result<Vec<Article>, Box<dyn Error>> {
    let mut articles = Vec::new();
    for page in 1..=args.pages.max(1) {
        let batch =
            sources::newsapi::fetch_page(http, api_key, &args.query, page, config.page_size)
                .await?;
        articles.extend(batch);
    }
    Ok(articles)
}
