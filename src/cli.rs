//! Command-line interface definitions for News Analyst.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Secrets and hosts can be provided via environment variables.

use clap::Parser;

/// Command-line arguments for the News Analyst pipeline.
///
/// # Examples
///
/// ```sh
/// # Basic usage: fetch one page for the default query, write data/final_output.csv
/// news_analyst
///
/// # Wider sweep with a custom query and stricter hype filter
/// news_analyst -q "fintech funding" -p 3 --hype-threshold 0.7
///
/// # Local extraction via Ollama
/// OLLAMA_HOST=http://localhost:11434 news_analyst --use-ollama
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// NewsAPI search query
    #[arg(short, long, default_value = "AI startups")]
    pub query: String,

    /// Number of NewsAPI result pages to fetch
    #[arg(short, long, default_value_t = 1)]
    pub pages: usize,

    /// Output directory for CSV/JSON files
    #[arg(short, long, default_value = "data")]
    pub output_dir: String,

    /// File name of the CSV export inside the output directory
    #[arg(long, default_value = "final_output.csv")]
    pub csv_filename: String,

    /// Also write a processed_news.json snapshot next to the CSV
    #[arg(long)]
    pub json_snapshot: bool,

    /// Optional path to a config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the configured hype threshold
    #[arg(long)]
    pub hype_threshold: Option<f64>,

    /// Override the configured articles-per-LLM-call batch size
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Override the configured chat model name
    #[arg(long, env = "MODEL_NAME")]
    pub model: Option<String>,

    /// Prefer the Ollama backend even when an OpenAI key is present
    #[arg(long)]
    pub use_ollama: bool,

    /// NewsAPI key; without it the run goes straight to the RSS fallback
    #[arg(long, env = "NEWSAPI_KEY", hide_env_values = true)]
    pub newsapi_key: Option<String>,

    /// OpenAI-compatible API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Ollama host, e.g. http://localhost:11434
    #[arg(long, env = "OLLAMA_HOST")]
    pub ollama_host: Option<String>,
}
