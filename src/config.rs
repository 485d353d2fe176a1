//! Runtime configuration, loadable from a YAML file.
//!
//! Every knob has a default, so the pipeline runs with no config file at
//! all; a `--config path/to/config.yaml` overrides whichever fields the
//! file names. Secrets (API keys, hosts) never live here; they come from
//! the CLI/environment (see [`crate::cli`]).

use std::error::Error;

use serde::Deserialize;
use tracing::info;

/// Tunables for the whole pipeline run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Minimum information density an article needs to reach the LLM.
    pub hype_threshold: f64,
    /// Articles per LLM call.
    pub batch_size: usize,
    /// Articles per NewsAPI page.
    pub page_size: usize,
    /// Per-field character cap when building the LLM digest lines.
    pub max_summary_chars: usize,
    /// Feed used when NewsAPI is unavailable or unconfigured.
    pub rss_fallback_url: String,
    /// Cap on items taken from the fallback feed.
    pub rss_max_items: usize,
    pub llm: LlmConfig,
}

/// LLM backend settings. Which backend actually runs is decided at call
/// time from the credentials present (see [`crate::llm`]).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LlmConfig {
    /// OpenAI-compatible API base, without the trailing endpoint path.
    pub api_base: String,
    /// Chat model name.
    pub model: String,
    /// Model used on the Ollama fallback path.
    pub ollama_model: String,
    pub temperature: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            hype_threshold: 0.5,
            batch_size: 6,
            page_size: 20,
            max_summary_chars: 400,
            rss_fallback_url: "https://rss.nytimes.com/services/xml/rss/nyt/Technology.xml"
                .to_string(),
            rss_max_items: 50,
            llm: LlmConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            ollama_model: "llama3".to_string(),
            temperature: 0.0,
        }
    }
}

/// Load configuration, falling back to defaults when no path is given.
///
/// A named file that is missing or malformed is an error: silently
/// running with defaults when the operator pointed at a file would hide
/// misconfiguration.
pub fn load_config(path: Option<&str>) -> Result<AppConfig, Box<dyn Error>> {
    match path {
        None => Ok(AppConfig::default()),
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            let config: AppConfig = serde_yaml::from_str(&raw)?;
            info!(path, "Loaded configuration");
            Ok(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = AppConfig::default();
        assert!(config.hype_threshold > 0.0 && config.hype_threshold <= 1.0);
        assert!(config.batch_size > 0);
        assert!(config.rss_fallback_url.starts_with("https://"));
    }

    #[test]
    fn test_yaml_overrides_defaults() {
        let yaml = r#"
hype_threshold: 0.7
batch_size: 10
llm:
  model: gpt-4.1
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.hype_threshold, 0.7);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.llm.model, "gpt-4.1");
        // untouched fields keep their defaults
        assert_eq!(config.page_size, 20);
        assert_eq!(config.llm.ollama_model, "llama3");
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let yaml = "hype_treshold: 0.7\n";
        assert!(serde_yaml::from_str::<AppConfig>(yaml).is_err());
    }

    #[test]
    fn test_missing_file_errors() {
        assert!(load_config(Some("/definitely/not/here.yaml")).is_err());
    }

    #[test]
    fn test_no_path_uses_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.batch_size, AppConfig::default().batch_size);
    }
}
