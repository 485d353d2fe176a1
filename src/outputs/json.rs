//! Optional JSON snapshot of the processed records.
//!
//! The CSV is the export of record; the snapshot exists for ad-hoc
//! inspection and for re-export without re-running the pipeline. It is
//! written pretty-printed, one file per run, overwriting the previous
//! snapshot in the same output directory.

use std::error::Error;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{info, instrument};

use crate::models::ProcessedArticle;

const SNAPSHOT_FILENAME: &str = "processed_news.json";

/// Write `{output_dir}/processed_news.json` and return the path.
#[instrument(level = "info", skip(records), fields(count = records.len()))]
pub async fn write_snapshot(
    records: &[ProcessedArticle],
    output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(records)?;
    let path = Path::new(output_dir).join(SNAPSHOT_FILENAME);

    fs::write(&path, json).await?;
    info!(path = %path.display(), count = records.len(), "Wrote JSON snapshot");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Article, Extraction};

    #[tokio::test]
    async fn test_write_snapshot_round_trips() {
        let records = vec![ProcessedArticle {
            article: Article {
                source: Some("TechCrunch".to_string()),
                title: Some("Acme raises $5M".into()),
                description: None,
                content: None,
                url: None,
                published_at: None,
            },
            extraction: Extraction::default(),
        }];

        let dir = std::env::temp_dir().join("news_analyst_json_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = write_snapshot(&records, dir.to_str().unwrap()).await.unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 1);
        assert_eq!(parsed[0]["article"]["source"], "TechCrunch");
        assert_eq!(parsed[0]["extraction"]["category"], "Unknown");
    }
}
