//! CSV export, the pipeline's primary output.
//!
//! One row per processed article: the article's own fields flattened to
//! plain strings, followed by the LLM-extracted columns. An empty run
//! still produces the file with its header row, so downstream consumers
//! always find a well-formed CSV.

use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, instrument};

use crate::models::ProcessedArticle;
use crate::text::normalize_field;

/// Column order of the export. Must match the field order of [`CsvRow`].
const HEADERS: [&str; 10] = [
    "source",
    "title",
    "description",
    "content",
    "url",
    "published_at",
    "company_name",
    "category",
    "sentiment_score",
    "is_funding_news",
];

/// The flat row shape written to disk.
#[derive(Debug, Serialize)]
struct CsvRow {
    source: String,
    title: String,
    description: String,
    content: String,
    url: String,
    published_at: String,
    company_name: String,
    category: String,
    sentiment_score: f64,
    is_funding_news: bool,
}

impl From<&ProcessedArticle> for CsvRow {
    fn from(record: &ProcessedArticle) -> Self {
        let article = &record.article;
        let extraction = &record.extraction;
        CsvRow {
            source: article.source.clone().unwrap_or_default(),
            title: normalize_field(article.title.as_ref()),
            description: normalize_field(article.description.as_ref()),
            content: normalize_field(article.content.as_ref()),
            url: article.url.clone().unwrap_or_default(),
            published_at: article.published_at.clone().unwrap_or_default(),
            company_name: extraction.company_name.clone().unwrap_or_default(),
            category: extraction.category.clone(),
            sentiment_score: extraction.sentiment_score,
            is_funding_news: extraction.is_funding_news,
        }
    }
}

/// Write all records to `{output_dir}/{filename}` and return the path.
#[instrument(level = "info", skip(records), fields(count = records.len()))]
pub fn write_rows(
    records: &[ProcessedArticle],
    output_dir: &str,
    filename: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let path = Path::new(output_dir).join(filename);
    let file = std::fs::File::create(&path)?;
    write_into(records, file)?;

    info!(path = %path.display(), count = records.len(), "Wrote CSV export");
    Ok(path)
}

// The header is written explicitly: the serde-driven writer only emits
// one when it sees a record, and an empty run must still produce it.
fn write_into<W: Write>(records: &[ProcessedArticle], out: W) -> Result<(), Box<dyn Error>> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(HEADERS)?;
    for record in records {
        writer.serialize(CsvRow::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Article, Extraction};

    fn record(title: &str, company: Option<&str>) -> ProcessedArticle {
        ProcessedArticle {
            article: Article {
                source: Some("TechCrunch".to_string()),
                title: Some(title.into()),
                description: Some("Seed round closed.".into()),
                content: None,
                url: Some("https://techcrunch.com/acme".to_string()),
                published_at: Some("2025-03-01T09:00:00Z".to_string()),
            },
            extraction: Extraction {
                company_name: company.map(str::to_string),
                category: "Funding".to_string(),
                sentiment_score: 0.6,
                is_funding_news: true,
            },
        }
    }

    fn rows_to_string(records: &[ProcessedArticle]) -> String {
        let mut out = Vec::new();
        write_into(records, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_row_shape() {
        let out = rows_to_string(&[record("Acme raises $5M", Some("Acme"))]);
        let mut lines = out.lines();
        assert_eq!(lines.next().unwrap(), HEADERS.join(","));
        let row = lines.next().unwrap();
        assert!(row.contains("Acme raises $5M"));
        assert!(row.contains("Funding"));
        assert!(row.ends_with("0.6,true"));
    }

    #[test]
    fn test_missing_fields_become_empty_cells() {
        let mut r = record("T", None);
        r.article.url = None;
        let out = rows_to_string(&[r]);
        let row = out.lines().nth(1).unwrap();
        // content, url, and company_name collapse to empty cells
        assert!(row.contains(",,"));
    }

    #[test]
    fn test_empty_input_writes_header_only() {
        let out = rows_to_string(&[]);
        assert_eq!(out.lines().count(), 1);
        assert_eq!(out.lines().next().unwrap(), HEADERS.join(","));
    }

    #[test]
    fn test_write_rows_creates_file() {
        let dir = std::env::temp_dir().join("news_analyst_csv_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = write_rows(&[record("T", None)], dir.to_str().unwrap(), "out.csv").unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
