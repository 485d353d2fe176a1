//! Utility functions for logging, LLM-response recovery, and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - String truncation for log output
//! - JSON error detection and substring recovery for sloppy LLM responses
//! - File system validation for the output directory

use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` bytes with an ellipsis and byte
/// count indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut cut = max;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
    }
}

/// Detect if a serde_json error indicates truncated/incomplete JSON.
///
/// When an LLM response is cut off (token limits, mid-stream failures),
/// parsing fails with an EOF error. Those cases are worth one re-ask;
/// other parse failures are not.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Find the widest bracket-delimited slice of `raw`.
///
/// Models wrap JSON in code fences or prose more often than they should.
/// This takes everything from the first `[`/`{` to the last `]`/`}` so the
/// inner payload can be parsed on its own. Returns `None` when no
/// plausible window exists.
pub fn widest_json_slice(raw: &str) -> Option<&str> {
    let start = raw.find(['[', '{'])?;
    let end = raw.rfind([']', '}'])?;
    if end > start {
        Some(&raw[start..=end])
    } else {
        None
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then performs a write test by creating
/// and immediately deleting a probe file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
