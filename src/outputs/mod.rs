//! Export modules for processed articles.
//!
//! # Submodules
//!
//! - [`csv`]: The primary export, one row per processed article
//! - [`json`]: Optional pretty-printed snapshot of the same records
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── final_output.csv       # always written
//! └── processed_news.json    # only with --json-snapshot
//! ```

pub mod csv;
pub mod json;
