//! Article sources for the fetch stage.
//!
//! Two sources, tried in order by the pipeline:
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | NewsAPI | [`newsapi`] | `everything` endpoint | Paged, newest-first; needs an API key |
//! | RSS | [`rss`] | any RSS 2.0 feed | Fallback when NewsAPI fails or is unconfigured |
//!
//! Both normalize their raw entries into [`crate::models::Article`], so
//! the rest of the pipeline never sees source-specific shapes. Failed
//! fetches propagate as errors; the pipeline decides whether to fall
//! back or abort.

use std::error::Error;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

pub mod newsapi;
pub mod rss;

/// GET a URL with simple exponential backoff.
///
/// Transient feed/API hiccups are common enough that one attempt is not
/// acceptable, but this is the fetch stage, not the LLM stage: a short
/// fixed ladder (1s, 2s) before giving up is plenty.
pub(crate) async fn get_with_backoff(
    request: reqwest::RequestBuilder,
    max_tries: usize,
) -> Result<reqwest::Response, Box<dyn Error>> {
    let mut delay = Duration::from_secs(1);

    for attempt in 1..=max_tries {
        let request = request
            .try_clone()
            .ok_or("request body is not cloneable for retry")?;
        match request.send().await.and_then(|r| r.error_for_status()) {
            Ok(response) => return Ok(response),
            Err(e) => {
                warn!(attempt, error = %e, "Fetch attempt failed");
                if attempt == max_tries {
                    return Err(Box::new(e));
                }
                sleep(delay).await;
                delay *= 2;
            }
        }
    }
    unreachable!("loop returns on success or final failure")
}
