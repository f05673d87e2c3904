//! Reference page fetching and text extraction.
//!
//! [`PageFetcher`] downloads a competitor page with a browser user-agent and
//! a bounded timeout. [`HtmlExtractor`] turns that page into structured text
//! via `contentlift-markdown`. Extraction failures are never fatal: callers
//! receive `None` and move on to the next candidate.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use contentlift_markdown::ExtractOptions;
use contentlift_shared::{ContentLiftError, ExtractConfig, Result};

// ---------------------------------------------------------------------------
// PageFetcher
// ---------------------------------------------------------------------------

/// HTTP client for competitor pages.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    /// Build a fetcher using the timeout and user-agent from `config`.
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                ContentLiftError::Network(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client })
    }

    /// Fetch `url` and return the response body. Non-2xx statuses are errors.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        debug!(%url, "fetching page");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ContentLiftError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContentLiftError::Network(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| ContentLiftError::Network(format!("{url}: body read failed: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Extraction seam
// ---------------------------------------------------------------------------

/// Anything that can turn a URL into reference text.
///
/// `None` means "skip this candidate"; it is not an error.
#[async_trait]
pub trait ReferenceExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Option<String>;
}

// ---------------------------------------------------------------------------
// HtmlExtractor
// ---------------------------------------------------------------------------

/// Fetches a page and converts its main content region to structured text.
#[derive(Debug, Clone)]
pub struct HtmlExtractor {
    fetcher: PageFetcher,
    options: ExtractOptions,
}

impl HtmlExtractor {
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        Ok(Self {
            fetcher: PageFetcher::new(config)?,
            options: ExtractOptions::from(config),
        })
    }
}

#[async_trait]
impl ReferenceExtractor for HtmlExtractor {
    #[instrument(skip_all, fields(url = %url))]
    async fn extract(&self, url: &str) -> Option<String> {
        let html = match self.fetcher.fetch(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, "reference fetch failed, skipping");
                return None;
            }
        };

        let extraction = contentlift_markdown::extract(&html, &self.options);
        if extraction.text.is_empty() {
            warn!(region = extraction.region, "page produced no text, skipping");
            return None;
        }

        info!(
            region = extraction.region,
            chars = extraction.text.chars().count(),
            "extracted reference text"
        );
        Some(extraction.text)
    }
}
