//! Primary search provider: Google Custom Search JSON API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use contentlift_shared::{ContentLiftError, Result, SearchConfig, SearchResult};

/// Timeout for a single search API call.
const SEARCH_TIMEOUT_SECS: u64 = 30;

/// A web search backend returning results in relevance order.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Search for `query`, asking for at most `num_results` items.
    ///
    /// Returns [`ContentLiftError::NoResults`] when the backend has nothing.
    async fn search(&self, query: &str, num_results: u32) -> Result<Vec<SearchResult>>;

    /// Provider name for logs.
    fn name(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
}

impl From<SearchItem> for SearchResult {
    fn from(item: SearchItem) -> Self {
        Self {
            title: item.title,
            url: item.link,
            snippet: item.snippet,
        }
    }
}

// ---------------------------------------------------------------------------
// GoogleSearchProvider
// ---------------------------------------------------------------------------

/// Custom Search client. Credentials are optional so that a missing key
/// surfaces as a search failure (and triggers the fallback) rather than a
/// startup error.
#[derive(Debug, Clone)]
pub struct GoogleSearchProvider {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    engine_id: Option<String>,
}

impl GoogleSearchProvider {
    pub fn new(
        config: &SearchConfig,
        api_key: Option<String>,
        engine_id: Option<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(SEARCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                ContentLiftError::Network(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            engine_id,
        })
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ContentLiftError::config("search API key is not configured"))?;
        let cx = self
            .engine_id
            .as_deref()
            .ok_or_else(|| ContentLiftError::config("search engine id is not configured"))?;
        Ok((key, cx))
    }
}

#[async_trait]
impl SearchProvider for GoogleSearchProvider {
    #[instrument(skip_all, fields(provider = "google", query = %query))]
    async fn search(&self, query: &str, num_results: u32) -> Result<Vec<SearchResult>> {
        let (key, cx) = self.credentials()?;
        let num = num_results.to_string();

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("key", key), ("cx", cx), ("q", query), ("num", num.as_str())])
            .send()
            .await
            .map_err(|e| ContentLiftError::Network(format!("search request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ContentLiftError::Network(format!(
                "search API returned HTTP {status}: {body}"
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| ContentLiftError::parse(format!("search response: {e}")))?;

        if parsed.items.is_empty() {
            return Err(ContentLiftError::NoResults {
                query: query.to_string(),
            });
        }

        debug!(items = parsed.items.len(), "search API answered");
        let results: Vec<SearchResult> = parsed.items.into_iter().map(Into::into).collect();
        info!(results = results.len(), "search provider returned results");

        Ok(results)
    }

    fn name(&self) -> &'static str {
        "google-custom-search"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer, key: Option<&str>) -> GoogleSearchProvider {
        let config = SearchConfig {
            endpoint: format!("{}/customsearch/v1", server.uri()),
            ..SearchConfig::default()
        };
        GoogleSearchProvider::new(&config, key.map(String::from), Some("engine-1".into())).unwrap()
    }

    #[tokio::test]
    async fn sends_credentials_and_maps_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .and(query_param("key", "k-123"))
            .and(query_param("cx", "engine-1"))
            .and(query_param("q", "Best Coffee Makers 2024"))
            .and(query_param("num", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"title": "Top Picks", "link": "https://a.example.com/top", "snippet": "Our picks"},
                    {"title": "Buying Guide", "link": "https://b.example.com/guide"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let results = provider(&server, Some("k-123"))
            .search("Best Coffee Makers 2024", 10)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "https://a.example.com/top");
        assert_eq!(results[0].snippet, "Our picks");
        assert_eq!(results[1].title, "Buying Guide");
        assert!(results[1].snippet.is_empty());
    }

    #[tokio::test]
    async fn missing_items_is_no_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"searchInformation": {"totalResults": "0"}})),
            )
            .mount(&server)
            .await;

        let err = provider(&server, Some("k"))
            .search("obscure topic", 10)
            .await
            .unwrap_err();
        assert!(matches!(err, ContentLiftError::NoResults { .. }));
    }

    #[tokio::test]
    async fn http_error_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let err = provider(&server, Some("k")).search("q", 10).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("429"));
        assert!(message.contains("quota exceeded"));
    }

    #[tokio::test]
    async fn missing_key_fails_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = provider(&server, None).search("q", 10).await.unwrap_err();
        assert!(matches!(err, ContentLiftError::Config { .. }));
    }
}
