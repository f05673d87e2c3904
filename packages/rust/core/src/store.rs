//! Client for the external content store's article API.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use contentlift_shared::{Article, ContentLiftError, ContentStoreConfig, Result};

use crate::publish::PublishPayload;

/// Timeout for content store calls.
const STORE_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    articles: Option<ArticlePage>,
}

#[derive(Debug, Deserialize)]
struct ArticlePage {
    #[serde(default)]
    data: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct UpdateResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// ContentStoreClient
// ---------------------------------------------------------------------------

/// Reads the latest article and applies partial updates.
#[derive(Debug, Clone)]
pub struct ContentStoreClient {
    client: Client,
    base_url: String,
}

impl ContentStoreClient {
    pub fn new(config: &ContentStoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(STORE_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                ContentLiftError::Network(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the most recent article.
    ///
    /// Fails with [`ContentLiftError::NoArticle`] when the store reports
    /// failure or has no articles.
    #[instrument(skip_all)]
    pub async fn latest_article(&self) -> Result<Article> {
        let url = format!("{}/articles", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("per_page", "1")])
            .send()
            .await
            .map_err(|e| ContentLiftError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ContentLiftError::Network(format!("{url}: HTTP {status}: {body}")));
        }

        let list: ListResponse = response
            .json()
            .await
            .map_err(|e| ContentLiftError::parse(format!("article list: {e}")))?;

        if !list.success {
            return Err(ContentLiftError::NoArticle);
        }

        let article = list
            .articles
            .and_then(|page| page.data.into_iter().next())
            .ok_or(ContentLiftError::NoArticle)?;

        info!(id = article.id, title = %article.title, "fetched latest article");
        Ok(article)
    }

    /// Send a partial update for article `id`.
    ///
    /// A 2xx answer with `success: false` is a rejection. Returns the
    /// store's view of the updated article when it sends one back.
    #[instrument(skip_all, fields(id = id))]
    pub async fn update_article(&self, id: u64, payload: &PublishPayload) -> Result<Option<Article>> {
        let url = format!("{}/updateArticle/{id}", self.base_url);
        debug!(fields = ?payload.keys(), "sending partial update");

        let response = self
            .client
            .put(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| ContentLiftError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ContentLiftError::Network(format!("{url}: HTTP {status}: {body}")));
        }

        let update: UpdateResponse = response
            .json()
            .await
            .map_err(|e| ContentLiftError::parse(format!("update response: {e}")))?;

        if !update.success {
            return Err(ContentLiftError::PublishRejected {
                article_id: id,
                message: update
                    .message
                    .unwrap_or_else(|| "API returned unsuccessful response".into()),
            });
        }

        info!(id, "article updated");
        Ok(update.data.and_then(|v| serde_json::from_value(v).ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentlift_shared::ReferenceLink;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ContentStoreClient {
        ContentStoreClient::new(&ContentStoreConfig {
            base_url: format!("{}/api/", server.uri()),
        })
        .unwrap()
    }

    fn payload() -> PublishPayload {
        PublishPayload {
            excerpt: Some("Intro".into()),
            full_content: "Intro\n\nBody".into(),
            is_optimized: true,
            reference_articles: vec![ReferenceLink {
                title: "A".into(),
                url: "https://a.example.com".into(),
            }],
            optimized_at: "2026-10-16".into(),
            image: None,
            image_alt: None,
            author_name: None,
            author_url: None,
        }
    }

    #[tokio::test]
    async fn latest_article_reads_first_entry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/articles"))
            .and(query_param("per_page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "articles": {
                    "current_page": 1,
                    "data": [{"id": 42, "title": "Best Coffee Makers 2024", "content": "Old text"}]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let article = client(&server).latest_article().await.unwrap();
        assert_eq!(article.id, 42);
        assert_eq!(article.title, "Best Coffee Makers 2024");
        assert_eq!(article.body(), "Old text");
    }

    #[tokio::test]
    async fn empty_store_is_no_article() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/articles"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "articles": {"data": []}})),
            )
            .mount(&server)
            .await;

        let err = client(&server).latest_article().await.unwrap_err();
        assert!(matches!(err, ContentLiftError::NoArticle));
    }

    #[tokio::test]
    async fn unsuccessful_list_is_no_article() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/articles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
            .mount(&server)
            .await;

        let err = client(&server).latest_article().await.unwrap_err();
        assert!(matches!(err, ContentLiftError::NoArticle));
    }

    #[tokio::test]
    async fn update_puts_payload_and_returns_article() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/updateArticle/42"))
            .and(body_json(json!({
                "excerpt": "Intro",
                "full_content": "Intro\n\nBody",
                "is_optimized": true,
                "reference_articles": [{"title": "A", "url": "https://a.example.com"}],
                "optimized_at": "2026-10-16"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"id": 42, "title": "Updated Title", "content": "Intro\n\nBody"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let updated = client(&server)
            .update_article(42, &payload())
            .await
            .unwrap()
            .expect("store echoes the article");
        assert_eq!(updated.title, "Updated Title");
    }

    #[tokio::test]
    async fn success_false_is_rejection_even_on_200() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/updateArticle/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).update_article(7, &payload()).await.unwrap_err();
        match err {
            ContentLiftError::PublishRejected { article_id, message } => {
                assert_eq!(article_id, 7);
                assert_eq!(message, "API returned unsuccessful response");
            }
            other => panic!("expected PublishRejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_error_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(422).set_body_string("validation failed"))
            .mount(&server)
            .await;

        let err = client(&server).update_article(1, &payload()).await.unwrap_err();
        assert!(matches!(err, ContentLiftError::Network(ref m) if m.contains("validation failed")));
    }
}
