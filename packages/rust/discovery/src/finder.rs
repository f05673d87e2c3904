//! Competitor discovery: search provider first, rendered search page second.

use std::fmt;

use tracing::{debug, info, instrument};
use url::Url;

use contentlift_shared::{
    BrowserConfig, ContentLiftError, Result, SearchConfig, SearchResult, first_success,
};

use crate::browser::{BrowserLauncher, with_browser};
use crate::filter::filter_candidates;
use crate::provider::SearchProvider;
use crate::serp::parse_results;

/// Where competitor candidates come from, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchStrategy {
    Provider,
    Browser,
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider => f.write_str("search-provider"),
            Self::Browser => f.write_str("browser-fallback"),
        }
    }
}

static STRATEGIES: [SearchStrategy; 2] = [SearchStrategy::Provider, SearchStrategy::Browser];

/// Finds competitor articles for a topic.
///
/// The browser is only launched when the provider fails, and is closed
/// before the fallback returns.
pub struct CompetitorFinder {
    provider: Box<dyn SearchProvider>,
    launcher: Box<dyn BrowserLauncher>,
    search: SearchConfig,
    browser: BrowserConfig,
}

impl CompetitorFinder {
    pub fn new(
        provider: Box<dyn SearchProvider>,
        launcher: Box<dyn BrowserLauncher>,
        search: SearchConfig,
        browser: BrowserConfig,
    ) -> Self {
        Self {
            provider,
            launcher,
            search,
            browser,
        }
    }

    /// Return up to `candidate_limit` non-denied results in ranking order.
    ///
    /// Fewer than the limit is not an error here; the caller decides whether
    /// the list is sufficient.
    #[instrument(skip_all, fields(query = %query))]
    pub async fn find(&self, query: &str) -> Result<Vec<SearchResult>> {
        match first_success(&STRATEGIES, |strategy| self.search_with(*strategy, query)).await {
            Ok((strategy, results)) => {
                info!(%strategy, candidates = results.len(), "competitor search complete");
                Ok(results)
            }
            Err(failures) => Err(ContentLiftError::SearchExhausted { failures }),
        }
    }

    async fn search_with(&self, strategy: SearchStrategy, query: &str) -> Result<Vec<SearchResult>> {
        match strategy {
            SearchStrategy::Provider => self.search_provider(query).await,
            SearchStrategy::Browser => self.search_browser(query).await,
        }
    }

    async fn search_provider(&self, query: &str) -> Result<Vec<SearchResult>> {
        let raw = self.provider.search(query, self.search.num_results).await?;
        debug!(provider = self.provider.name(), raw = raw.len(), "filtering provider results");

        Ok(filter_candidates(
            raw,
            &self.search.denylist,
            self.search.candidate_limit,
        ))
    }

    async fn search_browser(&self, query: &str) -> Result<Vec<SearchResult>> {
        let page_url = search_page_url(&self.browser.search_url, query)?;
        let max_results = self.browser.max_results;
        let denylist = self.browser.denylist.clone();
        let limit = self.search.candidate_limit;

        with_browser(self.launcher.as_ref(), move |session| {
            Box::pin(async move {
                let html = session.render(&page_url).await?;
                let raw = parse_results(&html, max_results);
                debug!(raw = raw.len(), "parsed rendered search page");
                Ok(filter_candidates(raw, &denylist, limit))
            })
        })
        .await
    }
}

/// Build `<search_url>?q=<query>` with the query form-encoded.
fn search_page_url(search_url: &str, query: &str) -> Result<String> {
    Url::parse_with_params(search_url, &[("q", query)])
        .map(String::from)
        .map_err(|e| ContentLiftError::config(format!("invalid browser search URL {search_url}: {e}")))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::browser::BrowserSession;
    use crate::provider::GoogleSearchProvider;

    fn load_fixture(name: &str) -> String {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures/search")
            .join(name);
        std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("missing fixture {}: {e}", path.display()))
    }

    fn result(url: &str) -> SearchResult {
        SearchResult {
            title: format!("Title for {url}"),
            url: url.to_string(),
            snippet: String::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Fakes
    // -----------------------------------------------------------------------

    struct FakeProvider {
        outcome: fn(&str) -> Result<Vec<SearchResult>>,
    }

    #[async_trait]
    impl SearchProvider for FakeProvider {
        async fn search(&self, query: &str, _num_results: u32) -> Result<Vec<SearchResult>> {
            (self.outcome)(query)
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    #[derive(Default)]
    struct BrowserLog {
        launched: AtomicUsize,
        closed: AtomicUsize,
        rendered: Mutex<Vec<String>>,
    }

    struct FakeLauncher {
        page: Option<String>,
        log: Arc<BrowserLog>,
    }

    struct FakeSession {
        page: Option<String>,
        log: Arc<BrowserLog>,
    }

    #[async_trait]
    impl BrowserLauncher for FakeLauncher {
        async fn launch(&self) -> Result<Box<dyn BrowserSession>> {
            self.log.launched.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeSession {
                page: self.page.clone(),
                log: Arc::clone(&self.log),
            }))
        }
    }

    #[async_trait]
    impl BrowserSession for FakeSession {
        async fn render(&self, url: &str) -> Result<String> {
            self.log.rendered.lock().unwrap().push(url.to_string());
            self.page
                .clone()
                .ok_or_else(|| ContentLiftError::browser("page crashed"))
        }

        async fn close(&self) -> Result<()> {
            self.log.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn finder(
        provider: Box<dyn SearchProvider>,
        page: Option<String>,
    ) -> (CompetitorFinder, Arc<BrowserLog>) {
        let log = Arc::new(BrowserLog::default());
        let launcher = FakeLauncher {
            page,
            log: Arc::clone(&log),
        };
        let finder = CompetitorFinder::new(
            provider,
            Box::new(launcher),
            SearchConfig::default(),
            BrowserConfig::default(),
        );
        (finder, log)
    }

    fn no_results(query: &str) -> Result<Vec<SearchResult>> {
        Err(ContentLiftError::NoResults {
            query: query.to_string(),
        })
    }

    // -----------------------------------------------------------------------
    // Provider path
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn provider_results_are_filtered_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(load_fixture("custom-search.json")),
            )
            .mount(&server)
            .await;

        let search = SearchConfig {
            endpoint: format!("{}/customsearch/v1", server.uri()),
            ..SearchConfig::default()
        };
        let provider =
            GoogleSearchProvider::new(&search, Some("key".into()), Some("cx".into())).unwrap();
        let (finder, log) = finder(Box::new(provider), None);

        let results = finder.find("Best Coffee Makers 2024").await.unwrap();
        let urls: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();

        assert_eq!(
            urls,
            vec![
                "https://www.example-kitchen.com/best-coffee-makers",
                "https://brewguide.example.org/coffee-makers",
            ]
        );
        assert_eq!(log.launched.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn provider_with_one_survivor_does_not_fall_back() {
        let provider = FakeProvider {
            outcome: |_| {
                Ok(vec![
                    result("https://www.instagram.com/p/coffee"),
                    result("https://one.example.com/post"),
                ])
            },
        };
        let (finder, log) = finder(Box::new(provider), None);

        let results = finder.find("espresso").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(log.launched.load(Ordering::SeqCst), 0);
    }

    // -----------------------------------------------------------------------
    // Browser fallback
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn no_results_triggers_browser_fallback() {
        let provider = FakeProvider { outcome: no_results };
        let page = load_fixture("google-results.html");
        let (finder, log) = finder(Box::new(provider), Some(page));

        let results = finder.find("best coffee makers").await.unwrap();
        let urls: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();

        assert_eq!(
            urls,
            vec![
                "https://www.example-kitchen.com/best-coffee-makers",
                "https://brewguide.example.org/coffee-makers?ref=a&b=c",
            ]
        );
        assert_eq!(log.launched.load(Ordering::SeqCst), 1);
        assert_eq!(log.closed.load(Ordering::SeqCst), 1);
        assert_eq!(
            *log.rendered.lock().unwrap(),
            vec!["https://www.google.com/search?q=best+coffee+makers".to_string()]
        );
    }

    #[tokio::test]
    async fn provider_error_triggers_fallback() {
        let provider = FakeProvider {
            outcome: |_| Err(ContentLiftError::Network("HTTP 403".into())),
        };
        let page = load_fixture("google-results.html");
        let (finder, log) = finder(Box::new(provider), Some(page));

        assert_eq!(finder.find("q").await.unwrap().len(), 2);
        assert_eq!(log.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn browser_released_when_everything_is_filtered() {
        let provider = FakeProvider { outcome: no_results };
        let page = r#"<div class="g"><a href="https://youtube.com/watch?v=1"><h3>Clip</h3></a></div>"#;
        let (finder, log) = finder(Box::new(provider), Some(page.to_string()));

        let results = finder.find("q").await.unwrap();
        assert!(results.is_empty());
        assert_eq!(log.launched.load(Ordering::SeqCst), 1);
        assert_eq!(log.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn browser_released_when_render_fails() {
        let provider = FakeProvider { outcome: no_results };
        let (finder, log) = finder(Box::new(provider), None);

        let err = finder.find("q").await.unwrap_err();
        match err {
            ContentLiftError::SearchExhausted { failures } => {
                assert_eq!(failures.len(), 2);
                assert_eq!(failures[0].option, "search-provider");
                assert_eq!(failures[1].option, "browser-fallback");
                assert!(failures[1].message.contains("page crashed"));
            }
            other => panic!("expected SearchExhausted, got {other:?}"),
        }
        assert_eq!(log.launched.load(Ordering::SeqCst), 1);
        assert_eq!(log.closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn search_page_url_encodes_query() {
        let url = search_page_url("https://www.google.com/search", "café & crema").unwrap();
        assert_eq!(url, "https://www.google.com/search?q=caf%C3%A9+%26+crema");
    }
}
