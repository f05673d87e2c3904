//! Parsing of a rendered search results page.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

use contentlift_shared::SearchResult;

static RESULT_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.g").expect("valid selector"));
static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h3").expect("valid selector"));
static LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));
static SNIPPET: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".VwiC3b").expect("valid selector"));

/// Parse up to `max_results` visible result blocks.
///
/// Blocks without a title or an absolute link are skipped; they do not
/// count toward the limit.
pub fn parse_results(html: &str, max_results: usize) -> Vec<SearchResult> {
    let doc = Html::parse_document(html);

    doc.select(&RESULT_BLOCK)
        .filter_map(|block| {
            let title = block
                .select(&TITLE)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .filter(|t| !t.is_empty())?;

            let href = block.select(&LINK).next()?.value().attr("href")?;
            let url = resolve_link(href)?;

            let snippet = block
                .select(&SNIPPET)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .unwrap_or_default();

            Some(SearchResult {
                title,
                url,
                snippet,
            })
        })
        // Counts valid results only; skipped blocks never use up the limit.
        .take(max_results)
        .collect()
}

/// Resolve a result href to its target URL.
///
/// Redirect-wrapped links (`/url?q=<target>&...`) are unwrapped; other
/// relative links are dropped.
fn resolve_link(href: &str) -> Option<String> {
    if href.starts_with("/url?") {
        let wrapped = Url::parse("https://redirect.invalid").ok()?.join(href).ok()?;
        let target = wrapped
            .query_pairs()
            .find(|(k, _)| k == "q" || k == "url")
            .map(|(_, v)| v.into_owned())?;
        return is_absolute_http(&target).then_some(target);
    }

    is_absolute_http(href).then(|| href.to_string())
}

fn is_absolute_http(link: &str) -> bool {
    link.starts_with("http://") || link.starts_with("https://")
}
