//! Denylist filtering of search candidates.

use contentlift_shared::SearchResult;

/// `true` when any denylist pattern occurs in the lowercased URL.
pub fn is_denied(url: &str, denylist: &[String]) -> bool {
    let url = url.to_lowercase();
    denylist
        .iter()
        .any(|pattern| url.contains(&pattern.to_lowercase()))
}

/// Drop denied URLs and keep the first `limit` survivors in their original order.
pub fn filter_candidates<I>(results: I, denylist: &[String], limit: usize) -> Vec<SearchResult>
where
    I: IntoIterator<Item = SearchResult>,
{
    results
        .into_iter()
        .filter(|result| !is_denied(&result.url, denylist))
        .take(limit)
        .collect()
}
