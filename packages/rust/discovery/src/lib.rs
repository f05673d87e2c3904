//! Competitor discovery for contentlift.
//!
//! Given a topic, find a small ordered set of competing articles:
//! - [`SearchProvider`] / [`GoogleSearchProvider`]: the primary search API
//! - [`BrowserLauncher`] / [`ChromeLauncher`]: headless rendering of a public
//!   results page when the provider fails
//! - [`filter_candidates`]: denylist filter + take-first-N, shared by both paths
//! - [`CompetitorFinder`]: ties the above together

mod browser;
mod filter;
mod finder;
mod provider;
mod serp;

pub use browser::{BrowserLauncher, BrowserSession, ChromeLauncher, SessionFuture, with_browser};
pub use filter::{filter_candidates, is_denied};
pub use finder::CompetitorFinder;
pub use provider::{GoogleSearchProvider, SearchProvider};
pub use serp::parse_results;
