//! Shared types, error model, and configuration for contentlift.
//!
//! This crate is the foundation depended on by all other contentlift crates.
//! It provides:
//! - [`ContentLiftError`]: the unified error type
//! - Domain types ([`Article`], [`SearchResult`], [`ReferenceArticle`], [`RewriteResult`])
//! - Configuration ([`AppConfig`] and its sections, config loading)
//! - [`first_success`]: the ordered "try each option until one works" loop

pub mod attempt;
pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use attempt::{AttemptFailure, first_success};
pub use config::{
    AppConfig, BROWSER_USER_AGENT, BrowserConfig, ContentStoreConfig, ExtractConfig, LlmConfig,
    PublishConfig, SearchConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from, resolve_secret,
};
pub use error::{ContentLiftError, Result};
pub use types::{Article, ReferenceArticle, ReferenceLink, RewriteResult, SearchResult};
