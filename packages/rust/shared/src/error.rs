//! Error types for contentlift.
//!
//! Library crates use [`ContentLiftError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::fmt;
use std::path::PathBuf;

use crate::attempt::AttemptFailure;

/// Top-level error type for all contentlift operations.
#[derive(Debug, thiserror::Error)]
pub enum ContentLiftError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error talking to an external service.
    #[error("network error: {0}")]
    Network(String),

    /// HTML or JSON parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Headless browser launch, render, or shutdown error.
    #[error("browser error: {0}")]
    Browser(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The content store has no article to optimize.
    #[error("no article found in the content store")]
    NoArticle,

    /// The search provider returned zero raw results.
    #[error("no search results found for {query:?}")]
    NoResults { query: String },

    /// Every search strategy (provider and browser fallback) failed.
    #[error("all search strategies failed: {}", FailureList(failures))]
    SearchExhausted { failures: Vec<AttemptFailure> },

    /// Too few competitor URLs survived filtering.
    #[error("found {found} competitor candidates, need at least {required}")]
    InsufficientCandidates { found: usize, required: usize },

    /// Too few competitor pages could be extracted.
    #[error("extracted {found} reference articles, need {required}")]
    InsufficientReferences { found: usize, required: usize },

    /// A single model identifier failed to produce output.
    #[error("model {model} failed: {message}")]
    ModelInvocation { model: String, message: String },

    /// Every configured model identifier failed.
    #[error("no model produced a rewrite: {}", FailureList(failures))]
    NoModelAvailable { failures: Vec<AttemptFailure> },

    /// The content store answered the update with `success: false`.
    #[error("content store rejected update of article {article_id}: {message}")]
    PublishRejected { article_id: u64, message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ContentLiftError>;

impl ContentLiftError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a browser error from any displayable message.
    pub fn browser(msg: impl Into<String>) -> Self {
        Self::Browser(msg.into())
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Renders `[a: x; b: y]` for aggregate failures.
struct FailureList<'a>(&'a [AttemptFailure]);

impl fmt::Display for FailureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{failure}")?;
        }
        f.write_str("]")
    }
}
