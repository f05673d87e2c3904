//! Domain types that flow between pipeline stages.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Article
// ---------------------------------------------------------------------------

/// Read-only snapshot of an article held by the content store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Article {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub image_alt: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_url: Option<String>,
}

impl Article {
    /// Text used as the rewrite source: full content, else the excerpt.
    pub fn body(&self) -> &str {
        non_empty(&self.content)
            .or_else(|| non_empty(&self.excerpt))
            .unwrap_or("")
    }
}

/// `Some(s)` only when the field holds a non-empty string.
pub fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Search and references
// ---------------------------------------------------------------------------

/// A competitor candidate returned by a search strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: String,
}

/// A search result enriched with its extracted page text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceArticle {
    pub title: String,
    pub url: String,
    /// Structured text from the extractor; never empty.
    pub content: String,
}

impl ReferenceArticle {
    /// The persisted form: title and URL only.
    pub fn link(&self) -> ReferenceLink {
        ReferenceLink {
            title: self.title.clone(),
            url: self.url.clone(),
        }
    }
}

/// Title + URL pair sent to the content store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceLink {
    pub title: String,
    pub url: String,
}

// ---------------------------------------------------------------------------
// RewriteResult
// ---------------------------------------------------------------------------

/// Output of the rewrite engine for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteResult {
    /// Markdown produced by the model, untouched.
    pub markdown_body: String,
    /// Identifier of the model that produced it.
    pub model_used: String,
}
