//! Turning model output into the partial update sent to the content store.
//!
//! The rewrite's first `#` heading becomes the title and is removed from the
//! body. A references section is appended, an excerpt is derived, and the
//! payload carries only the fields that have a value.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use tracing::{info, instrument};

use contentlift_markdown::demote_duplicate_h1;
use contentlift_shared::types::non_empty;
use contentlift_shared::{Article, ReferenceArticle, ReferenceLink, Result};

use crate::store::ContentStoreClient;

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#[ \t]+(.+)$").expect("valid regex"));

static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Partial update body. Optional fields are omitted when the source is
/// absent or empty, so the store leaves those columns untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    pub full_content: String,
    pub is_optimized: bool,
    pub reference_articles: Vec<ReferenceLink>,
    /// `YYYY-MM-DD`.
    pub optimized_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_url: Option<String>,
}

impl PublishPayload {
    /// Names of the keys that will be sent, in wire order.
    pub fn keys(&self) -> Vec<&'static str> {
        let optional = [
            ("excerpt", self.excerpt.is_some()),
            ("full_content", true),
            ("is_optimized", true),
            ("reference_articles", true),
            ("optimized_at", true),
            ("image", self.image.is_some()),
            ("image_alt", self.image_alt.is_some()),
            ("author_name", self.author_name.is_some()),
            ("author_url", self.author_url.is_some()),
        ];
        optional
            .into_iter()
            .filter_map(|(key, present)| present.then_some(key))
            .collect()
    }
}

/// Everything derived from one rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    /// Title from the rewrite, or the original title when it has none.
    pub title: String,
    pub payload: PublishPayload,
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Split the rewrite into title and body.
///
/// Only the first level-1 heading becomes the title; any later ones are
/// demoted to level 2 so the body never carries a second title.
fn split_title(markdown: &str) -> (Option<String>, String) {
    let markdown = demote_duplicate_h1(markdown);
    let Some(caps) = TITLE_RE.captures(&markdown) else {
        return (None, markdown.trim().to_string());
    };

    let title = caps[1].trim().to_string();
    let line = caps.get(0).map_or(0..0, |m| m.range());
    let body = format!("{}{}", &markdown[..line.start], &markdown[line.end..]);
    let body = BLANK_RUN_RE.replace_all(&body, "\n\n");
    (Some(title), body.trim().to_string())
}

/// The fixed references section appended to every published body.
pub fn references_section(references: &[ReferenceArticle], today: NaiveDate) -> String {
    let links: Vec<String> = references
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. [{}]({})", i + 1, r.title, r.url))
        .collect();

    format!(
        "\n\n---\n\n## References\n\n\
         This article was optimized based on analysis of top-ranking content:\n\n\
         {}\n\n\
         *Last updated: {}*\n",
        links.join("\n"),
        today.format("%-m/%-d/%Y")
    )
}

/// First non-empty line that is not a heading, cut to `max_chars` characters.
pub fn derive_excerpt(body: &str, max_chars: usize) -> Option<String> {
    body.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.chars().take(max_chars).collect())
}

/// Builds the publication from a rewrite and submits it.
#[derive(Debug, Clone)]
pub struct PublishAssembler {
    excerpt_chars: usize,
}

impl PublishAssembler {
    pub fn new(excerpt_chars: usize) -> Self {
        Self { excerpt_chars }
    }

    /// Derive title, body, excerpt and payload. Pure; `today` stamps the
    /// references section and `optimized_at`.
    pub fn assemble(
        &self,
        article: &Article,
        markdown: &str,
        references: &[ReferenceArticle],
        today: NaiveDate,
    ) -> Publication {
        let (title, body) = split_title(markdown);
        let excerpt = derive_excerpt(&body, self.excerpt_chars);
        let full_content = format!("{body}{}", references_section(references, today));

        let payload = PublishPayload {
            excerpt,
            full_content,
            is_optimized: true,
            reference_articles: references.iter().map(ReferenceArticle::link).collect(),
            optimized_at: today.format("%Y-%m-%d").to_string(),
            image: non_empty(&article.image).map(str::to_owned),
            image_alt: non_empty(&article.image_alt).map(str::to_owned),
            author_name: non_empty(&article.author_name).map(str::to_owned),
            author_url: non_empty(&article.author_url).map(str::to_owned),
        };

        Publication {
            title: title.unwrap_or_else(|| article.title.clone()),
            payload,
        }
    }

    /// Assemble and send the update. The store is written exactly once.
    #[instrument(skip_all, fields(article_id = article.id))]
    pub async fn publish(
        &self,
        store: &ContentStoreClient,
        article: &Article,
        markdown: &str,
        references: &[ReferenceArticle],
        today: NaiveDate,
    ) -> Result<Publication> {
        let Publication { title, payload } = self.assemble(article, markdown, references, today);
        info!(fields = %payload.keys().join(", "), "publishing update");

        let stored = store.update_article(article.id, &payload).await?;
        let title = stored
            .map(|a| a.title)
            .filter(|t| !t.is_empty())
            .unwrap_or(title);

        Ok(Publication { title, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 7).unwrap()
    }

    fn references() -> Vec<ReferenceArticle> {
        vec![
            ReferenceArticle {
                title: "Kitchen Picks".into(),
                url: "https://a.example.com/picks".into(),
                content: "long text a".into(),
            },
            ReferenceArticle {
                title: "Buying Guide".into(),
                url: "https://b.example.com/guide".into(),
                content: "long text b".into(),
            },
        ]
    }

    fn article() -> Article {
        Article {
            id: 3,
            title: "Best Coffee Makers 2024".into(),
            content: Some("old".into()),
            ..Default::default()
        }
    }

    #[test]
    fn title_is_taken_from_first_heading_and_removed() {
        let publication = PublishAssembler::new(250).assemble(
            &article(),
            "# New Title\n\nIntro text...\n\n## Section\n\nMore",
            &references(),
            today(),
        );

        assert_eq!(publication.title, "New Title");
        let body = &publication.payload.full_content;
        assert!(body.starts_with("Intro text...\n\n## Section\n\nMore"));
        assert!(!body.contains("# New Title"));
        assert_eq!(publication.payload.excerpt.as_deref(), Some("Intro text..."));
    }

    #[test]
    fn references_section_lists_links_and_date() {
        let section = references_section(&references(), today());
        assert_eq!(
            section,
            "\n\n---\n\n## References\n\n\
             This article was optimized based on analysis of top-ranking content:\n\n\
             1. [Kitchen Picks](https://a.example.com/picks)\n\
             2. [Buying Guide](https://b.example.com/guide)\n\n\
             *Last updated: 3/7/2026*\n"
        );
    }

    #[test]
    fn missing_heading_keeps_original_title() {
        let publication =
            PublishAssembler::new(250).assemble(&article(), "Just a body.", &references(), today());
        assert_eq!(publication.title, "Best Coffee Makers 2024");
        assert!(publication.payload.full_content.starts_with("Just a body."));
    }

    #[test]
    fn later_top_level_headings_are_demoted() {
        let publication = PublishAssembler::new(250).assemble(
            &article(),
            "Preamble line\n\n# Real Title\n\nIntro\n\n# Stray Heading\n\nText",
            &references(),
            today(),
        );
        let body = &publication.payload.full_content;
        assert_eq!(publication.title, "Real Title");
        assert!(body.starts_with("Preamble line"));
        assert!(body.contains("\n## Stray Heading\n"));
        assert!(!body.contains("# Real Title"));
    }

    #[test]
    fn removing_inner_title_leaves_single_blank_line() {
        let publication = PublishAssembler::new(250).assemble(
            &article(),
            "Preamble line\n\n# Real Title\n\nIntro",
            &references(),
            today(),
        );
        assert!(publication
            .payload
            .full_content
            .starts_with("Preamble line\n\nIntro\n\n---"));
    }

    #[test]
    fn excerpt_skips_headings_and_is_capped() {
        let long_line = "x".repeat(400);
        let markdown = format!("# T\n\n## Lead\n\n{long_line}\n");
        let publication = PublishAssembler::new(250).assemble(&article(), &markdown, &references(), today());
        assert_eq!(publication.payload.excerpt.as_deref().map(str::len), Some(250));
    }

    #[test]
    fn heading_only_body_has_no_excerpt() {
        assert_eq!(derive_excerpt("## Only\n\n### Headings", 250), None);
    }

    #[test]
    fn payload_omits_falsy_optionals() {
        let source = Article {
            image: Some("https://cdn.example.com/a.jpg".into()),
            image_alt: Some(String::new()),
            author_name: Some("Dana".into()),
            author_url: None,
            ..article()
        };
        let publication =
            PublishAssembler::new(250).assemble(&source, "# T\n\nIntro", &references(), today());
        let value = serde_json::to_value(&publication.payload).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object["image"], json!("https://cdn.example.com/a.jpg"));
        assert_eq!(object["author_name"], json!("Dana"));
        assert!(!object.contains_key("image_alt"));
        assert!(!object.contains_key("author_url"));
        assert!(!object.contains_key("title"));
        assert_eq!(object["is_optimized"], json!(true));
        assert_eq!(object["optimized_at"], json!("2026-03-07"));
        assert_eq!(
            object["reference_articles"],
            json!([
                {"title": "Kitchen Picks", "url": "https://a.example.com/picks"},
                {"title": "Buying Guide", "url": "https://b.example.com/guide"}
            ])
        );
        assert_eq!(
            publication.payload.keys(),
            vec![
                "excerpt",
                "full_content",
                "is_optimized",
                "reference_articles",
                "optimized_at",
                "image",
                "author_name"
            ]
        );
    }

    #[test]
    fn mandatory_fields_present_for_bare_article() {
        let publication =
            PublishAssembler::new(250).assemble(&article(), "## Only headings", &references(), today());
        let value = serde_json::to_value(&publication.payload).unwrap();
        let object = value.as_object().unwrap();

        assert!(!object.contains_key("excerpt"));
        for key in ["full_content", "is_optimized", "reference_articles", "optimized_at"] {
            assert!(object.contains_key(key), "missing {key}");
        }
    }
}
