//! HTML-to-structured-text conversion for competitor pages.
//!
//! Strips page chrome, picks the main content region, and renders its
//! headings, paragraphs, list items and quotes as markdown-flavored lines.
//! The result feeds a model prompt, so it is normalized and size-capped.

mod cleanup;

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};

use contentlift_shared::ExtractConfig;

pub use cleanup::{TRUNCATION_MARKER, demote_duplicate_h1};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Thresholds for region selection and output size.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// A region is accepted once its converted text exceeds this many characters.
    pub min_region_chars: usize,
    /// Text nodes shorter than this are skipped as boilerplate.
    pub min_node_chars: usize,
    /// Hard cap on the final text (the ellipsis marker is added on top).
    pub max_chars: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::from(&ExtractConfig::default())
    }
}

impl From<&ExtractConfig> for ExtractOptions {
    fn from(config: &ExtractConfig) -> Self {
        Self {
            min_region_chars: config.min_region_chars,
            min_node_chars: config.min_node_chars,
            max_chars: config.max_chars,
        }
    }
}

/// Result of extracting one HTML document.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Normalized structured text.
    pub text: String,
    /// Selector of the accepted region, or `"body"`.
    pub region: &'static str,
}

// ---------------------------------------------------------------------------
// Selectors
// ---------------------------------------------------------------------------

/// Subtrees removed before conversion.
const NOISE_SELECTOR: &str = "script, style, nav, header, footer, aside, \
     .advertisement, .ad, .social-share, .comments, .related-posts";

/// Candidate content regions in priority order.
pub const CONTENT_SELECTORS: [&str; 7] = [
    "article",          // Semantic article container
    ".post-content",    // WordPress themes
    ".entry-content",   // WordPress core
    ".article-content", // Common CMS
    ".content",         // Generic
    "main",             // HTML5 semantic
    "[role=\"main\"]",  // ARIA landmark
];

/// Elements that produce output lines.
const BLOCK_SELECTOR: &str = "h1, h2, h3, h4, h5, h6, p, li, blockquote";

static NOISE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(NOISE_SELECTOR).expect("valid selector"));

static BLOCKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(BLOCK_SELECTOR).expect("valid selector"));

static BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("valid selector"));

static REGIONS: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    CONTENT_SELECTORS
        .iter()
        .map(|s| (*s, Selector::parse(s).expect("valid selector")))
        .collect()
});

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Convert a full HTML document into normalized structured text.
///
/// 1. Remove noise subtrees (scripts, chrome, ads, comments)
/// 2. Convert the first match of each content selector, in priority order,
///    accepting the first whose text exceeds `min_region_chars`
/// 3. Fall back to the whole `<body>` when no region qualifies
/// 4. Collapse blank-line runs, trim, and cap at `max_chars`
#[instrument(skip_all, fields(html_len = html.len()))]
pub fn extract(html: &str, opts: &ExtractOptions) -> Extraction {
    let mut doc = Html::parse_document(html);
    strip_noise(&mut doc);

    let (region, raw) = select_region(&doc, opts);
    let text = cleanup::run_pipeline(&raw, opts.max_chars);

    debug!(region, chars = text.chars().count(), "extraction complete");

    Extraction { text, region }
}

/// Detach every noise subtree from the document.
fn strip_noise(doc: &mut Html) {
    let ids: Vec<_> = doc.select(&NOISE).map(|el| el.id()).collect();

    for id in ids {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Pick the accepted region and return its converted (uncleaned) text.
fn select_region(doc: &Html, opts: &ExtractOptions) -> (&'static str, String) {
    for (name, selector) in REGIONS.iter() {
        let Some(element) = doc.select(selector).next() else {
            continue;
        };

        let text = convert_element(element, opts.min_node_chars);
        let len = text.chars().count();
        if len > opts.min_region_chars {
            return (*name, text);
        }
        debug!(region = *name, len, "region too short, trying next selector");
    }

    let text = doc
        .select(&BODY)
        .next()
        .map(|body| convert_element(body, opts.min_node_chars))
        .unwrap_or_default();

    ("body", text)
}

/// Render the block descendants of `region` in document order.
pub fn convert_element(region: ElementRef<'_>, min_node_chars: usize) -> String {
    let mut parts: Vec<String> = Vec::new();

    for el in region.select(&BLOCKS) {
        if el.id() == region.id() {
            continue;
        }

        let raw: String = el.text().collect();
        let text = raw.trim();
        if text.is_empty() || text.chars().count() < min_node_chars {
            continue;
        }

        let line = match el.value().name() {
            "h1" => format!("# {text}\n"),
            "h2" => format!("## {text}\n"),
            "h3" => format!("### {text}\n"),
            "h4" => format!("#### {text}\n"),
            "h5" | "h6" => format!("##### {text}\n"),
            "p" if parent_name(el) == Some("li") => continue,
            "p" => format!("{text}\n"),
            "li" if parent_name(el) == Some("ol") => format!("1. {text}\n"),
            "li" => format!("• {text}\n"),
            "blockquote" => format!("> {text}\n"),
            _ => continue,
        };
        parts.push(line);
    }

    parts.join("\n")
}

fn parent_name<'a>(el: ElementRef<'a>) -> Option<&'a str> {
    el.parent()
        .and_then(ElementRef::wrap)
        .map(|parent| parent.value().name())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
