//! Post-conversion cleanup pipeline for structured text.
//!
//! Each cleanup pass is a function `&str -> String` applied in sequence.

use std::sync::LazyLock;

use regex::Regex;

/// Marker appended when text is cut at the size cap.
pub const TRUNCATION_MARKER: &str = "...";

/// Run the full cleanup pipeline on converted text.
pub(crate) fn run_pipeline(text: &str, max_chars: usize) -> String {
    let mut result = normalize_whitespace(text);

    result = collapse_blank_lines(&result);
    result = result.trim().to_string();
    result = truncate_chars(&result, max_chars);

    result
}

// ---------------------------------------------------------------------------
// Pass 1: Normalize whitespace
// ---------------------------------------------------------------------------

/// Strip trailing whitespace so whitespace-only lines become truly blank.
fn normalize_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Pass 2: Collapse blank lines
// ---------------------------------------------------------------------------

/// Collapse any run of 3+ newlines into a single blank line.
fn collapse_blank_lines(text: &str) -> String {
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

    MULTI_BLANK_RE.replace_all(text, "\n\n").to_string()
}

// ---------------------------------------------------------------------------
// Pass 3: Truncate
// ---------------------------------------------------------------------------

/// Cut to `max_chars` characters and append [`TRUNCATION_MARKER`].
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{TRUNCATION_MARKER}", &text[..byte_idx]),
        None => text.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Heading normalization
// ---------------------------------------------------------------------------

/// Demote every level-1 heading after the first to level 2.
pub fn demote_duplicate_h1(md: &str) -> String {
    static H1_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^#[ \t]+(.+)$").expect("valid regex"));

    let mut seen_h1 = false;
    let mut lines: Vec<String> = Vec::new();

    for line in md.lines() {
        match H1_RE.captures(line) {
            Some(caps) if seen_h1 => lines.push(format!("## {}", &caps[1])),
            Some(_) => {
                seen_h1 = true;
                lines.push(line.to_string());
            }
            None => lines.push(line.to_string()),
        }
    }

    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
