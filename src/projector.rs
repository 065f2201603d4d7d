//! Plain-text projection of article HTML.
//!
//! [`project`] defines what text a reviewer actually sees. Every position in
//! the crate is expressed against its output, never against raw HTML.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::model::{HtmlPosition, PlainTextPosition};

/// Comments plus script/style blocks, contents included. Unterminated
/// comments swallow the rest of the input.
static HIDDEN_BLOCKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<!--.*?(?:-->|$)|<script\b.*?(?:</script\s*>|$)|<style\b.*?(?:</style\s*>|$)")
        .expect("hidden block pattern is valid")
});

/// Any tag, including ones missing their closing `>`. A `<` must be
/// followed by a tag name (optionally after `/`), `!` or `?` to count, so
/// "a < b" survives.
static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</?([A-Za-z][A-Za-z0-9-]*)[^>]*(?:>|$)|<[!?][^>]*(?:>|$)")
        .expect("tag pattern is valid")
});

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z][A-Za-z0-9]{1,31});")
        .expect("entity pattern is valid")
});

/// A URL scheme or `www.` prefix followed by URL characters only, so the
/// match stops at CJK punctuation and text.
static BARE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:https?://|www\.)[A-Za-z0-9\-._~:/?#\[\]@!$&'()*+,;=%]+")
        .expect("url pattern is valid")
});

/// Sentence punctuation that ends a URL match but belongs to the prose.
const URL_TRAILING: &[char] = &['.', ',', ';', ':', '!', '?', '\'', ')', ']', '*'];

/// Tags that start a new line of text when rendered.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

/// Project HTML into canonical plain text.
///
/// Strips tags (malformed ones included), decodes entities, removes bare
/// URLs, collapses whitespace runs to one ASCII space and trims. Never fails.
pub fn project(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let text = HIDDEN_BLOCKS.replace_all(html, " ");
    let text = TAG.replace_all(&text, |caps: &Captures| {
        let is_block = caps
            .get(1)
            .is_some_and(|name| BLOCK_TAGS.contains(&name.as_str().to_ascii_lowercase().as_str()));
        if is_block { " " } else { "" }
    });
    let text = decode_entities(&text);
    let text = strip_urls(&text);

    collapse_whitespace(&text)
}

/// Remove bare URLs. A match glued to a preceding ASCII letter or digit is
/// part of a word and stays. Trailing sentence punctuation is kept.
fn strip_urls(text: &str) -> String {
    BARE_URL
        .replace_all(text, |caps: &Captures| {
            let m = &caps[0];
            let start = caps.get(0).map_or(0, |g| g.start());
            let before = text[..start].chars().next_back();
            if before.is_some_and(|c| c.is_ascii_alphanumeric()) {
                return m.to_string();
            }
            let url = m.trim_end_matches(URL_TRAILING);
            m[url.len()..].to_string()
        })
        .into_owned()
}

/// Collapse whitespace runs to a single ASCII space and trim both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode named and numeric character references. Unknown names are
/// left as written.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let body = &caps[1];
            decode_entity(body).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_entity(body: &str) -> Option<String> {
    if let Some(num) = body.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }

    let c = match body {
        "nbsp" => '\u{a0}',
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "hellip" => '…',
        "mdash" => '—',
        "ndash" => '–',
        "lsquo" => '‘',
        "rsquo" => '’',
        "ldquo" => '“',
        "rdquo" => '”',
        "laquo" => '«',
        "raquo" => '»',
        "middot" => '·',
        "bull" => '•',
        "copy" => '©',
        "reg" => '®',
        "trade" => '™',
        "deg" => '°',
        "times" => '×',
        "divide" => '÷',
        "yen" => '¥',
        "euro" => '€',
        "pound" => '£',
        "cent" => '¢',
        "sect" => '§',
        "para" => '¶',
        "ensp" | "emsp" | "thinsp" => ' ',
        "zwsp" | "zwnj" | "zwj" | "shy" => return Some(String::new()),
        _ => return None,
    };
    Some(c.to_string())
}

// ---------------------------------------------------------------------------
// PlainText
// ---------------------------------------------------------------------------

/// A projected plain-text string with character-offset addressing.
#[derive(Debug, Clone)]
pub struct PlainText {
    text: String,
    /// Byte offset of every char, plus a trailing `text.len()` sentinel.
    boundaries: Vec<usize>,
    /// HTML this text was projected from, if known.
    source_html: Option<String>,
}

impl PlainText {
    /// Project `html` and keep it around for HTML-offset lookups.
    pub fn from_html(html: &str) -> Self {
        let mut plain = Self::new(project(html));
        plain.source_html = Some(html.to_string());
        plain
    }

    /// Wrap text that is already canonical plain text.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        boundaries.push(text.len());
        Self {
            text,
            boundaries,
            source_html: None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Characters `start..end`, or `None` if the range is out of bounds.
    pub fn slice(&self, start: usize, end: usize) -> Option<&str> {
        if start > end || end > self.char_len() {
            return None;
        }
        Some(&self.text[self.boundaries[start]..self.boundaries[end]])
    }

    /// First occurrence of `needle` at or after character `from`.
    pub fn find_from(&self, needle: &str, from: usize) -> Option<PlainTextPosition> {
        if needle.is_empty() || from > self.char_len() {
            return None;
        }
        let byte_from = self.boundaries[from];
        let byte_start = byte_from + self.text[byte_from..].find(needle)?;
        // Matches of a valid UTF-8 needle always begin on a char boundary.
        let start = self.boundaries.binary_search(&byte_start).ok()?;
        Some(PlainTextPosition::new(start, start + needle.chars().count()))
    }

    /// Re-project the HTML under `position`. `None` without source HTML or
    /// when the position is out of bounds.
    pub fn html_referent(&self, position: HtmlPosition) -> Option<String> {
        let html = self.source_html.as_deref()?;
        if position.start > position.end {
            return None;
        }
        let fragment: String = html
            .chars()
            .skip(position.start)
            .take(position.end - position.start)
            .collect();
        if fragment.chars().count() != position.end - position.start {
            return None;
        }
        Some(project(&fragment))
    }
}

impl std::fmt::Display for PlainText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
