//! Position resolution: anchor an issue onto the plain text a reviewer sees.
//!
//! Precomputed plain-text positions win when they still match the issue's
//! text, because they are unambiguous for repeated substrings. Otherwise
//! the expected text is searched for, first match wins.

use opentelemetry::KeyValue;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{PlainTextPosition, ProofreadingIssue};
use crate::projector::{PlainText, collapse_whitespace};
use crate::telemetry::metrics;

/// How a resolved position was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSource {
    PlainTextPosition,
    TextSearch,
    NotFound,
}

impl PositionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            PositionSource::PlainTextPosition => "plain_text_position",
            PositionSource::TextSearch => "text_search",
            PositionSource::NotFound => "not_found",
        }
    }
}

impl std::fmt::Display for PositionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Outcome of resolving one issue. Not finding an issue is a normal
/// result: the caller omits it from rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionResult {
    pub position: Option<PlainTextPosition>,
    pub source: PositionSource,
    pub validated: bool,
}

impl PositionResult {
    pub fn not_found() -> Self {
        Self {
            position: None,
            source: PositionSource::NotFound,
            validated: false,
        }
    }

    fn found(position: PlainTextPosition, source: PositionSource) -> Self {
        Self {
            position: Some(position),
            source,
            validated: true,
        }
    }

    pub fn is_found(&self) -> bool {
        self.position.is_some()
    }
}

/// How closely a precomputed span must match the expected text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tolerance {
    /// Byte-for-byte equality.
    Exact,
    /// Equal after collapsing whitespace runs and trimming.
    #[default]
    Whitespace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolveOptions {
    /// Character offset where the fallback search begins.
    pub search_start_from: usize,
    /// Treat a stale precomputed position as not found instead of searching.
    pub strict_validation: bool,
    pub tolerance: Tolerance,
}

impl ResolveOptions {
    pub fn search_from(mut self, offset: usize) -> Self {
        self.search_start_from = offset;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_validation = strict;
        self
    }

    pub fn tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// The text an issue is about: `original_text_plain`, or the projected
/// HTML referent when that field is missing.
pub fn expected_text(issue: &ProofreadingIssue, text: &PlainText) -> Option<String> {
    match &issue.original_text_plain {
        Some(t) => Some(t.clone()),
        None => issue
            .original_html_position
            .and_then(|pos| text.html_referent(pos)),
    }
}

/// Resolve an issue's position against `text`.
pub fn resolve(
    issue: &ProofreadingIssue,
    text: &PlainText,
    options: &ResolveOptions,
) -> PositionResult {
    let result = resolve_inner(issue, text, options);
    metrics::positions_resolved().add(1, &[KeyValue::new("source", result.source.as_str())]);
    result
}

fn resolve_inner(
    issue: &ProofreadingIssue,
    text: &PlainText,
    options: &ResolveOptions,
) -> PositionResult {
    let expected = match expected_text(issue, text) {
        Some(t) if !t.is_empty() => t,
        _ => {
            debug!(issue_id = %issue.id, "no expected text, issue cannot be located");
            return PositionResult::not_found();
        }
    };

    if let Some(pos) = issue.plain_text_position {
        let actual = text.slice(pos.start, pos.end);
        if actual.is_some_and(|a| matches(a, &expected, options.tolerance)) {
            debug!(issue_id = %issue.id, %pos, "precomputed position validated");
            return PositionResult::found(pos, PositionSource::PlainTextPosition);
        }

        warn!(
            issue_id = %issue.id,
            %pos,
            expected = %expected,
            actual = actual.unwrap_or("<out of range>"),
            "plain text position does not match, content likely edited after detection"
        );
        if options.strict_validation {
            return PositionResult::not_found();
        }
    }

    let found = text
        .find_from(&expected, options.search_start_from)
        .or_else(|| {
            // Out-of-order issue lists: the text may sit before the hint.
            if options.search_start_from > 0 {
                text.find_from(&expected, 0)
            } else {
                None
            }
        });

    match found {
        Some(pos) => {
            debug!(issue_id = %issue.id, %pos, "located by text search");
            PositionResult::found(pos, PositionSource::TextSearch)
        }
        None => {
            debug!(issue_id = %issue.id, "expected text not present");
            PositionResult::not_found()
        }
    }
}

fn matches(actual: &str, expected: &str, tolerance: Tolerance) -> bool {
    if actual == expected {
        return true;
    }
    match tolerance {
        Tolerance::Exact => false,
        Tolerance::Whitespace => collapse_whitespace(actual) == collapse_whitespace(expected),
    }
}
