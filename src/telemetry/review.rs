//! Span helpers for review and worklist operations.

use tracing::Span;
use uuid::Uuid;

/// Start a span covering work on one article's review.
///
/// `review.issues` is declared empty and filled in once issues are loaded.
pub fn start_review_span(article_id: &Uuid) -> Span {
    tracing::info_span!(
        "review.article",
        "article.id" = %article_id,
        "review.issues" = tracing::field::Empty,
    )
}

/// Record how many issues the review covers.
pub fn record_issue_count(span: &Span, count: usize) {
    span.record("review.issues", count as u64);
}

/// Start a span for a worklist status change.
pub fn start_worklist_span(worklist_id: &Uuid) -> Span {
    tracing::info_span!(
        "worklist.transition",
        "worklist.id" = %worklist_id,
        "worklist.status" = tracing::field::Empty,
    )
}

/// Emit a status transition event inside `span` and note the new status.
pub fn record_status_transition(span: &Span, from: &str, to: &str) {
    span.record("worklist.status", to);
    span.in_scope(|| {
        tracing::info!(from = from, to = to, "status_transition");
    });
}
