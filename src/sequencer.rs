//! Issue sequencing: resolve a batch of issues and lay them out in
//! document order without overlaps.

use opentelemetry::KeyValue;
use tracing::debug;

use crate::model::{PlainTextPosition, ProofreadingIssue};
use crate::projector::PlainText;
use crate::resolver::{PositionSource, ResolveOptions, resolve};
use crate::telemetry::metrics;

/// An issue together with where it sits in the plain text.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedIssue<'a> {
    pub issue: &'a ProofreadingIssue,
    pub position: PlainTextPosition,
    pub source: PositionSource,
}

/// Resolve every issue, drop the ones that cannot be located, and sort the
/// rest by start offset.
///
/// Each search starts where the previously located issue ended, so issues
/// supplied in rough document order resolve repeated text more accurately.
/// The sort is stable: equal starts keep input order.
pub fn resolve_all<'a>(
    issues: &'a [ProofreadingIssue],
    text: &PlainText,
    options: &ResolveOptions,
) -> Vec<ResolvedIssue<'a>> {
    let mut resolved = Vec::with_capacity(issues.len());
    let mut cursor = options.search_start_from;

    for issue in issues {
        let result = resolve(issue, text, &options.search_from(cursor));
        let Some(position) = result.position else {
            continue;
        };
        cursor = position.end;
        resolved.push(ResolvedIssue {
            issue,
            position,
            source: result.source,
        });
    }

    let dropped = issues.len() - resolved.len();
    if dropped > 0 {
        debug!(dropped, "issues could not be located");
        metrics::issues_dropped().add(dropped as u64, &[KeyValue::new("reason", "not_found")]);
    }

    resolved.sort_by_key(|r| r.position.start);
    resolved
}

/// Greedy interval pass over a start-sorted list: keep an issue only if it
/// begins at or after the end of the last kept one.
pub fn remove_overlaps(sorted: Vec<ResolvedIssue<'_>>) -> Vec<ResolvedIssue<'_>> {
    let total = sorted.len();
    let mut kept: Vec<ResolvedIssue<'_>> = Vec::with_capacity(total);
    let mut last_end = 0;

    for r in sorted {
        if r.position.start >= last_end {
            last_end = r.position.end;
            kept.push(r);
        } else {
            debug!(issue_id = %r.issue.id, position = %r.position, "overlapping issue dropped");
        }
    }

    let dropped = total - kept.len();
    if dropped > 0 {
        metrics::issues_dropped().add(dropped as u64, &[KeyValue::new("reason", "overlap")]);
    }
    kept
}

/// Resolve, order and de-overlap: the render sequence for one article.
pub fn sequence<'a>(
    issues: &'a [ProofreadingIssue],
    text: &PlainText,
    options: &ResolveOptions,
) -> Vec<ResolvedIssue<'a>> {
    remove_overlaps(resolve_all(issues, text, options))
}
