//! Tests for ordering and overlap removal of resolved issues.

use proofdesk::model::*;
use proofdesk::projector::PlainText;
use proofdesk::resolver::{PositionSource, ResolveOptions};
use proofdesk::sequencer::{remove_overlaps, resolve_all, sequence};

fn issue(text: &str) -> ProofreadingIssue {
    ProofreadingIssue::new("rule", "grammar", Severity::Warning, DetectionEngine::Ai)
        .original_text(text)
}

fn starts(resolved: &[proofdesk::sequencer::ResolvedIssue<'_>]) -> Vec<(usize, usize)> {
    resolved
        .iter()
        .map(|r| (r.position.start, r.position.end))
        .collect()
}

#[test]
fn chained_search_attributes_repeated_text_in_order() {
    let text = PlainText::new("健康飲食很重要。運動也很重要。");
    let issues = vec![issue("很重要"), issue("很重要")];

    let resolved = resolve_all(&issues, &text, &ResolveOptions::default());
    assert_eq!(starts(&resolved), vec![(4, 7), (11, 14)]);
    assert_eq!(resolved[0].issue.id, issues[0].id);
    assert_eq!(resolved[1].issue.id, issues[1].id);
}

#[test]
fn not_found_issues_are_dropped() {
    let text = PlainText::new("alpha beta gamma");
    let issues = vec![issue("beta"), issue("delta"), issue("")];

    let resolved = resolve_all(&issues, &text, &ResolveOptions::default());
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].issue.id, issues[0].id);
}

#[test]
fn results_are_sorted_by_start() {
    let text = PlainText::new("alpha beta gamma");
    let issues = vec![
        issue("gamma").plain_position(11, 16),
        issue("alpha").plain_position(0, 5),
        issue("beta"),
    ];

    let resolved = resolve_all(&issues, &text, &ResolveOptions::default());
    assert_eq!(starts(&resolved), vec![(0, 5), (6, 10), (11, 16)]);
    assert_eq!(resolved[1].source, PositionSource::TextSearch);
}

#[test]
fn equal_starts_keep_input_order() {
    let text = PlainText::new("alpha beta");
    let long = issue("alpha beta");
    let short = issue("alpha").plain_position(0, 5);
    let issues = vec![long, short];

    let resolved = resolve_all(&issues, &text, &ResolveOptions::default());
    assert_eq!(resolved[0].issue.id, issues[0].id);
    assert_eq!(resolved[1].issue.id, issues[1].id);
}

#[test]
fn overlapping_issues_keep_first_by_start() {
    let text = PlainText::new("the quick brown fox");
    let issues = vec![
        issue("the quick").plain_position(0, 9),
        issue("quick brown").plain_position(4, 15),
        issue("brown").plain_position(10, 15),
        issue("fox").plain_position(16, 19),
    ];

    let kept = sequence(&issues, &text, &ResolveOptions::default());
    let ids: Vec<_> = kept.iter().map(|r| r.issue.id).collect();
    assert_eq!(ids, vec![issues[0].id, issues[2].id, issues[3].id]);
}

#[test]
fn adjacent_spans_are_not_overlaps() {
    let text = PlainText::new("abcdef");
    let issues = vec![
        issue("abc").plain_position(0, 3),
        issue("def").plain_position(3, 6),
    ];

    let kept = sequence(&issues, &text, &ResolveOptions::default());
    assert_eq!(starts(&kept), vec![(0, 3), (3, 6)]);
}

#[test]
fn output_is_non_overlapping_and_monotonic() {
    let text = PlainText::from_html(
        "<p>Proofreading catches typos. Proofreading catches style. Typos matter.</p>",
    );
    let issues = vec![
        issue("Proofreading catches"),
        issue("catches typos"),
        issue("typos"),
        issue("Proofreading catches style"),
        issue("style. Typos"),
        issue("matter"),
        issue("Typos matter."),
    ];

    let kept = sequence(&issues, &text, &ResolveOptions::default());
    assert!(!kept.is_empty());
    for pair in kept.windows(2) {
        assert!(pair[0].position.end <= pair[1].position.start);
        assert!(pair[0].position.start < pair[1].position.start);
    }
}

#[test]
fn remove_overlaps_on_empty_input() {
    assert!(remove_overlaps(Vec::new()).is_empty());
}
