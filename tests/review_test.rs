//! Tests for the review decision store and summary statistics.

use std::collections::HashMap;

use proofdesk::error::Error;
use proofdesk::model::*;
use proofdesk::review::{ReviewDecisionStore, summarize};

fn issues() -> Vec<ProofreadingIssue> {
    vec![
        ProofreadingIssue::new("typo-01", "typo", Severity::Critical, DetectionEngine::Deterministic)
            .original_text("teh"),
        ProofreadingIssue::new("style-02", "style", Severity::Warning, DetectionEngine::Ai)
            .original_text("very unique")
            .confidence(0.8),
        ProofreadingIssue::new("tone-03", "tone", Severity::Info, DetectionEngine::Ai)
            .original_text("super")
            .confidence(0.4),
    ]
}

fn store() -> (ReviewDecisionStore, Vec<IssueId>) {
    let issues = issues();
    let ids = issues.iter().map(|i| i.id).collect();
    (ReviewDecisionStore::new(issues), ids)
}

// ---------------------------------------------------------------------------
// record_decision
// ---------------------------------------------------------------------------

#[test]
fn records_decision_and_updates_cached_status() {
    let (mut store, ids) = store();

    let d = store
        .record_decision(ids[0], NewDecision::accepted().rationale("obvious typo"))
        .unwrap();
    assert_eq!(d.issue_id, ids[0]);
    assert_eq!(d.decision_type, DecisionType::Accepted);
    assert_eq!(d.rationale.as_deref(), Some("obvious typo"));

    assert_eq!(
        store.issue(ids[0]).unwrap().decision_status,
        DecisionStatus::Accepted
    );
    assert_eq!(
        store.issue(ids[1]).unwrap().decision_status,
        DecisionStatus::Pending
    );
}

#[test]
fn later_decision_replaces_earlier_one() {
    let (mut store, ids) = store();

    store.record_decision(ids[1], NewDecision::accepted()).unwrap();
    let d2 = store
        .record_decision(ids[1], NewDecision::modified("unique"))
        .unwrap();

    assert_eq!(store.decisions().len(), 1);
    assert_eq!(store.decision(ids[1]), Some(&d2));
    assert_eq!(
        store.issue(ids[1]).unwrap().decision_status,
        DecisionStatus::Modified
    );
}

#[test]
fn modified_without_content_is_invalid() {
    let (mut store, ids) = store();

    let err = store
        .record_decision(ids[0], NewDecision::new(DecisionType::Modified))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidDecision { issue_id, .. } if issue_id == ids[0]));

    let err = store
        .record_decision(ids[0], NewDecision::modified("   "))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidDecision { .. }));

    assert!(store.decision(ids[0]).is_none());
    assert_eq!(
        store.issue(ids[0]).unwrap().decision_status,
        DecisionStatus::Pending
    );
}

#[test]
fn invalid_decision_keeps_the_previous_one() {
    let (mut store, ids) = store();

    store.record_decision(ids[0], NewDecision::rejected()).unwrap();
    assert!(
        store
            .record_decision(ids[0], NewDecision::modified(""))
            .is_err()
    );

    assert_eq!(
        store.decision(ids[0]).unwrap().decision_type,
        DecisionType::Rejected
    );
}

#[test]
fn unknown_issue_is_rejected() {
    let (mut store, _) = store();
    let stranger = IssueId::new();

    let err = store
        .record_decision(stranger, NewDecision::accepted())
        .unwrap_err();
    assert!(matches!(err, Error::UnknownIssue(id) if id == stranger));
}

#[test]
fn feedback_is_kept_on_the_decision() {
    let (mut store, ids) = store();

    let d = store
        .record_decision(
            ids[2],
            NewDecision::rejected().feedback("false-positive", Some("informal tone is intended".into())),
        )
        .unwrap();
    let feedback = d.feedback.unwrap();
    assert_eq!(feedback.category, "false-positive");
    assert_eq!(feedback.notes.as_deref(), Some("informal tone is intended"));
}

// ---------------------------------------------------------------------------
// record_batch
// ---------------------------------------------------------------------------

#[test]
fn batch_reports_partial_failure_without_rollback() {
    let (mut store, ids) = store();
    let invalid = IssueId::new();

    let outcome = store.record_batch(
        &[ids[0], invalid, ids[2]],
        BatchDecisionType::Accepted,
        Some("bulk accept"),
    );

    assert_eq!(outcome.processed_count, 2);
    assert_eq!(outcome.failed, vec![invalid]);
    assert_eq!(outcome.saved_decisions.len(), 2);
    assert!(
        outcome
            .saved_decisions
            .iter()
            .all(|d| d.rationale.as_deref() == Some("bulk accept"))
    );

    assert_eq!(
        store.decision(ids[0]).unwrap().decision_type,
        DecisionType::Accepted
    );
    assert_eq!(
        store.decision(ids[2]).unwrap().decision_type,
        DecisionType::Accepted
    );
    assert!(store.decision(ids[1]).is_none());
}

#[test]
fn batch_failures_are_reported_in_input_order() {
    let (mut store, ids) = store();
    let a = IssueId::new();
    let b = IssueId::new();

    let outcome = store.record_batch(&[b, ids[1], a], BatchDecisionType::Rejected, None);
    assert_eq!(outcome.processed_count, 1);
    assert_eq!(outcome.failed, vec![b, a]);
}

#[test]
fn batch_replaces_earlier_decisions() {
    let (mut store, ids) = store();
    store.record_decision(ids[0], NewDecision::modified("the")).unwrap();

    store.record_batch(&ids, BatchDecisionType::Rejected, None);

    assert_eq!(store.decisions().len(), 3);
    assert!(
        store
            .issues()
            .iter()
            .all(|i| i.decision_status == DecisionStatus::Rejected)
    );
}

// ---------------------------------------------------------------------------
// summarize
// ---------------------------------------------------------------------------

#[test]
fn summary_counts_sum_to_total() {
    let (mut store, ids) = store();
    store.record_decision(ids[0], NewDecision::accepted()).unwrap();
    store.record_decision(ids[1], NewDecision::modified("unique")).unwrap();

    let stats = store.summary();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.counts.pending, 1);
    assert_eq!(stats.counts.accepted, 1);
    assert_eq!(stats.counts.modified, 1);
    assert_eq!(stats.counts.rejected, 0);
    assert_eq!(stats.counts.total(), stats.total);
    assert_eq!(stats.pending_count(), 1);
    assert!(!stats.is_complete());
}

#[test]
fn summary_breaks_down_by_severity_and_engine() {
    let (mut store, ids) = store();
    store.record_decision(ids[0], NewDecision::accepted()).unwrap();
    store.record_decision(ids[2], NewDecision::rejected()).unwrap();

    let stats = store.summary();

    let critical = stats.by_severity[&Severity::Critical];
    assert_eq!(critical.accepted, 1);
    assert_eq!(critical.total(), 1);
    assert_eq!(stats.by_severity[&Severity::Warning].pending, 1);
    assert_eq!(stats.by_severity[&Severity::Info].rejected, 1);

    let ai = stats.by_engine[&DetectionEngine::Ai];
    assert_eq!(ai.total(), 2);
    assert_eq!(ai.pending, 1);
    assert_eq!(ai.rejected, 1);
    assert_eq!(stats.by_engine[&DetectionEngine::Deterministic].decided(), 1);
}

#[test]
fn summary_is_complete_once_everything_is_decided() {
    let (mut store, ids) = store();
    store.record_batch(&ids, BatchDecisionType::Accepted, None);

    let stats = store.summary();
    assert!(stats.is_complete());
    assert_eq!(stats.counts.accepted, 3);
}

#[test]
fn summarize_trusts_decisions_over_cached_status() {
    let mut issues = issues();
    // Cache claims accepted, but no decision exists.
    issues[0].decision_status = DecisionStatus::Accepted;

    let stats = summarize(&issues, &HashMap::new());
    assert_eq!(stats.counts.pending, 3);
    assert_eq!(stats.counts.accepted, 0);
}

#[test]
fn summarize_empty_review() {
    let stats = summarize(&[], &HashMap::new());
    assert_eq!(stats.total, 0);
    assert!(stats.is_complete());
    assert!(stats.by_severity.is_empty());
}

#[test]
fn store_rebuilt_from_persisted_decisions() {
    let (mut original, ids) = store();
    let saved = original
        .record_batch(&ids[..2], BatchDecisionType::Accepted, None)
        .saved_decisions;

    let stranger = Decision {
        issue_id: IssueId::new(),
        ..saved[0].clone()
    };
    let rebuilt = ReviewDecisionStore::with_decisions(
        issues_with_ids(&ids),
        saved.into_iter().chain(std::iter::once(stranger)),
    );

    assert_eq!(rebuilt.decisions().len(), 2);
    assert_eq!(
        rebuilt.issue(ids[0]).unwrap().decision_status,
        DecisionStatus::Accepted
    );
    assert_eq!(rebuilt.summary().pending_count(), 1);
}

#[test]
fn rebuilt_store_resets_stale_cached_status() {
    let mut issues = issues();
    issues[0].decision_status = DecisionStatus::Accepted;
    issues[1].decision_status = DecisionStatus::Rejected;
    let decided = Decision {
        issue_id: issues[1].id,
        decision_type: DecisionType::Modified,
        modified_content: Some("unique".into()),
        rationale: None,
        feedback: None,
        created_at: chrono::Utc::now(),
    };
    let ids: Vec<_> = issues.iter().map(|i| i.id).collect();

    let store = ReviewDecisionStore::with_decisions(issues, [decided]);

    assert_eq!(
        store.issue(ids[0]).unwrap().decision_status,
        DecisionStatus::Pending
    );
    assert_eq!(
        store.issue(ids[1]).unwrap().decision_status,
        DecisionStatus::Modified
    );
    let stats = store.summary();
    let cached_pending = store
        .issues()
        .iter()
        .filter(|i| i.decision_status == DecisionStatus::Pending)
        .count();
    assert_eq!(cached_pending, stats.pending_count());
}

fn issues_with_ids(ids: &[IssueId]) -> Vec<ProofreadingIssue> {
    issues()
        .into_iter()
        .zip(ids)
        .map(|(mut issue, id)| {
            issue.id = *id;
            issue
        })
        .collect()
}
