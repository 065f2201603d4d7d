//! Review decisions: one active decision per issue, plus summary stats.
//!
//! The store owns one article's issues. Decisions are the source of truth;
//! each issue's `decision_status` is recomputed from them on every write.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use opentelemetry::KeyValue;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::model::*;
use crate::telemetry::metrics;

/// Result of a bulk accept/reject.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub processed_count: usize,
    /// Issue ids that could not be decided, in input order.
    pub failed: Vec<IssueId>,
    pub saved_decisions: Vec<Decision>,
}

/// Decisions for one article's issues.
#[derive(Debug, Clone, Default)]
pub struct ReviewDecisionStore {
    issues: Vec<ProofreadingIssue>,
    index: HashMap<IssueId, usize>,
    decisions: HashMap<IssueId, Decision>,
}

impl ReviewDecisionStore {
    pub fn new(issues: Vec<ProofreadingIssue>) -> Self {
        let index = issues
            .iter()
            .enumerate()
            .map(|(i, issue)| (issue.id, i))
            .collect();
        Self {
            issues,
            index,
            decisions: HashMap::new(),
        }
    }

    /// Rebuild a store from persisted issues and decisions. Decisions for
    /// issues not in `issues` are ignored. Every cached status is re-derived,
    /// so an issue without a decision reads `pending` whatever was stored.
    pub fn with_decisions(
        issues: Vec<ProofreadingIssue>,
        decisions: impl IntoIterator<Item = Decision>,
    ) -> Self {
        let mut store = Self::new(issues);
        for decision in decisions {
            if store.index.contains_key(&decision.issue_id) {
                store.decisions.insert(decision.issue_id, decision);
            } else {
                warn!(issue_id = %decision.issue_id, "decision for unknown issue ignored");
            }
        }
        for i in 0..store.issues.len() {
            store.refresh_status(i);
        }
        store
    }

    pub fn issues(&self) -> &[ProofreadingIssue] {
        &self.issues
    }

    pub fn issue(&self, id: IssueId) -> Option<&ProofreadingIssue> {
        self.index.get(&id).map(|&i| &self.issues[i])
    }

    pub fn decision(&self, id: IssueId) -> Option<&Decision> {
        self.decisions.get(&id)
    }

    pub fn decisions(&self) -> &HashMap<IssueId, Decision> {
        &self.decisions
    }

    /// Record a decision, replacing any earlier one for the same issue.
    pub fn record_decision(&mut self, issue_id: IssueId, new: NewDecision) -> Result<Decision> {
        let result = self.record_inner(issue_id, new);
        let (decision_type, outcome) = match &result {
            Ok(d) => (d.decision_type.as_str(), "ok"),
            Err(_) => ("unknown", "error"),
        };
        metrics::decisions_recorded().add(
            1,
            &[
                KeyValue::new("decision_type", decision_type),
                KeyValue::new("result", outcome),
            ],
        );
        result
    }

    fn record_inner(&mut self, issue_id: IssueId, new: NewDecision) -> Result<Decision> {
        let Some(&i) = self.index.get(&issue_id) else {
            return Err(Error::UnknownIssue(issue_id));
        };

        if new.decision_type == DecisionType::Modified
            && new.modified_content.as_deref().is_none_or(|c| c.trim().is_empty())
        {
            return Err(Error::InvalidDecision {
                issue_id,
                reason: "a modified decision needs replacement content".to_string(),
            });
        }

        let decision = Decision {
            issue_id,
            decision_type: new.decision_type,
            modified_content: new.modified_content,
            rationale: new.rationale,
            feedback: new.feedback,
            created_at: Utc::now(),
        };

        if let Some(prior) = self.decisions.insert(issue_id, decision.clone()) {
            info!(
                %issue_id,
                from = prior.decision_type.as_str(),
                to = decision.decision_type.as_str(),
                "decision replaced"
            );
        }
        self.refresh_status(i);

        Ok(decision)
    }

    /// Accept or reject many issues. Each id is processed on its own;
    /// a failure is reported and the rest carry on.
    pub fn record_batch(
        &mut self,
        issue_ids: &[IssueId],
        decision_type: BatchDecisionType,
        rationale: Option<&str>,
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        for &id in issue_ids {
            let mut new = NewDecision::new(decision_type.into());
            if let Some(r) = rationale {
                new = new.rationale(r);
            }
            match self.record_decision(id, new) {
                Ok(decision) => {
                    outcome.processed_count += 1;
                    outcome.saved_decisions.push(decision);
                }
                Err(e) => {
                    warn!(issue_id = %id, error = %e, "batch decision failed");
                    outcome.failed.push(id);
                }
            }
        }

        info!(
            processed = outcome.processed_count,
            failed = outcome.failed.len(),
            "batch decision complete"
        );
        outcome
    }

    /// Summary over this store's issues and decisions.
    pub fn summary(&self) -> ReviewStats {
        summarize(&self.issues, &self.decisions)
    }

    /// Re-derive the cached status of issue `i` from its decision.
    fn refresh_status(&mut self, i: usize) {
        let id = self.issues[i].id;
        self.issues[i].decision_status = self
            .decisions
            .get(&id)
            .map(|d| d.decision_type.into())
            .unwrap_or_default();
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Counts per decision status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub modified: usize,
}

impl StatusCounts {
    fn add(&mut self, status: DecisionStatus) {
        match status {
            DecisionStatus::Pending => self.pending += 1,
            DecisionStatus::Accepted => self.accepted += 1,
            DecisionStatus::Rejected => self.rejected += 1,
            DecisionStatus::Modified => self.modified += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.pending + self.accepted + self.rejected + self.modified
    }

    pub fn decided(&self) -> usize {
        self.total() - self.pending
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewStats {
    pub total: usize,
    pub counts: StatusCounts,
    pub by_severity: BTreeMap<Severity, StatusCounts>,
    pub by_engine: BTreeMap<DetectionEngine, StatusCounts>,
}

impl ReviewStats {
    pub fn pending_count(&self) -> usize {
        self.counts.pending
    }

    /// Every issue has a decision.
    pub fn is_complete(&self) -> bool {
        self.counts.pending == 0
    }
}

/// Derive review statistics. Decisions are authoritative; an issue's
/// cached status that disagrees is reported and ignored.
pub fn summarize(
    issues: &[ProofreadingIssue],
    decisions: &HashMap<IssueId, Decision>,
) -> ReviewStats {
    let mut stats = ReviewStats {
        total: issues.len(),
        ..Default::default()
    };

    for issue in issues {
        let status: DecisionStatus = decisions
            .get(&issue.id)
            .map(|d| d.decision_type.into())
            .unwrap_or_default();
        if status != issue.decision_status {
            warn!(
                issue_id = %issue.id,
                cached = %issue.decision_status,
                actual = %status,
                "cached decision status out of date"
            );
        }

        stats.counts.add(status);
        stats.by_severity.entry(issue.severity).or_default().add(status);
        stats.by_engine.entry(issue.engine).or_default().add(status);
    }

    stats
}
