//! Worklist state machine.
//!
//! Validates every status change and records it in the item's history.
//! The machine never looks at review decisions itself; the
//! [`complete_review`] helper is the orchestration step that does.

use chrono::Utc;
use opentelemetry::KeyValue;
use tracing::info;

use crate::error::{Error, Result};
use crate::model::{StatusChange, WorklistItem, WorklistStatus};
use crate::review::ReviewStats;
use crate::telemetry::metrics;

/// Validate a forward transition, returning an error if disallowed.
pub fn validate_transition(from: WorklistStatus, to: WorklistStatus) -> Result<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(Error::IllegalTransition { from, to })
    }
}

/// Validate a retry, the only sanctioned backward move.
pub fn validate_retry(from: WorklistStatus, to: WorklistStatus) -> Result<()> {
    if from.can_retry_to(to) {
        Ok(())
    } else {
        Err(Error::IllegalTransition { from, to })
    }
}

/// Where a retry from `from` lands, if anywhere.
pub fn retry_target(from: WorklistStatus) -> Option<WorklistStatus> {
    match from {
        WorklistStatus::ProofreadingReview => Some(WorklistStatus::Proofreading),
        WorklistStatus::ParsingReview => Some(WorklistStatus::Parsing),
        _ => None,
    }
}

impl WorklistItem {
    /// Move the item from `from` to `to`.
    ///
    /// Fails with `IllegalTransition` if the pipeline does not allow the
    /// move and with `StaleState` if the item is no longer in `from`.
    /// Status and history change together or not at all.
    pub fn transition(
        &mut self,
        from: WorklistStatus,
        to: WorklistStatus,
        actor: &str,
        reason: Option<&str>,
    ) -> Result<&StatusChange> {
        validate_transition(from, to)?;
        self.apply(from, to, actor, reason)
    }

    /// Send a review stage back to its automated stage for another run.
    /// Callers must have authorized the retry separately.
    pub fn retry(
        &mut self,
        from: WorklistStatus,
        to: WorklistStatus,
        actor: &str,
        reason: Option<&str>,
    ) -> Result<&StatusChange> {
        validate_retry(from, to)?;
        self.apply(from, to, actor, reason)
    }

    /// Mark the item failed from whatever non-terminal status it is in.
    pub fn fail(&mut self, actor: &str, reason: &str) -> Result<&StatusChange> {
        let from = self.status;
        self.transition(from, WorklistStatus::Failed, actor, Some(reason))
    }

    fn apply(
        &mut self,
        from: WorklistStatus,
        to: WorklistStatus,
        actor: &str,
        reason: Option<&str>,
    ) -> Result<&StatusChange> {
        if self.status != from {
            return Err(Error::StaleState {
                expected: from,
                actual: self.status,
            });
        }

        // Nothing below can fail, so status and history stay in step.
        let now = Utc::now();
        self.status = to;
        self.updated_at = now;
        self.status_history.push(StatusChange {
            from,
            to,
            changed_by: actor.to_string(),
            reason: reason.map(str::to_string),
            at: now,
        });

        info!(worklist_id = %self.id, %from, %to, actor, "worklist status changed");
        metrics::worklist_transitions().add(
            1,
            &[
                KeyValue::new("from", from.as_str()),
                KeyValue::new("to", to.as_str()),
            ],
        );

        Ok(&self.status_history[self.status_history.len() - 1])
    }
}

/// Finish human review: `proofreading_review -> ready_to_publish`, but only
/// once every issue has a decision.
pub fn complete_review<'a>(
    item: &'a mut WorklistItem,
    stats: &ReviewStats,
    actor: &str,
) -> Result<&'a StatusChange> {
    if !stats.is_complete() {
        return Err(Error::PendingDecisions(stats.pending_count()));
    }
    item.transition(
        WorklistStatus::ProofreadingReview,
        WorklistStatus::ReadyToPublish,
        actor,
        Some("all issues decided"),
    )
}
