//! Error types for proofdesk.

use thiserror::Error;

use crate::model::{IssueId, WorklistStatus};

#[derive(Debug, Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("issue {0} is not part of this review")]
    UnknownIssue(IssueId),

    #[error("invalid decision for issue {issue_id}: {reason}")]
    InvalidDecision { issue_id: IssueId, reason: String },

    #[error("illegal status transition: {from} -> {to}")]
    IllegalTransition {
        from: WorklistStatus,
        to: WorklistStatus,
    },

    /// The item moved on since the caller last read it. Refetch and retry.
    #[error("stale state: expected {expected}, found {actual}")]
    StaleState {
        expected: WorklistStatus,
        actual: WorklistStatus,
    },

    #[error("{0} issue(s) still awaiting a decision")]
    PendingDecisions(usize),

    #[error("unknown worklist status: {0}")]
    UnknownStatus(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
