//! Reviewer decisions on proofreading issues.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::issue::{DecisionStatus, IssueId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionType {
    Accepted,
    Rejected,
    /// Reviewer supplied their own replacement text.
    Modified,
}

impl DecisionType {
    pub fn as_str(self) -> &'static str {
        match self {
            DecisionType::Accepted => "accepted",
            DecisionType::Rejected => "rejected",
            DecisionType::Modified => "modified",
        }
    }
}

impl From<DecisionType> for DecisionStatus {
    fn from(t: DecisionType) -> Self {
        match t {
            DecisionType::Accepted => DecisionStatus::Accepted,
            DecisionType::Rejected => DecisionStatus::Rejected,
            DecisionType::Modified => DecisionStatus::Modified,
        }
    }
}

impl std::fmt::Display for DecisionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for DecisionType {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accepted" | "accept" => Ok(DecisionType::Accepted),
            "rejected" | "reject" => Ok(DecisionType::Rejected),
            "modified" | "modify" => Ok(DecisionType::Modified),
            other => Err(crate::error::Error::Other(format!(
                "unknown decision type: {other}"
            ))),
        }
    }
}

/// Decision types allowed in bulk operations. Modifications need
/// per-issue content and cannot be batched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchDecisionType {
    Accepted,
    Rejected,
}

impl From<BatchDecisionType> for DecisionType {
    fn from(t: BatchDecisionType) -> Self {
        match t {
            BatchDecisionType::Accepted => DecisionType::Accepted,
            BatchDecisionType::Rejected => DecisionType::Rejected,
        }
    }
}

/// Structured reviewer feedback, used to tune detection rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// The single active decision for one issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub issue_id: IssueId,
    pub decision_type: DecisionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// A decision as submitted by a reviewer, before validation.
#[derive(Debug, Clone)]
pub struct NewDecision {
    pub(crate) decision_type: DecisionType,
    pub(crate) modified_content: Option<String>,
    pub(crate) rationale: Option<String>,
    pub(crate) feedback: Option<Feedback>,
}

impl NewDecision {
    pub fn new(decision_type: DecisionType) -> Self {
        Self {
            decision_type,
            modified_content: None,
            rationale: None,
            feedback: None,
        }
    }

    pub fn accepted() -> Self {
        Self::new(DecisionType::Accepted)
    }

    pub fn rejected() -> Self {
        Self::new(DecisionType::Rejected)
    }

    pub fn modified(content: impl Into<String>) -> Self {
        Self::new(DecisionType::Modified).content(content)
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.modified_content = Some(content.into());
        self
    }

    pub fn rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }

    pub fn feedback(mut self, category: impl Into<String>, notes: Option<String>) -> Self {
        self.feedback = Some(Feedback {
            category: category.into(),
            notes,
        });
        self
    }

    pub fn decision_type(&self) -> DecisionType {
        self.decision_type
    }
}
