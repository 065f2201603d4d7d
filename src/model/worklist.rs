//! Worklist items: one article's progress through the review pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Newtype for worklist item IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorklistId(pub Uuid);

impl WorklistId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for WorklistId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Short display: first 8 chars of UUID
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

impl Default for WorklistId {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a worklist item.
///
/// Deserialization goes through [`FromStr`](std::str::FromStr), which is the
/// only place the legacy `under_review` spelling is accepted. Serialization
/// always writes the canonical name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum WorklistStatus {
    /// Ingested, no processing started.
    Pending,
    /// Structural parsing (title, author, images) running.
    Parsing,
    /// Waiting for a human to confirm the parsed structure.
    ParsingReview,
    /// Issue detection running.
    Proofreading,
    /// Waiting for human decisions on detected issues.
    ProofreadingReview,
    /// All decisions recorded, waiting for the publish trigger.
    ReadyToPublish,
    /// Publish in flight. Not retriable mid-flight.
    Publishing,
    /// Terminal success.
    Published,
    /// Terminal failure.
    Failed,
}

impl WorklistStatus {
    pub const ALL: [WorklistStatus; 9] = [
        WorklistStatus::Pending,
        WorklistStatus::Parsing,
        WorklistStatus::ParsingReview,
        WorklistStatus::Proofreading,
        WorklistStatus::ProofreadingReview,
        WorklistStatus::ReadyToPublish,
        WorklistStatus::Publishing,
        WorklistStatus::Published,
        WorklistStatus::Failed,
    ];

    /// The next stage in the forward pipeline, if any.
    pub fn successor(self) -> Option<WorklistStatus> {
        use WorklistStatus::*;
        match self {
            Pending => Some(Parsing),
            Parsing => Some(ParsingReview),
            ParsingReview => Some(Proofreading),
            Proofreading => Some(ProofreadingReview),
            ProofreadingReview => Some(ReadyToPublish),
            ReadyToPublish => Some(Publishing),
            Publishing => Some(Published),
            Published | Failed => None,
        }
    }

    /// Can move forward from self to `to`? Failure is reachable from
    /// every non-terminal status.
    pub fn can_transition_to(self, to: WorklistStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == WorklistStatus::Failed || self.successor() == Some(to)
    }

    /// Can a retry move self back to `to`? Only the two review stages
    /// may be sent back to their automated stage.
    pub fn can_retry_to(self, to: WorklistStatus) -> bool {
        use WorklistStatus::*;
        matches!(
            (self, to),
            (ProofreadingReview, Proofreading) | (ParsingReview, Parsing)
        )
    }

    /// Is this a terminal status?
    pub fn is_terminal(self) -> bool {
        matches!(self, WorklistStatus::Published | WorklistStatus::Failed)
    }

    /// Is a human expected to act next?
    pub fn awaits_review(self) -> bool {
        matches!(
            self,
            WorklistStatus::ParsingReview | WorklistStatus::ProofreadingReview
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorklistStatus::Pending => "pending",
            WorklistStatus::Parsing => "parsing",
            WorklistStatus::ParsingReview => "parsing_review",
            WorklistStatus::Proofreading => "proofreading",
            WorklistStatus::ProofreadingReview => "proofreading_review",
            WorklistStatus::ReadyToPublish => "ready_to_publish",
            WorklistStatus::Publishing => "publishing",
            WorklistStatus::Published => "published",
            WorklistStatus::Failed => "failed",
        }
    }

    /// Every spelling of this status that may exist in stored rows.
    pub fn stored_spellings(self) -> &'static [&'static str] {
        match self {
            WorklistStatus::ProofreadingReview => &["proofreading_review", "under_review"],
            WorklistStatus::Pending => &["pending"],
            WorklistStatus::Parsing => &["parsing"],
            WorklistStatus::ParsingReview => &["parsing_review"],
            WorklistStatus::Proofreading => &["proofreading"],
            WorklistStatus::ReadyToPublish => &["ready_to_publish"],
            WorklistStatus::Publishing => &["publishing"],
            WorklistStatus::Published => &["published"],
            WorklistStatus::Failed => &["failed"],
        }
    }
}

impl std::fmt::Display for WorklistStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for WorklistStatus {
    type Err = crate::error::Error;

    /// Normalize a stored status string. `under_review` is a legacy
    /// spelling of `proofreading_review`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let status = match s.trim() {
            "pending" => WorklistStatus::Pending,
            "parsing" => WorklistStatus::Parsing,
            "parsing_review" => WorklistStatus::ParsingReview,
            "proofreading" => WorklistStatus::Proofreading,
            "proofreading_review" | "under_review" => WorklistStatus::ProofreadingReview,
            "ready_to_publish" => WorklistStatus::ReadyToPublish,
            "publishing" => WorklistStatus::Publishing,
            "published" => WorklistStatus::Published,
            "failed" => WorklistStatus::Failed,
            other => return Err(crate::error::Error::UnknownStatus(other.to_string())),
        };
        Ok(status)
    }
}

impl TryFrom<String> for WorklistStatus {
    type Error = crate::error::Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

// ---------------------------------------------------------------------------
// Worklist Item
// ---------------------------------------------------------------------------

/// One entry of a worklist item's append-only status history.
///
/// Field names on the wire match the persisted `status_history` layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    #[serde(rename = "old_status")]
    pub from: WorklistStatus,
    #[serde(rename = "new_status")]
    pub to: WorklistStatus,
    pub changed_by: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(rename = "created_at")]
    pub at: DateTime<Utc>,
}

/// The unit of work tracking one article through the review pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorklistItem {
    pub id: WorklistId,
    pub article_id: Uuid,

    /// Current status. Changed only through the state machine.
    pub status: WorklistStatus,

    #[serde(default)]
    pub status_history: Vec<StatusChange>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorklistItem {
    /// A freshly ingested item, status `pending`, empty history.
    pub fn new(article_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: WorklistId::new(),
            article_id,
            status: WorklistStatus::Pending,
            status_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The most recent history entry.
    pub fn last_change(&self) -> Option<&StatusChange> {
        self.status_history.last()
    }
}
