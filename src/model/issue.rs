//! Proofreading issues and the positions they are anchored to.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// Half-open character span into one specific plain-text rendering.
///
/// Offsets count Unicode scalar values, not bytes. A position is only
/// meaningful against the exact string it was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlainTextPosition {
    pub start: usize,
    pub end: usize,
}

impl PlainTextPosition {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

impl std::fmt::Display for PlainTextPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Character span into the original article HTML. Legacy; may be stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlPosition {
    pub start: usize,
    pub end: usize,
}

// ---------------------------------------------------------------------------
// Issue
// ---------------------------------------------------------------------------

/// Newtype for issue IDs. Assigned by the detector, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(pub Uuid);

impl IssueId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for IssueId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for IssueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical" => Ok(Severity::Critical),
            "warning" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            other => Err(crate::error::Error::Other(format!("unknown severity: {other}"))),
        }
    }
}

/// Which detector produced the issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionEngine {
    Ai,
    Deterministic,
}

impl DetectionEngine {
    pub fn as_str(self) -> &'static str {
        match self {
            DetectionEngine::Ai => "ai",
            DetectionEngine::Deterministic => "deterministic",
        }
    }
}

impl std::fmt::Display for DetectionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for DetectionEngine {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ai" => Ok(DetectionEngine::Ai),
            "deterministic" => Ok(DetectionEngine::Deterministic),
            other => Err(crate::error::Error::Other(format!("unknown engine: {other}"))),
        }
    }
}

/// Cached disposition of an issue. Mirrors the latest decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Modified,
}

impl DecisionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DecisionStatus::Pending => "pending",
            DecisionStatus::Accepted => "accepted",
            DecisionStatus::Rejected => "rejected",
            DecisionStatus::Modified => "modified",
        }
    }
}

impl std::fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for DecisionStatus {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DecisionStatus::Pending),
            "accepted" => Ok(DecisionStatus::Accepted),
            "rejected" => Ok(DecisionStatus::Rejected),
            "modified" => Ok(DecisionStatus::Modified),
            other => Err(crate::error::Error::Other(format!(
                "unknown decision status: {other}"
            ))),
        }
    }
}

/// One detected proofreading problem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofreadingIssue {
    pub id: IssueId,

    pub rule_id: String,
    pub category: String,
    pub severity: Severity,
    pub engine: DetectionEngine,

    /// Model confidence in [0, 1]. Only set for `engine = ai`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_html_position: Option<HtmlPosition>,

    /// Producer-computed span against the plain text. Absent on older
    /// data, wrong after edits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plain_text_position: Option<PlainTextPosition>,

    /// The text the issue is about. Ground truth for locating it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_text_plain: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_text_plain: Option<String>,

    #[serde(default)]
    pub decision_status: DecisionStatus,
}

impl ProofreadingIssue {
    pub fn new(
        rule_id: impl Into<String>,
        category: impl Into<String>,
        severity: Severity,
        engine: DetectionEngine,
    ) -> Self {
        Self {
            id: IssueId::new(),
            rule_id: rule_id.into(),
            category: category.into(),
            severity,
            engine,
            confidence: None,
            original_html_position: None,
            plain_text_position: None,
            original_text_plain: None,
            suggested_text_plain: None,
            decision_status: DecisionStatus::Pending,
        }
    }

    pub fn original_text(mut self, text: impl Into<String>) -> Self {
        self.original_text_plain = Some(text.into());
        self
    }

    pub fn suggested_text(mut self, text: impl Into<String>) -> Self {
        self.suggested_text_plain = Some(text.into());
        self
    }

    pub fn plain_position(mut self, start: usize, end: usize) -> Self {
        self.plain_text_position = Some(PlainTextPosition::new(start, end));
        self
    }

    pub fn html_position(mut self, start: usize, end: usize) -> Self {
        self.original_html_position = Some(HtmlPosition { start, end });
        self
    }

    pub fn confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }
}
