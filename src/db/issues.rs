//! Issue and decision persistence.

use crate::error::Result;
use crate::model::*;
use crate::review::ReviewDecisionStore;
use crate::telemetry::metrics;
use opentelemetry::KeyValue;
use sqlx::types::Json;
use std::time::Instant;
use tracing::debug;
use uuid::Uuid;

impl super::Db {
    /// Store a newly detected issue for an article.
    pub async fn insert_issue(&self, article_id: Uuid, issue: &ProofreadingIssue) -> Result<()> {
        sqlx::query(
            "INSERT INTO proofreading_issues (id, article_id, rule_id, category, severity, engine, confidence, original_html_position, plain_text_position, original_text_plain, suggested_text_plain, decision_status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(issue.id.0)
        .bind(article_id)
        .bind(&issue.rule_id)
        .bind(&issue.category)
        .bind(issue.severity.as_str())
        .bind(issue.engine.as_str())
        .bind(issue.confidence)
        .bind(issue.original_html_position.map(Json))
        .bind(issue.plain_text_position.map(Json))
        .bind(&issue.original_text_plain)
        .bind(&issue.suggested_text_plain)
        .bind(issue.decision_status.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// All issues of an article, in detection order.
    pub async fn load_issues(&self, article_id: Uuid) -> Result<Vec<ProofreadingIssue>> {
        let rows: Vec<IssueRow> = sqlx::query_as(
            "SELECT id, rule_id, category, severity, engine, confidence, original_html_position, plain_text_position, original_text_plain, suggested_text_plain, decision_status
             FROM proofreading_issues WHERE article_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(article_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(IssueRow::try_into_issue).collect()
    }

    /// All decisions recorded for an article's issues.
    pub async fn load_decisions(&self, article_id: Uuid) -> Result<Vec<Decision>> {
        let rows: Vec<DecisionRow> = sqlx::query_as(
            "SELECT d.issue_id, d.decision_type, d.modified_content, d.rationale, d.feedback, d.created_at
             FROM review_decisions d
             JOIN proofreading_issues i ON i.id = d.issue_id
             WHERE i.article_id = $1",
        )
        .bind(article_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DecisionRow::try_into_decision).collect()
    }

    /// Load an article's issues and decisions into a decision store.
    pub async fn load_review(&self, article_id: Uuid) -> Result<ReviewDecisionStore> {
        let issues = self.load_issues(article_id).await?;
        let decisions = self.load_decisions(article_id).await?;
        debug!(%article_id, issues = issues.len(), decisions = decisions.len(), "review loaded");
        Ok(ReviewDecisionStore::with_decisions(issues, decisions))
    }

    /// Persist decisions, replacing any earlier decision per issue, and
    /// refresh each issue's cached status in the same transaction.
    pub async fn save_decisions(&self, decisions: &[Decision]) -> Result<()> {
        let started = Instant::now();
        let mut tx = self.pool.begin().await?;

        for d in decisions {
            sqlx::query(
                "INSERT INTO review_decisions (issue_id, decision_type, modified_content, rationale, feedback, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 ON CONFLICT (issue_id) DO UPDATE SET
                    decision_type = EXCLUDED.decision_type,
                    modified_content = EXCLUDED.modified_content,
                    rationale = EXCLUDED.rationale,
                    feedback = EXCLUDED.feedback,
                    created_at = EXCLUDED.created_at",
            )
            .bind(d.issue_id.0)
            .bind(d.decision_type.as_str())
            .bind(&d.modified_content)
            .bind(&d.rationale)
            .bind(d.feedback.clone().map(Json))
            .bind(d.created_at)
            .execute(&mut *tx)
            .await?;

            let status: DecisionStatus = d.decision_type.into();
            sqlx::query("UPDATE proofreading_issues SET decision_status = $1 WHERE id = $2")
                .bind(status.as_str())
                .bind(d.issue_id.0)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        metrics::operation_duration_ms().record(
            started.elapsed().as_secs_f64() * 1000.0,
            &[KeyValue::new("operation", "decisions.save")],
        );
        Ok(())
    }

    /// Back-fill `plain_text_position` for issues located by text search,
    /// so later renders of the same content can skip the search.
    pub async fn store_plain_positions(
        &self,
        positions: &[(IssueId, PlainTextPosition)],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for (id, pos) in positions {
            sqlx::query("UPDATE proofreading_issues SET plain_text_position = $1 WHERE id = $2")
                .bind(Json(*pos))
                .bind(id.0)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct IssueRow {
    id: Uuid,
    rule_id: String,
    category: String,
    severity: String,
    engine: String,
    confidence: Option<f32>,
    original_html_position: Option<Json<HtmlPosition>>,
    plain_text_position: Option<Json<PlainTextPosition>>,
    original_text_plain: Option<String>,
    suggested_text_plain: Option<String>,
    decision_status: String,
}

impl IssueRow {
    fn try_into_issue(self) -> Result<ProofreadingIssue> {
        Ok(ProofreadingIssue {
            id: IssueId(self.id),
            rule_id: self.rule_id,
            category: self.category,
            severity: self.severity.parse()?,
            engine: self.engine.parse()?,
            confidence: self.confidence,
            original_html_position: self.original_html_position.map(|j| j.0),
            plain_text_position: self.plain_text_position.map(|j| j.0),
            original_text_plain: self.original_text_plain,
            suggested_text_plain: self.suggested_text_plain,
            decision_status: self.decision_status.parse()?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct DecisionRow {
    issue_id: Uuid,
    decision_type: String,
    modified_content: Option<String>,
    rationale: Option<String>,
    feedback: Option<Json<Feedback>>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl DecisionRow {
    fn try_into_decision(self) -> Result<Decision> {
        Ok(Decision {
            issue_id: IssueId(self.issue_id),
            decision_type: self.decision_type.parse()?,
            modified_content: self.modified_content,
            rationale: self.rationale,
            feedback: self.feedback.map(|j| j.0),
            created_at: self.created_at,
        })
    }
}
