//! Worklist persistence with optimistic concurrency.
//!
//! Transitions run the state machine on the freshly read item, then write
//! status and the new history entry in one conditional `UPDATE`. If the
//! stored status moved in between, no row matches and the caller gets
//! `StaleState`.

use crate::error::{Error, Result};
use crate::model::*;
use crate::telemetry::review::{record_status_transition, start_worklist_span};
use crate::worklist;
use sqlx::types::Json;
use tracing::Instrument;
use uuid::Uuid;

impl super::Db {
    /// Create a worklist item for a newly ingested article.
    pub async fn create_worklist_item(&self, article_id: Uuid) -> Result<WorklistItem> {
        let item = WorklistItem::new(article_id);
        sqlx::query(
            "INSERT INTO worklist_items (id, article_id, status, status_history, created_at, updated_at)
             VALUES ($1, $2, $3, '[]'::jsonb, $4, $4)",
        )
        .bind(item.id.0)
        .bind(article_id)
        .bind(item.status.as_str())
        .bind(item.created_at)
        .execute(&self.pool)
        .await?;
        Ok(item)
    }

    /// Get a worklist item by ID.
    pub async fn get_worklist_item(&self, id: WorklistId) -> Result<WorklistItem> {
        let row: Option<WorklistRow> = sqlx::query_as(
            "SELECT id, article_id, status, status_history, created_at, updated_at
             FROM worklist_items WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| Error::NotFound(format!("worklist item {id}")))?
            .try_into_item()
    }

    /// List worklist items, newest first, optionally filtered by status.
    pub async fn list_worklist_items(
        &self,
        status: Option<WorklistStatus>,
        limit: i64,
    ) -> Result<Vec<WorklistItem>> {
        let spellings: Option<Vec<&str>> = status.map(|s| s.stored_spellings().to_vec());
        let rows: Vec<WorklistRow> = sqlx::query_as(
            "SELECT id, article_id, status, status_history, created_at, updated_at
             FROM worklist_items
             WHERE ($1::text[] IS NULL OR status = ANY($1))
             ORDER BY updated_at DESC
             LIMIT $2",
        )
        .bind(spellings)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(WorklistRow::try_into_item).collect()
    }

    /// Forward transition, validated by the state machine.
    pub async fn transition_status(
        &self,
        id: WorklistId,
        from: WorklistStatus,
        to: WorklistStatus,
        actor: &str,
        reason: Option<&str>,
    ) -> Result<WorklistItem> {
        self.persist_change(id, from, |item| item.transition(from, to, actor, reason).map(|_| ()))
            .await
    }

    /// Retry a review stage, validated by the state machine.
    pub async fn retry_status(
        &self,
        id: WorklistId,
        from: WorklistStatus,
        to: WorklistStatus,
        actor: &str,
        reason: Option<&str>,
    ) -> Result<WorklistItem> {
        self.persist_change(id, from, |item| item.retry(from, to, actor, reason).map(|_| ()))
            .await
    }

    /// Finish proofreading review once the article has no pending
    /// decisions. Fails with `PendingDecisions` otherwise.
    pub async fn complete_review(&self, id: WorklistId, actor: &str) -> Result<WorklistItem> {
        let item = self.get_worklist_item(id).await?;
        let stats = self.load_review(item.article_id).await?.summary();
        self.persist_change(id, WorklistStatus::ProofreadingReview, |item| {
            worklist::complete_review(item, &stats, actor).map(|_| ())
        })
        .await
    }

    /// Apply `change` to the stored item and write it back if the stored
    /// status still reads `from`.
    async fn persist_change<F>(
        &self,
        id: WorklistId,
        from: WorklistStatus,
        change: F,
    ) -> Result<WorklistItem>
    where
        F: FnOnce(&mut WorklistItem) -> Result<()>,
    {
        let span = start_worklist_span(&id.0);

        async {
            let mut item = self.get_worklist_item(id).await?;
            change(&mut item)?;

            let entry = item
                .last_change()
                .cloned()
                .ok_or_else(|| Error::Other("transition left no history entry".to_string()))?;

            let rows_affected = sqlx::query(
                "UPDATE worklist_items
                 SET status = $1, status_history = status_history || jsonb_build_array($2::jsonb), updated_at = $3
                 WHERE id = $4 AND status = ANY($5)",
            )
            .bind(item.status.as_str())
            .bind(Json(&entry))
            .bind(item.updated_at)
            .bind(id.0)
            .bind(from.stored_spellings())
            .execute(&self.pool)
            .await?
            .rows_affected();

            if rows_affected == 0 {
                let current = self.get_worklist_item(id).await?;
                return Err(Error::StaleState {
                    expected: from,
                    actual: current.status,
                });
            }

            record_status_transition(&span, entry.from.as_str(), entry.to.as_str());
            Ok(item)
        }
        .instrument(span.clone())
        .await
    }
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct WorklistRow {
    id: Uuid,
    article_id: Uuid,
    status: String,
    status_history: Json<Vec<StatusChange>>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl WorklistRow {
    fn try_into_item(self) -> Result<WorklistItem> {
        Ok(WorklistItem {
            id: WorklistId(self.id),
            article_id: self.article_id,
            // `parse` maps legacy spellings onto the canonical status.
            status: self.status.parse()?,
            status_history: self.status_history.0,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
