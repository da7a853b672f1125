//! Repository for the `notifications` table.

use sqlx::PgPool;

use crate::models::notification::{CreateNotification, Notification};
use marketplace_core::types::Timestamp;

/// Column list for `notifications` queries.
const COLUMNS: &str = "id, recipient_id, sender_id, message, is_read, \
                       action_url, icon_url, icon_action_url, created_at";

/// Provides persistence operations for notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Insert a single notification, returning the stored row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateNotification,
    ) -> Result<Notification, sqlx::Error> {
        Self::insert(pool, input).await
    }

    /// Insert several notifications in one transaction.
    ///
    /// Either every row is committed or none is. Rows are returned in input
    /// order.
    pub async fn create_many(
        pool: &PgPool,
        inputs: &[CreateNotification],
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut rows = Vec::with_capacity(inputs.len());

        for input in inputs {
            rows.push(Self::insert(&mut *tx, input).await?);
        }

        tx.commit().await?;
        tracing::debug!(count = rows.len(), "Inserted notification batch");
        Ok(rows)
    }

    async fn insert<'e, E>(executor: E, input: &CreateNotification) -> Result<Notification, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO notifications \
                (id, recipient_id, sender_id, message, is_read, \
                 action_url, icon_url, icon_action_url, created_at) \
             VALUES ($1, $2, $3, $4, false, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(input.id)
            .bind(&input.draft.recipient_id)
            .bind(&input.draft.sender_id)
            .bind(&input.draft.message)
            .bind(&input.draft.action_url)
            .bind(&input.draft.icon_url)
            .bind(&input.draft.icon_action_url)
            .bind(input.created_at)
            .fetch_one(executor)
            .await
    }

    /// List a recipient's notifications, newest first.
    pub async fn list_for_recipient(
        pool: &PgPool,
        recipient_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE recipient_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(recipient_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Mark all unread notifications as read for a recipient.
    ///
    /// Returns the number of notifications that were marked read.
    pub async fn mark_all_read(pool: &PgPool, recipient_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_read = true \
             WHERE recipient_id = $1 AND is_read = false",
        )
        .bind(recipient_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete read notifications created before `cutoff`.
    ///
    /// Returns the number of deleted rows.
    pub async fn delete_read_older_than(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM notifications \
             WHERE is_read = true AND created_at < $1",
        )
        .bind(cutoff)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
