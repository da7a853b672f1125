//! Persistence port for notification records.
//!
//! The facade only needs to record notifications; the read-side methods are
//! here for the history/mark-as-read collaborators and the retention job.
//!
//! - [`PgNotificationStore`]: PostgreSQL via [`NotificationRepo`].
//! - [`MemoryNotificationStore`]: process-local, used when no database is
//!   configured and in tests.

use async_trait::async_trait;
use marketplace_core::types::Timestamp;
use marketplace_db::models::notification::{CreateNotification, Notification};
use marketplace_db::repositories::NotificationRepo;
use marketplace_db::DbPool;
use tokio::sync::RwLock;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The database rejected or failed the operation.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The backing store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// NotificationStore
// ---------------------------------------------------------------------------

/// Durable storage for notifications.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Record a notification and return the stored row.
    async fn create(&self, input: CreateNotification) -> Result<Notification, StoreError>;

    /// Record several notifications atomically, returning rows in input order.
    async fn create_many(
        &self,
        inputs: Vec<CreateNotification>,
    ) -> Result<Vec<Notification>, StoreError>;

    /// A recipient's notifications, newest first.
    async fn list_for_recipient(
        &self,
        recipient_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, StoreError>;

    /// Mark every unread notification of a recipient as read.
    async fn mark_all_read(&self, recipient_id: &str) -> Result<u64, StoreError>;

    /// Delete read notifications created before `cutoff`.
    async fn delete_read_older_than(&self, cutoff: Timestamp) -> Result<u64, StoreError>;

    /// Verify the store is reachable.
    async fn health_check(&self) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// PgNotificationStore
// ---------------------------------------------------------------------------

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgNotificationStore {
    pool: DbPool,
}

impl PgNotificationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn create(&self, input: CreateNotification) -> Result<Notification, StoreError> {
        Ok(NotificationRepo::create(&self.pool, &input).await?)
    }

    async fn create_many(
        &self,
        inputs: Vec<CreateNotification>,
    ) -> Result<Vec<Notification>, StoreError> {
        Ok(NotificationRepo::create_many(&self.pool, &inputs).await?)
    }

    async fn list_for_recipient(
        &self,
        recipient_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, StoreError> {
        Ok(NotificationRepo::list_for_recipient(&self.pool, recipient_id, limit, offset).await?)
    }

    async fn mark_all_read(&self, recipient_id: &str) -> Result<u64, StoreError> {
        Ok(NotificationRepo::mark_all_read(&self.pool, recipient_id).await?)
    }

    async fn delete_read_older_than(&self, cutoff: Timestamp) -> Result<u64, StoreError> {
        Ok(NotificationRepo::delete_read_older_than(&self.pool, cutoff).await?)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(marketplace_db::health_check(&self.pool).await?)
    }
}

// ---------------------------------------------------------------------------
// MemoryNotificationStore
// ---------------------------------------------------------------------------

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryNotificationStore {
    rows: RwLock<Vec<Notification>>,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored notifications.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn create(&self, input: CreateNotification) -> Result<Notification, StoreError> {
        let row = input.into_row();
        self.rows.write().await.push(row.clone());
        Ok(row)
    }

    async fn create_many(
        &self,
        inputs: Vec<CreateNotification>,
    ) -> Result<Vec<Notification>, StoreError> {
        let created: Vec<Notification> = inputs.into_iter().map(CreateNotification::into_row).collect();
        self.rows.write().await.extend(created.iter().cloned());
        Ok(created)
    }

    async fn list_for_recipient(
        &self,
        recipient_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, StoreError> {
        let rows = self.rows.read().await;
        let mut matching: Vec<Notification> = rows
            .iter()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect();
        // v7 ids break ties between equal timestamps in creation order.
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn mark_all_read(&self, recipient_id: &str) -> Result<u64, StoreError> {
        let mut rows = self.rows.write().await;
        let mut count = 0;
        for row in rows
            .iter_mut()
            .filter(|n| n.recipient_id == recipient_id && !n.is_read)
        {
            row.is_read = true;
            count += 1;
        }
        Ok(count)
    }

    async fn delete_read_older_than(&self, cutoff: Timestamp) -> Result<u64, StoreError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|n| !(n.is_read && n.created_at < cutoff));
        Ok((before - rows.len()) as u64)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use marketplace_core::notification::NewNotification;

    use super::*;

    fn stamped(recipient: &str, message: &str) -> CreateNotification {
        CreateNotification::stamp(NewNotification::new(recipient, message))
    }

    #[tokio::test]
    async fn create_assigns_unread_row() {
        let store = MemoryNotificationStore::new();
        let input = stamped("p1", "hello");
        let id = input.id;

        let row = store.create(input).await.unwrap();

        assert_eq!(row.id, id);
        assert!(!row.is_read);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn list_is_newest_first_and_scoped_to_recipient() {
        let store = MemoryNotificationStore::new();
        store.create(stamped("p1", "first")).await.unwrap();
        store.create(stamped("p2", "other")).await.unwrap();
        store.create(stamped("p1", "second")).await.unwrap();

        let rows = store.list_for_recipient("p1", 50, 0).await.unwrap();
        let messages: Vec<_> = rows.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, ["second", "first"]);

        let page = store.list_for_recipient("p1", 1, 1).await.unwrap();
        assert_eq!(page[0].message, "first");
    }

    #[tokio::test]
    async fn create_many_keeps_input_order() {
        let store = MemoryNotificationStore::new();
        let rows = store
            .create_many(vec![stamped("a", "1"), stamped("b", "2"), stamped("c", "3")])
            .await
            .unwrap();

        let recipients: Vec<_> = rows.iter().map(|n| n.recipient_id.as_str()).collect();
        assert_eq!(recipients, ["a", "b", "c"]);
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn mark_all_read_only_touches_unread_rows_of_recipient() {
        let store = MemoryNotificationStore::new();
        store.create(stamped("p1", "a")).await.unwrap();
        store.create(stamped("p1", "b")).await.unwrap();
        store.create(stamped("p2", "c")).await.unwrap();

        assert_eq!(store.mark_all_read("p1").await.unwrap(), 2);
        assert_eq!(store.mark_all_read("p1").await.unwrap(), 0);

        let others = store.list_for_recipient("p2", 10, 0).await.unwrap();
        assert!(!others[0].is_read);
    }

    #[tokio::test]
    async fn delete_read_older_than_keeps_unread_and_recent() {
        let store = MemoryNotificationStore::new();
        let mut old_read = stamped("p1", "old read");
        old_read.created_at = Utc::now() - Duration::days(40);
        let mut old_unread = stamped("p2", "old unread");
        old_unread.created_at = Utc::now() - Duration::days(40);

        store.create(old_read).await.unwrap();
        store.create(old_unread).await.unwrap();
        store.create(stamped("p1", "recent")).await.unwrap();
        store.mark_all_read("p1").await.unwrap();

        let deleted = store
            .delete_read_older_than(Utc::now() - Duration::days(30))
            .await
            .unwrap();

        assert_eq!(deleted, 1);
        assert_eq!(store.len().await, 2);
    }
}
