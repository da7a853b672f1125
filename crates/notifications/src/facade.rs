//! Producer-side entry point of the notification pipeline.
//!
//! [`NotificationFacade`] records each notification before publishing it to
//! the delivery queue, so a client that receives a live push always finds the
//! record in its history. It returns as soon as the message is queued and
//! never waits on the transport.

use std::sync::Arc;

use marketplace_core::error::CoreError;
use marketplace_core::notification::NewNotification;
use marketplace_db::models::notification::{CreateNotification, Notification};

use crate::message::{DeliveryMessage, SendNotificationMessage, SendNotificationsRequestMessage};
use crate::queue::{QueueError, QueueSender};
use crate::store::{NotificationStore, StoreError};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for notify operations.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The draft failed field validation. Nothing was recorded.
    #[error(transparent)]
    Invalid(#[from] CoreError),

    /// The notification could not be recorded. Nothing was queued.
    #[error("Failed to record notification: {0}")]
    Persistence(#[from] StoreError),

    /// The notification was recorded but the delivery queue is closed, so
    /// it will only show up in history.
    #[error("Notification recorded but not queued for delivery: {0}")]
    QueueClosed(#[from] QueueError),
}

// ---------------------------------------------------------------------------
// NotificationFacade
// ---------------------------------------------------------------------------

/// Records notifications and queues them for live delivery.
///
/// Cheap to clone; every clone shares the same store and queue.
#[derive(Clone)]
pub struct NotificationFacade {
    store: Arc<dyn NotificationStore>,
    queue: QueueSender,
}

impl NotificationFacade {
    /// Create a facade writing to `store` and publishing to `queue`.
    pub fn new(store: Arc<dyn NotificationStore>, queue: QueueSender) -> Self {
        Self { store, queue }
    }

    /// Record one notification and queue it for delivery.
    ///
    /// Returns the stored record once it is queued, or `None` when the
    /// recipient is also the sender: users are never notified of their own
    /// actions, so such a draft is skipped without being recorded.
    pub async fn notify(
        &self,
        draft: NewNotification,
    ) -> Result<Option<Notification>, NotifyError> {
        draft.check()?;
        if draft.is_self_notification() {
            tracing::debug!(
                recipient_id = %draft.recipient_id,
                "Skipping notification addressed to its own sender"
            );
            return Ok(None);
        }

        let record = self.store.create(CreateNotification::stamp(draft)).await?;

        self.publish(DeliveryMessage::Single(record.clone().into()), 1)
            .await?;

        tracing::debug!(
            notification_id = %record.id,
            recipient_id = %record.recipient_id,
            "Notification queued"
        );
        Ok(Some(record))
    }

    /// Record a fan-out of notifications and queue them as one batch.
    ///
    /// Every draft is validated before anything is written; drafts addressed
    /// to their own sender are skipped. All remaining records are written in
    /// one call, then published in input order as a single message.
    pub async fn notify_many(
        &self,
        drafts: Vec<NewNotification>,
    ) -> Result<Vec<Notification>, NotifyError> {
        for draft in &drafts {
            draft.check()?;
        }

        let inputs: Vec<CreateNotification> = drafts
            .into_iter()
            .filter(|d| !d.is_self_notification())
            .map(CreateNotification::stamp)
            .collect();

        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let records = self.store.create_many(inputs).await?;

        let batch = SendNotificationsRequestMessage {
            notifications: records
                .iter()
                .cloned()
                .map(SendNotificationMessage::from)
                .collect(),
        };
        self.publish(DeliveryMessage::Batch(batch), records.len())
            .await?;

        tracing::debug!(count = records.len(), "Notification batch queued");
        Ok(records)
    }

    async fn publish(&self, message: DeliveryMessage, count: usize) -> Result<(), QueueError> {
        self.queue.enqueue(message).await.inspect_err(|e| {
            tracing::error!(
                error = %e,
                count,
                "Notification recorded but could not be queued for delivery"
            );
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
