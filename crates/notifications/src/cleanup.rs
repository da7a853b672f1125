//! Periodic purge of read notifications.
//!
//! Deletes read notifications older than the retention period on a fixed
//! interval. Unread notifications are never purged.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::store::NotificationStore;

/// Run the retention loop until `cancel` is triggered.
///
/// The first purge happens immediately, then once per `interval`.
pub async fn run(
    store: Arc<dyn NotificationStore>,
    retention_days: i64,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        retention_days,
        interval_secs = interval.as_secs(),
        "Notification retention job started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Notification retention job stopping");
                break;
            }
            _ = ticker.tick() => {
                purge_once(store.as_ref(), retention_days).await;
            }
        }
    }
}

/// Run a single purge pass. Errors are logged, never returned.
pub async fn purge_once(store: &dyn NotificationStore, retention_days: i64) -> u64 {
    let cutoff = Utc::now() - chrono::Duration::days(retention_days);
    match store.delete_read_older_than(cutoff).await {
        Ok(deleted) => {
            if deleted > 0 {
                tracing::info!(deleted, "Notification retention: purged read notifications");
            } else {
                tracing::debug!("Notification retention: nothing to purge");
            }
            deleted
        }
        Err(e) => {
            tracing::error!(error = %e, "Notification retention: cleanup failed");
            0
        }
    }
}
