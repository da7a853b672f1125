//! Handlers for notifications.
//!
//! The create endpoints go through the notification facade, so every
//! accepted notification is recorded and queued for live delivery. The
//! profile endpoints read and update history directly.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use marketplace_core::notification::NewNotification;
use marketplace_core::types::ProfileId;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query types
// ---------------------------------------------------------------------------

/// Query parameters for the history listing.
#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}

/// Maximum page size for notification listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for notification listing.
const DEFAULT_LIMIT: i64 = 50;

// ---------------------------------------------------------------------------
// Raising notifications
// ---------------------------------------------------------------------------

/// POST /api/v1/notifications
///
/// Record a notification and queue it for delivery. Returns 201 with the
/// stored record, or 200 with `null` data when the recipient is also the
/// sender and nothing was recorded.
pub async fn create_notification(
    State(state): State<AppState>,
    Json(draft): Json<NewNotification>,
) -> AppResult<impl IntoResponse> {
    let record = state.notifications.notify(draft).await?;
    let status = if record.is_some() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(serde_json::json!({ "data": record }))))
}

/// POST /api/v1/notifications/batch
///
/// Record a fan-out and queue it as one batch. Drafts addressed to their
/// own sender are skipped; the response holds only the stored records.
pub async fn create_notifications(
    State(state): State<AppState>,
    Json(drafts): Json<Vec<NewNotification>>,
) -> AppResult<impl IntoResponse> {
    if drafts.is_empty() {
        return Err(AppError::BadRequest("At least one notification is required".into()));
    }

    let records = state.notifications.notify_many(drafts).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "data": records })),
    ))
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// GET /api/v1/profiles/{profile_id}/notifications
///
/// A profile's notifications, newest first.
pub async fn list_notifications(
    State(state): State<AppState>,
    Path(profile_id): Path<ProfileId>,
    Query(params): Query<NotificationQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let notifications = state
        .store
        .list_for_recipient(&profile_id, limit, offset)
        .await?;

    Ok(Json(serde_json::json!({ "data": notifications })))
}

/// POST /api/v1/profiles/{profile_id}/notifications/read-all
///
/// Mark every unread notification of the profile as read.
pub async fn mark_all_read(
    State(state): State<AppState>,
    Path(profile_id): Path<ProfileId>,
) -> AppResult<Json<serde_json::Value>> {
    let updated = state.store.mark_all_read(&profile_id).await?;

    tracing::debug!(profile_id = %profile_id, updated, "Marked notifications read");

    Ok(Json(serde_json::json!({ "data": { "updated": updated } })))
}
