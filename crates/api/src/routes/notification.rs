//! Route definitions for notifications.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::notification;
use crate::state::AppState;

/// Routes mounted at `/notifications`.
///
/// ```text
/// POST   /                          -> create_notification
/// POST   /batch                     -> create_notifications
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(notification::create_notification))
        .route("/batch", post(notification::create_notifications))
}

/// Routes mounted at `/profiles/{profile_id}/notifications`.
///
/// ```text
/// GET    /                          -> list_notifications
/// POST   /read-all                  -> mark_all_read
/// ```
pub fn profile_router() -> Router<AppState> {
    Router::new()
        .route("/", get(notification::list_notifications))
        .route("/read-all", post(notification::mark_all_read))
}
