pub mod health;
pub mod notification;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws?profile_id={id}                               WebSocket (notification push)
///
/// /notifications                                    raise one (POST)
/// /notifications/batch                              raise a fan-out (POST)
/// /profiles/{profile_id}/notifications              history (GET)
/// /profiles/{profile_id}/notifications/read-all     mark all read (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/notifications", notification::router())
        .nest(
            "/profiles/{profile_id}/notifications",
            notification::profile_router(),
        )
}
