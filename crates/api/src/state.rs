use std::sync::Arc;

use marketplace_notifications::{NotificationFacade, NotificationStore, WorkerHandle};

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (browser clients).
    pub ws_manager: Arc<WsManager>,
    /// Notification history, PostgreSQL or in-memory.
    pub store: Arc<dyn NotificationStore>,
    /// Entry point for raising notifications.
    pub notifications: NotificationFacade,
    /// Lifecycle view of the delivery worker.
    pub delivery_worker: WorkerHandle,
}
