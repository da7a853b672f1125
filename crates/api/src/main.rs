use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, StatusCode};
use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marketplace_api::config::ServerConfig;
use marketplace_api::hub::HubTransport;
use marketplace_api::{routes, state, ws};
use marketplace_notifications::{
    cleanup, DeliveryConfig, DeliveryQueue, DeliveryWorker, MemoryNotificationStore,
    NotificationFacade, NotificationStore, PgNotificationStore, PipelineConfig,
};

use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "marketplace_api=debug,marketplace_notifications=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let pipeline_config = PipelineConfig::from_env();
    tracing::info!(
        queue_capacity = ?pipeline_config.queue_capacity,
        delivery_mode = ?pipeline_config.delivery_mode,
        send_timeout_ms = pipeline_config.send_timeout.map(|t| t.as_millis() as u64),
        "Loaded notification pipeline configuration"
    );

    // --- Notification store ---
    let store: Arc<dyn NotificationStore> = match &config.database_url {
        Some(database_url) => {
            let pool = marketplace_db::create_pool(database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            marketplace_db::health_check(&pool)
                .await
                .expect("Database health check failed");
            tracing::info!("Database health check passed");

            marketplace_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            Arc::new(PgNotificationStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, notifications are kept in memory");
            Arc::new(MemoryNotificationStore::new())
        }
    };

    // --- CORS ---
    let cors = build_cors_layer(&config);

    // --- WebSocket manager ---
    let ws_manager = Arc::new(ws::WsManager::new());

    // --- Heartbeat ---
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager));

    // --- Delivery pipeline ---
    let (queue_tx, queue_rx) = DeliveryQueue::from_capacity(pipeline_config.queue_capacity);
    let facade = NotificationFacade::new(Arc::clone(&store), queue_tx.clone());

    let transport = Arc::new(HubTransport::new(Arc::clone(&ws_manager)));
    let worker = DeliveryWorker::new(
        queue_rx,
        transport,
        DeliveryConfig::from(&pipeline_config),
    );
    let delivery_worker = worker.handle();
    let delivery_cancel = CancellationToken::new();
    let mut worker_handle = tokio::spawn(worker.run(delivery_cancel.clone()));

    // Spawn retention cleanup (purges old read notifications).
    let cleanup_cancel = CancellationToken::new();
    let cleanup_handle = tokio::spawn(cleanup::run(
        Arc::clone(&store),
        pipeline_config.retention_days,
        pipeline_config.cleanup_interval,
        cleanup_cancel.clone(),
    ));

    tracing::info!("Notification services started (delivery worker, retention cleanup)");

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        ws_manager: Arc::clone(&ws_manager),
        store,
        notifications: facade,
        delivery_worker,
    };

    // --- Request ID header name ---
    let request_id_header = HeaderName::from_static("x-request-id");

    // --- Router ---
    let app = Router::new()
        // Health check at root level (not under /api/v1).
        .merge(routes::health::router())
        // API v1 routes.
        .nest("/api/v1", routes::api_routes())
        // -- Middleware stack (applied bottom-up) --
        // Panic recovery: catch panics and return 500 JSON.
        .layer(CatchPanicLayer::new())
        // Request timeout.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        // Propagate request ID to response.
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        // Structured request/response tracing.
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Set request ID on incoming requests.
        .layer(SetRequestIdLayer::new(
            request_id_header,
            MakeRequestUuid,
        ))
        // CORS.
        .layer(cors)
        // Shared state.
        .with_state(state);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);

    // Close the queue so the worker drains what is already queued, then
    // stops. Cancel it if draining takes longer than the shutdown timeout.
    queue_tx.close();
    match tokio::time::timeout(shutdown_timeout, &mut worker_handle).await {
        Ok(Ok(stats)) => {
            tracing::info!(
                delivered = stats.delivered,
                failed = stats.failed,
                timed_out = stats.timed_out,
                "Delivery worker drained"
            );
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Delivery worker task failed");
        }
        Err(_) => {
            tracing::warn!(
                timeout_secs = shutdown_timeout.as_secs(),
                "Delivery worker did not drain in time, cancelling"
            );
            delivery_cancel.cancel();
            let _ = tokio::time::timeout(Duration::from_secs(5), worker_handle).await;
        }
    }

    // Stop retention cleanup.
    cleanup_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), cleanup_handle).await;
    tracing::info!("Retention cleanup stopped");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Heartbeat task stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Build the CORS middleware layer from server configuration.
///
/// Panics at startup if any configured origin is invalid; misconfiguration
/// should fail fast.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
