#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use marketplace_api::config::ServerConfig;
use marketplace_api::hub::HubTransport;
use marketplace_api::routes;
use marketplace_api::state::AppState;
use marketplace_api::ws::WsManager;
use marketplace_notifications::{
    DeliveryConfig, DeliveryQueue, DeliveryWorker, MemoryNotificationStore, NotificationFacade,
    QueueSender,
};

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout. No database: notifications are kept in
/// memory.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        database_url: None,
    }
}

/// A fully wired application plus handles to its internals.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub ws_manager: Arc<WsManager>,
    pub store: Arc<MemoryNotificationStore>,
    pub queue: QueueSender,
    pub cancel: CancellationToken,
}

/// Build the full application router with all middleware layers and a
/// running delivery worker over an in-memory store.
///
/// This mirrors the wiring in `main.rs` so integration tests exercise the
/// same middleware stack (CORS, request ID, timeout, tracing, panic
/// recovery) and the same delivery path that production uses.
pub async fn build_test_app() -> TestApp {
    let config = test_config();
    let ws_manager = Arc::new(WsManager::new());
    let store = Arc::new(MemoryNotificationStore::new());

    let (queue, rx) = DeliveryQueue::unbounded();
    let facade = NotificationFacade::new(store.clone(), queue.clone());
    let worker = DeliveryWorker::new(
        rx,
        Arc::new(HubTransport::new(Arc::clone(&ws_manager))),
        DeliveryConfig::default(),
    );
    let delivery_worker = worker.handle();
    let cancel = CancellationToken::new();
    tokio::spawn(worker.run(cancel.clone()));

    while !delivery_worker.is_running() {
        tokio::task::yield_now().await;
    }

    let state = AppState {
        config: Arc::new(config),
        ws_manager: Arc::clone(&ws_manager),
        store: store.clone(),
        notifications: facade,
        delivery_worker,
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    let router = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state.clone());

    TestApp {
        router,
        state,
        ws_manager,
        store,
        queue,
        cancel,
    }
}

/// Send a GET request through the router.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a POST request with a JSON body through the router.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
