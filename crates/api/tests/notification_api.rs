//! Integration tests for the notification endpoints and live delivery.

mod common;

use std::time::Duration;

use axum::extract::ws::Message;
use axum::http::StatusCode;
use common::{body_json, get, post_json};
use serde_json::json;

async fn next_frame(rx: &mut tokio::sync::mpsc::UnboundedReceiver<Message>) -> serde_json::Value {
    let msg = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("frame should arrive")
        .expect("channel open");
    match msg {
        Message::Text(t) => serde_json::from_str(t.as_str()).unwrap(),
        other => panic!("Expected text frame, got: {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Test: POST /notifications records and pushes to the recipient
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_notification_is_recorded_and_pushed() {
    let app = common::build_test_app().await;
    let mut alice = app.ws_manager.add("a".to_string(), Some("alice".into())).await;

    let response = post_json(
        app.router.clone(),
        "/api/v1/notifications",
        json!({
            "recipient_id": "alice",
            "sender_id": "bob",
            "message": "Bob replied to your comment",
            "action_url": "/posts/7/#comment-9"
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(created["data"]["isRead"], false);
    assert_eq!(created["data"]["recipientId"], "alice");

    let frame = next_frame(&mut alice).await;
    assert_eq!(frame["type"], "notification");
    assert_eq!(frame["data"]["id"], id);
    assert_eq!(frame["data"]["message"], "Bob replied to your comment");

    assert_eq!(app.store.len().await, 1);
}

// ---------------------------------------------------------------------------
// Test: validation failures return 400 and record nothing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_notification_returns_400() {
    let app = common::build_test_app().await;

    let response = post_json(
        app.router,
        "/api/v1/notifications",
        json!({ "recipient_id": "alice", "message": "x".repeat(501) }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(app.store.is_empty().await);
}

// ---------------------------------------------------------------------------
// Test: notifying yourself is skipped
// ---------------------------------------------------------------------------

#[tokio::test]
async fn self_notification_is_skipped() {
    let app = common::build_test_app().await;

    let response = post_json(
        app.router,
        "/api/v1/notifications",
        json!({ "recipient_id": "alice", "sender_id": "alice", "message": "hi me" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["data"].is_null());
    assert!(app.store.is_empty().await);
}

// ---------------------------------------------------------------------------
// Test: a closed queue reports 503 but keeps the record
// ---------------------------------------------------------------------------

#[tokio::test]
async fn closed_queue_returns_503_and_keeps_history() {
    let app = common::build_test_app().await;
    app.queue.close();

    let response = post_json(
        app.router,
        "/api/v1/notifications",
        json!({ "recipient_id": "alice", "message": "late" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["code"], "DELIVERY_UNAVAILABLE");
    assert_eq!(app.store.len().await, 1);
}

// ---------------------------------------------------------------------------
// Test: batch fan-out skips the sender and pushes in order
// ---------------------------------------------------------------------------

#[tokio::test]
async fn batch_skips_sender_and_pushes_each_recipient() {
    let app = common::build_test_app().await;
    let mut alice = app.ws_manager.add("a".to_string(), Some("alice".into())).await;
    let mut carol = app.ws_manager.add("c".to_string(), Some("carol".into())).await;
    let mut bob = app.ws_manager.add("b".to_string(), Some("bob".into())).await;

    let response = post_json(
        app.router,
        "/api/v1/notifications/batch",
        json!([
            { "recipient_id": "alice", "sender_id": "bob", "message": "New job match" },
            { "recipient_id": "bob", "sender_id": "bob", "message": "New job match" },
            { "recipient_id": "carol", "sender_id": "bob", "message": "New job match" }
        ]),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 2);

    assert_eq!(next_frame(&mut alice).await["data"]["recipientId"], "alice");
    assert_eq!(next_frame(&mut carol).await["data"]["recipientId"], "carol");

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(bob.try_recv().is_err(), "sender must not be notified");
}

#[tokio::test]
async fn empty_batch_returns_400() {
    let app = common::build_test_app().await;

    let response = post_json(app.router, "/api/v1/notifications/batch", json!([])).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Test: history lists newest first and read-all marks them read
// ---------------------------------------------------------------------------

#[tokio::test]
async fn history_and_read_all() {
    let app = common::build_test_app().await;

    for text in ["first", "second"] {
        let response = post_json(
            app.router.clone(),
            "/api/v1/notifications",
            json!({ "recipient_id": "alice", "message": text }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let history = body_json(get(app.router.clone(), "/api/v1/profiles/alice/notifications").await).await;
    let messages: Vec<_> = history["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["message"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(messages, ["second", "first"]);

    let response = post_json(
        app.router.clone(),
        "/api/v1/profiles/alice/notifications/read-all",
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["updated"], 2);

    let history = body_json(get(app.router, "/api/v1/profiles/alice/notifications?limit=1").await).await;
    let page = history["data"].as_array().unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["isRead"], true);
    assert_eq!(page[0]["recipientId"], "alice");
    assert!(page[0].get("is_read").is_none());
}
