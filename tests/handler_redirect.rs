mod common;

use serde_json::{Value, json};

async fn create(app: &common::TestApp, body: Value) {
    let response = app
        .server
        .post("/rest/short-urls")
        .add_header("X-Api-Key", app.api_key.as_str())
        .json(&body)
        .await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn test_redirect_success() {
    let mut app = common::spawn_app().await;
    create(
        &app,
        json!({ "long_url": "https://example.com/target", "custom_slug": "go" }),
    )
    .await;

    let response = app
        .server
        .get("/go")
        .add_header("User-Agent", "integration-test")
        .add_header("Referer", "https://referrer.example")
        .await;

    assert_eq!(response.status_code(), 307);
    assert_eq!(response.header("location"), "https://example.com/target");

    let event = app.locate_rx.try_recv().unwrap();
    assert_eq!(event.remote_addr.as_deref(), Some("203.0.113.7"));
}

#[tokio::test]
async fn test_redirect_not_found() {
    let app = common::spawn_app().await;

    let response = app.server.get("/nonexistent").await;

    assert_eq!(response.status_code(), 404);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_redirect_records_visit() {
    let app = common::spawn_app().await;
    create(
        &app,
        json!({ "long_url": "https://example.com", "custom_slug": "counted" }),
    )
    .await;

    app.server
        .get("/counted")
        .add_header("User-Agent", "integration-test")
        .await;

    let visits: Value = app
        .server
        .get("/rest/short-urls/counted/visits")
        .add_header("X-Api-Key", app.api_key.as_str())
        .await
        .json();

    assert_eq!(visits["pagination"]["total_items"], 1);
    assert_eq!(visits["data"][0]["user_agent"], "integration-test");
    assert_eq!(visits["data"][0]["remote_addr"], "203.0.113.7");
    assert!(visits["data"][0]["visit_location"].is_null());
}

#[tokio::test]
async fn test_max_visits_stops_redirecting() {
    let app = common::spawn_app().await;
    create(
        &app,
        json!({ "long_url": "https://example.com", "custom_slug": "twice", "max_visits": 2 }),
    )
    .await;

    assert_eq!(app.server.get("/twice").await.status_code(), 307);
    assert_eq!(app.server.get("/twice").await.status_code(), 307);
    assert_eq!(app.server.get("/twice").await.status_code(), 404);
}

#[tokio::test]
async fn test_redirect_outside_window_is_not_found() {
    let app = common::spawn_app().await;
    create(
        &app,
        json!({
            "long_url": "https://example.com",
            "custom_slug": "later",
            "valid_since": "2999-01-01T00:00:00Z"
        }),
    )
    .await;
    create(
        &app,
        json!({
            "long_url": "https://example.com",
            "custom_slug": "expired",
            "valid_until": "2000-01-01T00:00:00Z"
        }),
    )
    .await;

    assert_eq!(app.server.get("/later").await.status_code(), 404);
    assert_eq!(app.server.get("/expired").await.status_code(), 404);
}

#[tokio::test]
async fn test_redirect_survives_full_location_queue() {
    let app = common::spawn_app().await;
    create(
        &app,
        json!({ "long_url": "https://example.com", "custom_slug": "busy" }),
    )
    .await;

    // queue holds 100 events and nobody drains it
    for _ in 0..105 {
        assert_eq!(app.server.get("/busy").await.status_code(), 307);
    }
}

#[tokio::test]
async fn test_control_characters_never_reach_redirect() {
    let app = common::spawn_app().await;

    let response = app
        .server
        .post("/rest/short-urls")
        .add_header("X-Api-Key", app.api_key.as_str())
        .json(&json!({ "long_url": "https://example.com/a\u{1}b", "custom_slug": "ctl" }))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "INVALID_ARGUMENT");
    assert_eq!(app.server.get("/ctl").await.status_code(), 404);
}
