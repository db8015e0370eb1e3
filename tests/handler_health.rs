mod common;

use serde_json::Value;

#[tokio::test]
async fn test_health_check_healthy() {
    let app = common::spawn_app().await;

    let response = app.server.get("/health").await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["database"]["status"], "ok");
    assert_eq!(body["checks"]["location_queue"]["status"], "ok");
    assert_eq!(body["checks"]["cache"]["status"], "ok");
}

#[tokio::test]
async fn test_health_check_degraded_without_location_worker() {
    let app = common::spawn_app().await;
    drop(app.locate_rx);

    let response = app.server.get("/health").await;

    assert_eq!(response.status_code(), 503);
    let body: Value = response.json();
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"]["location_queue"]["status"], "error");
}
