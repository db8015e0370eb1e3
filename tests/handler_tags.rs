mod common;

use serde_json::{Value, json};

async fn create_short_url(app: &common::TestApp, slug: &str, tags: &[&str]) {
    let response = app
        .server
        .post("/rest/short-urls")
        .add_header("X-Api-Key", app.api_key.as_str())
        .json(&json!({ "long_url": "https://example.com", "custom_slug": slug, "tags": tags }))
        .await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn test_tags_require_api_key() {
    let app = common::spawn_app().await;

    assert_eq!(app.server.get("/rest/tags").await.status_code(), 401);
}

#[tokio::test]
async fn test_list_counts_usage() {
    let app = common::spawn_app().await;
    create_short_url(&app, "one", &["alpha", "beta"]).await;
    create_short_url(&app, "two", &["alpha"]).await;

    let body: Value = app
        .server
        .get("/rest/tags")
        .add_header("X-Api-Key", app.api_key.as_str())
        .await
        .json();

    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["name"], "alpha");
    assert_eq!(data[0]["short_urls_count"], 2);
    assert_eq!(data[1]["name"], "beta");
    assert_eq!(data[1]["short_urls_count"], 1);
}

#[tokio::test]
async fn test_create_and_delete() {
    let app = common::spawn_app().await;

    let response = app
        .server
        .post("/rest/tags")
        .add_header("X-Api-Key", app.api_key.as_str())
        .json(&json!({ "tags": ["one", "two"] }))
        .await;
    assert_eq!(response.status_code(), 201);

    let response = app
        .server
        .delete("/rest/tags")
        .add_header("X-Api-Key", app.api_key.as_str())
        .add_query_param("tags", "one,unknown")
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["affected"], 1);

    let body: Value = app
        .server
        .get("/rest/tags")
        .add_header("X-Api-Key", app.api_key.as_str())
        .await
        .json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["name"], "two");
}

#[tokio::test]
async fn test_rename_moves_tag_on_short_urls() {
    let app = common::spawn_app().await;
    create_short_url(&app, "renamed", &["before"]).await;

    let response = app
        .server
        .put("/rest/tags")
        .add_header("X-Api-Key", app.api_key.as_str())
        .json(&json!({ "old_name": "before", "new_name": "after" }))
        .await;
    assert_eq!(response.status_code(), 204);

    let body: Value = app
        .server
        .get("/rest/short-urls/renamed")
        .add_header("X-Api-Key", app.api_key.as_str())
        .await
        .json();
    assert_eq!(body["tags"], json!(["after"]));
}

#[tokio::test]
async fn test_rename_errors() {
    let app = common::spawn_app().await;
    create_short_url(&app, "both", &["a", "b"]).await;

    let missing = app
        .server
        .put("/rest/tags")
        .add_header("X-Api-Key", app.api_key.as_str())
        .json(&json!({ "old_name": "nope", "new_name": "c" }))
        .await;
    assert_eq!(missing.status_code(), 404);

    let taken = app
        .server
        .put("/rest/tags")
        .add_header("X-Api-Key", app.api_key.as_str())
        .json(&json!({ "old_name": "a", "new_name": "b" }))
        .await;
    assert_eq!(taken.status_code(), 409);
}
