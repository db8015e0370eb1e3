mod common;

use serde_json::Value;

#[tokio::test]
async fn test_missing_api_key_is_invalid_argument() {
    let app = common::spawn_app().await;

    let response = app
        .server
        .get("/rest/short-urls/shorten")
        .add_query_param("long_url", "https://example.com")
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "INVALID_ARGUMENT");
    assert_eq!(
        body["error"]["message"],
        "No API key was provided or it is not valid"
    );
}

#[tokio::test]
async fn test_unknown_api_key_is_invalid_argument() {
    let app = common::spawn_app().await;

    let response = app
        .server
        .get("/rest/short-urls/shorten")
        .add_query_param("api_key", "nope")
        .add_query_param("long_url", "https://example.com")
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(
        body["error"]["message"],
        "No API key was provided or it is not valid"
    );
}

#[tokio::test]
async fn test_missing_url_is_invalid_argument() {
    let app = common::spawn_app().await;

    let response = app
        .server
        .get("/rest/short-urls/shorten")
        .add_query_param("api_key", app.api_key.as_str())
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "INVALID_ARGUMENT");
    assert_eq!(body["error"]["message"], "A URL was not provided");
}

#[tokio::test]
async fn test_single_step_success() {
    let app = common::spawn_app().await;

    let response = app
        .server
        .get("/rest/short-urls/shorten")
        .add_query_param("api_key", app.api_key.as_str())
        .add_query_param("long_url", "https://example.com/single")
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["long_url"], "https://example.com/single");

    let code = body["short_code"].as_str().unwrap().to_string();
    let redirect = app.server.get(&format!("/{code}")).await;
    assert_eq!(redirect.status_code(), 307);
}

#[tokio::test]
async fn test_disabled_key_is_rejected() {
    let app = common::spawn_app().await;
    app.state.api_key_service.disable(&app.api_key).await.unwrap();

    let response = app
        .server
        .get("/rest/short-urls/shorten")
        .add_query_param("api_key", app.api_key.as_str())
        .add_query_param("long_url", "https://example.com")
        .await;

    assert_eq!(response.status_code(), 400);
}
