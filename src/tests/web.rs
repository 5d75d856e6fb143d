use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::storage::BackendLocal;
use crate::store::EntryStore;
use crate::web::{router, SharedState};

fn app() -> (Router, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let store = EntryStore::load(BackendLocal::new(tmp.path()).unwrap(), "data.json").unwrap();
    (router(Arc::new(SharedState { store }), None), tmp)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn seed(app: &Router) {
    for (url, title, tags) in [
        ("https://go.dev", "Go", json!(["dev/go"])),
        ("https://rust-lang.org", "Rust Book", json!(["dev"])),
        ("https://news.com", "Daily news", json!([])),
    ] {
        let (status, _) = send(
            app,
            Method::POST,
            "/api/entries",
            Some(json!({"url": url, "title": title, "tags": tags})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_health() {
    let (app, _tmp) = app();
    let (status, body) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert!(body["time"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cors_headers_and_preflight() {
    let (app, _tmp) = app();
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/entries")
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(res.headers()[header::CACHE_CONTROL], "no-store");
    assert_eq!(
        res.headers()[header::ACCESS_CONTROL_ALLOW_METHODS],
        "GET,POST,PUT,DELETE,OPTIONS"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_entry_crud() {
    let (app, _tmp) = app();

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/entries",
        Some(json!({"url": "https://a.com", "tags": "x, y"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["title"], "https://a.com");
    assert_eq!(created["tags"], json!(["x", "y"]));
    let id = created["id"].as_str().unwrap().to_string();

    let (status, got) = send(&app, Method::GET, &format!("/api/entries/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(got["url"], "https://a.com");

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/entries/{id}"),
        Some(json!({"title": "A"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "A");
    assert_eq!(updated["createdAt"], created["createdAt"]);

    let (status, deleted) =
        send(&app, Method::DELETE, &format!("/api/entries/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["deleted"], true);
    assert_eq!(deleted["entry"]["id"], id.as_str());

    let (status, body) = send(&app, Method::GET, &format!("/api/entries/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not found");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_create_invalid_url() {
    let (app, _tmp) = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/entries",
        Some(json!({"url": "ftp://a.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "url must start with http:// or https://");

    let (status, body) = send(&app, Method::POST, "/api/entries", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "url is required");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_search() {
    let (app, _tmp) = app();
    seed(&app).await;

    let (status, body) = send(&app, Method::GET, "/api/search", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["path"], "__ALL__");

    let (_, body) = send(&app, Method::GET, "/api/search?q=rust%20OR%20go&path=dev", None).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["q"], "rust OR go");

    let (_, body) = send(&app, Method::GET, "/api/search?path=dev/go", None).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["entries"][0]["title"], "Go");

    let (_, body) = send(&app, Method::GET, "/api/search?q=%22daily%20news%22", None).await;
    assert_eq!(body["count"], 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_tags_tree() {
    let (app, _tmp) = app();
    seed(&app).await;

    let (status, tree) = send(&app, Method::GET, "/api/tags/tree", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tree["name"], "All");
    assert_eq!(tree["path"], "__ALL__");
    assert_eq!(tree["count"], 3);
    assert_eq!(tree["children"]["dev"]["count"], 2);
    assert_eq!(tree["children"]["dev"]["children"]["go"]["path"], "dev/go");
    assert_eq!(tree["children"]["Untagged"]["count"], 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_import_export() {
    let (app, _tmp) = app();
    seed(&app).await;

    let (status, body) = send(&app, Method::POST, "/api/import", Some(json!({"entries": 5}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "entries must be a list");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/import",
        Some(json!({"entries": [
            {"id": "1", "url": "https://a.com", "tags": ["dev"]},
            {"title": "no url"}
        ]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["imported"], 1);

    let (_, doc) = send(&app, Method::GET, "/api/export", None).await;
    assert_eq!(doc["version"], 1);
    assert_eq!(doc["entries"].as_array().unwrap().len(), 1);
    assert_eq!(doc["entries"][0]["id"], "1");

    let (_, list) = send(&app, Method::GET, "/api/entries", None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}
