use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use axum::Router;
use docqa_core::{Corpus, SharedCorpus};
use docqa_server::{build_app, ServerConfig};
use http_body_util::BodyExt;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use tower::ServiceExt;

fn write_docs(dir: &Path) {
    fs::write(dir.join("cat.txt"), "The cat sat on the mat.").unwrap();
    fs::write(dir.join("dog.md"), "The dog ran in the park.").unwrap();
    fs::write(dir.join("skip.bin"), [0u8, 255, 1]).unwrap();
}

fn app(docs_dir: &Path, admin_token: Option<&str>) -> (Router, SharedCorpus) {
    let corpus = SharedCorpus::new(Corpus::new());
    let config = ServerConfig {
        docs_dir: docs_dir.to_path_buf(),
        admin_token: admin_token.map(str::to_string),
        cors_origins: vec![],
    };
    (build_app(config, corpus.clone()).unwrap(), corpus)
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Bytes) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, json: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri).header("content-type", "application/json");
    if let Some(t) = token {
        builder = builder.header("X-ADMIN-TOKEN", t);
    }
    builder.body(Body::from(json.to_string())).unwrap()
}

#[tokio::test]
async fn folder_load_then_search_returns_ranked_results() {
    let dir = tempdir().unwrap();
    write_docs(dir.path());
    let (app, _) = app(dir.path(), None);

    let folder = dir.path().to_string_lossy().to_string();
    let (status, body) = call(app.clone(), post("/index/folder", serde_json::json!({ "path": folder }), None)).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["files"], 2);
    assert_eq!(json["chunks"], 2);

    let (status, body) = call(app, get("/search?q=cat&k=5")).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 1);
    assert!(arr[0]["doc_path"].as_str().unwrap().ends_with("cat.txt"));
    assert_eq!(arr[0]["chunk_id"], 0);
    assert!(arr[0]["score"].as_f64().unwrap() > 0.0);
    assert_eq!(arr[0]["snippet"], "The <em>cat</em> sat on the mat.");
}

#[tokio::test]
async fn deferred_rebuild_needs_commit() {
    let dir = tempdir().unwrap();
    write_docs(dir.path());
    let (app, corpus) = app(dir.path(), None);

    let req = post("/index/file", serde_json::json!({ "path": "dog.md", "rebuild": false }), None);
    let (status, _) = call(app.clone(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(corpus.read().needs_rebuild());

    let (_, body) = call(app.clone(), get("/search?q=dog")).await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["total_hits"], 0);

    let (status, _) = call(app.clone(), post("/index/commit", Value::Null, None)).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = call(app, get("/search?q=dog")).await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["total_hits"], 1);
}

#[tokio::test]
async fn unsupported_file_is_not_found() {
    let dir = tempdir().unwrap();
    write_docs(dir.path());
    let (app, _) = app(dir.path(), None);
    let (status, _) = call(app.clone(), post("/index/file", serde_json::json!({ "path": "skip.bin" }), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(app, post("/index/folder", serde_json::json!({ "path": "missing" }), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_token_guards_mutations() {
    let dir = tempdir().unwrap();
    write_docs(dir.path());
    let (app, corpus) = app(dir.path(), Some("s3cret"));

    let body = serde_json::json!({ "path": "cat.txt" });
    let (status, _) = call(app.clone(), post("/index/file", body.clone(), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = call(app.clone(), post("/index/file", body, Some("s3cret"))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = call(app.clone(), get("/docs")).await;
    let docs: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(docs.as_array().unwrap().len(), 1);
    assert_eq!(docs[0]["chunks"], 1);

    let (status, _) = call(app.clone(), post("/index/clear", Value::Null, Some("s3cret"))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(corpus.read().documents().is_empty());
    let (_, body) = call(app, get("/search?q=cat")).await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["results"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn health_is_ok() {
    let dir = tempdir().unwrap();
    let (app, _) = app(dir.path(), None);
    let (status, body) = call(app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn snippet_markup_is_escaped_and_highlighted_once() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("xss.txt"), "The cat sat. <script>alert(1)</script>").unwrap();
    let (app, _) = app(dir.path(), None);

    let (status, _) = call(app.clone(), post("/index/file", serde_json::json!({ "path": "xss.txt" }), None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(app, get("/search?q=cat%20em")).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0]["snippet"], "The <em>cat</em> sat. &lt;script&gt;alert(1)&lt;/script&gt;");
}

#[tokio::test]
async fn total_hits_counts_matches_beyond_k() {
    let dir = tempdir().unwrap();
    write_docs(dir.path());
    let (app, _) = app(dir.path(), None);

    let folder = dir.path().to_string_lossy().to_string();
    let (status, _) = call(app.clone(), post("/index/folder", serde_json::json!({ "path": folder }), None)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = call(app, get("/search?q=the&k=1")).await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["total_hits"], 2);
    assert_eq!(json["results"].as_array().unwrap().len(), 1);
}
