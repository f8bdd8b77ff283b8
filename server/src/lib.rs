use anyhow::Result;
use axum::{extract::{Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use docqa_core::locate::{is_supported, resolve_for_load};
use docqa_core::{snippet, tokenize, SharedCorpus, Weight, DEFAULT_TOP_K};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const SNIPPET_CHARS: usize = 240;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { DEFAULT_TOP_K }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_path: String,
    pub chunk_id: usize,
    pub score: Weight,
    pub snippet: String,
}

#[derive(Serialize)]
pub struct DocEntry {
    pub path: String,
    pub chunks: usize,
}

#[derive(Deserialize)]
pub struct LoadRequest {
    pub path: String,
    #[serde(default = "default_rebuild")]
    pub rebuild: bool,
}
fn default_rebuild() -> bool { true }

/// Settings the router is built from. `admin_token` gates the mutating
/// endpoints when set; `cors_origins` empty means any origin.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub docs_dir: PathBuf,
    pub admin_token: Option<String>,
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    /// Fill admin token and CORS origins from `ADMIN_TOKEN` and the
    /// comma-separated `CORS_ALLOW_ORIGIN`.
    pub fn from_env(docs_dir: PathBuf) -> Self {
        let admin_token = std::env::var("ADMIN_TOKEN").ok().filter(|t| !t.is_empty());
        let cors_origins = std::env::var("CORS_ALLOW_ORIGIN")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        Self { docs_dir, admin_token, cors_origins }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub corpus: SharedCorpus,
    pub docs_dir: PathBuf,
    pub admin_token: Option<String>,
}

/// Build the router over `corpus`. The handle stays usable by the caller,
/// e.g. to preload documents before serving.
pub fn build_app(config: ServerConfig, corpus: SharedCorpus) -> Result<Router> {
    let app_state = AppState { corpus, docs_dir: config.docs_dir, admin_token: config.admin_token };

    let origins: Vec<_> = config.cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
    let cors = if origins.is_empty() {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/docs", get(docs_handler))
        .route("/index/file", post(index_file))
        .route("/index/folder", post(index_folder))
        .route("/index/commit", post(index_commit))
        .route("/index/clear", post(index_clear))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);
    Ok(app)
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let k = params.k.clamp(1, 100);
    let (total_hits, hits) = state.corpus.query_with_total(&params.q, k);

    // Query tokens drive highlighting so it matches what was scored
    let terms = tokenize(&params.q);
    let results: Vec<SearchHit> = hits
        .into_iter()
        .map(|h| {
            let snippet = highlight_terms(&snippet(&h.text, SNIPPET_CHARS), &terms);
            SearchHit { doc_path: h.doc_path, chunk_id: h.chunk_id, score: h.score, snippet }
        })
        .collect();

    let elapsed = start.elapsed();
    Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits, results })
}

pub async fn docs_handler(State(state): State<AppState>) -> Json<Vec<DocEntry>> {
    let corpus = state.corpus.read();
    let docs = corpus
        .documents()
        .iter()
        .map(|d| DocEntry { path: d.path.clone(), chunks: d.n_chunks })
        .collect();
    Json(docs)
}

/// HTML-escape `snippet` and wrap whole-word, case-insensitive matches of
/// any query token in `<em>`. All terms are matched in a single pass.
fn highlight_terms(snippet: &str, terms: &[String]) -> String {
    let mut terms: Vec<&str> = terms.iter().map(String::as_str).filter(|t| !t.is_empty()).collect();
    terms.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    terms.dedup();
    if terms.is_empty() {
        return escape_html(snippet);
    }
    let alternation = terms.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|");
    let Ok(pat) = regex::RegexBuilder::new(&format!(r"\b(?:{alternation})\b")).case_insensitive(true).build() else {
        return escape_html(snippet);
    };

    let mut out = String::with_capacity(snippet.len() + 16);
    let mut last = 0;
    for m in pat.find_iter(snippet) {
        out.push_str(&escape_html(&snippet[last..m.start()]));
        out.push_str("<em>");
        out.push_str(&escape_html(m.as_str()));
        out.push_str("</em>");
        last = m.end();
    }
    out.push_str(&escape_html(&snippet[last..]));
    out
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// --- Admin endpoints ---
type ApiError = (StatusCode, String);

async fn index_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LoadRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    let path = match resolve_for_load(&req.path, &[&state.docs_dir]) {
        Some(p) if p.is_file() && is_supported(&p) => p,
        _ => return Err((StatusCode::NOT_FOUND, "file not found or unsupported; use .txt/.md/.log".into())),
    };
    let chunks = state.corpus.add_file(&path, req.rebuild).map_err(internal)?;
    tracing::info!(path = %path.display(), chunks, "indexed file");
    Ok(Json(serde_json::json!({ "path": path, "chunks": chunks })))
}

async fn index_folder(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LoadRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    let folder = match resolve_for_load(&req.path, &[&state.docs_dir]) {
        Some(p) if p.is_dir() => p,
        _ => return Err((StatusCode::NOT_FOUND, "folder not found".into())),
    };
    let (files, chunks) = state.corpus.add_folder(&folder, req.rebuild);
    tracing::info!(folder = %folder.display(), files, chunks, "indexed folder");
    Ok(Json(serde_json::json!({ "path": folder, "files": files, "chunks": chunks })))
}

async fn index_commit(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    state.corpus.rebuild();
    let chunks = state.corpus.read().chunks().len();
    Ok(Json(serde_json::json!({ "chunks": chunks })))
}

async fn index_clear(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    state.corpus.clear();
    Ok(Json(serde_json::json!({ "cleared": true })))
}

fn internal(e: anyhow::Error) -> ApiError {
    tracing::error!(error = %e, "indexing failed");
    (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(required) = &state.admin_token else {
        return Ok(());
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required.as_str() {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
