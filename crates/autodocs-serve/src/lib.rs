pub mod blobs;
pub mod dashboard;
pub mod store;

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tower_http::cors::CorsLayer;

use autodocs_core::{clock, ChangePayload, DiffId, DiffKind, LogEntry, ServeConfig};

use crate::blobs::BlobStore;
use crate::dashboard::{DashboardRenderer, HtmlDashboard};
use crate::store::{newest_first, JsonFileLog, LogStore, StoreError};

/// Default number of entries returned by `GET /autodocs/git/logs`.
pub const DEFAULT_LOG_LIMIT: usize = 10;

const MSG_SAVED: &str = "Webhook received and diffs saved";
const MSG_PARTIAL: &str = "Webhook received, but some diffs could not be saved";

/// Request bodies carry whole diffs.
const BODY_LIMIT: usize = 50 * 1024 * 1024;

// ── App State ──

pub struct AppState {
    log: Box<dyn LogStore>,
    blobs: BlobStore,
    dashboard: Box<dyn DashboardRenderer>,
}

impl AppState {
    pub fn new(
        log: Box<dyn LogStore>,
        blobs: BlobStore,
        dashboard: Box<dyn DashboardRenderer>,
    ) -> Self {
        Self {
            log,
            blobs,
            dashboard,
        }
    }

    /// JSON file log, diff directory and HTML dashboard under `config.data_dir`.
    pub fn open(config: &ServeConfig) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        let log = JsonFileLog::open(config.log_file(), config.log_capacity)?;
        let blobs = BlobStore::open(config.diff_dir())?;
        Ok(Self::new(
            Box::new(log),
            blobs,
            Box::new(HtmlDashboard::default()),
        ))
    }

    /// Receipt time in millis, bumped past the newest logged id so blob
    /// names never collide.
    fn allocate_id(&self, received: OffsetDateTime) -> DiffId {
        let candidate = clock::unix_millis(received);
        match self.log.load() {
            Ok(entries) => match entries.last() {
                Some(last) if last.id >= candidate => last.id + 1,
                _ => candidate,
            },
            Err(_) => candidate,
        }
    }
}

// ── Error Handling ──

enum AppError {
    BadPayload(JsonRejection),
    LogUnavailable(StoreError),
    NotFound,
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadPayload(rejection) => {
                tracing::warn!(
                    status = %rejection.status(),
                    error = %rejection.body_text(),
                    "rejected webhook body"
                );
                (rejection.status(), rejection.body_text())
            }
            AppError::LogUnavailable(e) => {
                tracing::error!(error = %e, "cannot read change log");
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read logs".to_string())
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, "Diff file not found".to_string()),
            AppError::Internal(e) => {
                tracing::error!(error = %e, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::LogUnavailable(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadPayload(rejection)
    }
}

impl From<askama::Error> for AppError {
    fn from(err: askama::Error) -> Self {
        AppError::Internal(err.into())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.into())
    }
}

// ── Entrypoint ──

pub async fn serve(config: ServeConfig) -> anyhow::Result<()> {
    let app = router(&config)?;
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        url = %format!("http://{addr}"),
        endpoint = "/autodocs/git",
        log = %config.log_file().display(),
        diffs = %config.diff_dir().display(),
        "webhook server listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down webhook server");
        })
        .await?;
    Ok(())
}

/// Build the router (for testing without binding to a port).
pub fn router(config: &ServeConfig) -> anyhow::Result<Router> {
    Ok(router_with_state(AppState::open(config)?))
}

pub fn router_with_state(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/health", get(health))
        .route("/autodocs/git", post(receive_change))
        .route("/autodocs/git/logs", get(get_logs))
        .route("/autodocs/git/diff/{kind}/{id}", get(get_diff))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

// ── Health ──

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "message": "Webhook server is running" }))
}

// ── POST /autodocs/git ──

#[derive(Serialize)]
struct ReceiveResponse {
    success: bool,
    message: &'static str,
    diff_id: DiffId,
    staged_files: usize,
    unstaged_files: usize,
    timestamp: String,
}

async fn receive_change(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChangePayload>, JsonRejection>,
) -> Result<Json<ReceiveResponse>, AppError> {
    let Json(payload) = payload?;
    let received = OffsetDateTime::now_utc();
    let received_at = clock::rfc3339(received);
    let id = state.allocate_id(received);

    log_summary(&payload);

    let mut written = [false; 2];
    let mut all_saved = true;
    for (slot, kind) in DiffKind::ALL.into_iter().enumerate() {
        let section = match kind {
            DiffKind::Staged => &payload.staged_changes,
            DiffKind::Unstaged => &payload.unstaged_changes,
        };
        if !section.has_diff() {
            continue;
        }
        match state.blobs.write(kind, id, &section.diff) {
            Ok(path) => {
                tracing::info!(%kind, path = %path.display(), "diff saved");
                written[slot] = true;
            }
            Err(e) => {
                tracing::error!(%kind, id, error = %e, "cannot save diff");
                all_saved = false;
            }
        }
    }

    let entry = LogEntry::from_payload(id, &payload, written[0], written[1], received_at.clone());
    if let Err(e) = state.log.append(entry) {
        tracing::error!(id, error = %e, "cannot save log entry");
    }

    Ok(Json(ReceiveResponse {
        success: true,
        message: if all_saved { MSG_SAVED } else { MSG_PARTIAL },
        diff_id: id,
        staged_files: payload.staged_changes.count,
        unstaged_files: payload.unstaged_changes.count,
        timestamp: received_at,
    }))
}

fn log_summary(payload: &ChangePayload) {
    let (file, event_type) = payload
        .triggered_by
        .as_ref()
        .map(|t| (t.file.as_str(), t.event_type.map_or("", |k| k.as_str())))
        .unwrap_or(("", ""));
    tracing::info!(
        repository = %payload.repository,
        branch = %payload.branch,
        sent_at = %payload.timestamp,
        triggered_by = file,
        event_type,
        "webhook received"
    );
    if let Some(commit) = payload.last_commit.as_deref() {
        tracing::info!(last_commit = commit, "last commit");
    }
    tracing::info!(
        count = payload.staged_changes.count,
        files = ?payload.staged_changes.files,
        "staged"
    );
    tracing::info!(
        count = payload.unstaged_changes.count,
        files = ?payload.unstaged_changes.files,
        "unstaged"
    );
    tracing::info!(
        count = payload.untracked_files.len(),
        files = ?payload.untracked_files,
        "untracked"
    );
}

// ── GET /autodocs/git/logs ──

#[derive(Deserialize)]
struct LogsQuery {
    limit: Option<String>,
}

#[derive(Serialize)]
struct LogsResponse {
    total: usize,
    logs: Vec<LogEntry>,
}

/// Missing, non-numeric and zero limits all fall back to the default.
fn parse_limit(raw: Option<&str>) -> usize {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_LOG_LIMIT)
}

async fn get_logs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LogsQuery>,
) -> Result<Json<LogsResponse>, AppError> {
    let entries = state.log.load()?;
    let limit = parse_limit(params.limit.as_deref());
    Ok(Json(LogsResponse {
        total: entries.len(),
        logs: newest_first(&entries, limit),
    }))
}

// ── GET /autodocs/git/diff/{kind}/{id} ──

async fn get_diff(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let kind: DiffKind = kind.parse().map_err(|_| AppError::NotFound)?;
    let id: DiffId = id.parse().map_err(|_| AppError::NotFound)?;
    let bytes = state.blobs.read(kind, id)?.ok_or(AppError::NotFound)?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        bytes,
    )
        .into_response())
}

// ── GET / ──

async fn dashboard(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    let entries = state.log.load()?;
    Ok(Html(state.dashboard.render(&entries)?))
}

// ── Tests ──
