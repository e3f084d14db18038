//! HTTP endpoints: metrics, health and a landing page
//!
//! Handlers only read the snapshot cache, they never wait for a refresh.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::Utc;
use tracing::error;

use crate::{metrics, snapshot::SnapshotCache};

pub const HEALTH_PATH: &str = "/healthz";

/// Shared state of the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<SnapshotCache>,
    pub scrapes: Arc<AtomicU64>,
    pub metrics_path: Arc<str>,
}

impl AppState {
    pub fn new(cache: Arc<SnapshotCache>, metrics_path: &str) -> Self {
        Self {
            cache,
            scrapes: Arc::new(AtomicU64::new(0)),
            metrics_path: Arc::from(metrics_path),
        }
    }
}

/// Build the router; `metrics_path` must start with `/`
pub fn build_router(state: AppState) -> Router {
    let metrics_path = state.metrics_path.to_string();
    Router::new()
        .route("/", get(root_handler))
        .route(HEALTH_PATH, get(health_handler))
        .route(&metrics_path, get(metrics_handler))
        .with_state(state)
}

/// Landing page
///
/// GET /
async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        format!(
            "Nordic icebreaker exporter\nMetrics: {}\nHealth: {}\n",
            state.metrics_path, HEALTH_PATH
        ),
    )
}

/// Readiness
///
/// GET /healthz
///
/// 503 until the first refresh and whenever the latest refresh failed.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    if state.cache.get().await.is_ready() {
        (StatusCode::OK, "ok\n")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready\n")
    }
}

/// Prometheus scrape endpoint
///
/// GET <metrics_path>
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let scrapes = state.scrapes.fetch_add(1, Ordering::Relaxed) + 1;
    let snapshot = state.cache.get().await;
    match metrics::render(&snapshot, scrapes, Utc::now()) {
        Ok(body) => ([(header::CONTENT_TYPE, metrics::CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            error!(error = %e, "failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
