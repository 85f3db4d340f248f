use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::db::StoreMode;
use crate::AppState;

/// GET /: liveness check kept for older deploy scripts.
pub async fn root() -> &'static str {
    "Backend is alive"
}

/// GET /health: reports where the journal is currently persisting.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let mode = state.store.mode().await;
    let status = match mode {
        StoreMode::Connected | StoreMode::MemoryOnly => "healthy",
        StoreMode::DegradedFallback | StoreMode::Reconnecting => "degraded",
    };

    Json(json!({
        "status": status,
        "store": mode,
        "pending_writes": state.store.pending_writes().await,
        "rejected_writes": state.store.rejected_writes().await,
    }))
}

/// GET /metrics: Prometheus scrape payload.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = state.metrics_handle.render();
    ([(CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}
