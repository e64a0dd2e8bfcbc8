//! Operational routes: liveness, readiness and build info.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    store: &'static str,
    resources: usize,
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// 503 while the document store does not answer.
async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyBody>) {
    let resources = state.catalog().resources.len();
    match state.service.store().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadyBody {
                status: "ok",
                store: "ok",
                resources,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadyBody {
                    status: "degraded",
                    store: "unavailable",
                    resources,
                }),
            )
        }
    }
}

async fn version(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "resources": state
            .catalog()
            .resources
            .iter()
            .map(|r| serde_json::json!({"name": r.name, "label": r.label}))
            .collect::<Vec<_>>(),
    }))
}

/// GET /health, GET /ready, GET /version.
pub fn common_routes_with_ready(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .with_state(state)
}
