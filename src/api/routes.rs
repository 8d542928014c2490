//! API route definitions.

use super::AppState;
use crate::model::AnalysisRequest;
use crate::submit::SubmitError;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/dashboard", get(dashboard))
        .route("/analyze", post(analyze))
}

fn meta() -> Value {
    json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    })
}

/// Gateway liveness plus a live reachability probe of the backend.
async fn health(State(app): State<AppState>) -> Json<Value> {
    let backend = match app.backend.health().await {
        Ok(s) => json!({
            "reachable": true,
            "status": s.status,
            "ai": s.ai
        }),
        Err(e) => json!({
            "reachable": false,
            "error": e.to_string()
        }),
    };

    Json(json!({
        "data": {
            "status": "ok",
            "backend": backend,
            "fetch": app.state.fetch_status()
        },
        "meta": meta()
    }))
}

#[derive(Debug, Deserialize)]
struct DashboardParams {
    /// Case-insensitive substring filter on user ids in the live panel.
    user: Option<String>,
}

/// The derived dashboard view plus the transient last-analysis verdict.
/// The verdict sits beside the view, never inside its counts.
async fn dashboard(
    State(app): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Json<Value> {
    let view = app.state.derived(chrono::Utc::now(), params.user.as_deref());
    let total = view.summary.total;

    Json(json!({
        "data": {
            "view": view,
            "last_analysis": app.state.last_analysis()
        },
        "meta": {
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "version": env!("CARGO_PKG_VERSION"),
            "total": total
        }
    }))
}

/// Proxy one submission through the single-flight handler.
async fn analyze(
    State(app): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> (StatusCode, Json<Value>) {
    match app.submitter.submit(request).await {
        Ok(verdict) => (
            StatusCode::OK,
            Json(json!({ "data": verdict, "meta": meta() })),
        ),
        Err(e) => {
            let status = match &e {
                SubmitError::Busy => StatusCode::CONFLICT,
                SubmitError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                SubmitError::Backend(_) => StatusCode::BAD_GATEWAY,
            };
            let hint = match &e {
                SubmitError::Busy => "a submission is already in flight",
                _ => "backend may be unreachable",
            };
            (
                status,
                Json(json!({
                    "error": e.to_string(),
                    "hint": hint,
                    "meta": meta()
                })),
            )
        }
    }
}
