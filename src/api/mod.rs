//! Gateway API layer -- axum routes and shared state.

mod routes;

use crate::backend::Backend;
use crate::state::StateHandle;
use crate::submit::Submitter;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Everything a handler needs: the view state, the single-flight
/// submission handler, and the backend client for health probes.
#[derive(Clone)]
pub struct AppState {
    pub state: StateHandle,
    pub submitter: Arc<Submitter>,
    pub backend: Arc<dyn Backend>,
}

/// Build the application router with all API routes.
///
/// CORS is permissive so a browser dashboard page can consume the API
/// from any origin, matching the backend service's own policy.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn fallback() -> (axum::http::StatusCode, &'static str) {
    (axum::http::StatusCode::NOT_FOUND, "not found")
}
