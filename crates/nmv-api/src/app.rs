use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Thin status surface over the collection services. Everything heavier —
/// auth, the operator frontend, evaluation views — lives outside the core.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .route("/jobs", get(handlers::list_jobs))
        .route("/collect/:api_name", post(handlers::trigger_collect))
        .route("/errors/:maintenance_id", get(handlers::list_errors))
        .route(
            "/batches/:maintenance_id/:api_name/:hostname/latest",
            get(handlers::latest_batch),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
