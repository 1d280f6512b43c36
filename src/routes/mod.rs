pub mod fashion;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::state::AppState;

/// The full application: liveness routes plus the record API under `/api/fashion`.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Fashion Shop API running" }))
        .route("/health", get(health_check))
        .nest("/api/fashion", fashion::routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
