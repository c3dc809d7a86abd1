//! HTTP server setup with Axum

use std::sync::Arc;

use axum::{
    handler::HandlerWithoutStateExt,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::rest::{library, stats, tracking};
use super::state::AppState;

/// Create the Axum router with all endpoints
///
/// Paths outside the API are served from the static root.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_files = ServeDir::new(&state.config.static_root)
        .call_fallback_on_method_not_allowed(true)
        .not_found_service(not_found.into_service());

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // REST API endpoints
        .route("/api/config", get(library::get_config))
        .route("/api/music", get(library::list_music))
        .route("/api/trackplay", post(tracking::track_play))
        .route("/api/trackdownload", post(tracking::track_download))
        .route("/api/trackvisit", post(tracking::track_visit))
        .route("/api/stats", get(stats::get_stats))
        .fallback_service(static_files)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Sorry, can't find that!")
}
