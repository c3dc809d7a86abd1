//! Statistics endpoint

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::error_response;
use crate::api::state::AppState;

/// GET /api/stats - Totals, every counted track and the daily series
/// over the configured window
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Response {
    match state.reporting.build_stats_payload(state.config.stats_days) {
        Ok(payload) => (StatusCode::OK, Json(payload)).into_response(),
        Err(err) => error_response(err),
    }
}
