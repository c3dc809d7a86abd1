//! Client configuration and music listing endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::error_response;
use crate::api::state::AppState;
use crate::error::AnalyticsError;

/// Response for GET /api/config
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub playlist_prefix_filter: String,
    pub debug_logging: bool,
}

/// GET /api/config - Settings the browser client needs
pub async fn get_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ClientConfig {
        playlist_prefix_filter: state.config.playlist_prefix_filter.clone(),
        debug_logging: state.config.debug_logging,
    })
}

/// GET /api/music - Tracks on disk, most played first
pub async fn list_music(State(state): State<Arc<AppState>>) -> Response {
    if !state.store().is_ready() {
        return error_response(AnalyticsError::NotReady);
    }

    let on_disk = state.library.list_track_ids().await;
    match state.reporting.build_track_list(&on_disk) {
        Ok(tracks) => (StatusCode::OK, Json(tracks)).into_response(),
        Err(err) => error_response(err),
    }
}
