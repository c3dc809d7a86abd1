//! Recording endpoints - play, download and visit

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::debug;

use super::{error_response, ApiError};
use crate::aggregation::RecordOutcome;
use crate::api::state::AppState;
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::types::{EventKind, RecordResponse};

/// POST /api/trackplay - body `{ "filename": "<track>" }`
pub async fn track_play(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    record_track_event(&state, EventKind::Play, body)
}

/// POST /api/trackdownload - body `{ "filename": "<track>" }`
pub async fn track_download(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    record_track_event(&state, EventKind::Download, body)
}

/// POST /api/trackvisit - no body
pub async fn track_visit(State(state): State<Arc<AppState>>) -> Response {
    respond(EventKind::Visit, state.engine.record_visit())
}

fn record_track_event(state: &AppState, kind: EventKind, body: Result<Json<Value>, JsonRejection>) -> Response {
    if !state.store().is_ready() {
        return error_response(AnalyticsError::NotReady);
    }

    let filename = match body {
        Ok(Json(value)) => value.get("filename").and_then(Value::as_str).map(str::to_string),
        Err(rejection) => {
            debug!(%kind, error = %rejection, "Rejected tracking body");
            None
        }
    };

    match filename {
        Some(filename) => respond(kind, state.engine.record_event(kind, Some(&filename))),
        None => (StatusCode::BAD_REQUEST, Json(ApiError::bad_request("Invalid filename."))).into_response(),
    }
}

fn respond(kind: EventKind, result: AnalyticsResult<RecordOutcome>) -> Response {
    match result {
        Ok(outcome) => {
            let body = RecordResponse {
                message: acknowledgement(kind).to_string(),
                count: outcome.count,
                warning: outcome.persistence_warning,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => error_response(err),
    }
}

fn acknowledgement(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Visit => "Visit tracked.",
        EventKind::Play => "Play tracked.",
        EventKind::Download => "Download tracked.",
    }
}
