//! REST API module for HTTP endpoints
//!
//! - `GET /api/config` - Client settings
//! - `GET /api/music` - Tracks on disk with their counters
//! - `POST /api/trackplay`, `/api/trackdownload`, `/api/trackvisit` - Record usage
//! - `GET /api/stats` - Totals, per-track table and daily series

pub mod library;
pub mod stats;
pub mod tracking;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::error::AnalyticsError;

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: "BAD_REQUEST".to_string(),
        }
    }
}

impl From<&AnalyticsError> for ApiError {
    fn from(err: &AnalyticsError) -> Self {
        Self {
            error: err.to_string(),
            code: err.code().to_string(),
        }
    }
}

/// HTTP status for an analytics error
pub fn status_for(err: &AnalyticsError) -> StatusCode {
    match err {
        AnalyticsError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        AnalyticsError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
        AnalyticsError::Persistence(_)
        | AnalyticsError::StoreInconsistency(_)
        | AnalyticsError::CounterOverflow(_)
        | AnalyticsError::Io(_)
        | AnalyticsError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Turn an analytics error into a JSON error response
pub fn error_response(err: AnalyticsError) -> Response {
    if matches!(err, AnalyticsError::StoreInconsistency(_)) {
        error!(error = %err, "Analytics store is inconsistent");
    }
    (status_for(&err), Json(ApiError::from(&err))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&AnalyticsError::invalid_input("x")), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&AnalyticsError::NotReady), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            status_for(&AnalyticsError::Persistence("disk".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&AnalyticsError::StoreInconsistency("drift".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&AnalyticsError::CounterOverflow("plays".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_api_error_carries_code() {
        let body = ApiError::from(&AnalyticsError::NotReady);
        assert_eq!(body.code, "NOT_READY");
        assert!(body.error.contains("not ready"));
    }
}
