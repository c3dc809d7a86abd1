//! Response payloads assembled by the reporting facade

use serde::{Deserialize, Serialize};

use super::{DailyData, TrackCounter};

/// Payload for the statistics page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsPayload {
    pub total_visits: u64,
    /// Every counted track, most played first
    pub tracks: Vec<TrackCounter>,
    pub daily_data: DailyData,
}

/// Acknowledgement returned by the recording endpoints
#[derive(Debug, Clone, Serialize)]
pub struct RecordResponse {
    pub message: String,
    /// Counter value after the increment
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}
