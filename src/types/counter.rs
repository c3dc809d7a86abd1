//! Counter records

use serde::{Deserialize, Serialize};

/// Cumulative per-track counters
///
/// One record exists per distinct track identifier ever observed.
/// Both counts start at zero and never decrease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackCounter {
    #[serde(rename = "filename")]
    pub track_id: String,

    #[serde(rename = "play_count", default)]
    pub play_count: u64,

    #[serde(rename = "download_count", default)]
    pub download_count: u64,
}

impl TrackCounter {
    /// A fresh record with both counts at zero
    pub fn new(track_id: impl Into<String>) -> Self {
        Self {
            track_id: track_id.into(),
            play_count: 0,
            download_count: 0,
        }
    }

    pub fn with_counts(track_id: impl Into<String>, play_count: u64, download_count: u64) -> Self {
        Self {
            track_id: track_id.into(),
            play_count,
            download_count,
        }
    }
}

/// Process-wide counter singleton
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalCounter {
    pub total_visits: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_counter_wire_names() {
        let counter = TrackCounter::with_counts("songA", 3, 1);
        let json = serde_json::to_string(&counter).unwrap();
        assert_eq!(json, r#"{"filename":"songA","play_count":3,"download_count":1}"#);
    }

    #[test]
    fn test_missing_counts_default_to_zero() {
        let counter: TrackCounter = serde_json::from_str(r#"{"filename":"old","play_count":4}"#).unwrap();
        assert_eq!(counter.play_count, 4);
        assert_eq!(counter.download_count, 0);
    }
}
