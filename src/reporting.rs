//! Reporting facade - shapes engine output for the HTTP API

use std::collections::HashMap;
use std::sync::Arc;

use crate::aggregation::AggregationEngine;
use crate::error::AnalyticsResult;
use crate::types::{StatsPayload, TrackCounter};

pub struct ReportingFacade {
    engine: Arc<AggregationEngine>,
}

impl ReportingFacade {
    pub fn new(engine: Arc<AggregationEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<AggregationEngine> {
        &self.engine
    }

    /// Merge on-disk tracks with their counters
    ///
    /// Disk presence decides what is listed: tracks never counted appear
    /// with zero counts, counted tracks missing from disk are left out.
    /// Ordered by play count (highest first), then by track id.
    pub fn build_track_list(&self, files_on_disk: &[String]) -> AnalyticsResult<Vec<TrackCounter>> {
        let known: HashMap<String, TrackCounter> = self
            .engine
            .list_tracks()?
            .into_iter()
            .map(|t| (t.track_id.clone(), t))
            .collect();

        let mut listing: Vec<TrackCounter> = files_on_disk
            .iter()
            .map(|id| {
                known
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| TrackCounter::new(id.as_str()))
            })
            .collect();

        listing.sort_by(|a, b| {
            b.play_count
                .cmp(&a.play_count)
                .then_with(|| a.track_id.cmp(&b.track_id))
        });

        Ok(listing)
    }

    /// Totals, the full per-track table and the daily series
    pub fn build_stats_payload(&self, window_days: u32) -> AnalyticsResult<StatsPayload> {
        let view = self.engine.stats_view(window_days)?;

        let mut tracks = view.tracks;
        tracks.sort_by(|a, b| b.play_count.cmp(&a.play_count));

        Ok(StatsPayload {
            total_visits: view.global.total_visits,
            tracks,
            daily_data: view.series.to_daily_data(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::{FixedClock, StatsTimezone};
    use crate::error::AnalyticsError;
    use crate::storage::AnalyticsStore;
    use chrono::{TimeZone, Utc};

    fn facade() -> ReportingFacade {
        let store = Arc::new(AnalyticsStore::in_memory());
        store.init().unwrap();
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 8, 15, 10, 0, 0).unwrap()));
        let engine = AggregationEngine::new(store)
            .with_clock(clock)
            .with_timezone(StatsTimezone::utc());
        ReportingFacade::new(Arc::new(engine))
    }

    fn names(list: &[TrackCounter]) -> Vec<&str> {
        list.iter().map(|t| t.track_id.as_str()).collect()
    }

    fn disk(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_track_list_breaks_ties_by_name() {
        let reporting = facade();
        let engine = reporting.engine();
        for _ in 0..5 {
            engine.record_play("B").unwrap();
            engine.record_play("A").unwrap();
        }
        for _ in 0..3 {
            engine.record_play("C").unwrap();
        }

        let list = reporting.build_track_list(&disk(&["C", "B", "A"])).unwrap();
        assert_eq!(names(&list), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_track_list_disk_is_authoritative() {
        let reporting = facade();
        reporting.engine().record_play("gone").unwrap();
        reporting.engine().record_download("kept").unwrap();

        let list = reporting.build_track_list(&disk(&["kept", "fresh"])).unwrap();

        assert_eq!(
            list,
            vec![
                TrackCounter::with_counts("fresh", 0, 0),
                TrackCounter::with_counts("kept", 0, 1),
            ]
        );
    }

    #[test]
    fn test_empty_disk_gives_empty_list() {
        let reporting = facade();
        reporting.engine().record_play("songA").unwrap();

        assert!(reporting.build_track_list(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_stats_payload_lists_every_counted_track() {
        let reporting = facade();
        reporting.engine().record_play("low").unwrap();
        reporting.engine().record_play("high").unwrap();
        reporting.engine().record_play("high").unwrap();

        let payload = reporting.build_stats_payload(7).unwrap();
        assert_eq!(names(&payload.tracks), vec!["high", "low"]);
        assert_eq!(payload.daily_data.labels.len(), 7);
        assert_eq!(payload.daily_data.labels[6], "2024-08-15");
        assert_eq!(payload.daily_data.plays[6], 3);
    }

    #[test]
    fn test_not_ready_propagates() {
        let engine = AggregationEngine::new(Arc::new(AnalyticsStore::in_memory()));
        let reporting = ReportingFacade::new(Arc::new(engine));

        assert!(matches!(reporting.build_track_list(&disk(&["a"])), Err(AnalyticsError::NotReady)));
        assert!(matches!(reporting.build_stats_payload(7), Err(AnalyticsError::NotReady)));
    }
}
