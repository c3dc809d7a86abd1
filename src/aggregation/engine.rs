//! Aggregation Engine - the single write path and read path for analytics

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use tracing::debug;

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::storage::{AnalyticsStore, StoreState};
use crate::types::{DailyBucket, DailySeries, EventKind, GlobalCounter, TrackCounter, UsageEvent};

use super::calendar::{date_label, StatsTimezone};
use super::clock::{Clock, SystemClock};

/// Result of a recording operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    pub kind: EventKind,
    /// Counter value after the increment (total visits, or the track's
    /// play/download count)
    pub count: u64,
    /// Set while the store's last flush to disk has failed
    pub persistence_warning: Option<String>,
}

/// Counters and daily series read under one lock
#[derive(Debug, Clone)]
pub struct StatsView {
    pub global: GlobalCounter,
    pub tracks: Vec<TrackCounter>,
    pub series: DailySeries,
}

pub struct AggregationEngine {
    store: Arc<AnalyticsStore>,
    clock: Arc<dyn Clock>,
    timezone: StatsTimezone,
}

impl AggregationEngine {
    /// Engine over `store` using the wall clock and the host timezone
    pub fn new(store: Arc<AnalyticsStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            timezone: StatsTimezone::Local,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_timezone(mut self, timezone: StatsTimezone) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn store(&self) -> &Arc<AnalyticsStore> {
        &self.store
    }

    pub fn timezone(&self) -> StatsTimezone {
        self.timezone
    }

    /// Record one usage event
    ///
    /// Play and download require a track identifier that is non-empty after
    /// trimming; the identifier itself is stored exactly as given. A track
    /// identifier passed with a visit is ignored. The counter update and the
    /// log append happen under the store lock as one unit.
    ///
    /// A store that is not ready fails with `NotReady` before the input is
    /// looked at.
    pub fn record_event(&self, kind: EventKind, track_id: Option<&str>) -> AnalyticsResult<RecordOutcome> {
        let (count, persistence_warning) = self.store.write(|state| {
            let track_id = validated_track(kind, track_id)?;
            let event = UsageEvent::new(kind, track_id, self.clock.now_millis());
            state.apply(event)
        })?;

        debug!(%kind, count, "Recorded usage event");

        Ok(RecordOutcome {
            kind,
            count,
            persistence_warning,
        })
    }

    pub fn record_visit(&self) -> AnalyticsResult<RecordOutcome> {
        self.record_event(EventKind::Visit, None)
    }

    pub fn record_play(&self, track_id: &str) -> AnalyticsResult<RecordOutcome> {
        self.record_event(EventKind::Play, Some(track_id))
    }

    pub fn record_download(&self, track_id: &str) -> AnalyticsResult<RecordOutcome> {
        self.record_event(EventKind::Download, Some(track_id))
    }

    /// Daily activity for the last `window_days` local days, ending today
    pub fn compute_daily_series(&self, window_days: u32) -> AnalyticsResult<DailySeries> {
        let window = DayWindow::ending_today(self, window_days)?;
        self.store.read(|state| window.bucket(state, &self.timezone))
    }

    /// Global counter, every track counter and the daily series, all taken
    /// from the same state so the three agree with each other
    pub fn stats_view(&self, window_days: u32) -> AnalyticsResult<StatsView> {
        let window = DayWindow::ending_today(self, window_days)?;
        self.store.read(|state| StatsView {
            global: state.counters.global(),
            tracks: state.counters.list_tracks(),
            series: window.bucket(state, &self.timezone),
        })
    }

    /// Snapshot of all known track counters (unordered)
    pub fn list_tracks(&self) -> AnalyticsResult<Vec<TrackCounter>> {
        self.store.read(|state| state.counters.list_tracks())
    }

    pub fn total_visits(&self) -> AnalyticsResult<u64> {
        self.store.read(|state| state.counters.total_visits())
    }

    /// Recount the event log and compare it against the counters
    pub fn verify_consistency(&self) -> AnalyticsResult<()> {
        self.store.read(|state| state.verify_consistency())?
    }
}

/// Track id to log for `kind`: required and non-blank for plays and
/// downloads, dropped for visits
fn validated_track(kind: EventKind, track_id: Option<&str>) -> AnalyticsResult<Option<String>> {
    if !kind.requires_track() {
        return Ok(None);
    }
    match track_id {
        Some(id) if !id.trim().is_empty() => Ok(Some(id.to_string())),
        _ => Err(AnalyticsError::invalid_input(format!(
            "{} requires a non-empty filename",
            kind
        ))),
    }
}

/// The labelled days a series covers and where its query starts
struct DayWindow {
    days: Vec<NaiveDate>,
    from_ms: i64,
}

impl DayWindow {
    fn ending_today(engine: &AggregationEngine, window_days: u32) -> AnalyticsResult<Self> {
        if window_days == 0 {
            return Err(AnalyticsError::invalid_input("window must cover at least one day"));
        }

        let today = engine.timezone.today(engine.clock.now());
        let oldest = today
            .checked_sub_days(Days::new(u64::from(window_days - 1)))
            .ok_or_else(|| AnalyticsError::invalid_input(format!("window of {} days is out of range", window_days)))?;

        let days: Vec<NaiveDate> = oldest.iter_days().take(window_days as usize).collect();
        let from_ms = engine.timezone.start_of_day(oldest);

        Ok(Self { days, from_ms })
    }

    fn bucket(&self, state: &StoreState, timezone: &StatsTimezone) -> DailySeries {
        let mut buckets: Vec<DailyBucket> = self.days.iter().map(|d| DailyBucket::empty(date_label(*d))).collect();
        let index: HashMap<NaiveDate, usize> = self.days.iter().enumerate().map(|(i, d)| (*d, i)).collect();

        let recent = state.events.query_since(self.from_ms);
        let mut dropped = 0usize;
        for event in &recent {
            match timezone.date_of(event.occurred_at).and_then(|d| index.get(&d)) {
                Some(&i) => buckets[i].bump(event.kind),
                None => dropped += 1,
            }
        }

        debug!(
            days = self.days.len(),
            events = recent.len(),
            dropped,
            "Aggregated daily series"
        );

        DailySeries { buckets }
    }
}
