//! Derived daily time series (computed per query, never stored)

use serde::{Deserialize, Serialize};

use super::EventKind;

/// Activity counts for one local calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyBucket {
    /// Day label formatted as `YYYY-MM-DD` in the reporting timezone
    pub date: String,
    pub visits: u64,
    pub plays: u64,
    pub downloads: u64,
}

impl DailyBucket {
    pub fn empty(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            visits: 0,
            plays: 0,
            downloads: 0,
        }
    }

    /// Count one event of the given kind
    pub fn bump(&mut self, kind: EventKind) {
        match kind {
            EventKind::Visit => self.visits += 1,
            EventKind::Play => self.plays += 1,
            EventKind::Download => self.downloads += 1,
        }
    }

    pub fn count(&self, kind: EventKind) -> u64 {
        match kind {
            EventKind::Visit => self.visits,
            EventKind::Play => self.plays,
            EventKind::Download => self.downloads,
        }
    }
}

/// Consecutive daily buckets, oldest first, ending today
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailySeries {
    pub buckets: Vec<DailyBucket>,
}

impl DailySeries {
    pub fn labels(&self) -> Vec<&str> {
        self.buckets.iter().map(|b| b.date.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Look up a bucket by its day label
    pub fn bucket(&self, label: &str) -> Option<&DailyBucket> {
        self.buckets.iter().find(|b| b.date == label)
    }

    /// Sum of one kind across the whole window
    pub fn total(&self, kind: EventKind) -> u64 {
        self.buckets.iter().map(|b| b.count(kind)).sum()
    }

    /// Convert to the chart-friendly parallel-array shape
    pub fn to_daily_data(&self) -> DailyData {
        DailyData {
            labels: self.buckets.iter().map(|b| b.date.clone()).collect(),
            visits: self.buckets.iter().map(|b| b.visits).collect(),
            plays: self.buckets.iter().map(|b| b.plays).collect(),
            downloads: self.buckets.iter().map(|b| b.downloads).collect(),
        }
    }
}

/// Four parallel arrays aligned by index, one entry per day label
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyData {
    pub labels: Vec<String>,
    pub visits: Vec<u64>,
    pub plays: Vec<u64>,
    pub downloads: Vec<u64>,
}

impl From<&DailySeries> for DailyData {
    fn from(series: &DailySeries) -> Self {
        series.to_daily_data()
    }
}
