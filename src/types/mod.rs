//! Data types for the jukebox analytics core
//!
//! This module contains the records stored by the analytics engine and the
//! payloads it produces for the HTTP API.

mod counter;
mod event;
mod report;
mod series;

pub use counter::{GlobalCounter, TrackCounter};
pub use event::{EventKind, UsageEvent};
pub use report::{RecordResponse, StatsPayload};
pub use series::{DailyBucket, DailyData, DailySeries};
