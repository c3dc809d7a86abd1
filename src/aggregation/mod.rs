//! Aggregation Engine
//!
//! Records usage events against the analytics store and rebuilds the
//! fixed-window daily series from the event log on demand.
//!
//! - `AggregationEngine`: record path and query path
//! - `Clock`: injected time source (`SystemClock`, `FixedClock`)
//! - `StatsTimezone`: explicit timezone for day bucketing

mod calendar;
mod clock;
mod engine;

pub use calendar::{date_label, local_date_label, StatsTimezone};
pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{AggregationEngine, RecordOutcome, StatsView};
