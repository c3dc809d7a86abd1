//! Jukebox Analytics Server
//!
//! Usage analytics for a self-hosted music jukebox: counts visits, plays
//! and downloads, keeps a timestamped event log, and serves per-track
//! statistics and a daily activity series to a web client.
//!
//! # Modules
//!
//! - `types`: Core data structures (UsageEvent, TrackCounter, DailySeries)
//! - `event_store`: Append-only, time-indexed usage event log
//! - `counter_store`: Running per-track and global counters
//! - `storage`: Single-lock analytics store with JSONL snapshot persistence
//! - `aggregation`: Record path and daily series computation
//! - `reporting`: Track listing and stats payload assembly
//! - `library`: Music directory scanning
//! - `api`: Axum REST endpoints and static file serving
//! - `server`: Listener, autosave and shutdown lifecycle
//! - `config`: Environment configuration
//! - `utils`: Atomic file writes
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use jukebox::{AggregationEngine, AnalyticsStore, ReportingFacade};
//!
//! fn main() -> jukebox::AnalyticsResult<()> {
//!     let store = Arc::new(AnalyticsStore::with_file("jukebox.db.jsonl"));
//!     store.init()?;
//!
//!     let engine = Arc::new(AggregationEngine::new(store.clone()));
//!     engine.record_play("Opening Theme")?;
//!
//!     let reporting = ReportingFacade::new(engine);
//!     let payload = reporting.build_stats_payload(7)?;
//!     println!("{} visits", payload.total_visits);
//!
//!     store.close()
//! }
//! ```

pub mod aggregation;
pub mod api;
pub mod config;
pub mod counter_store;
pub mod error;
pub mod event_store;
pub mod library;
pub mod logging;
pub mod reporting;
pub mod server;
pub mod storage;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use aggregation::{AggregationEngine, Clock, FixedClock, RecordOutcome, StatsTimezone, SystemClock};
pub use config::JukeboxConfig;
pub use counter_store::CounterStore;
pub use error::{AnalyticsError, AnalyticsResult};
pub use event_store::EventStore;
pub use library::MusicLibrary;
pub use reporting::ReportingFacade;
pub use storage::AnalyticsStore;
pub use types::{
    DailyBucket, DailyData, DailySeries, EventKind, GlobalCounter, StatsPayload, TrackCounter,
    UsageEvent,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
