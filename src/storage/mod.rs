//! Analytics store - the event log and counters behind a single lock
//!
//! ```text
//! Write path:
//! ┌─────────┐    ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ record  │───►│ lock state   │───►│ counters +   │───►│ generation++ │
//! │ request │    │ (one mutex)  │    │ append event │    │ (dirty)      │
//! └─────────┘    └──────────────┘    └──────────────┘    └──────────────┘
//!
//! Flush path (autosave timer / shutdown):
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ copy state   │───►│ backend.save │───►│ mark flushed │
//! │ under lock   │    │ (no lock)    │    │ generation   │
//! └──────────────┘    └──────────────┘    └──────────────┘
//! ```
//!
//! Until `init()` completes, and after `close()`, every operation fails
//! with `NotReady`.

mod backend;
mod snapshot;

use std::path::Path;

use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::counter_store::CounterStore;
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::event_store::EventStore;
use crate::types::{EventKind, UsageEvent};

pub use backend::{FileBackend, MemoryBackend, StoreBackend};
pub use snapshot::{decode as decode_snapshot, encode as encode_snapshot, SnapshotMeta, StoreSnapshot};

/// The in-memory state: event log plus its cached reduction
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    pub events: EventStore,
    pub counters: CounterStore,
}

impl StoreState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            events: EventStore::from_events(snapshot.events),
            counters: CounterStore::from_parts(snapshot.tracks, snapshot.global),
        }
    }

    pub fn to_snapshot(&self, saved_at: i64) -> StoreSnapshot {
        StoreSnapshot {
            saved_at,
            global: self.counters.global(),
            tracks: self.counters.list_tracks(),
            events: self.events.to_vec(),
        }
    }

    /// Apply one usage event: bump the matching counter, then log it
    ///
    /// The counter increment is the only step that can fail, and it fails
    /// before anything is modified, so either both the counter and the log
    /// advance or neither does.
    pub fn apply(&mut self, event: UsageEvent) -> AnalyticsResult<u64> {
        let count = match (event.kind, event.track_id.as_deref()) {
            (EventKind::Visit, _) => self.counters.increment_visits()?,
            (EventKind::Play, Some(track)) => self.counters.increment_play(track)?,
            (EventKind::Download, Some(track)) => self.counters.increment_download(track)?,
            (kind, None) => {
                return Err(AnalyticsError::invalid_input(format!(
                    "{} event requires a track identifier",
                    kind
                )))
            }
        };
        self.events.append(event);
        Ok(count)
    }

    /// Recount the event log and compare it with every counter
    pub fn verify_consistency(&self) -> AnalyticsResult<()> {
        let logged_visits = self.events.count_matching(EventKind::Visit, None);
        if logged_visits != self.counters.total_visits() {
            return Err(AnalyticsError::StoreInconsistency(format!(
                "totalVisits is {} but the log holds {} visit events",
                self.counters.total_visits(),
                logged_visits
            )));
        }

        for track in self.counters.list_tracks() {
            let plays = self.events.count_matching(EventKind::Play, Some(&track.track_id));
            let downloads = self.events.count_matching(EventKind::Download, Some(&track.track_id));
            if plays != track.play_count || downloads != track.download_count {
                return Err(AnalyticsError::StoreInconsistency(format!(
                    "track '{}' counts {}/{} plays/downloads but the log holds {}/{}",
                    track.track_id, track.play_count, track.download_count, plays, downloads
                )));
            }
        }

        // Events referencing a track that has no counter record
        for event in self.events.iter() {
            if let Some(track) = event.track_id.as_deref() {
                if self.counters.track(track).is_none() {
                    return Err(AnalyticsError::StoreInconsistency(format!(
                        "log holds {} events for '{}' but no counter exists",
                        event.kind, track
                    )));
                }
            }
        }

        Ok(())
    }
}

struct StoreInner {
    state: Option<StoreState>,
    /// Bumped on every successful mutation
    generation: u64,
    /// Generation captured by the last successful save
    flushed_generation: u64,
    last_flush_error: Option<String>,
    /// Why the last `init` failed, until one succeeds
    init_error: Option<String>,
}

/// Single-writer analytics store with an explicit lifecycle
pub struct AnalyticsStore {
    backend: Box<dyn StoreBackend>,
    inner: Mutex<StoreInner>,
    /// Serializes saves so snapshots reach the backend in order
    flush_lock: Mutex<()>,
}

impl AnalyticsStore {
    /// Create an uninitialized store over the given backend
    pub fn new<B: StoreBackend + 'static>(backend: B) -> Self {
        Self {
            backend: Box::new(backend),
            inner: Mutex::new(StoreInner {
                state: None,
                generation: 0,
                flushed_generation: 0,
                last_flush_error: None,
                init_error: None,
            }),
            flush_lock: Mutex::new(()),
        }
    }

    /// Store persisted to a JSONL snapshot file
    pub fn with_file<P: AsRef<Path>>(path: P) -> Self {
        Self::new(FileBackend::new(path))
    }

    /// Store with no durable backing
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Load persisted state and make the store ready
    ///
    /// Fails with `StoreInconsistency` if the loaded counters disagree with
    /// the loaded event log. Calling `init` on a ready store is a no-op.
    pub fn init(&self) -> AnalyticsResult<()> {
        let _flush = self.flush_lock.lock();
        if self.is_ready() {
            return Ok(());
        }

        let state = match self.load_state() {
            Ok(state) => state,
            Err(e) => {
                self.inner.lock().init_error = Some(e.to_string());
                return Err(e);
            }
        };

        info!(
            backend = %self.backend.describe(),
            tracks = state.counters.track_count(),
            events = state.events.len(),
            total_visits = state.counters.total_visits(),
            "Analytics store initialized"
        );

        let mut inner = self.inner.lock();
        inner.state = Some(state);
        inner.generation = 0;
        inner.flushed_generation = 0;
        inner.last_flush_error = None;
        inner.init_error = None;
        Ok(())
    }

    fn load_state(&self) -> AnalyticsResult<StoreState> {
        let state = match self.backend.load()? {
            Some(snapshot) => StoreState::from_snapshot(snapshot),
            None => {
                info!(backend = %self.backend.describe(), "No saved store found, starting empty");
                StoreState::new()
            }
        };

        if let Err(e) = state.verify_consistency() {
            error!(backend = %self.backend.describe(), error = %e, "Refusing to load inconsistent store");
            return Err(e);
        }
        Ok(state)
    }

    pub fn is_ready(&self) -> bool {
        self.inner.lock().state.is_some()
    }

    /// Run a read-only closure against the current state
    pub fn read<R>(&self, f: impl FnOnce(&StoreState) -> R) -> AnalyticsResult<R> {
        let inner = self.inner.lock();
        let state = inner.state.as_ref().ok_or(AnalyticsError::NotReady)?;
        Ok(f(state))
    }

    /// Run a mutating closure while holding the store lock
    ///
    /// The closure must leave the state untouched when it returns an error.
    /// On success the store is marked dirty and the result is returned with
    /// the last unresolved flush failure, if any.
    pub fn write<R>(
        &self,
        f: impl FnOnce(&mut StoreState) -> AnalyticsResult<R>,
    ) -> AnalyticsResult<(R, Option<String>)> {
        let mut inner = self.inner.lock();
        let state = inner.state.as_mut().ok_or(AnalyticsError::NotReady)?;
        let result = f(state)?;
        inner.generation += 1;
        Ok((result, inner.last_flush_error.clone()))
    }

    /// Whether there are mutations not yet saved
    pub fn is_dirty(&self) -> bool {
        let inner = self.inner.lock();
        inner.generation != inner.flushed_generation
    }

    /// Message of the last failed `init`, cleared once `init` succeeds
    ///
    /// Distinguishes a store that will not come up from one still loading.
    pub fn init_failure(&self) -> Option<String> {
        self.inner.lock().init_error.clone()
    }

    /// Message of the last failed flush, cleared by the next successful one
    pub fn persistence_warning(&self) -> Option<String> {
        self.inner.lock().last_flush_error.clone()
    }

    /// Save the current state if it changed since the last save
    ///
    /// Returns `true` when a snapshot was written. On failure the in-memory
    /// state stays as it is and remains dirty so the next flush retries.
    pub fn flush(&self) -> AnalyticsResult<bool> {
        let _flush = self.flush_lock.lock();

        let (snapshot, generation) = {
            let inner = self.inner.lock();
            let state = inner.state.as_ref().ok_or(AnalyticsError::NotReady)?;
            if inner.generation == inner.flushed_generation {
                return Ok(false);
            }
            (
                state.to_snapshot(chrono::Utc::now().timestamp_millis()),
                inner.generation,
            )
        };

        match self.backend.save(&snapshot) {
            Ok(()) => {
                let mut inner = self.inner.lock();
                inner.flushed_generation = generation;
                inner.last_flush_error = None;
                Ok(true)
            }
            Err(e) => {
                let message = e.to_string();
                warn!(backend = %self.backend.describe(), error = %message, "Store flush failed, changes held in memory");
                self.inner.lock().last_flush_error = Some(message.clone());
                Err(AnalyticsError::Persistence(message))
            }
        }
    }

    /// Final flush, then stop serving operations
    ///
    /// If the final flush fails the store stays open and the error is
    /// returned, so the caller can retry or accept the loss.
    pub fn close(&self) -> AnalyticsResult<()> {
        if !self.is_ready() {
            return Ok(());
        }
        // A write may land between the flush and taking the locks; go again until clean
        loop {
            self.flush()?;

            let _flush = self.flush_lock.lock();
            let mut inner = self.inner.lock();
            if inner.generation == inner.flushed_generation {
                inner.state = None;
                break;
            }
        }
        info!(backend = %self.backend.describe(), "Analytics store closed");
        Ok(())
    }
}
