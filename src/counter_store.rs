//! Counter Store - cumulative per-track and global counters
//!
//! Track records are created lazily on first reference with both counts
//! at zero. Keys are exact, case-sensitive track identifiers.

use std::collections::BTreeMap;

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::types::{EventKind, GlobalCounter, TrackCounter};

#[derive(Debug, Clone, Default)]
pub struct CounterStore {
    tracks: BTreeMap<String, TrackCounter>,
    global: GlobalCounter,
}

impl CounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted records; a repeated track id keeps the last record
    pub fn from_parts(tracks: Vec<TrackCounter>, global: GlobalCounter) -> Self {
        let tracks = tracks
            .into_iter()
            .map(|t| (t.track_id.clone(), t))
            .collect();
        Self { tracks, global }
    }

    /// Existing record for `track_id`, or a new zeroed one
    pub fn get_or_create_track(&mut self, track_id: &str) -> &TrackCounter {
        self.track_entry(track_id)
    }

    fn track_entry(&mut self, track_id: &str) -> &mut TrackCounter {
        self.tracks
            .entry(track_id.to_string())
            .or_insert_with(|| TrackCounter::new(track_id))
    }

    /// Look up a track without creating it
    pub fn track(&self, track_id: &str) -> Option<&TrackCounter> {
        self.tracks.get(track_id)
    }

    pub fn increment_play(&mut self, track_id: &str) -> AnalyticsResult<u64> {
        self.bump_track(track_id, EventKind::Play)
    }

    pub fn increment_download(&mut self, track_id: &str) -> AnalyticsResult<u64> {
        self.bump_track(track_id, EventKind::Download)
    }

    /// Increment one field of a track record, leaving its sibling untouched.
    /// On overflow nothing is modified.
    fn bump_track(&mut self, track_id: &str, kind: EventKind) -> AnalyticsResult<u64> {
        if !kind.requires_track() {
            return Err(AnalyticsError::invalid_input(
                "visits are counted globally, not per track",
            ));
        }
        let counter = self.track_entry(track_id);
        let slot = if kind == EventKind::Play {
            &mut counter.play_count
        } else {
            &mut counter.download_count
        };
        let next = slot
            .checked_add(1)
            .ok_or_else(|| AnalyticsError::CounterOverflow(format!("{} count for '{}'", kind, track_id)))?;
        *slot = next;
        Ok(next)
    }

    pub fn increment_visits(&mut self) -> AnalyticsResult<u64> {
        let next = self
            .global
            .total_visits
            .checked_add(1)
            .ok_or_else(|| AnalyticsError::CounterOverflow("total visits".to_string()))?;
        self.global.total_visits = next;
        Ok(next)
    }

    /// Snapshot of all known tracks (ordered by id, callers re-sort)
    pub fn list_tracks(&self) -> Vec<TrackCounter> {
        self.tracks.values().cloned().collect()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn total_visits(&self) -> u64 {
        self.global.total_visits
    }

    pub fn global(&self) -> GlobalCounter {
        self.global
    }
}
