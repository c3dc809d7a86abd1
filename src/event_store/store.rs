//! Event Store - append-only usage log
//!
//! Events are kept in arrival order. A `BTreeMap` index keyed by
//! `occurred_at` turns windowed queries into range lookups.

use std::collections::BTreeMap;

use crate::types::{EventKind, UsageEvent};

/// The EventStore holds the append-only event log
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    /// Events in arrival order
    events: Vec<UsageEvent>,
    /// occurred_at -> positions in `events`
    by_time: BTreeMap<i64, Vec<usize>>,
}

impl EventStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from previously persisted events, preserving order
    pub fn from_events(events: Vec<UsageEvent>) -> Self {
        let mut store = Self::new();
        for event in events {
            store.append(event);
        }
        store
    }

    /// Append an event to the log
    pub fn append(&mut self, event: UsageEvent) {
        let position = self.events.len();
        self.by_time.entry(event.occurred_at).or_default().push(position);
        self.events.push(event);
    }

    /// All events with `occurred_at` in the closed interval `[from, to]`
    pub fn query_range(&self, from_inclusive: i64, to_inclusive: i64) -> Vec<&UsageEvent> {
        if from_inclusive > to_inclusive {
            return Vec::new();
        }
        self.collect(self.by_time.range(from_inclusive..=to_inclusive))
    }

    /// All events with `occurred_at >= from`
    pub fn query_since(&self, from_inclusive: i64) -> Vec<&UsageEvent> {
        self.collect(self.by_time.range(from_inclusive..))
    }

    fn collect<'a, I>(&'a self, range: I) -> Vec<&'a UsageEvent>
    where
        I: Iterator<Item = (&'a i64, &'a Vec<usize>)>,
    {
        range
            .flat_map(|(_, positions)| positions.iter().map(|&i| &self.events[i]))
            .collect()
    }

    /// Iterate events in arrival order
    pub fn iter(&self) -> impl Iterator<Item = &UsageEvent> {
        self.events.iter()
    }

    /// Number of logged events of `kind`, optionally restricted to one track
    pub fn count_matching(&self, kind: EventKind, track_id: Option<&str>) -> u64 {
        self.events
            .iter()
            .filter(|e| e.kind == kind)
            .filter(|e| match track_id {
                Some(id) => e.is_for_track(id),
                None => true,
            })
            .count() as u64
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Copy of the log in arrival order (for snapshots)
    pub fn to_vec(&self) -> Vec<UsageEvent> {
        self.events.clone()
    }
}
