//! Snapshot codec for the analytics store
//!
//! A snapshot is a JSONL document:
//!
//! ```text
//! {"type":"jukebox_snapshot","version":1,"savedAt":...,"totalVisits":3,"trackCount":2,"eventCount":7}
//! {"filename":"songA","play_count":1,"download_count":2}
//! {"filename":"songB","play_count":1,"download_count":0}
//! {"type":"visit","timestamp":1718000000000}
//! {"type":"play","filename":"songA","timestamp":1718000000100}
//! ...
//! ```
//!
//! The metadata line comes first, then track counters, then events in
//! arrival order.

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::types::{GlobalCounter, TrackCounter, UsageEvent};

const META_TYPE: &str = "jukebox_snapshot";
const FORMAT_VERSION: u32 = 1;
const PREALLOC_LIMIT: usize = 4096;

/// Point-in-time copy of everything the store holds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    /// Unix milliseconds when the snapshot was taken
    pub saved_at: i64,
    pub global: GlobalCounter,
    pub tracks: Vec<TrackCounter>,
    pub events: Vec<UsageEvent>,
}

/// Snapshot metadata - first line in snapshot file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMeta {
    #[serde(rename = "type")]
    pub meta_type: String,

    #[serde(default = "default_version")]
    pub version: u32,

    pub saved_at: i64,

    #[serde(default)]
    pub total_visits: u64,

    pub track_count: usize,

    pub event_count: usize,
}

fn default_version() -> u32 {
    FORMAT_VERSION
}

impl SnapshotMeta {
    fn for_snapshot(snapshot: &StoreSnapshot) -> Self {
        Self {
            meta_type: META_TYPE.to_string(),
            version: FORMAT_VERSION,
            saved_at: snapshot.saved_at,
            total_visits: snapshot.global.total_visits,
            track_count: snapshot.tracks.len(),
            event_count: snapshot.events.len(),
        }
    }
}

/// Body line of a snapshot. Events are tried first: a track line has no
/// `type`/`timestamp` and falls through to `Track`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SnapshotRecord {
    Event(UsageEvent),
    Track(TrackCounter),
}

/// Write a snapshot as JSONL
pub fn encode<W: Write>(snapshot: &StoreSnapshot, out: &mut W) -> std::io::Result<()> {
    let to_io = |e: serde_json::Error| std::io::Error::new(std::io::ErrorKind::InvalidData, e);

    writeln!(out, "{}", serde_json::to_string(&SnapshotMeta::for_snapshot(snapshot)).map_err(to_io)?)?;

    for track in &snapshot.tracks {
        writeln!(out, "{}", serde_json::to_string(track).map_err(to_io)?)?;
    }

    for event in &snapshot.events {
        writeln!(out, "{}", event.to_json_line().map_err(to_io)?)?;
    }

    Ok(())
}

/// Read a snapshot written by [`encode`]
///
/// Blank lines are skipped. Track lines missing a count default it to
/// zero. A malformed line or a body that does not match the metadata
/// counts fails the whole load.
pub fn decode<R: BufRead>(reader: R) -> AnalyticsResult<StoreSnapshot> {
    let mut lines = reader.lines();

    let meta_line = loop {
        match lines.next() {
            Some(line) => {
                let line = line?;
                if !line.trim().is_empty() {
                    break line;
                }
            }
            None => return Err(AnalyticsError::Persistence("empty snapshot file".to_string())),
        }
    };

    let meta: SnapshotMeta = serde_json::from_str(&meta_line)?;
    if meta.meta_type != META_TYPE {
        return Err(AnalyticsError::Persistence(format!(
            "unexpected snapshot header type '{}'",
            meta.meta_type
        )));
    }
    if meta.version > FORMAT_VERSION {
        return Err(AnalyticsError::Persistence(format!(
            "snapshot version {} is newer than supported version {}",
            meta.version, FORMAT_VERSION
        )));
    }

    let mut snapshot = StoreSnapshot {
        saved_at: meta.saved_at,
        global: GlobalCounter {
            total_visits: meta.total_visits,
        },
        // Header counts are untrusted until the body has been checked against them
        tracks: Vec::with_capacity(meta.track_count.min(PREALLOC_LIMIT)),
        events: Vec::with_capacity(meta.event_count.min(PREALLOC_LIMIT)),
    };

    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<SnapshotRecord>(&line) {
            Ok(SnapshotRecord::Event(event)) => snapshot.events.push(event),
            Ok(SnapshotRecord::Track(track)) => snapshot.tracks.push(track),
            Err(_) => {
                // Re-parse as a plain value to surface a useful serde error
                let value: serde_json::Value = serde_json::from_str(&line)?;
                return Err(AnalyticsError::Persistence(format!(
                    "unrecognized snapshot record: {}",
                    value
                )));
            }
        }
    }

    if snapshot.tracks.len() != meta.track_count || snapshot.events.len() != meta.event_count {
        return Err(AnalyticsError::Persistence(format!(
            "snapshot body does not match header: {} tracks / {} events, expected {} / {}",
            snapshot.tracks.len(),
            snapshot.events.len(),
            meta.track_count,
            meta.event_count
        )));
    }

    Ok(snapshot)
}
