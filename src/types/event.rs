//! Usage event types
//!
//! Events are immutable records of listener activity. The event log is
//! the source of truth; counters are a cached reduction of it.

use serde::{Deserialize, Serialize};

/// Kinds of usage the jukebox records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A page visit (no track attached)
    Visit,
    /// A track started playing
    Play,
    /// A track was downloaded
    Download,
}

impl EventKind {
    /// All kinds, in reporting order
    pub const ALL: [EventKind; 3] = [EventKind::Visit, EventKind::Play, EventKind::Download];

    /// Whether events of this kind must carry a track identifier
    pub fn requires_track(self) -> bool {
        matches!(self, EventKind::Play | EventKind::Download)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Visit => "visit",
            EventKind::Play => "play",
            EventKind::Download => "download",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "visit" => Ok(EventKind::Visit),
            "play" => Ok(EventKind::Play),
            "download" => Ok(EventKind::Download),
            other => Err(format!("unknown event kind '{}'", other)),
        }
    }
}

/// An immutable usage event in the log
///
/// `occurred_at` is a Unix timestamp in milliseconds, assigned by the
/// server when the event is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,

    /// Track identifier (present for play/download, absent for visit)
    #[serde(rename = "filename", default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,

    #[serde(rename = "timestamp")]
    pub occurred_at: i64,
}

impl UsageEvent {
    pub fn new(kind: EventKind, track_id: Option<String>, occurred_at: i64) -> Self {
        Self {
            kind,
            track_id,
            occurred_at,
        }
    }

    /// A visit event at the given time
    pub fn visit(occurred_at: i64) -> Self {
        Self::new(EventKind::Visit, None, occurred_at)
    }

    /// Whether this event was recorded against the given track
    pub fn is_for_track(&self, track_id: &str) -> bool {
        self.track_id.as_deref() == Some(track_id)
    }

    /// Serialize event to JSON string (for JSONL)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize event from JSON string
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}
