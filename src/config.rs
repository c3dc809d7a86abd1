//! Server configuration from environment variables

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

use crate::aggregation::StatsTimezone;

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_STATS_DAYS: u32 = 7;
pub const DEFAULT_AUTOSAVE_MS: u64 = 4000;

/// Runtime configuration for the jukebox server
#[derive(Debug, Clone)]
pub struct JukeboxConfig {
    pub port: u16,
    /// Directory scanned for tracks
    pub music_dir: PathBuf,
    /// Snapshot file for the analytics store
    pub db_path: PathBuf,
    /// Directory served as static files (index.html, scripts, music)
    pub static_root: PathBuf,
    /// Window of the daily series on the stats page
    pub stats_days: u32,
    pub stats_timezone: StatsTimezone,
    pub autosave_interval: Duration,
    /// Exposed to the browser client via /api/config
    pub playlist_prefix_filter: String,
    pub debug_logging: bool,
}

impl Default for JukeboxConfig {
    fn default() -> Self {
        let root = PathBuf::from(".");
        Self {
            port: DEFAULT_PORT,
            music_dir: root.join("music"),
            db_path: root.join("jukebox.db.jsonl"),
            static_root: root,
            stats_days: DEFAULT_STATS_DAYS,
            stats_timezone: StatsTimezone::Local,
            autosave_interval: Duration::from_millis(DEFAULT_AUTOSAVE_MS),
            playlist_prefix_filter: String::new(),
            debug_logging: false,
        }
    }
}

impl JukeboxConfig {
    /// Read configuration from the process environment
    ///
    /// Relative paths are resolved against the current directory.
    pub fn from_env() -> Self {
        let root = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::from_lookup(&root, |key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Invalid values fall back to their defaults with a warning.
    pub fn from_lookup<F>(root: &Path, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_or_default(&lookup, "PORT", DEFAULT_PORT);

        let stats_days = match parse_or_default(&lookup, "STATS_DAYS", DEFAULT_STATS_DAYS) {
            0 => {
                warn!("STATS_DAYS must be at least 1, using {}", DEFAULT_STATS_DAYS);
                DEFAULT_STATS_DAYS
            }
            days => days,
        };

        let stats_timezone = match lookup("STATS_TZ_OFFSET") {
            Some(raw) => StatsTimezone::parse(&raw).unwrap_or_else(|e| {
                warn!("Ignoring STATS_TZ_OFFSET: {}; using local time", e);
                StatsTimezone::Local
            }),
            None => StatsTimezone::Local,
        };

        let autosave_ms = match parse_or_default(&lookup, "AUTOSAVE_INTERVAL_MS", DEFAULT_AUTOSAVE_MS) {
            0 => DEFAULT_AUTOSAVE_MS,
            ms => ms,
        };

        let music_folder = lookup("MUSIC_FOLDER").unwrap_or_else(|| "music".to_string());
        let db_filename = lookup("DB_FILENAME").unwrap_or_else(|| "jukebox.db.jsonl".to_string());
        let static_root = lookup("STATIC_ROOT")
            .map(|p| resolve(root, &p))
            .unwrap_or_else(|| root.to_path_buf());

        Self {
            port,
            music_dir: resolve(root, &music_folder),
            db_path: resolve(root, &db_filename),
            static_root,
            stats_days,
            stats_timezone,
            autosave_interval: Duration::from_millis(autosave_ms),
            playlist_prefix_filter: lookup("PLAYLIST_PREFIX_FILTER").unwrap_or_default(),
            debug_logging: lookup("DEBUG_LOGGING").map(|v| v == "true").unwrap_or(false),
        }
    }
}

fn resolve(root: &Path, value: &str) -> PathBuf {
    let path = Path::new(value);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid {}='{}', using {}", key, raw, default);
            default
        }),
        None => default,
    }
}
