//! Durable storage backends for the analytics store

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::utils::{atomic_write_with, remove_stale_temp};

use super::snapshot::{self, StoreSnapshot};

/// Where store snapshots are loaded from and saved to
pub trait StoreBackend: Send + Sync {
    /// Load the most recent snapshot, or `None` if nothing was saved yet
    fn load(&self) -> AnalyticsResult<Option<StoreSnapshot>>;

    /// Durably replace the saved snapshot
    fn save(&self, snapshot: &StoreSnapshot) -> AnalyticsResult<()>;

    /// Human-readable location for log lines
    fn describe(&self) -> String;
}

impl<B: StoreBackend + ?Sized> StoreBackend for Arc<B> {
    fn load(&self) -> AnalyticsResult<Option<StoreSnapshot>> {
        (**self).load()
    }

    fn save(&self, snapshot: &StoreSnapshot) -> AnalyticsResult<()> {
        (**self).save(snapshot)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// JSONL snapshot file on the local filesystem
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StoreBackend for FileBackend {
    fn load(&self) -> AnalyticsResult<Option<StoreSnapshot>> {
        if remove_stale_temp(&self.path)? {
            warn!(path = %self.path.display(), "Removed temp file left by an interrupted save");
        }

        if !self.path.exists() {
            return Ok(None);
        }

        let file = File::open(&self.path)?;
        let snapshot = snapshot::decode(BufReader::new(file))?;
        debug!(
            path = %self.path.display(),
            tracks = snapshot.tracks.len(),
            events = snapshot.events.len(),
            "Loaded store snapshot"
        );
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &StoreSnapshot) -> AnalyticsResult<()> {
        atomic_write_with(&self.path, |out| snapshot::encode(snapshot, out)).map_err(|e| {
            AnalyticsError::Persistence(format!("failed to write {}: {}", self.path.display(), e))
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory backend for tests and ephemeral runs
///
/// Keeps the last saved snapshot and can be switched into a failing mode
/// to exercise persistence error handling.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    saved: Mutex<Option<StoreSnapshot>>,
    fail_saves: AtomicBool,
    save_count: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing snapshot, as if it had been saved earlier
    pub fn with_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            saved: Mutex::new(Some(snapshot)),
            ..Self::default()
        }
    }

    /// Make subsequent saves fail (or succeed again)
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    pub fn saved(&self) -> Option<StoreSnapshot> {
        self.saved.lock().clone()
    }
}

impl StoreBackend for MemoryBackend {
    fn load(&self) -> AnalyticsResult<Option<StoreSnapshot>> {
        Ok(self.saved.lock().clone())
    }

    fn save(&self, snapshot: &StoreSnapshot) -> AnalyticsResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(AnalyticsError::Persistence("memory backend rejected save".to_string()));
        }
        *self.saved.lock() = Some(snapshot.clone());
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}
