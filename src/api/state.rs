//! Shared application state for the HTTP handlers

use std::sync::Arc;

use crate::aggregation::AggregationEngine;
use crate::config::JukeboxConfig;
use crate::library::MusicLibrary;
use crate::reporting::ReportingFacade;
use crate::storage::AnalyticsStore;

pub struct AppState {
    /// Record path
    pub engine: Arc<AggregationEngine>,
    /// Query path
    pub reporting: ReportingFacade,
    pub library: MusicLibrary,
    pub config: JukeboxConfig,
}

impl AppState {
    /// State around an existing engine
    pub fn new(engine: Arc<AggregationEngine>, config: JukeboxConfig) -> Self {
        Self {
            reporting: ReportingFacade::new(engine.clone()),
            library: MusicLibrary::new(&config.music_dir),
            engine,
            config,
        }
    }

    /// File-backed store at `config.db_path`, bucketed in the configured timezone
    ///
    /// The store is returned uninitialized.
    pub fn from_config(config: JukeboxConfig) -> Self {
        let store = Arc::new(AnalyticsStore::with_file(&config.db_path));
        let engine = AggregationEngine::new(store).with_timezone(config.stats_timezone);
        Self::new(Arc::new(engine), config)
    }

    pub fn store(&self) -> &Arc<AnalyticsStore> {
        self.engine.store()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_config_starts_uninitialized() {
        let temp_dir = TempDir::new().unwrap();
        let config = JukeboxConfig {
            db_path: temp_dir.path().join("stats.jsonl"),
            music_dir: temp_dir.path().join("music"),
            ..JukeboxConfig::default()
        };

        let state = AppState::from_config(config);
        assert!(!state.store().is_ready());
        assert_eq!(state.library.dir(), temp_dir.path().join("music"));

        state.store().init().unwrap();
        assert_eq!(state.engine.record_visit().unwrap().count, 1);
    }
}
