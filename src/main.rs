//! Jukebox Server - Binary Entry Point
//!
//! This is the main entry point for the jukebox-server binary.

use jukebox::config::JukeboxConfig;
use jukebox::{logging, server};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Logging comes first so configuration warnings are visible
    logging::init(std::env::var("DEBUG_LOGGING").as_deref() == Ok("true"));
    let config = JukeboxConfig::from_env();

    tracing::info!(
        version = jukebox::VERSION,
        music_dir = %config.music_dir.display(),
        db_path = %config.db_path.display(),
        stats_days = config.stats_days,
        timezone = %config.stats_timezone,
        "Starting jukebox server"
    );

    server::run(config).await
}
