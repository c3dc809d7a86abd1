//! HTTP server lifecycle
//!
//! Binds the listener first, then loads the analytics store in the
//! background so early requests get `503` instead of a refused connection.
//! A periodic autosave flushes dirty state, and shutdown performs a final
//! flush before the process exits.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::api::{create_router, AppState};
use crate::config::JukeboxConfig;
use crate::storage::AnalyticsStore;

/// Run the jukebox server until Ctrl+C or SIGTERM
pub async fn run(config: JukeboxConfig) -> std::io::Result<()> {
    let autosave_interval = config.autosave_interval;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = Arc::new(AppState::from_config(config));
    let store = state.store().clone();

    let listener = TcpListener::bind(addr).await?;
    info!("Jukebox listening on http://{}", addr);

    let init_store = store.clone();
    tokio::spawn(async move {
        match tokio::task::spawn_blocking(move || init_store.init()).await {
            Ok(Ok(())) => info!("Analytics store ready"),
            Ok(Err(e)) => error!(error = %e, "Analytics store failed to initialize"),
            Err(e) => error!(error = %e, "Store initialization task panicked"),
        }
    });

    let (stop_tx, stop_rx) = watch::channel(false);
    let autosave = tokio::spawn(Autosaver::new(store.clone(), autosave_interval).run(stop_rx));

    let served = axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    let _ = stop_tx.send(true);
    if let Err(e) = autosave.await {
        warn!(error = %e, "Autosave task ended abnormally");
    }

    match tokio::task::spawn_blocking(move || store.close()).await {
        Ok(Ok(())) => info!("Final save complete"),
        Ok(Err(e)) => error!(error = %e, "Final save failed, recent activity may be lost"),
        Err(e) => error!(error = %e, "Final save task panicked"),
    }

    served
}

/// Periodically saves the store while it has unsaved changes
pub struct Autosaver {
    store: Arc<AnalyticsStore>,
    period: Duration,
}

impl Autosaver {
    pub fn new(store: Arc<AnalyticsStore>, period: Duration) -> Self {
        Self { store, period }
    }

    /// Flush on every tick until `stop` turns true
    pub async fn run(self, mut stop: watch::Receiver<bool>) {
        let mut timer = interval(self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        timer.tick().await;

        loop {
            tokio::select! {
                _ = timer.tick() => self.save_if_dirty().await,
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }
    }

    async fn save_if_dirty(&self) {
        if let Some(reason) = self.store.init_failure() {
            error!(error = %reason, "Analytics store failed to load, requests fail until restart");
            return;
        }
        if !self.store.is_ready() || !self.store.is_dirty() {
            return;
        }

        let store = self.store.clone();
        match tokio::task::spawn_blocking(move || store.flush()).await {
            Ok(Ok(_)) => {}
            // Already logged by the store; the next tick retries
            Ok(Err(_)) => {}
            Err(e) => warn!(error = %e, "Autosave task panicked"),
        }
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
