//! Hot-reloadable configuration store.
//!
//! Readers load the current snapshot through an [`ArcSwap`] and never block.
//! Writers are serialized by a mutex so sequence numbers stay monotonic.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::snapshot::{ConfigError, ConfigSnapshot};

/// The most recent rejected reload.
#[derive(Debug, Clone, Serialize)]
pub struct ReloadFailure {
    pub at: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Default)]
struct ReloadState {
    /// Modification time of the last document we attempted to load.
    seen_mtime: Option<SystemTime>,
    last_error: Option<ReloadFailure>,
}

/// Holds exactly one current [`ConfigSnapshot`] and replaces it on reload.
pub struct ConfigStore {
    current: ArcSwap<ConfigSnapshot>,
    source: PathBuf,
    reload_state: Mutex<ReloadState>,
}

impl ConfigStore {
    /// Create a store serving `initial` until the first reload.
    pub fn new(source: impl Into<PathBuf>, initial: ConfigSnapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
            source: source.into(),
            reload_state: Mutex::new(ReloadState::default()),
        }
    }

    /// Load the services document at `source`, falling back to the built-in
    /// defaults if it cannot be loaded.
    pub fn open(source: impl Into<PathBuf>) -> Self {
        let store = Self::new(source, ConfigSnapshot::defaults());
        match store.reload() {
            Ok(snapshot) => {
                tracing::info!(
                    "Loaded {} service(s) from {}",
                    snapshot.len(),
                    store.source.display()
                );
            }
            Err(e) => {
                tracing::warn!("{}; using built-in default configuration", e);
            }
        }
        store
    }

    /// Current snapshot. Never blocks, never fails.
    pub fn current(&self) -> Arc<ConfigSnapshot> {
        self.current.load_full()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Re-read the services document and publish it if valid.
    ///
    /// On any error the previous snapshot stays current.
    pub fn reload(&self) -> Result<Arc<ConfigSnapshot>, ConfigError> {
        let mut state = self.lock_state();
        state.seen_mtime = modified_time(&self.source);
        let result = std::fs::read_to_string(&self.source)
            .map_err(|source| ConfigError::Io {
                path: self.source.clone(),
                source,
            })
            .and_then(|document| self.publish(&document));
        Self::note_result(&mut state, &result);
        result
    }

    /// Validate and publish an in-memory document.
    pub fn apply_document(&self, document: &str) -> Result<Arc<ConfigSnapshot>, ConfigError> {
        let mut state = self.lock_state();
        let result = self.publish(document);
        Self::note_result(&mut state, &result);
        result
    }

    /// Reload only if the document's modification time advanced since the
    /// last attempt. Returns `Ok(None)` when nothing changed.
    pub fn reload_if_changed(&self) -> Result<Option<Arc<ConfigSnapshot>>, ConfigError> {
        let Some(mtime) = modified_time(&self.source) else {
            return Ok(None);
        };
        {
            let state = self.lock_state();
            if state.seen_mtime.is_some_and(|seen| mtime <= seen) {
                return Ok(None);
            }
        }
        tracing::info!("Services document {} changed, reloading", self.source.display());
        self.reload().map(Some)
    }

    /// The most recent rejected reload, if the last attempt failed.
    pub fn last_error(&self) -> Option<ReloadFailure> {
        self.lock_state().last_error.clone()
    }

    // Caller must hold the reload lock.
    fn publish(&self, document: &str) -> Result<Arc<ConfigSnapshot>, ConfigError> {
        let sequence = self.current.load().sequence() + 1;
        let snapshot = Arc::new(ConfigSnapshot::parse(sequence, document)?);
        self.current.store(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    fn note_result(state: &mut ReloadState, result: &Result<Arc<ConfigSnapshot>, ConfigError>) {
        match result {
            Ok(snapshot) => {
                tracing::info!(
                    sequence = snapshot.sequence(),
                    services = snapshot.len(),
                    "Published configuration snapshot"
                );
                state.last_error = None;
            }
            Err(e) => {
                tracing::warn!("Rejected configuration reload: {}", e);
                state.last_error = Some(ReloadFailure {
                    at: Utc::now(),
                    message: e.to_string(),
                });
            }
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ReloadState> {
        self.reload_state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Poll the services document and reload it when it changes.
///
/// Runs until the task is dropped. Reload work happens on the blocking pool so
/// request handling is never paused.
pub async fn watch(store: Arc<ConfigStore>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately; the document was just loaded.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let store = Arc::clone(&store);
        // Rejections are already logged and recorded by the store.
        if let Err(e) = tokio::task::spawn_blocking(move || store.reload_if_changed()).await {
            tracing::error!("Config watcher task failed: {}", e);
        }
    }
}
