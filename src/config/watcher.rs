//! Keymap file watcher for hot-reload support

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Watches a keymap file and delivers its new text after each modification
///
/// The text is not parsed here; the host parses it into a scratch store and
/// swaps it in, so a broken edit never half-applies.
pub struct KeymapWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<String>,
}

impl KeymapWatcher {
    /// Create a watcher for `path`, returning it with the current file text
    pub async fn new(path: PathBuf) -> Result<(Self, String)> {
        let (tx, rx) = mpsc::channel(10);

        let initial = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read keymap: {}", path.display()))?;

        let watched = path.clone();

        // notify callbacks run on their own OS thread, not in Tokio context
        let runtime_handle = tokio::runtime::Handle::current();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Modify(_)) {
                        debug!("Keymap modified: {:?}", event.paths);

                        let path = watched.clone();
                        let tx = tx.clone();

                        runtime_handle.spawn(async move {
                            // Debounce: wait a bit for file writes to complete
                            tokio::time::sleep(Duration::from_millis(100)).await;

                            match tokio::fs::read_to_string(&path).await {
                                Ok(text) => {
                                    if let Err(e) = tx.send(text).await {
                                        error!("Failed to send keymap update: {}", e);
                                    }
                                }
                                Err(e) => {
                                    warn!("Failed to reread keymap (keeping old bindings): {}", e);
                                }
                            }
                        });
                    }
                }
                Err(e) => {
                    error!("Watch error: {}", e);
                }
            }
        })?;

        watcher
            .watch(&path, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch keymap: {}", path.display()))?;

        info!("Keymap watcher started for: {}", path.display());

        Ok((Self { _watcher: watcher, rx }, initial))
    }

    /// Wait for the next keymap text
    /// Returns None if the watcher has been closed
    pub async fn next_keymap(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}
