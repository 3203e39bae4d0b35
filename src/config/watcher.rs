//! Configuration file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself, so saves that
//! write a temporary file and rename it over the config keep being seen.
//! Bursts of events are debounced and the file is read once they settle.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::parse_config;
use crate::config::schema::SiteConfig;

/// Quiet period after the last file event before the file is read.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Watches the configuration file and pushes every valid revision.
///
/// Invalid, empty or unchanged contents are dropped; the running
/// configuration stays.
pub struct ConfigWatcher {
    path: PathBuf,
    debounce: Duration,
    update_tx: mpsc::UnboundedSender<SiteConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<SiteConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                debounce: DEFAULT_DEBOUNCE,
                update_tx,
            },
            update_rx,
        )
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Start watching. Must be called inside a Tokio runtime. The returned
    /// handle must be kept alive; dropping it stops the reload task.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = self.path.file_name().map(ToOwned::to_owned).ok_or_else(|| {
            notify::Error::generic("config path has no file name").add_path(self.path.clone())
        })?;

        let (event_tx, event_rx) = mpsc::unbounded_channel::<()>();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Access(_)) {
                        return;
                    }
                    let touches_config = event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == Some(file_name.as_os_str()));
                    if touches_config {
                        let _ = event_tx.send(());
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        let last_applied = fs::read_to_string(&self.path).ok();
        tokio::spawn(reload_loop(
            self.path.clone(),
            self.debounce,
            last_applied,
            event_rx,
            self.update_tx,
        ));

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

async fn reload_loop(
    path: PathBuf,
    debounce: Duration,
    mut last_applied: Option<String>,
    mut events: mpsc::UnboundedReceiver<()>,
    update_tx: mpsc::UnboundedSender<SiteConfig>,
) {
    while events.recv().await.is_some() {
        // Wait for the writer to finish.
        while let Ok(Some(())) = tokio::time::timeout(debounce, events.recv()).await {}

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!(path = ?path, error = %e, "Config file unreadable, waiting");
                continue;
            }
        };
        if content.trim().is_empty() {
            tracing::debug!(path = ?path, "Config file empty, waiting for contents");
            continue;
        }
        if last_applied.as_deref() == Some(content.as_str()) {
            continue;
        }

        tracing::info!(path = ?path, "Config file change detected, reloading");
        match parse_config(&content) {
            Ok(config) => {
                last_applied = Some(content);
                if update_tx.send(config).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Failed to reload config, keeping current configuration"
                );
            }
        }
    }
    tracing::debug!(path = ?path, "Config watcher stopped");
}
