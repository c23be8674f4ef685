use anyhow::Result;
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;
use tracing::{error, info, warn};

/// Invokes a callback when the schema file changes.
///
/// The parent directory is watched so editors that replace the file on save
/// are still picked up. Dropping the watcher stops notifications.
pub struct SchemaWatcher {
    _watcher: RecommendedWatcher,
}

impl SchemaWatcher {
    pub fn new<F>(path: impl Into<PathBuf>, on_change: F) -> Result<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let path: PathBuf = path.into();
        let (tx, rx) = channel();

        let mut watcher = RecommendedWatcher::new(tx, Config::default())?;

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        info!("Watching schema file: {}", path.display());

        let file_name = path.file_name().map(|n| n.to_os_string());

        std::thread::spawn(move || loop {
            match rx.recv() {
                Ok(Ok(event)) => {
                    let relevant = matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    ) && event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if !relevant {
                        continue;
                    }
                    // Debounce bursts of write events
                    std::thread::sleep(Duration::from_millis(100));
                    while rx.try_recv().is_ok() {}
                    info!("Schema change detected, reloading...");
                    on_change();
                }
                Ok(Err(e)) => warn!("Watch error: {:?}", e),
                Err(e) => {
                    error!("Watch channel closed: {:?}", e);
                    break;
                }
            }
        });

        Ok(Self { _watcher: watcher })
    }
}
