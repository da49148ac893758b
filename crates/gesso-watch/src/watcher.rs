//! File watching for continuous rebuilds.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

/// Events emitted by the file watcher.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// An entry template or partial was modified
    TemplateChanged(PathBuf),

    /// A stylesheet was modified
    StyleChanged(PathBuf),

    /// A script was modified
    ScriptChanged(PathBuf),

    /// The template data file was modified
    DataChanged(PathBuf),

    /// An image or font was modified
    AssetChanged(PathBuf),

    /// File was created
    Created(PathBuf),

    /// File was deleted
    Deleted(PathBuf),

    /// Modification to a file no pipeline stage reads
    Modified(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            WatchEvent::TemplateChanged(p)
            | WatchEvent::StyleChanged(p)
            | WatchEvent::ScriptChanged(p)
            | WatchEvent::DataChanged(p)
            | WatchEvent::AssetChanged(p)
            | WatchEvent::Created(p)
            | WatchEvent::Deleted(p)
            | WatchEvent::Modified(p) => p,
        }
    }
}

/// File watcher for detecting source changes.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Create a new file watcher for the given paths.
    ///
    /// Returns the watcher and a channel to receive events.
    pub fn new(
        paths: &[PathBuf],
    ) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), std::io::Error> {
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })
        .map_err(std::io::Error::other)?;

        for path in paths {
            if path.exists() {
                watcher
                    .watch(path, RecursiveMode::Recursive)
                    .map_err(std::io::Error::other)?;
            }
        }

        // Forward events, collapsing rapid bursts from editors that write
        // several times per save.
        std::thread::spawn(move || {
            let mut last_event_time = std::time::Instant::now();
            let debounce_duration = Duration::from_millis(100);

            while let Ok(event) = sync_rx.recv() {
                let now = std::time::Instant::now();
                if now.duration_since(last_event_time) < debounce_duration {
                    continue;
                }
                last_event_time = now;

                for path in event.paths {
                    if let Some(e) = classify_event(&path, &event.kind) {
                        let _ = async_tx.blocking_send(e);
                    }
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

/// Classify a notify event by the kind of source file it touched.
fn classify_event(path: &Path, kind: &notify::EventKind) -> Option<WatchEvent> {
    use notify::EventKind;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match kind {
        EventKind::Create(_) => Some(WatchEvent::Created(path.to_path_buf())),
        EventKind::Remove(_) => Some(WatchEvent::Deleted(path.to_path_buf())),
        EventKind::Modify(_) => match ext {
            "hbs" => Some(WatchEvent::TemplateChanged(path.to_path_buf())),
            "scss" | "sass" | "less" | "css" => {
                Some(WatchEvent::StyleChanged(path.to_path_buf()))
            }
            "js" => Some(WatchEvent::ScriptChanged(path.to_path_buf())),
            "json" => Some(WatchEvent::DataChanged(path.to_path_buf())),
            "jpg" | "jpeg" | "png" | "gif" | "woff" | "woff2" | "ttf" | "eot" | "svg" => {
                Some(WatchEvent::AssetChanged(path.to_path_buf()))
            }
            _ => Some(WatchEvent::Modified(path.to_path_buf())),
        },
        _ => None,
    }
}
