//! File watching for live reload.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

/// Events emitted by the file watcher.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    /// Markdown page was created or modified
    Page(PathBuf),

    /// Site configuration was modified
    Config(PathBuf),

    /// Image or other copied file was created or modified
    Asset(PathBuf),

    /// File under the docs directory was removed
    Removed(PathBuf),
}

impl WatchEvent {
    /// Path the event refers to.
    pub fn path(&self) -> &Path {
        match self {
            Self::Page(path) | Self::Config(path) | Self::Asset(path) | Self::Removed(path) => path,
        }
    }
}

impl fmt::Display for WatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Page(_) => "page changed",
            Self::Config(_) => "config changed",
            Self::Asset(_) => "asset changed",
            Self::Removed(_) => "removed",
        };
        write!(f, "{} {}", self.path().display(), kind)
    }
}

/// What the watcher observes.
#[derive(Debug, Clone)]
pub struct WatchTargets {
    /// Docs directory, watched recursively
    pub docs_dir: PathBuf,

    /// Site configuration file
    pub config_file: PathBuf,
}

impl WatchTargets {
    /// Resolve symlinks so paths compare equal to the ones notify reports.
    fn canonical(&self) -> Self {
        Self {
            docs_dir: self
                .docs_dir
                .canonicalize()
                .unwrap_or_else(|_| self.docs_dir.clone()),
            config_file: self
                .config_file
                .canonicalize()
                .unwrap_or_else(|_| self.config_file.clone()),
        }
    }
}

/// File watcher for detecting changes.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Start watching the docs directory and the configuration file.
    ///
    /// Returns the watcher and a channel to receive events. Events stop when
    /// the watcher is dropped.
    pub fn new(
        targets: &WatchTargets,
    ) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), std::io::Error> {
        let targets = targets.canonical();
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })
        .map_err(std::io::Error::other)?;

        if targets.docs_dir.exists() {
            watcher
                .watch(&targets.docs_dir, RecursiveMode::Recursive)
                .map_err(std::io::Error::other)?;
        }

        // Editors often replace the file on save, so watch its directory.
        if let Some(parent) = targets.config_file.parent() {
            if parent.exists() {
                watcher
                    .watch(parent, RecursiveMode::NonRecursive)
                    .map_err(std::io::Error::other)?;
            }
        }

        std::thread::spawn(move || {
            while let Ok(event) = sync_rx.recv() {
                for path in &event.paths {
                    let Some(watch_event) = classify_event(path, &event.kind, &targets) else {
                        continue;
                    };
                    if async_tx.blocking_send(watch_event).is_err() {
                        return;
                    }
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

/// Classify a file system event.
fn classify_event(path: &Path, kind: &EventKind, targets: &WatchTargets) -> Option<WatchEvent> {
    let removed = match kind {
        EventKind::Create(_) | EventKind::Modify(_) => false,
        EventKind::Remove(_) => true,
        _ => return None,
    };

    if path == targets.config_file {
        return Some(WatchEvent::Config(path.to_path_buf()));
    }

    if !path.starts_with(&targets.docs_dir) || path == targets.docs_dir {
        return None;
    }

    if is_scratch_file(path) {
        return None;
    }

    if removed {
        return Some(WatchEvent::Removed(path.to_path_buf()));
    }

    match path.extension().and_then(|e| e.to_str()) {
        Some("md") => Some(WatchEvent::Page(path.to_path_buf())),
        // wiki sources are converted explicitly, never rendered
        Some("pwtxt") => None,
        _ => Some(WatchEvent::Asset(path.to_path_buf())),
    }
}

/// Editor swap and backup files.
fn is_scratch_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return true;
    };

    name.starts_with('.')
        || name.ends_with('~')
        || name.ends_with(".swp")
        || name.ends_with(".tmp")
}
