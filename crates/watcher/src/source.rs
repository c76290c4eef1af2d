//! Raw watch source
//!
//! One non-recursive `notify` watcher per target. A directory target is
//! watched directly. A file target is watched through its parent directory
//! with events narrowed to the file, so that renaming it arrives as a paired
//! move instead of a lone "moved away" on the old name. Backend callbacks run
//! on the backend's own thread and forward into the dispatch loop's channel.

use filemon_core::error::{Error, Result};
use notify::event::{ModifyKind, RenameMode};
use notify::{
    Config as NotifyConfig, Event as NotifyEvent, EventKind, RecommendedWatcher, RecursiveMode,
    Watcher as NotifyWatcher,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{error, info, trace, warn};

/// Which backend events belong to a target
#[derive(Debug)]
enum Scope {
    /// Everything under the directory, until the directory itself moves or
    /// is removed; after that the backend keeps reporting stale paths
    Directory { path: PathBuf, detached: bool },
    /// Events naming the file, plus the far half of a move that started at it
    File {
        path: PathBuf,
        trackers: HashSet<usize>,
    },
}

impl Scope {
    fn for_target(path: &Path) -> Self {
        let is_file = std::fs::metadata(path).is_ok_and(|m| !m.is_dir());
        let has_parent = path.parent().is_some_and(|p| !p.as_os_str().is_empty());
        if is_file && has_parent {
            Self::File {
                path: path.to_path_buf(),
                trackers: HashSet::new(),
            }
        } else {
            Self::Directory {
                path: path.to_path_buf(),
                detached: false,
            }
        }
    }

    /// Path handed to the backend
    fn watch_path(&self) -> &Path {
        match self {
            Self::Directory { path, .. } => path.as_path(),
            Self::File { path, .. } => path.parent().unwrap_or(path.as_path()),
        }
    }

    fn is_directory(&self) -> bool {
        matches!(self, Self::Directory { .. })
    }

    /// Whether `event` should reach the dispatch loop
    fn admit(&mut self, event: &NotifyEvent) -> bool {
        match self {
            Self::Directory { path, detached } => {
                if *detached {
                    trace!("Dropping {:?} from detached watch on {:?}", event.kind, path);
                    return false;
                }
                let about_self = event.paths.iter().any(|p| p == path);
                let gone = matches!(
                    event.kind,
                    EventKind::Remove(_)
                        | EventKind::Modify(ModifyKind::Name(RenameMode::From | RenameMode::Any))
                );
                if about_self && gone {
                    warn!("Watched directory {:?} moved or removed, no longer watching it", path);
                    *detached = true;
                }
                true
            }
            Self::File { path, trackers } => {
                let names_target = event.paths.iter().any(|p| p == path);
                let tracker = event.tracker();
                match event.kind {
                    EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                        if let (true, Some(tracker)) = (names_target, tracker) {
                            trackers.insert(tracker);
                        }
                        names_target
                    }
                    EventKind::Modify(ModifyKind::Name(RenameMode::To | RenameMode::Both)) => {
                        let followed = tracker.is_some_and(|t| trackers.remove(&t));
                        names_target || followed
                    }
                    _ => names_target,
                }
            }
        }
    }
}

/// A live subscription to one target's changes
///
/// Dropping it releases the OS subscription.
pub struct WatchSource {
    path: PathBuf,
    directory: bool,
    _watcher: RecommendedWatcher,
}

impl std::fmt::Debug for WatchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSource")
            .field("path", &self.path)
            .field("directory", &self.directory)
            .finish_non_exhaustive()
    }
}

impl WatchSource {
    /// Watch `path` and forward its events to `tx`
    pub fn subscribe(path: &Path, tx: mpsc::Sender<NotifyEvent>) -> Result<Self> {
        let mut scope = Scope::for_target(path);
        let watch_path = scope.watch_path().to_path_buf();
        let directory = scope.is_directory();

        let mut watcher = RecommendedWatcher::new(
            move |res: std::result::Result<NotifyEvent, notify::Error>| match res {
                Ok(event) if !scope.admit(&event) => {}
                Ok(event) => match tx.try_send(event) {
                    Ok(()) => {}
                    Err(TrySendError::Full(event)) => {
                        warn!("Event queue full, dropping {:?} on {:?}", event.kind, event.paths);
                    }
                    Err(TrySendError::Closed(_)) => {
                        trace!("Dispatch loop gone, dropping event");
                    }
                },
                Err(e) => {
                    error!("Notify error: {}", e);
                }
            },
            NotifyConfig::default(),
        )
        .map_err(|e| Error::watcher(format!("Failed to create watcher: {e}")))?;

        watcher
            .watch(&watch_path, RecursiveMode::NonRecursive)
            .map_err(|e| Error::watcher(format!("Failed to watch path {path:?}: {e}")))?;

        info!("Watching path: {:?}", path);
        Ok(Self {
            path: path.to_path_buf(),
            directory,
            _watcher: watcher,
        })
    }

    /// The watched target
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the target is a directory watched directly
    pub fn is_directory(&self) -> bool {
        self.directory
    }

    /// Whether this source already reports everything about `target`
    ///
    /// A directory source covers the files directly inside it.
    pub fn covers(&self, target: &Path) -> bool {
        if self.path == target {
            return true;
        }
        self.directory && target.parent() == Some(self.path.as_path()) && !target.is_dir()
    }
}
