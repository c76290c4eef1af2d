//! Raw and normalized event types
//!
//! Raw events are what the watch source reports; normalized events are the
//! single user-meaningful description the engine hands to a presentation sink.

use crate::icon::Icon;
use std::fmt;
use std::path::{Path, PathBuf};

/// Low-level event kinds reported by the watch source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawEventKind {
    /// File contents were written
    Changed,
    /// A writer closed the file; a burst of `Changed` is over
    ChangesDoneHint,
    /// Entry appeared
    Created,
    /// Entry disappeared
    Deleted,
    /// Permissions, ownership or timestamps changed
    AttributeChanged,
    /// Entry crossed into the watched set
    MovedIn,
    /// Entry crossed out of the watched set
    MovedOut,
    /// Entry was renamed within its directory
    Renamed,
    /// The filesystem holding the entry went away
    Unmounted,
    /// Anything the source could not classify
    Other,
}

impl RawEventKind {
    /// Operation category for this kind, or `None` when it is never reported
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::MovedIn | Self::MovedOut => Some(Operation::Moved),
            Self::Renamed => Some(Operation::Renamed),
            Self::Deleted => Some(Operation::Deleted),
            Self::Created => Some(Operation::Created),
            Self::Changed => Some(Operation::Changed),
            Self::ChangesDoneHint | Self::AttributeChanged | Self::Unmounted | Self::Other => None,
        }
    }
}

/// One event from the watch source
///
/// For `Renamed`, `MovedOut` and `MovedIn`, `path` is the old location and
/// `other` the new one. When only one side of a move is known, `other` is
/// `None` and `path` holds the side that is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: RawEventKind,
    pub path: PathBuf,
    pub other: Option<PathBuf>,
}

impl RawEvent {
    /// Create an event with no secondary path
    pub fn new(kind: RawEventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            other: None,
        }
    }

    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self::new(RawEventKind::Created, path)
    }

    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self::new(RawEventKind::Deleted, path)
    }

    pub fn changed(path: impl Into<PathBuf>) -> Self {
        Self::new(RawEventKind::Changed, path)
    }

    pub fn renamed(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        Self {
            kind: RawEventKind::Renamed,
            path: from.into(),
            other: Some(to.into()),
        }
    }

    /// The "out" half of a move; `to` is `None` when the destination is unwatched
    pub fn moved_out(from: impl Into<PathBuf>, to: Option<PathBuf>) -> Self {
        Self {
            kind: RawEventKind::MovedOut,
            path: from.into(),
            other: to,
        }
    }

    /// The "in" half of a move; `from` is `None` when the source is unwatched
    pub fn moved_in(from: Option<PathBuf>, to: impl Into<PathBuf>) -> Self {
        match from {
            Some(from) => Self {
                kind: RawEventKind::MovedIn,
                path: from,
                other: Some(to.into()),
            },
            None => Self::new(RawEventKind::MovedIn, to),
        }
    }

    /// The path whose identity the event is about
    ///
    /// Moves and renames are about their new location.
    pub fn subject(&self) -> &Path {
        match self.kind {
            RawEventKind::MovedIn | RawEventKind::MovedOut | RawEventKind::Renamed => {
                self.other.as_deref().unwrap_or(&self.path)
            }
            _ => &self.path,
        }
    }
}

/// User-facing operation categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Moved,
    Deleted,
    Created,
    Renamed,
    Changed,
}

impl Operation {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Moved => "moved",
            Self::Deleted => "deleted",
            Self::Created => "created",
            Self::Renamed => "renamed",
            Self::Changed => "changed",
        }
    }

    /// Contextual action offered alongside a report of this operation
    pub fn action(&self) -> Action {
        match self {
            Self::Changed => Action::ViewContents,
            _ => Action::ShowInFiles,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// User-triggerable action attached to a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Open the directory containing the entry
    ShowInFiles,
    /// Open the entry itself
    ViewContents,
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ShowInFiles => "Show in Files",
            Self::ViewContents => "View file contents",
        }
    }

    /// Path the action opens for an entry at `target`
    pub fn resolve<'a>(&self, target: &'a Path) -> &'a Path {
        match self {
            Self::ShowInFiles => target.parent().unwrap_or(target),
            Self::ViewContents => target,
        }
    }
}

/// Type of a filesystem entry, queried without following symbolic links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    RegularFile,
    Directory,
    SymbolicLink,
    Other,
}

impl EntryKind {
    /// Query the type of `path`; unreadable paths are `Other`
    pub fn query(path: &Path) -> Self {
        match std::fs::symlink_metadata(path) {
            Ok(meta) => {
                let file_type = meta.file_type();
                if file_type.is_symlink() {
                    Self::SymbolicLink
                } else if file_type.is_dir() {
                    Self::Directory
                } else if file_type.is_file() {
                    Self::RegularFile
                } else {
                    Self::Other
                }
            }
            Err(_) => Self::Other,
        }
    }

    /// Human label; anything unrecognized reads as a file
    pub fn label(&self) -> &'static str {
        match self {
            Self::SymbolicLink => "Symlink",
            Self::Directory => "Directory",
            Self::RegularFile | Self::Other => "File",
        }
    }
}

/// The engine's reduced description of one filesystem change
///
/// Borrows from the tracked entry it describes, so it lives no longer than
/// the handling of the raw event that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEvent<'a> {
    pub kind: EntryKind,
    pub operation: Operation,
    /// Display form of the event's primary path
    pub subject: String,
    /// Display form of the other side of a move (full path) or rename (base name)
    pub counterpart: Option<String>,
    /// Canonical identity of the tracked entry, used by the contextual action
    pub target: &'a Path,
    pub icon: Option<&'a Icon>,
}

impl NormalizedEvent<'_> {
    /// `"<kind> <operation>"`, e.g. `"Directory renamed"`
    pub fn title(&self) -> String {
        format!("{} {}", self.kind.label(), self.operation.label())
    }

    /// `"<subject> -> <counterpart>"`, or the subject alone
    pub fn description(&self) -> String {
        match &self.counterpart {
            Some(counterpart) => format!("{} -> {}", self.subject, counterpart),
            None => self.subject.clone(),
        }
    }

    pub fn action(&self) -> Action {
        self.operation.action()
    }
}

impl fmt::Display for NormalizedEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title(), self.description())
    }
}
