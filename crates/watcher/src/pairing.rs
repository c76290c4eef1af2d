//! Move pairing
//!
//! Watch backends report the two halves of a move separately, tagged with a
//! shared tracker. [`MovePairer`] joins them into one rename or move pair and
//! translates every other backend event into a [`RawEvent`].

use crate::events::{RawEvent, RawEventKind};
use crate::ignore::IgnoreFilter;
use notify::event::{AccessKind, AccessMode, ModifyKind, RenameMode};
use notify::{Event, EventKind};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    From,
    To,
}

#[derive(Debug)]
struct PendingHalf {
    side: Side,
    path: PathBuf,
    seen: Instant,
}

/// Joins move halves and converts backend events
#[derive(Debug)]
pub struct MovePairer {
    window: Duration,
    ignore: IgnoreFilter,
    /// Halves waiting for their partner, by tracker
    pending: HashMap<usize, PendingHalf>,
    /// Trackers already resolved, so late duplicates are dropped
    completed: HashMap<usize, Instant>,
}

impl MovePairer {
    pub fn new(window: Duration, ignore: IgnoreFilter) -> Self {
        Self {
            window,
            ignore,
            pending: HashMap::new(),
            completed: HashMap::new(),
        }
    }

    /// Translate one backend event
    pub fn push(&mut self, event: Event, now: Instant) -> Vec<RawEvent> {
        if event.need_rescan() {
            warn!("Watch backend dropped events; some changes were not reported");
        }

        let window = self.window;
        self.completed
            .retain(|_, at| now.saturating_duration_since(*at) < window);

        let tracker = event.tracker();
        let paths = event.paths;
        match event.kind {
            EventKind::Create(_) => self.each(RawEventKind::Created, paths),
            EventKind::Remove(_) => self.each(RawEventKind::Deleted, paths),
            EventKind::Modify(ModifyKind::Name(mode)) => self.rename(mode, tracker, paths, now),
            EventKind::Modify(ModifyKind::Metadata(_)) => {
                self.each(RawEventKind::AttributeChanged, paths)
            }
            EventKind::Modify(_) => self.each(RawEventKind::Changed, paths),
            EventKind::Access(AccessKind::Close(AccessMode::Write)) => {
                self.each(RawEventKind::ChangesDoneHint, paths)
            }
            EventKind::Access(_) => Vec::new(),
            EventKind::Any | EventKind::Other => self.each(RawEventKind::Other, paths),
        }
    }

    /// Release halves whose partner did not arrive within the window
    ///
    /// Released halves come out oldest first.
    pub fn expire(&mut self, now: Instant) -> Vec<RawEvent> {
        let window = self.window;
        let stale: Vec<usize> = self
            .pending
            .iter()
            .filter(|(_, half)| now.saturating_duration_since(half.seen) >= window)
            .map(|(tracker, _)| *tracker)
            .collect();

        let mut halves: Vec<PendingHalf> = stale
            .into_iter()
            .filter_map(|tracker| self.pending.remove(&tracker))
            .collect();
        halves.sort_by_key(|half| half.seen);

        self.completed
            .retain(|_, at| now.saturating_duration_since(*at) < window);

        halves
            .into_iter()
            .map(|half| {
                trace!("Move half {:?} expired unpaired", half.path);
                unpaired(half.side, half.path)
            })
            .collect()
    }

    /// When the oldest pending half will expire
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending
            .values()
            .map(|half| half.seen + self.window)
            .min()
    }

    /// Number of halves waiting for a partner
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn each(&self, kind: RawEventKind, paths: Vec<PathBuf>) -> Vec<RawEvent> {
        paths
            .into_iter()
            .filter(|path| !self.ignore.should_ignore(path))
            .map(|path| RawEvent::new(kind, path))
            .collect()
    }

    fn rename(
        &mut self,
        mode: RenameMode,
        tracker: Option<usize>,
        paths: Vec<PathBuf>,
        now: Instant,
    ) -> Vec<RawEvent> {
        match mode {
            RenameMode::Both if paths.len() >= 2 => {
                if let Some(tracker) = tracker {
                    if self.completed.contains_key(&tracker) {
                        trace!("Dropping duplicate rename for tracker {tracker}");
                        return Vec::new();
                    }
                    self.pending.remove(&tracker);
                    self.completed.insert(tracker, now);
                }
                let mut paths = paths.into_iter();
                match (paths.next(), paths.next()) {
                    (Some(from), Some(to)) => self.resolve(from, to),
                    _ => Vec::new(),
                }
            }
            RenameMode::From => self.half(Side::From, tracker, paths, now),
            RenameMode::To => self.half(Side::To, tracker, paths, now),
            _ => paths
                .into_iter()
                .filter(|path| !self.ignore.should_ignore(path))
                .map(|path| {
                    let side = if std::fs::symlink_metadata(&path).is_ok() {
                        Side::To
                    } else {
                        Side::From
                    };
                    unpaired(side, path)
                })
                .collect(),
        }
    }

    fn half(
        &mut self,
        side: Side,
        tracker: Option<usize>,
        paths: Vec<PathBuf>,
        now: Instant,
    ) -> Vec<RawEvent> {
        let mut out = Vec::new();
        for path in paths {
            let Some(tracker) = tracker else {
                if !self.ignore.should_ignore(&path) {
                    out.push(unpaired(side, path));
                }
                continue;
            };

            if self.completed.contains_key(&tracker) {
                trace!("Dropping late move half {:?}", path);
                continue;
            }

            match self.pending.remove(&tracker) {
                Some(partner) if partner.side != side => {
                    self.completed.insert(tracker, now);
                    let (from, to) = match side {
                        Side::To => (partner.path, path),
                        Side::From => (path, partner.path),
                    };
                    out.extend(self.resolve(from, to));
                }
                Some(partner) if partner.path == path => {
                    trace!("Dropping repeated move half {:?}", path);
                    self.pending.insert(tracker, partner);
                }
                previous => {
                    if let Some(previous) = previous {
                        warn!("Two {:?} halves share tracker {tracker}", side);
                        if !self.ignore.should_ignore(&previous.path) {
                            out.push(unpaired(previous.side, previous.path));
                        }
                    }
                    self.pending.insert(
                        tracker,
                        PendingHalf {
                            side,
                            path,
                            seen: now,
                        },
                    );
                }
            }
        }
        out
    }

    fn resolve(&self, from: PathBuf, to: PathBuf) -> Vec<RawEvent> {
        let from_ignored = self.ignore.should_ignore(&from);
        let to_ignored = self.ignore.should_ignore(&to);

        match (from_ignored, to_ignored) {
            (_, true) => Vec::new(),
            (true, false) => vec![RawEvent::changed(to)],
            (false, false) if from.parent() == to.parent() => vec![RawEvent::renamed(from, to)],
            (false, false) => vec![
                RawEvent::moved_out(from.clone(), Some(to.clone())),
                RawEvent::moved_in(Some(from), to),
            ],
        }
    }
}

fn unpaired(side: Side, path: PathBuf) -> RawEvent {
    match side {
        Side::From => RawEvent::moved_out(path, None),
        Side::To => RawEvent::moved_in(None, path),
    }
}
