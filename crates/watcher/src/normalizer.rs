//! Event normalization
//!
//! Reduces one raw event plus the current registry state to at most one
//! normalized event, keeping the registry in step with what the event says
//! happened.

use crate::events::{NormalizedEvent, Operation, RawEvent, RawEventKind};
use crate::paths::{base_name, identity, PathDisplay};
use crate::registry::Registry;
use crate::sink::PresentationSink;
use filemon_core::config::WatchConfig;
use filemon_core::error::{Error, Result};
use std::path::Path;
use tracing::{debug, error, trace};

/// Which operations the user asked to hear about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterestFilter {
    pub writes: bool,
    pub moves: bool,
    pub creation: bool,
    pub deletion: bool,
}

impl InterestFilter {
    /// Interested in everything
    pub fn all() -> Self {
        Self {
            writes: true,
            moves: true,
            creation: true,
            deletion: true,
        }
    }

    pub fn from_config(config: &WatchConfig) -> Self {
        Self {
            writes: config.writes,
            moves: config.moves,
            creation: config.creation,
            deletion: config.deletion,
        }
    }

    /// Whether events of `operation` should be reported
    pub fn accepts(&self, operation: Operation) -> bool {
        match operation {
            Operation::Changed => self.writes,
            Operation::Moved | Operation::Renamed => self.moves,
            Operation::Created => self.creation,
            Operation::Deleted => self.deletion,
        }
    }
}

/// Turns raw events into normalized events
#[derive(Debug, Clone)]
pub struct EventNormalizer {
    interest: InterestFilter,
    display: PathDisplay,
}

impl EventNormalizer {
    pub fn new(interest: InterestFilter, display: PathDisplay) -> Self {
        Self { interest, display }
    }

    pub fn interest(&self) -> InterestFilter {
        self.interest
    }

    /// Handle one raw event
    ///
    /// Returns the reported operation, or `None` when the event was filtered
    /// out. Fails with [`Error::Divergence`] when the event's subject is
    /// neither tracked nor present on disk; any presentation error is
    /// returned after the registry has been updated.
    pub fn handle(
        &self,
        registry: &mut Registry,
        raw: &RawEvent,
        sink: &mut dyn PresentationSink,
    ) -> Result<Option<Operation>> {
        let Some(operation) = raw.kind.operation() else {
            trace!("Ignoring {:?} on {:?}", raw.kind, raw.path);
            return Ok(None);
        };
        if !self.interest.accepts(operation) {
            trace!("Not reporting {} on {:?}", operation, raw.path);
            return Ok(None);
        }

        let checked = raw.subject();
        if registry.lookup(checked).is_none() {
            if std::fs::symlink_metadata(checked).is_err() {
                error!(
                    "{:?} event for {:?}, which is neither tracked nor present",
                    raw.kind, checked
                );
                return Err(Error::divergence(identity(checked)));
            }
            registry.insert(checked);
        }

        if operation == Operation::Changed {
            registry.refresh(checked);
        }

        let counterpart = match (operation, &raw.other) {
            (Operation::Moved, Some(other)) => Some(self.display.display(other)),
            (Operation::Renamed, Some(other)) => Some(base_name(other)),
            _ => None,
        };

        let presented = {
            let entry = registry
                .lookup(checked)
                .ok_or_else(|| Error::divergence(identity(checked)))?;
            let event = NormalizedEvent {
                kind: entry.kind(),
                operation,
                subject: self.display.display(&raw.path),
                counterpart,
                target: entry.identity(),
                icon: entry.icon(),
            };
            debug!("{event}");
            sink.present(&event)
        };

        Self::evict(registry, raw, checked);
        presented.map(|()| Some(operation))
    }

    /// Forget identities the event says no longer exist here
    fn evict(registry: &mut Registry, raw: &RawEvent, checked: &Path) {
        match raw.kind {
            RawEventKind::Deleted => {
                registry.remove(checked);
            }
            RawEventKind::MovedOut => {
                registry.remove(&raw.path);
                registry.remove(checked);
            }
            RawEventKind::Renamed if identity(&raw.path) != identity(checked) => {
                registry.remove(&raw.path);
            }
            _ => {}
        }
    }
}
