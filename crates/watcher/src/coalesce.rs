//! Write coalescing
//!
//! A single save usually reaches the backend as a burst of content writes.
//! [`ChangeCoalescer`] lets the first write of a burst through and swallows
//! the rest until the path has been quiet for the coalescing window.

use crate::events::{Operation, RawEvent};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::trace;

/// Merges rapid content writes to one path
#[derive(Debug)]
pub struct ChangeCoalescer {
    window: Duration,
    /// Last write seen per path
    recent: HashMap<PathBuf, Instant>,
}

impl ChangeCoalescer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            recent: HashMap::new(),
        }
    }

    /// Whether `event` should be handed on
    ///
    /// Every event other than a write is let through. Creation, deletion and
    /// moves also end the current burst for the paths they name.
    pub fn admit(&mut self, event: &RawEvent, now: Instant) -> bool {
        match event.kind.operation() {
            Some(Operation::Changed) => {}
            Some(_) => {
                self.forget(&event.path);
                if let Some(other) = &event.other {
                    self.forget(other);
                }
                return true;
            }
            None => return true,
        }

        if let Some(last) = self.recent.get_mut(&event.path) {
            if now.saturating_duration_since(*last) < self.window {
                trace!("Coalescing write to {:?}", event.path);
                *last = now;
                return false;
            }
        }

        self.cleanup(now);
        self.recent.insert(event.path.clone(), now);
        true
    }

    /// Number of paths inside a burst
    pub fn len(&self) -> usize {
        self.recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }

    fn forget(&mut self, path: &Path) {
        self.recent.remove(path);
    }

    fn cleanup(&mut self, now: Instant) {
        let window = self.window;
        self.recent
            .retain(|_, last| now.saturating_duration_since(*last) < window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RawEventKind;

    const WINDOW: Duration = Duration::from_millis(500);

    #[test]
    fn test_burst_reported_once() {
        let mut coalescer = ChangeCoalescer::new(WINDOW);
        let start = Instant::now();
        let write = RawEvent::changed("/w/log.txt");

        let closed = RawEvent::new(RawEventKind::ChangesDoneHint, "/w/log.txt");
        let admitted = (0..10u64)
            .filter(|i| {
                let at = start + Duration::from_millis(20 * *i);
                let admitted = coalescer.admit(&write, at);
                assert!(coalescer.admit(&closed, at));
                admitted
            })
            .count();

        assert_eq!(admitted, 1);
        assert_eq!(coalescer.len(), 1);
    }

    #[test]
    fn test_quiet_path_reported_again() {
        let mut coalescer = ChangeCoalescer::new(WINDOW);
        let start = Instant::now();
        let write = RawEvent::changed("/w/log.txt");

        assert!(coalescer.admit(&write, start));
        assert!(!coalescer.admit(&write, start + Duration::from_millis(400)));
        // The window slides with each swallowed write
        assert!(!coalescer.admit(&write, start + Duration::from_millis(800)));
        assert!(coalescer.admit(&write, start + Duration::from_millis(1400)));
    }

    #[test]
    fn test_paths_are_independent() {
        let mut coalescer = ChangeCoalescer::new(WINDOW);
        let now = Instant::now();

        assert!(coalescer.admit(&RawEvent::changed("/w/a"), now));
        assert!(coalescer.admit(&RawEvent::changed("/w/b"), now));
        assert!(!coalescer.admit(&RawEvent::changed("/w/a"), now));
    }

    #[test]
    fn test_other_events_end_the_burst() {
        let mut coalescer = ChangeCoalescer::new(WINDOW);
        let now = Instant::now();

        assert!(coalescer.admit(&RawEvent::changed("/w/a"), now));
        assert!(coalescer.admit(&RawEvent::renamed("/w/b", "/w/a"), now));
        assert!(coalescer.is_empty());
        assert!(coalescer.admit(&RawEvent::changed("/w/a"), now));

        assert!(coalescer.admit(&RawEvent::deleted("/w/a"), now));
        assert!(coalescer.is_empty());
    }

    #[test]
    fn test_zero_window_reports_every_write() {
        let mut coalescer = ChangeCoalescer::new(Duration::ZERO);
        let now = Instant::now();
        let write = RawEvent::changed("/w/a");

        assert!(coalescer.admit(&write, now));
        assert!(coalescer.admit(&write, now));
    }
}
