//! Dispatch loop
//!
//! [`FileMonitor`] owns every watch source, the registry and the move pairer.
//! Backend events arrive over one bounded channel and are handled one at a
//! time, in order, on the task that runs [`FileMonitor::run`].

use crate::coalesce::ChangeCoalescer;
use crate::events::RawEvent;
use crate::icon::IconResolver;
use crate::ignore::IgnoreFilter;
use crate::normalizer::{EventNormalizer, InterestFilter};
use crate::pairing::MovePairer;
use crate::paths::{identity, PathDisplay};
use crate::registry::Registry;
use crate::sink::PresentationSink;
use crate::source::WatchSource;
use filemon_core::config::WatchConfig;
use filemon_core::error::{Error, Result};
use notify::Event as NotifyEvent;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

enum Step {
    Stop,
    Event(NotifyEvent),
    Expire,
}

/// Watches a set of targets and reports what happens to their entries
pub struct FileMonitor {
    registry: Registry,
    normalizer: EventNormalizer,
    pairer: MovePairer,
    coalescer: ChangeCoalescer,
    sources: Vec<WatchSource>,
    tx: mpsc::Sender<NotifyEvent>,
    rx: mpsc::Receiver<NotifyEvent>,
}

impl std::fmt::Debug for FileMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileMonitor")
            .field("registry", &self.registry)
            .field("sources", &self.sources)
            .finish_non_exhaustive()
    }
}

impl FileMonitor {
    /// Create a monitor with no targets
    pub fn new(config: &WatchConfig, resolver: impl IconResolver + 'static) -> Result<Self> {
        let ignore = IgnoreFilter::from_patterns(&config.ignore_patterns)
            .map_err(|e| Error::config(format!("Failed to create ignore filter: {e}")))?;
        let (tx, rx) = mpsc::channel(config.max_queue_size.max(1));

        Ok(Self {
            registry: Registry::new(resolver),
            normalizer: EventNormalizer::new(
                InterestFilter::from_config(config),
                PathDisplay::from_env(),
            ),
            pairer: MovePairer::new(config.move_pair_window(), ignore),
            coalescer: ChangeCoalescer::new(config.change_coalesce_window()),
            sources: Vec::new(),
            tx,
            rx,
        })
    }

    /// Replace how paths are displayed
    pub fn with_display(mut self, display: PathDisplay) -> Self {
        self.normalizer = EventNormalizer::new(self.normalizer.interest(), display);
        self
    }

    /// Start watching `path`
    ///
    /// The target and, for a directory, each of its current children are
    /// registered first so that later events about them resolve. Adding a
    /// target that an existing source already reports on is a no-op; adding
    /// a directory replaces the sources of files directly inside it.
    pub fn add_target(&mut self, path: &Path) -> Result<()> {
        let target = identity(path);
        if self.sources.iter().any(|s| s.covers(&target)) {
            debug!("Already watching {:?}", target);
            return Ok(());
        }

        let added = self.preregister(&target);
        let source = match WatchSource::subscribe(&target, self.tx.clone()) {
            Ok(source) => source,
            Err(e) => {
                for path in &added {
                    self.registry.remove(path);
                }
                return Err(e);
            }
        };

        if source.is_directory() {
            self.sources.retain(|s| {
                let covered = source.covers(s.path());
                if covered {
                    debug!("{:?} now reported through {:?}", s.path(), source.path());
                }
                !covered
            });
        }
        self.sources.push(source);
        Ok(())
    }

    /// Registers the target and its children, returning the identities that were new
    fn preregister(&mut self, target: &Path) -> Vec<PathBuf> {
        let mut added = Vec::new();
        let metadata = match std::fs::symlink_metadata(target) {
            Ok(metadata) => metadata,
            Err(e) => {
                debug!("Not pre-registering {:?}: {e}", target);
                return added;
            }
        };
        self.track(target, &mut added);
        if !metadata.is_dir() {
            return added;
        }

        let entries = match std::fs::read_dir(target) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to enumerate {:?}: {e}", target);
                return added;
            }
        };
        for entry in entries {
            match entry {
                Ok(entry) => self.track(&entry.path(), &mut added),
                Err(e) => warn!("Failed to read entry in {:?}: {e}", target),
            }
        }
        debug!(
            "Pre-registered {:?}, {} entries tracked",
            target,
            self.registry.len()
        );
        added
    }

    fn track(&mut self, path: &Path, added: &mut Vec<PathBuf>) {
        if !self.registry.contains(path) {
            added.push(self.registry.insert(path).identity().to_path_buf());
        }
    }

    /// Targets currently watched
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        self.sources.iter().map(|s| s.path().to_path_buf()).collect()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Pull events until `cancel` fires
    ///
    /// Bursts of writes to one path are reported once. Presentation failures
    /// are logged and the loop continues; a divergence fault ends the loop
    /// with the error.
    pub async fn run(
        &mut self,
        sink: &mut dyn PresentationSink,
        cancel: CancellationToken,
    ) -> Result<()> {
        info!("Monitoring {} target(s)", self.sources.len());

        loop {
            let deadline = self
                .pairer
                .next_deadline()
                .map(tokio::time::Instant::from_std);

            let step = tokio::select! {
                biased;
                _ = cancel.cancelled() => Step::Stop,
                event = self.rx.recv() => match event {
                    Some(event) => Step::Event(event),
                    None => Step::Stop,
                },
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(tokio::time::Instant::now)),
                    if deadline.is_some() => Step::Expire,
            };

            let now = Instant::now();
            let mut raw = match step {
                Step::Stop => break,
                Step::Event(event) => self.pairer.push(event, now),
                Step::Expire => self.pairer.expire(now),
            };
            raw.retain(|event| self.coalescer.admit(event, now));
            self.dispatch(&raw, sink)?;
        }

        debug!("Dispatch loop stopped");
        Ok(())
    }

    fn dispatch(&mut self, raw: &[RawEvent], sink: &mut dyn PresentationSink) -> Result<()> {
        for event in raw {
            match self.normalizer.handle(&mut self.registry, event, sink) {
                Ok(_) => {}
                Err(e) if e.is_fatal_fault() => return Err(e),
                Err(e) => warn!("Failed to report {:?} on {:?}: {e}", event.kind, event.path),
            }
        }
        Ok(())
    }

    /// Release every watcher and tracked entry
    pub fn stop(&mut self) {
        let released = self.sources.len();
        self.sources.clear();
        self.registry.clear();
        info!("Stopped watching {released} target(s)");
    }
}
