//! Tracked entry registry
//!
//! Insertion-ordered cache of the entries the engine has observed, keyed by
//! canonical identity. Membership is best-effort knowledge of the watched
//! paths, not ground truth.

use crate::events::EntryKind;
use crate::icon::{Icon, IconResolver, NoIconResolver};
use crate::paths::identity;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Cached metadata for one observed filesystem entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedEntry {
    identity: PathBuf,
    kind: EntryKind,
    icon: Option<Icon>,
}

impl TrackedEntry {
    /// Canonical path of the entry
    pub fn identity(&self) -> &Path {
        &self.identity
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn icon(&self) -> Option<&Icon> {
        self.icon.as_ref()
    }
}

/// Registry of tracked entries
///
/// Holds at most one entry per canonical identity. Lookups are linear; the
/// working set is one watched directory's immediate children.
pub struct Registry {
    entries: Vec<TrackedEntry>,
    resolver: Box<dyn IconResolver>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::without_icons()
    }
}

impl Registry {
    /// Create an empty registry resolving icons with `resolver`
    pub fn new(resolver: impl IconResolver + 'static) -> Self {
        Self {
            entries: Vec::new(),
            resolver: Box::new(resolver),
        }
    }

    /// Create an empty registry that never resolves icons
    pub fn without_icons() -> Self {
        Self::new(NoIconResolver)
    }

    fn position(&self, identity: &Path) -> Option<usize> {
        self.entries.iter().position(|e| e.identity == identity)
    }

    /// Find the entry for `path`
    pub fn lookup(&self, path: &Path) -> Option<&TrackedEntry> {
        let identity = identity(path);
        self.position(&identity).map(|i| &self.entries[i])
    }

    /// Whether `path` is tracked
    pub fn contains(&self, path: &Path) -> bool {
        self.lookup(path).is_some()
    }

    /// Track `path`, querying its type and icon
    ///
    /// Idempotent: when the identity is already tracked the existing entry is
    /// returned untouched.
    pub fn insert(&mut self, path: &Path) -> &TrackedEntry {
        let identity = identity(path);
        if let Some(i) = self.position(&identity) {
            return &self.entries[i];
        }

        let kind = EntryKind::query(&identity);
        let icon = self.resolver.resolve(&identity, kind);
        trace!("Tracking {:?} ({:?}, icon {:?})", identity, kind, icon);

        let index = self.entries.len();
        self.entries.push(TrackedEntry {
            identity,
            kind,
            icon,
        });
        &self.entries[index]
    }

    /// Re-query type and icon of the entry for `path`
    ///
    /// The old icon is released before the new one is resolved. Returns `None`
    /// when `path` is not tracked.
    pub fn refresh(&mut self, path: &Path) -> Option<&TrackedEntry> {
        let identity = identity(path);
        let i = self.position(&identity)?;

        let entry = &mut self.entries[i];
        entry.icon = None;
        entry.kind = EntryKind::query(&entry.identity);
        entry.icon = self.resolver.resolve(&entry.identity, entry.kind);
        trace!("Refreshed {:?} ({:?})", entry.identity, entry.kind);

        Some(&self.entries[i])
    }

    /// Stop tracking `path`, handing back the detached entry
    ///
    /// Removing an untracked path is a no-op.
    pub fn remove(&mut self, path: &Path) -> Option<TrackedEntry> {
        let identity = identity(path);
        let i = self.position(&identity)?;
        trace!("Untracking {:?}", identity);
        Some(self.entries.remove(i))
    }

    /// Number of tracked entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &TrackedEntry> {
        self.entries.iter()
    }

    /// Release every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icon::DesktopIconResolver;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Hands out a fresh icon name on every call
    struct CountingResolver(Arc<AtomicUsize>);

    impl IconResolver for CountingResolver {
        fn resolve(&self, _path: &Path, _kind: EntryKind) -> Option<Icon> {
            let n = self.0.fetch_add(1, Ordering::SeqCst);
            Some(Icon::Named(format!("icon-{n}")))
        }
    }

    fn setup() -> (TempDir, PathBuf) {
        let dir = TempDir::new().expect("test setup failed");
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "hello").expect("test setup failed");
        (dir, file)
    }

    #[test]
    fn test_lookup_unseen_path() {
        let registry = Registry::without_icons();
        assert!(registry.lookup(Path::new("/never/seen")).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_insert_then_lookup() {
        let (_dir, file) = setup();
        let mut registry = Registry::new(DesktopIconResolver::new());

        let entry = registry.insert(&file);
        assert_eq!(entry.identity(), file.as_path());
        assert_eq!(entry.kind(), EntryKind::RegularFile);
        assert_eq!(entry.icon(), Some(&Icon::named("text-x-generic")));

        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&file));
    }

    #[test]
    fn test_insert_is_idempotent() {
        let (dir, file) = setup();
        let mut registry = Registry::without_icons();

        registry.insert(&file);
        let spelled_differently = dir.path().join(".").join("sub").join("..").join("notes.txt");
        registry.insert(&spelled_differently);

        assert_eq!(registry.len(), 1);
        assert!(registry.lookup(&spelled_differently).is_some());
    }

    #[test]
    fn test_insert_missing_path_is_other() {
        let dir = TempDir::new().expect("test setup failed");
        let mut registry = Registry::new(DesktopIconResolver::new());

        let entry = registry.insert(&dir.path().join("vanished"));
        assert_eq!(entry.kind(), EntryKind::Other);
        assert_eq!(entry.icon(), None);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (dir, file) = setup();
        let mut registry = Registry::without_icons();
        registry.insert(&file);
        registry.insert(dir.path());

        let removed = registry.remove(&file).expect("entry was tracked");
        assert_eq!(removed.identity(), file.as_path());
        assert_eq!(registry.len(), 1);

        assert!(registry.remove(&file).is_none());
        assert!(registry.remove(Path::new("/never/seen")).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_refresh_rederives_metadata() {
        let (dir, file) = setup();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = Registry::new(CountingResolver(Arc::clone(&calls)));

        let before = registry.insert(&file).icon().cloned();
        let after = registry
            .refresh(&file)
            .expect("entry was tracked")
            .icon()
            .cloned();

        assert_ne!(before, after);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(registry.len(), 1);
        assert!(registry.refresh(&dir.path().join("untracked")).is_none());
    }

    #[test]
    fn test_refresh_picks_up_type_change() {
        let (_dir, file) = setup();
        let mut registry = Registry::without_icons();
        registry.insert(&file);

        std::fs::remove_file(&file).expect("test setup failed");
        std::fs::create_dir(&file).expect("test setup failed");

        let entry = registry.refresh(&file).expect("entry was tracked");
        assert_eq!(entry.kind(), EntryKind::Directory);
        assert_eq!(entry.identity(), file.as_path());
    }

    #[test]
    fn test_iter_preserves_insertion_order() {
        let dir = TempDir::new().expect("test setup failed");
        let mut registry = Registry::without_icons();
        for name in ["c", "a", "b"] {
            registry.insert(&dir.path().join(name));
        }

        let names: Vec<_> = registry
            .iter()
            .map(|e| crate::paths::base_name(e.identity()))
            .collect();
        assert_eq!(names, vec!["c", "a", "b"]);

        registry.clear();
        assert!(registry.is_empty());
    }
}
