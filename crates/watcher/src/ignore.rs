//! Ignore pattern matching
//!
//! Patterns without a `/` are matched against the file name, so `*.swp`
//! catches editor swap files in every watched directory. Patterns containing
//! a `/` are matched against the whole path.

use glob::{Pattern, PatternError};
use std::path::Path;
use std::sync::Arc;
use tracing::trace;

/// Drops events for scratch files nobody wants to hear about
///
/// By default, ignores nothing.
#[derive(Debug, Clone, Default)]
pub struct IgnoreFilter {
    /// Matched against the file name
    name_patterns: Arc<Vec<Pattern>>,
    /// Matched against the full path
    path_patterns: Arc<Vec<Pattern>>,
}

impl IgnoreFilter {
    /// Create a filter that ignores nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filter from glob patterns
    pub fn from_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self, PatternError> {
        let mut name_patterns = Vec::new();
        let mut path_patterns = Vec::new();

        for raw in patterns {
            let raw = raw.as_ref();
            let pattern = Pattern::new(raw)?;
            if raw.contains('/') {
                path_patterns.push(pattern);
            } else {
                name_patterns.push(pattern);
            }
        }

        Ok(Self {
            name_patterns: Arc::new(name_patterns),
            path_patterns: Arc::new(path_patterns),
        })
    }

    /// Check if events for `path` should be dropped
    pub fn should_ignore(&self, path: &Path) -> bool {
        if let Some(name) = path.file_name() {
            let name = name.to_string_lossy();
            if self.name_patterns.iter().any(|p| p.matches(&name)) {
                trace!("Ignoring {:?} by name", path);
                return true;
            }
        }

        if !self.path_patterns.is_empty() {
            let full = path.to_string_lossy();
            if self.path_patterns.iter().any(|p| p.matches(&full)) {
                trace!("Ignoring {:?} by path", path);
                return true;
            }
        }

        false
    }

    /// Number of patterns held
    pub fn len(&self) -> usize {
        self.name_patterns.len() + self.path_patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filemon_core::config::WatchConfig;

    #[test]
    fn test_empty_filter_ignores_nothing() {
        let filter = IgnoreFilter::new();
        assert!(filter.is_empty());
        assert!(!filter.should_ignore(Path::new("/w/.notes.swp")));
    }

    #[test]
    fn test_name_patterns_match_any_directory() {
        let filter = IgnoreFilter::from_patterns(&["*.swp", ".#*"]).expect("test setup failed");

        assert!(filter.should_ignore(Path::new("/home/u/docs/.report.md.swp")));
        assert!(filter.should_ignore(Path::new("/tmp/.#draft.org")));
        assert!(!filter.should_ignore(Path::new("/home/u/docs/report.md")));
    }

    #[test]
    fn test_path_patterns_match_full_path() {
        let filter = IgnoreFilter::from_patterns(&["/srv/cache/*"]).expect("test setup failed");

        assert!(filter.should_ignore(Path::new("/srv/cache/blob")));
        assert!(!filter.should_ignore(Path::new("/srv/data/blob")));
    }

    #[test]
    fn test_default_patterns_cover_editor_scratch_files() {
        let filter = IgnoreFilter::from_patterns(&WatchConfig::default().ignore_patterns)
            .expect("defaults compile");

        assert!(filter.should_ignore(Path::new("/w/.main.rs.swp")));
        assert!(filter.should_ignore(Path::new("/w/notes.txt~")));
        assert!(filter.should_ignore(Path::new("/w/4913")));
        assert!(!filter.should_ignore(Path::new("/w/notes.txt")));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        assert!(IgnoreFilter::from_patterns(&["[unclosed"]).is_err());
    }
}
