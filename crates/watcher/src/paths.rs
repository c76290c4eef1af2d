//! Path identity and display helpers
//!
//! Identity comparison always uses the canonical form produced by
//! [`identity`]; the `~` abbreviation is display-only.

use std::path::{Component, Path, PathBuf};

/// Canonical identity of `path`
///
/// The path is made absolute against the current directory and normalised
/// lexically: repeated separators, `.` and `..` are collapsed. The filesystem
/// is not consulted, so paths that no longer exist still have an identity and
/// symbolic links are not resolved.
pub fn identity(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let at_relative_start = matches!(
                    normalized.components().next_back(),
                    None | Some(Component::ParentDir)
                );
                if at_relative_start && !normalized.has_root() {
                    normalized.push("..");
                } else {
                    // Popping the root is a no-op, "/.." stays "/"
                    normalized.pop();
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Final component of `path`, or the whole path when it has none
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Formats paths for people, abbreviating the home directory to `~`
#[derive(Debug, Clone, Default)]
pub struct PathDisplay {
    home: Option<PathBuf>,
}

impl PathDisplay {
    /// Use `home` as the directory to abbreviate; the filesystem root is never abbreviated
    pub fn new(home: Option<PathBuf>) -> Self {
        let home = home
            .map(|h| identity(&h))
            .filter(|h| h.parent().is_some());
        Self { home }
    }

    /// Abbreviate the current user's home directory
    pub fn from_env() -> Self {
        Self::new(dirs::home_dir())
    }

    /// Display form of `path`
    pub fn display(&self, path: &Path) -> String {
        let path = identity(path);
        if let Some(home) = &self.home {
            if let Ok(rest) = path.strip_prefix(home) {
                if rest.as_os_str().is_empty() {
                    return "~".to_string();
                }
                return format!("~/{}", rest.display());
            }
        }
        path.display().to_string()
    }
}
