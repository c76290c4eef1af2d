use std::path::PathBuf;
use thiserror::Error;

/// Result type for filemon operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for filemon operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File watching errors
    #[error("Watcher error: {0}")]
    Watcher(String),

    /// Presentation subsystem errors (notification daemon, output stream)
    #[error("Presentation error: {0}")]
    Presentation(String),

    /// A raw event referenced a path that is neither tracked nor present on disk.
    ///
    /// The watch source and the filesystem have diverged; this is never
    /// recovered from.
    #[error("Watch source diverged from filesystem: {} is neither tracked nor present", path.display())]
    Divergence { path: PathBuf },
}

impl Error {
    /// Creates a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a watcher error
    pub fn watcher(msg: impl Into<String>) -> Self {
        Self::Watcher(msg.into())
    }

    /// Creates a presentation error
    pub fn presentation(msg: impl Into<String>) -> Self {
        Self::Presentation(msg.into())
    }

    /// Creates a divergence fault for `path`
    pub fn divergence(path: impl Into<PathBuf>) -> Self {
        Self::Divergence { path: path.into() }
    }

    /// Whether this error is an internal-consistency fault rather than routine failure
    pub fn is_fatal_fault(&self) -> bool {
        matches!(self, Self::Divergence { .. })
    }
}
