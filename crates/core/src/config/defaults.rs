//! Default values and functions for configuration

// Default constants
pub(crate) const DEFAULT_APP_NAME: &str = "filemon";
pub(crate) const DEFAULT_MOVE_PAIR_WINDOW_MS: u64 = 100;
pub(crate) const DEFAULT_CHANGE_COALESCE_MS: u64 = 500;
pub(crate) const DEFAULT_MAX_QUEUE_SIZE: usize = 10_000;

pub(crate) fn default_move_pair_window_ms() -> u64 {
    DEFAULT_MOVE_PAIR_WINDOW_MS
}

pub(crate) fn default_change_coalesce_ms() -> u64 {
    DEFAULT_CHANGE_COALESCE_MS
}

pub(crate) fn default_max_queue_size() -> usize {
    DEFAULT_MAX_QUEUE_SIZE
}

pub(crate) fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_string()
}

/// Editor scratch files that appear and vanish faster than they can be inspected
pub(crate) fn default_ignore_patterns() -> Vec<String> {
    vec![
        "*.swp".to_string(),   // Vim swap files (non-hidden)
        ".*.sw?".to_string(),  // Vim swap files: .file.swp, .file.swo, .file.swn
        ".*.swx".to_string(),  // Extended Vim swap files
        "4913".to_string(),    // Vim write probe
        "*~".to_string(),      // Backup files (Vim, Emacs, etc.)
        "#*#".to_string(),     // Emacs auto-save files
        ".#*".to_string(),     // Emacs lock files
        "*.tmp.*".to_string(), // VS Code temp files: file.rs.tmp.12345.67890
    ]
}
