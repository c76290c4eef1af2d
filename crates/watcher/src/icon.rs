//! Icon resolution for tracked entries
//!
//! An application descriptor's declared icon is preferred over the generic
//! icon for the entry's type. Resolution is best effort and never fails.

use crate::events::EntryKind;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Largest file read when checking for an application descriptor
const MAX_DESCRIPTOR_SIZE: u64 = 64 * 1024;

const DESKTOP_ENTRY_GROUP: &str = "Desktop Entry";

/// Icon attached to a tracked entry
///
/// Owned by exactly one entry; dropped with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Icon {
    /// Name looked up in the desktop icon theme
    Named(String),
    /// Image file used directly
    File(PathBuf),
}

impl Icon {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// String form accepted as an icon hint by notification servers
    pub fn hint(&self) -> String {
        match self {
            Self::Named(name) => name.clone(),
            Self::File(path) => path.display().to_string(),
        }
    }
}

/// Resolves a representative icon for a path
pub trait IconResolver: Send + Sync {
    /// Resolve an icon for `path`, whose type has already been queried as `kind`
    fn resolve(&self, path: &Path, kind: EntryKind) -> Option<Icon>;
}

/// Resolver that never yields an icon, for outputs that cannot show one
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIconResolver;

impl IconResolver for NoIconResolver {
    fn resolve(&self, _path: &Path, _kind: EntryKind) -> Option<Icon> {
        None
    }
}

/// Resolver following freedesktop conventions
///
/// Application `.desktop` descriptors contribute their declared `Icon=`;
/// everything else gets the generic theme icon for its type.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopIconResolver;

impl DesktopIconResolver {
    pub fn new() -> Self {
        Self
    }

    fn application_icon(path: &Path) -> Option<Icon> {
        let metadata = std::fs::metadata(path).ok()?;
        if !metadata.is_file() || metadata.len() > MAX_DESCRIPTOR_SIZE {
            return None;
        }
        let content = std::fs::read_to_string(path).ok()?;
        let entry = DesktopEntry::parse(&content)?;
        if entry.entry_type.as_deref() != Some("Application") {
            return None;
        }
        entry.icon.map(|value| desktop_icon_value(&value))
    }

    fn intrinsic_icon(path: &Path, kind: EntryKind) -> Option<Icon> {
        match kind {
            EntryKind::Directory => Some(Icon::named("folder")),
            EntryKind::SymbolicLink => Some(Icon::named("inode-symlink")),
            EntryKind::RegularFile => Some(regular_file_icon(path)),
            EntryKind::Other => None,
        }
    }
}

impl IconResolver for DesktopIconResolver {
    fn resolve(&self, path: &Path, kind: EntryKind) -> Option<Icon> {
        if kind == EntryKind::RegularFile {
            if let Some(icon) = Self::application_icon(path) {
                trace!("Using application icon {:?} for {:?}", icon, path);
                return Some(icon);
            }
        }
        Self::intrinsic_icon(path, kind)
    }
}

/// Convert a descriptor `Icon=` value: absolute paths are image files, the
/// rest are theme names with any image extension dropped
fn desktop_icon_value(value: &str) -> Icon {
    let path = Path::new(value);
    if path.is_absolute() {
        return Icon::File(path.to_path_buf());
    }
    let name = [".png", ".svg", ".xpm"]
        .iter()
        .find_map(|ext| value.strip_suffix(ext))
        .unwrap_or(value);
    Icon::named(name)
}

fn regular_file_icon(path: &Path) -> Icon {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase());

    let name = match extension.as_deref() {
        Some("png" | "jpg" | "jpeg" | "gif" | "bmp" | "webp" | "svg" | "tif" | "tiff" | "ico") => {
            return Icon::File(path.to_path_buf());
        }
        Some("mp3" | "flac" | "ogg" | "oga" | "wav" | "m4a" | "opus" | "aac") => "audio-x-generic",
        Some("mp4" | "mkv" | "webm" | "avi" | "mov" | "wmv" | "ogv") => "video-x-generic",
        Some("zip" | "tar" | "gz" | "tgz" | "bz2" | "xz" | "zst" | "7z" | "rar") => {
            "package-x-generic"
        }
        Some("pdf" | "doc" | "docx" | "odt" | "rtf") => "x-office-document",
        Some("xls" | "xlsx" | "ods" | "csv") => "x-office-spreadsheet",
        Some("ppt" | "pptx" | "odp") => "x-office-presentation",
        Some("html" | "htm" | "xhtml") => "text-html",
        Some("sh" | "bash" | "py" | "rb" | "pl") => "text-x-script",
        _ if is_executable(path) => "application-x-executable",
        _ => "text-x-generic",
    };
    Icon::named(name)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("exe"))
        .unwrap_or(false)
}

/// The parts of a freedesktop key file's `[Desktop Entry]` group we care about
#[derive(Debug, Default, PartialEq, Eq)]
struct DesktopEntry {
    entry_type: Option<String>,
    icon: Option<String>,
}

impl DesktopEntry {
    /// Parse key file content; `None` if it is not a key file with a desktop entry group
    fn parse(content: &str) -> Option<Self> {
        let mut entry = DesktopEntry::default();
        let mut group: Option<&str> = None;
        let mut seen_entry_group = false;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                seen_entry_group |= name == DESKTOP_ENTRY_GROUP;
                group = Some(name);
                continue;
            }

            // Key/value pairs outside any group, or lines without '=', are malformed
            let (key, value) = line.split_once('=')?;
            if group? != DESKTOP_ENTRY_GROUP {
                continue;
            }

            let value = value.trim();
            match key.trim() {
                "Type" => entry.entry_type = Some(value.to_string()),
                "Icon" if !value.is_empty() => entry.icon = Some(value.to_string()),
                _ => {}
            }
        }

        seen_entry_group.then_some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const FIREFOX_DESKTOP: &str = "\
# Shipped by the distribution
[Desktop Entry]
Version=1.0
Type=Application
Name=Firefox
Icon=firefox
Icon[de]=firefox-de
Exec=firefox %u

[Desktop Action new-window]
Name=New Window
Icon=window-new
";

    #[test]
    fn test_parse_desktop_entry() {
        let entry = DesktopEntry::parse(FIREFOX_DESKTOP).expect("valid key file");
        assert_eq!(
            entry,
            DesktopEntry {
                entry_type: Some("Application".to_string()),
                icon: Some("firefox".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_rejects_non_key_files() {
        assert_eq!(DesktopEntry::parse("fn main() {}\n"), None);
        assert_eq!(DesktopEntry::parse("Icon=orphan\n[Desktop Entry]\n"), None);
        assert_eq!(DesktopEntry::parse("[Other Group]\nIcon=x\n"), None);
    }

    #[test]
    fn test_desktop_icon_value() {
        assert_eq!(desktop_icon_value("firefox"), Icon::named("firefox"));
        assert_eq!(desktop_icon_value("gimp.png"), Icon::named("gimp"));
        assert_eq!(
            desktop_icon_value("/opt/app/icon.png"),
            Icon::File(PathBuf::from("/opt/app/icon.png"))
        );
    }

    #[test]
    fn test_application_icon_preferred() {
        let dir = TempDir::new().expect("test setup failed");
        let path = dir.path().join("firefox.desktop");
        std::fs::write(&path, FIREFOX_DESKTOP).expect("test setup failed");

        let icon = DesktopIconResolver::new().resolve(&path, EntryKind::RegularFile);
        assert_eq!(icon, Some(Icon::named("firefox")));
    }

    #[test]
    fn test_link_descriptor_falls_back() {
        let dir = TempDir::new().expect("test setup failed");
        let path = dir.path().join("site.desktop");
        std::fs::write(&path, "[Desktop Entry]\nType=Link\nIcon=web-browser\n")
            .expect("test setup failed");

        let icon = DesktopIconResolver::new().resolve(&path, EntryKind::RegularFile);
        assert_eq!(icon, Some(Icon::named("text-x-generic")));
    }

    #[test]
    fn test_intrinsic_icons() {
        let dir = TempDir::new().expect("test setup failed");
        let resolver = DesktopIconResolver::new();

        let text = dir.path().join("notes.txt");
        std::fs::write(&text, "hello").expect("test setup failed");
        let song = dir.path().join("song.MP3");
        std::fs::write(&song, [0u8; 4]).expect("test setup failed");
        let photo = dir.path().join("photo.png");
        std::fs::write(&photo, [0u8; 4]).expect("test setup failed");

        assert_eq!(
            resolver.resolve(dir.path(), EntryKind::Directory),
            Some(Icon::named("folder"))
        );
        assert_eq!(
            resolver.resolve(&text, EntryKind::RegularFile),
            Some(Icon::named("text-x-generic"))
        );
        assert_eq!(
            resolver.resolve(&song, EntryKind::RegularFile),
            Some(Icon::named("audio-x-generic"))
        );
        assert_eq!(
            resolver.resolve(&photo, EntryKind::RegularFile),
            Some(Icon::File(photo.clone()))
        );
        assert_eq!(resolver.resolve(&dir.path().join("gone"), EntryKind::Other), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_executable_icon() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().expect("test setup failed");
        let tool = dir.path().join("tool");
        std::fs::write(&tool, [0x7f, b'E', b'L', b'F']).expect("test setup failed");
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755))
            .expect("test setup failed");

        assert_eq!(
            DesktopIconResolver::new().resolve(&tool, EntryKind::RegularFile),
            Some(Icon::named("application-x-executable"))
        );
    }

    #[test]
    fn test_oversized_file_not_parsed() {
        let dir = TempDir::new().expect("test setup failed");
        let path = dir.path().join("huge.desktop");
        let mut content = String::from("[Desktop Entry]\nType=Application\nIcon=huge\n");
        content.push_str(&"# padding\n".repeat(8 * 1024));
        std::fs::write(&path, content).expect("test setup failed");

        assert_eq!(
            DesktopIconResolver::new().resolve(&path, EntryKind::RegularFile),
            Some(Icon::named("text-x-generic"))
        );
    }

    #[test]
    fn test_no_icon_resolver() {
        assert_eq!(
            NoIconResolver.resolve(Path::new("/"), EntryKind::Directory),
            None
        );
    }

    #[test]
    fn test_icon_hint() {
        assert_eq!(Icon::named("folder").hint(), "folder");
        assert_eq!(Icon::File(PathBuf::from("/a/b.png")).hint(), "/a/b.png");
    }
}
