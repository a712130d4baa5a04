//! Workspace-relative path resolution.
//!
//! Paths are normalized lexically: `.` segments are dropped, `..` pops the
//! previous segment and trailing separators disappear. Case is preserved;
//! case folding is the matcher's concern.

use camino::Utf8Component;
use camino::Utf8Path;
use camino::Utf8PathBuf;
use perc_conf::PROJECT_FILES;

/// Lexically normalize `path` without touching the filesystem.
#[must_use]
pub fn normalize(path: &Utf8Path) -> Utf8PathBuf {
    let mut normalized = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::Prefix(_) | Utf8Component::RootDir | Utf8Component::Normal(_) => {
                normalized.push(component);
            }
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                // Never pop past the root.
                if matches!(
                    normalized.components().next_back(),
                    Some(Utf8Component::Normal(_))
                ) {
                    normalized.pop();
                }
            }
        }
    }
    normalized
}

/// Path of `path` relative to `root`, or `None` when it lies outside.
///
/// Containment is decided per component, so `/ws2/a.coffee` is not inside
/// `/ws`. The root itself resolves to an empty relative path.
#[must_use]
pub fn to_relative_path(root: &Utf8Path, path: &Utf8Path) -> Option<Utf8PathBuf> {
    let root = normalize(root);
    let path = normalize(path);
    path.strip_prefix(&root).ok().map(Utf8Path::to_path_buf)
}

/// Inverse of [`to_relative_path`].
#[must_use]
pub fn to_full_path(root: &Utf8Path, relative: &Utf8Path) -> Utf8PathBuf {
    normalize(&root.join(relative))
}

/// Relative path rendered with `/` separators on every platform.
#[must_use]
pub fn to_slash(relative: &Utf8Path) -> String {
    relative
        .components()
        .map(|component| component.as_str())
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether `path` names a project configuration file.
#[must_use]
pub fn is_project_file(path: &Utf8Path) -> bool {
    path.file_name()
        .is_some_and(|name| PROJECT_FILES.contains(&name))
}
