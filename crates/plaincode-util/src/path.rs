//! Path utilities.
//!
//! Tracked paths are stored relative to the project root with `/` as the only
//! separator, so a state file written on one platform reads the same on
//! another. This module converts native paths into that form.

use std::path::{Component, Path, PathBuf};

/// Make a path relative to a base directory.
///
/// Returns `None` if the path is not within the base directory.
pub fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    path.strip_prefix(base).ok().map(|p| p.to_path_buf())
}

/// Render a relative path with `/` separators.
///
/// Returns `None` for absolute paths, paths that climb out with `..`,
/// paths that are not valid UTF-8, and the empty path.
pub fn to_slash(relative: &Path) -> Option<String> {
    let mut parts = Vec::new();

    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Check that a string is a canonical project-relative path.
///
/// Canonical paths are non-empty, never start with `/`, contain no `\`, and
/// have no empty, `.` or `..` segments.
pub fn is_canonical(relative: &str) -> bool {
    !relative.is_empty()
        && !relative.contains('\\')
        && relative
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}
