//! Path resolution for the fixture layout.

use std::path::{Component, Path, PathBuf};

/// Resolve `path` against `root` when it is relative, then collapse `.` and
/// `..` components syntactically.
///
/// The filesystem is never consulted, so paths that do not exist yet (the
/// results directory on a first run) resolve the same way as existing ones.
/// A root of `.` is preserved so a default layout keeps printing
/// `./cachesim`-style relative paths.
#[must_use]
pub fn resolve_under(root: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    let keep_leading_dot = joined.starts_with(".") && !path.is_absolute();
    let normalized = normalize_syntactic(&joined);
    if keep_leading_dot && normalized.is_relative() {
        Path::new(".").join(normalized)
    } else {
        normalized
    }
}

fn normalize_syntactic(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(..) | Component::RootDir | Component::Normal(_) => {
                components.push(component);
            }
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir | Component::Prefix(..)) => {}
                _ => components.push(component),
            },
        }
    }
    components.into_iter().collect()
}
