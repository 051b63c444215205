//! Composition of namespace-relative paths with a namespace root.

use std::path::{Component, Path, PathBuf};

use burrow_store::{StoreError, StoreResult};

/// Join `relative` onto `root` segment by segment.
///
/// Leading separators (and Windows prefixes) are dropped so a relative path
/// can never replace the root, and `.` segments vanish. `..` segments are kept
/// verbatim: without confinement the result may point outside `root`. An
/// empty `relative` yields `root` itself.
pub fn compose(root: &Path, relative: &Path) -> PathBuf {
    let mut out = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir => out.push(".."),
            Component::Normal(segment) => out.push(segment),
        }
    }
    out
}

/// Resolve `.` and `..` segments without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Whether `relative`, composed onto `root`, names an entry other than the
/// root or one of its ancestors. `"."`, `"/"` and `"a/.."` all fail this
/// check, as does any `..` walk that lands back on or above the root.
pub fn names_entry(root: &Path, relative: &Path) -> bool {
    let target = normalize(&compose(root, relative));
    !normalize(root).starts_with(&target)
}

/// Like [`compose`], but refuses any `..` segment.
pub fn compose_confined(root: &Path, relative: &Path) -> StoreResult<PathBuf> {
    if relative
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(StoreError::EscapesRoot(relative.to_path_buf()));
    }
    Ok(compose(root, relative))
}
