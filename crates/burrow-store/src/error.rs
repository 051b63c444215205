use std::io;
use std::path::{Path, PathBuf};

/// Errors from blob persistence operations.
///
/// The boolean/absence API folds every variant into `false` or `None`; the
/// `try_*` API surfaces them for callers that need to tell the cases apart.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An empty path was supplied.
    #[error("path is empty")]
    EmptyPath,

    /// A zero-length blob was rejected by the write options.
    #[error("refusing to store an empty blob at {0}")]
    EmptyBlob(PathBuf),

    /// Nothing is stored at the path (move source, mostly).
    #[error("nothing stored at {0}")]
    NotFound(PathBuf),

    /// The move destination is already occupied.
    #[error("destination already exists: {0}")]
    AlreadyExists(PathBuf),

    /// A component of the path is a file where a directory is required.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A blob operation targeted a directory.
    #[error("is a directory: {0}")]
    IsADirectory(PathBuf),

    /// A relative path tried to leave its namespace root.
    #[error("path escapes its namespace root: {0}")]
    EscapesRoot(PathBuf),

    /// A relative path names the namespace root itself, or one of its
    /// ancestors, rather than an entry beneath it.
    #[error("path does not name an entry below its namespace root: {0}")]
    NotBelowRoot(PathBuf),

    /// A directory move whose destination lies inside the source.
    #[error("cannot move a directory into itself: {0}")]
    IntoOwnSubtree(PathBuf),

    /// The directory chain for a write could not be created.
    #[error("cannot create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// I/O error from the underlying filesystem.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn create_directory(path: &Path, source: io::Error) -> Self {
        Self::CreateDirectory {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result alias for persistence operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Reject empty paths up front; every operation treats them as invalid input.
pub(crate) fn non_empty(path: &Path) -> StoreResult<&Path> {
    if path.as_os_str().is_empty() {
        Err(StoreError::EmptyPath)
    } else {
        Ok(path)
    }
}

/// Parent directory of `path`, if it has a non-empty one.
pub(crate) fn parent_dir(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}
