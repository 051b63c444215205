//! `file://` locators for stored paths.

use std::fmt;
use std::path::{Path, PathBuf};

use url::Url;

/// A `file://` locator for a path.
///
/// Building one never touches the filesystem and cannot fail. Relative paths
/// are anchored at the process working directory, as a file URL has no
/// notion of "relative".
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FileUrl {
    path: PathBuf,
}

impl FileUrl {
    /// Locator for `path`, anchored at the working directory if relative.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let path = if path.is_relative() && !path.as_os_str().is_empty() {
            match std::env::current_dir() {
                Ok(cwd) => cwd.join(path),
                Err(_) => path.to_path_buf(),
            }
        } else {
            path.to_path_buf()
        };
        Self { path }
    }

    /// The filesystem path this locator points at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The locator as a parsed URL, or `None` when the path cannot be
    /// expressed as one (empty, or still relative).
    pub fn to_url(&self) -> Option<Url> {
        Url::from_file_path(&self.path).ok()
    }

    /// Locator of the containing directory.
    pub fn parent(&self) -> Option<FileUrl> {
        self.path.parent().map(|p| FileUrl {
            path: p.to_path_buf(),
        })
    }

    /// Final path component, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

impl fmt::Display for FileUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_url() {
            Some(url) => write!(f, "{url}"),
            None => write!(f, "file://{}", self.path.display()),
        }
    }
}

impl AsRef<Path> for FileUrl {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}
