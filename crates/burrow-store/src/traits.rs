use std::future::Future;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::exists;
use crate::locator::FileUrl;

/// Path-addressed blob persistence.
///
/// Backends implement the fallible `try_*` operations; the boolean/absence
/// API callers normally use is provided on top of them and never panics or
/// returns an error. All invariants:
/// - An empty path is invalid input for every operation.
/// - A save replaces whatever was stored at the path. No versioning.
/// - A save or move creates the missing parent directory chain first, and
///   does not touch the blob if that fails.
/// - Deleting an absent path succeeds.
/// - No operation retries, locks, or orders itself against concurrent calls.
pub trait BlobPersistence: Send + Sync {
    /// Whether anything (blob or directory) exists at `path`.
    fn try_file_exists(&self, path: &Path) -> StoreResult<bool>;

    /// Create the directory chain for `path`. Succeeds if it already exists.
    fn try_create_directory(&self, path: &Path) -> StoreResult<()>;

    /// Store `blob` at `path`, replacing existing content.
    fn try_save(&self, blob: &[u8], path: &Path) -> StoreResult<()>;

    /// Read the full blob at `path`.
    ///
    /// Returns `Ok(None)` if nothing is stored there.
    fn try_retrieve(&self, path: &Path) -> StoreResult<Option<Vec<u8>>>;

    /// Remove whatever is stored at `path`.
    ///
    /// Returns `Ok(true)` if something was removed, `Ok(false)` if the path
    /// was already absent.
    fn try_delete(&self, path: &Path) -> StoreResult<bool>;

    /// Relocate the blob at `source` to `destination`.
    ///
    /// Fails with [`StoreError::NotFound`] if the source is absent and with
    /// [`StoreError::AlreadyExists`] if the destination is occupied. A
    /// directory cannot be moved into its own subtree.
    fn try_move(&self, source: &Path, destination: &Path) -> StoreResult<()>;

    /// Locator for `path`. Pure; never touches the backend.
    fn resolve_file_url(&self, path: &Path) -> FileUrl {
        FileUrl::new(path)
    }

    fn file_exists(&self, path: &Path) -> bool {
        self.try_file_exists(path)
            .unwrap_or_else(|e| folded("file_exists", path, e, false))
    }

    /// Run the existence check off the calling context and hand the answer
    /// to `callback`, exactly once. See [`exists::dispatch`].
    fn file_exists_with<F>(&self, path: impl Into<PathBuf>, callback: F)
    where
        Self: Clone + Sized + 'static,
        F: FnOnce(bool) + Send + 'static,
    {
        exists::dispatch(self, path.into(), callback)
    }

    /// The existence check as a future. Runs on tokio's blocking pool when a
    /// runtime is current, on a helper thread otherwise.
    fn file_exists_async(&self, path: impl Into<PathBuf>) -> impl Future<Output = bool> + Send
    where
        Self: Clone + Sized + 'static,
    {
        exists::check(self.clone(), path.into())
    }

    fn create_directory(&self, path: &Path) -> bool {
        match self.try_create_directory(path) {
            Ok(()) => true,
            Err(e) => folded("create_directory", path, e, false),
        }
    }

    fn save(&self, blob: &[u8], path: &Path) -> bool {
        match self.try_save(blob, path) {
            Ok(()) => {
                debug!(path = %path.display(), len = blob.len(), "blob saved");
                true
            }
            Err(e) => folded("save", path, e, false),
        }
    }

    fn retrieve(&self, path: &Path) -> Option<Vec<u8>> {
        self.try_retrieve(path)
            .unwrap_or_else(|e| folded("retrieve", path, e, None))
    }

    fn delete(&self, path: &Path) -> bool {
        match self.try_delete(path) {
            Ok(removed) => {
                debug!(path = %path.display(), removed, "delete");
                true
            }
            Err(e) => folded("delete", path, e, false),
        }
    }

    fn move_file(&self, source: &Path, destination: &Path) -> bool {
        match self.try_move(source, destination) {
            Ok(()) => {
                debug!(
                    source = %source.display(),
                    destination = %destination.display(),
                    "blob moved"
                );
                true
            }
            Err(e) => folded("move_file", source, e, false),
        }
    }
}

/// Log a failure that is about to be reported as `fallback`.
fn folded<T>(op: &'static str, path: &Path, err: StoreError, fallback: T) -> T {
    warn!(op, path = %path.display(), error = %err, "blob operation failed");
    fallback
}
