use std::path::{Path, PathBuf};

use burrow_store::{BlobPersistence, FileUrl, FsPersistence, StoreError, StoreResult};
use tracing::warn;

use crate::namespace::Namespace;
use crate::paths::{compose, compose_confined, names_entry};

/// A persistence backend viewed through one namespace root.
///
/// Every operation takes a path relative to the root, composes it with the
/// root, and hands the absolute path to the backend unchanged. The view adds
/// no I/O of its own. A relative path that resolves to the root itself (`""`,
/// `"."`, `"/"`, `"a/.."`) or to one of its ancestors is valid for
/// [`path_for_resource`](Self::path_for_resource) but rejected by every
/// operation that reads, writes or deletes, so a view can never wipe its own
/// root.
#[derive(Clone, Debug)]
pub struct NamespaceStore<P = FsPersistence> {
    namespace: Namespace,
    root: PathBuf,
    confined: bool,
    backend: P,
}

impl<P: BlobPersistence> NamespaceStore<P> {
    /// A view of `backend` rooted at `root`, unconfined.
    pub fn new(namespace: Namespace, root: impl Into<PathBuf>, backend: P) -> Self {
        Self {
            namespace,
            root: root.into(),
            confined: false,
            backend,
        }
    }

    /// Reject relative paths containing `..` segments.
    pub fn with_confinement(mut self, confined: bool) -> Self {
        self.confined = confined;
        self
    }

    /// Which namespace this view serves.
    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// The backend every operation forwards to.
    pub fn backend(&self) -> &P {
        &self.backend
    }

    /// Whether `..` segments are rejected.
    pub fn is_confined(&self) -> bool {
        self.confined
    }

    /// The namespace root.
    pub fn directory_path(&self) -> &Path {
        &self.root
    }

    /// `file://` locator of the namespace root.
    pub fn directory_url(&self) -> FileUrl {
        self.backend.resolve_file_url(&self.root)
    }

    /// Absolute path for `relative`. Pure path arithmetic; confinement is
    /// not applied here, only when an operation runs.
    pub fn path_for_resource(&self, relative: impl AsRef<Path>) -> PathBuf {
        compose(&self.root, relative.as_ref())
    }

    /// `file://` locator for `relative`.
    pub fn url_for_resource(&self, relative: impl AsRef<Path>) -> FileUrl {
        self.backend
            .resolve_file_url(&self.path_for_resource(relative))
    }

    fn resolve(&self, relative: &Path) -> StoreResult<PathBuf> {
        if relative.as_os_str().is_empty() {
            return Err(StoreError::EmptyPath);
        }
        if !names_entry(&self.root, relative) {
            return Err(StoreError::NotBelowRoot(relative.to_path_buf()));
        }
        if self.confined {
            compose_confined(&self.root, relative)
        } else {
            Ok(compose(&self.root, relative))
        }
    }

    fn rejected<T>(&self, op: &'static str, relative: &Path, err: StoreError, fallback: T) -> T {
        warn!(
            namespace = %self.namespace,
            op,
            relative = %relative.display(),
            error = %err,
            "relative path rejected"
        );
        fallback
    }

    // ---- Fallible API ----

    /// Store `blob` at `relative`, surfacing the failure cause.
    pub fn try_save(&self, blob: &[u8], relative: impl AsRef<Path>) -> StoreResult<()> {
        let path = self.resolve(relative.as_ref())?;
        self.backend.try_save(blob, &path)
    }

    /// Read the blob at `relative`; `Ok(None)` if nothing is stored.
    pub fn try_retrieve(&self, relative: impl AsRef<Path>) -> StoreResult<Option<Vec<u8>>> {
        let path = self.resolve(relative.as_ref())?;
        self.backend.try_retrieve(&path)
    }

    /// Whether anything exists at `relative`.
    pub fn try_file_exists(&self, relative: impl AsRef<Path>) -> StoreResult<bool> {
        let path = self.resolve(relative.as_ref())?;
        self.backend.try_file_exists(&path)
    }

    /// Remove `relative`; `Ok(false)` if it was already absent.
    pub fn try_delete(&self, relative: impl AsRef<Path>) -> StoreResult<bool> {
        let path = self.resolve(relative.as_ref())?;
        self.backend.try_delete(&path)
    }

    // ---- Boolean API ----

    /// Store `blob` at `relative`. Returns `false` on any failure.
    pub fn save(&self, blob: &[u8], relative: impl AsRef<Path>) -> bool {
        let relative = relative.as_ref();
        match self.resolve(relative) {
            Ok(path) => self.backend.save(blob, &path),
            Err(e) => self.rejected("save", relative, e, false),
        }
    }

    /// Read the blob at `relative`, or `None`.
    pub fn retrieve(&self, relative: impl AsRef<Path>) -> Option<Vec<u8>> {
        let relative = relative.as_ref();
        match self.resolve(relative) {
            Ok(path) => self.backend.retrieve(&path),
            Err(e) => self.rejected("retrieve", relative, e, None),
        }
    }

    /// Whether anything exists at `relative`.
    pub fn file_exists(&self, relative: impl AsRef<Path>) -> bool {
        let relative = relative.as_ref();
        match self.resolve(relative) {
            Ok(path) => self.backend.file_exists(&path),
            Err(e) => self.rejected("file_exists", relative, e, false),
        }
    }

    /// Remove `relative`. Succeeds if nothing was there.
    pub fn delete(&self, relative: impl AsRef<Path>) -> bool {
        let relative = relative.as_ref();
        match self.resolve(relative) {
            Ok(path) => self.backend.delete(&path),
            Err(e) => self.rejected("delete", relative, e, false),
        }
    }
}

impl<P: BlobPersistence + Clone + 'static> NamespaceStore<P> {
    /// Background existence check; `callback` runs exactly once, off the
    /// calling thread, even when `relative` is rejected.
    pub fn file_exists_with<F>(&self, relative: impl AsRef<Path>, callback: F)
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let relative = relative.as_ref();
        let path = match self.resolve(relative) {
            Ok(path) => path,
            // An empty path always checks as absent on the backend.
            Err(e) => self.rejected("file_exists_with", relative, e, PathBuf::new()),
        };
        self.backend.file_exists_with(path, callback);
    }

    /// Existence check as a future.
    pub async fn file_exists_async(&self, relative: impl AsRef<Path>) -> bool {
        let relative = relative.as_ref();
        match self.resolve(relative) {
            Ok(path) => self.backend.file_exists_async(path).await,
            Err(e) => self.rejected("file_exists_async", relative, e, false),
        }
    }
}
