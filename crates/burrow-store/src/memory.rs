use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{non_empty, parent_dir, StoreError, StoreResult};
use crate::options::WriteOptions;
use crate::traits::BlobPersistence;

#[derive(Default)]
struct Tree {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
}

impl Tree {
    fn occupied(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.dirs.contains(path)
    }

    fn make_dirs(&mut self, path: &Path) -> StoreResult<()> {
        let chain: Vec<&Path> = path
            .ancestors()
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
        if let Some(file) = chain.iter().find(|p| self.files.contains_key(**p)) {
            return Err(StoreError::NotADirectory(file.to_path_buf()));
        }
        self.dirs.extend(chain.into_iter().map(Path::to_path_buf));
        Ok(())
    }

    /// Remove `path` and, if it is a directory, everything beneath it.
    fn remove_subtree(&mut self, path: &Path) -> bool {
        let had_file = self.files.remove(path).is_some();
        if !self.dirs.contains(path) {
            return had_file;
        }
        self.files.retain(|p, _| !p.starts_with(path));
        self.dirs.retain(|p| !p.starts_with(path));
        true
    }
}

/// In-memory, map-backed blob persistence.
///
/// Intended for tests and embedding. Directories are tracked explicitly so
/// the parent-creation rules match the filesystem backend. Clones share the
/// same underlying tree, which is what lets an existence check run on another
/// thread against the caller's data.
#[derive(Clone, Default)]
pub struct InMemoryPersistence {
    tree: Arc<RwLock<Tree>>,
    options: WriteOptions,
}

impl InMemoryPersistence {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that applies `options` to saves.
    pub fn with_options(options: WriteOptions) -> Self {
        Self {
            tree: Arc::default(),
            options,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Tree> {
        self.tree.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tree> {
        self.tree.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.read().files.len()
    }

    /// Returns `true` if no blobs are stored.
    pub fn is_empty(&self) -> bool {
        self.read().files.is_empty()
    }

    /// Total bytes across all stored blobs.
    pub fn total_bytes(&self) -> u64 {
        self.read().files.values().map(|b| b.len() as u64).sum()
    }

    /// Sorted paths of every stored blob.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.read().files.keys().cloned().collect()
    }

    /// Whether `path` is a known directory.
    pub fn is_dir(&self, path: &Path) -> bool {
        self.read().dirs.contains(path)
    }

    /// Drop every blob and directory.
    pub fn clear(&self) {
        let mut tree = self.write();
        tree.files.clear();
        tree.dirs.clear();
    }
}

impl BlobPersistence for InMemoryPersistence {
    fn try_file_exists(&self, path: &Path) -> StoreResult<bool> {
        let path = non_empty(path)?;
        Ok(self.read().occupied(path))
    }

    fn try_create_directory(&self, path: &Path) -> StoreResult<()> {
        let path = non_empty(path)?;
        self.write().make_dirs(path)
    }

    fn try_save(&self, blob: &[u8], path: &Path) -> StoreResult<()> {
        let path = non_empty(path)?;
        if blob.is_empty() && self.options.reject_empty_blobs {
            return Err(StoreError::EmptyBlob(path.to_path_buf()));
        }

        let mut tree = self.write();
        if let Some(parent) = parent_dir(path) {
            tree.make_dirs(parent)?;
        }
        if tree.dirs.contains(path) {
            return Err(StoreError::IsADirectory(path.to_path_buf()));
        }
        tree.files.insert(path.to_path_buf(), blob.to_vec());
        Ok(())
    }

    fn try_retrieve(&self, path: &Path) -> StoreResult<Option<Vec<u8>>> {
        let path = non_empty(path)?;
        let tree = self.read();
        if tree.dirs.contains(path) {
            return Err(StoreError::IsADirectory(path.to_path_buf()));
        }
        Ok(tree.files.get(path).cloned())
    }

    fn try_delete(&self, path: &Path) -> StoreResult<bool> {
        let path = non_empty(path)?;
        Ok(self.write().remove_subtree(path))
    }

    fn try_move(&self, source: &Path, destination: &Path) -> StoreResult<()> {
        let source = non_empty(source)?;
        let destination = non_empty(destination)?;

        let mut tree = self.write();
        if !tree.occupied(source) {
            return Err(StoreError::NotFound(source.to_path_buf()));
        }
        if tree.occupied(destination) {
            return Err(StoreError::AlreadyExists(destination.to_path_buf()));
        }
        if destination.starts_with(source) {
            return Err(StoreError::IntoOwnSubtree(destination.to_path_buf()));
        }
        if let Some(parent) = parent_dir(destination) {
            tree.make_dirs(parent)?;
        }

        if let Some(blob) = tree.files.remove(source) {
            tree.files.insert(destination.to_path_buf(), blob);
            return Ok(());
        }

        // Directory: re-root everything beneath it.
        let rebase = |p: &Path| -> Option<PathBuf> {
            let rest = p.strip_prefix(source).ok()?;
            if rest.as_os_str().is_empty() {
                Some(destination.to_path_buf())
            } else {
                Some(destination.join(rest))
            }
        };
        let files: Vec<(PathBuf, Vec<u8>)> = tree
            .files
            .iter()
            .filter_map(|(p, b)| rebase(p.as_path()).map(|np| (np, b.clone())))
            .collect();
        let dirs: Vec<PathBuf> = tree.dirs.iter().filter_map(|p| rebase(p.as_path())).collect();
        tree.remove_subtree(source);
        tree.files.extend(files);
        tree.dirs.extend(dirs);
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryPersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tree = self.read();
        f.debug_struct("InMemoryPersistence")
            .field("blob_count", &tree.files.len())
            .field("dir_count", &tree.dirs.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> &Path {
        Path::new(s)
    }

    #[test]
    fn save_and_retrieve() {
        let store = InMemoryPersistence::new();
        assert!(store.save(b"hello world", p("/root/a.txt")));
        assert_eq!(store.retrieve(p("/root/a.txt")).unwrap(), b"hello world");
        assert_eq!(store.len(), 1);
        assert_eq!(store.total_bytes(), 11);
    }

    #[test]
    fn save_registers_parent_chain() {
        let store = InMemoryPersistence::new();
        store.save(b"hello", p("/c/a/b/c.txt"));
        assert!(store.is_dir(p("/c/a")));
        assert!(store.is_dir(p("/c/a/b")));
        assert!(store.file_exists(p("/c/a/b")));
    }

    #[test]
    fn overwrite_replaces() {
        let store = InMemoryPersistence::new();
        store.save(b"v1", p("/v"));
        store.save(b"v2", p("/v"));
        assert_eq!(store.retrieve(p("/v")).unwrap(), b"v2");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn file_in_the_way_blocks_directory_creation() {
        let store = InMemoryPersistence::new();
        store.save(b"f", p("/a/file"));
        let err = store.try_save(b"x", p("/a/file/child")).unwrap_err();
        assert!(matches!(err, StoreError::NotADirectory(_)));
        assert!(!store.create_directory(p("/a/file/sub")));
    }

    #[test]
    fn save_over_directory_fails() {
        let store = InMemoryPersistence::new();
        store.create_directory(p("/d"));
        assert!(matches!(
            store.try_save(b"x", p("/d")),
            Err(StoreError::IsADirectory(_))
        ));
    }

    #[test]
    fn empty_blob_policy() {
        let lenient = InMemoryPersistence::new();
        assert!(lenient.save(b"", p("/e")));

        let strict = InMemoryPersistence::with_options(WriteOptions::default().rejecting_empty_blobs(true));
        assert!(!strict.save(b"", p("/e")));
        assert!(strict.is_empty());
    }

    #[test]
    fn delete_absent_is_success() {
        let store = InMemoryPersistence::new();
        assert!(!store.try_delete(p("/missing")).unwrap());
        assert!(store.delete(p("/missing")));
    }

    #[test]
    fn delete_directory_removes_contents() {
        let store = InMemoryPersistence::new();
        store.save(b"1", p("/t/a"));
        store.save(b"2", p("/t/s/b"));
        store.save(b"3", p("/other"));

        assert!(store.delete(p("/t")));
        assert_eq!(store.paths(), vec![PathBuf::from("/other")]);
        assert!(!store.file_exists(p("/t/s")));
    }

    #[test]
    fn delete_sibling_with_shared_prefix_survives() {
        let store = InMemoryPersistence::new();
        store.save(b"1", p("/t/a"));
        store.save(b"2", p("/tt/b"));
        store.delete(p("/t"));
        assert!(store.file_exists(p("/tt/b")));
    }

    #[test]
    fn move_file_between_directories() {
        let store = InMemoryPersistence::new();
        store.save(b"png", p("/test/source.png"));

        assert!(store.move_file(p("/test/source.png"), p("/other/destination.png")));
        assert!(store.retrieve(p("/test/source.png")).is_none());
        assert_eq!(store.retrieve(p("/other/destination.png")).unwrap(), b"png");
        assert!(store.is_dir(p("/other")));
    }

    #[test]
    fn move_directory_rebases_children() {
        let store = InMemoryPersistence::new();
        store.save(b"1", p("/from/a"));
        store.save(b"2", p("/from/sub/b"));

        assert!(store.move_file(p("/from"), p("/to")));
        assert_eq!(store.retrieve(p("/to/a")).unwrap(), b"1");
        assert_eq!(store.retrieve(p("/to/sub/b")).unwrap(), b"2");
        assert!(!store.file_exists(p("/from")));
        assert!(store.is_dir(p("/to/sub")));
    }

    #[test]
    fn move_directory_into_itself_fails() {
        let store = InMemoryPersistence::new();
        store.save(b"1", p("/from/a"));
        store.save(b"2", p("/from/sub/b"));

        assert!(matches!(
            store.try_move(p("/from"), p("/from/sub2")),
            Err(StoreError::IntoOwnSubtree(_))
        ));
        assert_eq!(store.retrieve(p("/from/a")).unwrap(), b"1");
        assert_eq!(store.retrieve(p("/from/sub/b")).unwrap(), b"2");
        assert!(!store.file_exists(p("/from/sub2")));
    }

    #[test]
    fn move_missing_source_and_occupied_destination() {
        let store = InMemoryPersistence::new();
        store.save(b"keep", p("/dst"));
        assert!(matches!(
            store.try_move(p("/ghost"), p("/dst")),
            Err(StoreError::NotFound(_))
        ));

        store.save(b"src", p("/src"));
        assert!(matches!(
            store.try_move(p("/src"), p("/dst")),
            Err(StoreError::AlreadyExists(_))
        ));
        assert_eq!(store.retrieve(p("/dst")).unwrap(), b"keep");
    }

    #[test]
    fn clones_share_state() {
        let a = InMemoryPersistence::new();
        let b = a.clone();
        a.save(b"x", p("/shared"));
        assert!(b.file_exists(p("/shared")));
        b.clear();
        assert!(a.is_empty());
    }

    #[test]
    fn empty_paths_rejected() {
        let store = InMemoryPersistence::new();
        assert!(!store.save(b"x", p("")));
        assert!(store.retrieve(p("")).is_none());
        assert!(!store.delete(p("")));
        assert!(!store.file_exists(p("")));
        assert!(!store.create_directory(p("")));
    }

    #[test]
    fn debug_reports_counts() {
        let store = InMemoryPersistence::new();
        store.save(b"x", p("/a/b"));
        let dbg = format!("{store:?}");
        assert!(dbg.contains("blob_count: 1"));
    }
}
