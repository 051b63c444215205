use burrow_store::{BlobPersistence, FsPersistence};

use crate::config::StorageConfig;
use crate::namespace::Namespace;
use crate::rooted::NamespaceStore;

/// Both namespaces, built once from a [`StorageConfig`] and sharing one
/// backend.
#[derive(Clone, Debug)]
pub struct Storage<P = FsPersistence> {
    cache: NamespaceStore<P>,
    documents: NamespaceStore<P>,
}

impl Storage<FsPersistence> {
    /// Filesystem-backed namespaces with the config's write options.
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::with_backend(config, FsPersistence::new(config.write))
    }
}

impl<P: BlobPersistence + Clone> Storage<P> {
    /// Both namespaces over a shared `backend`.
    pub fn with_backend(config: &StorageConfig, backend: P) -> Self {
        Self {
            cache: config.namespace_with(Namespace::Cache, backend.clone()),
            documents: config.namespace_with(Namespace::Documents, backend),
        }
    }
}

impl<P: BlobPersistence> Storage<P> {
    /// The purgeable cache namespace.
    pub fn cache(&self) -> &NamespaceStore<P> {
        &self.cache
    }

    /// The durable documents namespace.
    pub fn documents(&self) -> &NamespaceStore<P> {
        &self.documents
    }

    /// View for `namespace`.
    pub fn namespace(&self, namespace: Namespace) -> &NamespaceStore<P> {
        match namespace {
            Namespace::Cache => &self.cache,
            Namespace::Documents => &self.documents,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use burrow_store::InMemoryPersistence;

    use super::*;

    #[test]
    fn namespaces_are_independent() {
        let cache_dir = tempfile::tempdir().unwrap();
        let docs_dir = tempfile::tempdir().unwrap();
        let config = StorageConfig::new(cache_dir.path(), docs_dir.path()).unwrap();
        let storage = Storage::from_config(&config);

        assert!(storage.cache().save(b"c", "same.txt"));
        assert!(storage.documents().save(b"d", "same.txt"));

        assert_eq!(storage.cache().retrieve("same.txt").unwrap(), b"c");
        assert_eq!(storage.documents().retrieve("same.txt").unwrap(), b"d");
        assert!(cache_dir.path().join("same.txt").is_file());
        assert!(docs_dir.path().join("same.txt").is_file());

        assert!(storage.cache().delete("same.txt"));
        assert!(storage.documents().file_exists("same.txt"));
    }

    #[test]
    fn shared_memory_backend() {
        let config = StorageConfig::new("/c", "/d").unwrap();
        let backend = InMemoryPersistence::new();
        let storage = Storage::with_backend(&config, backend.clone());

        storage.namespace(Namespace::Cache).save(b"1", "a");
        storage.namespace(Namespace::Documents).save(b"2", "a");

        assert_eq!(backend.len(), 2);
        assert!(backend.file_exists(Path::new("/c/a")));
        assert!(backend.file_exists(Path::new("/d/a")));
    }

    #[test]
    fn move_between_namespaces_through_primitive() {
        let config = StorageConfig::new("/c", "/d").unwrap();
        let storage = Storage::with_backend(&config, InMemoryPersistence::new());
        storage.cache().save(b"draft", "inbox/n.txt");

        let src = storage.cache().path_for_resource("inbox/n.txt");
        let dst = storage.documents().path_for_resource("kept/n.txt");
        assert!(storage.cache().backend().move_file(&src, &dst));

        assert!(storage.cache().retrieve("inbox/n.txt").is_none());
        assert_eq!(storage.documents().retrieve("kept/n.txt").unwrap(), b"draft");
    }
}
