//! Cache and documents namespaces over the burrow persistence primitive.
//!
//! A namespace is a fixed root directory. Callers address blobs with paths
//! relative to that root; [`NamespaceStore`] composes the absolute path and
//! forwards the call to a [`burrow_store::BlobPersistence`] backend without
//! adding behavior of its own.
//!
//! # Namespaces
//!
//! - **Cache** -- purgeable. The operating environment may clear it; this
//!   crate never evicts anything itself.
//! - **Documents** -- durable across runs.
//!
//! # Modules
//!
//! - [`config`] -- [`StorageConfig`]: roots and write options, from TOML or
//!   the environment
//! - [`rooted`] -- [`NamespaceStore`], the rooted view
//! - [`storage`] -- [`Storage`], both namespaces over one backend
//! - [`paths`] -- relative path composition and confinement
//! - [`namespace`] -- the [`Namespace`] tag
//! - [`error`] -- configuration errors

pub mod config;
pub mod error;
pub mod namespace;
pub mod paths;
pub mod rooted;
pub mod storage;

pub use config::{StorageConfig, CACHE_ROOT_VAR, DOCUMENTS_ROOT_VAR};
pub use error::{ConfigError, ConfigResult};
pub use namespace::Namespace;
pub use rooted::NamespaceStore;
pub use storage::Storage;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn save_then_retrieve_in_both_namespaces(
            rel in "[a-z0-9]{1,8}(/[a-z0-9]{1,8}){0,2}\\.bin",
            blob in prop::collection::vec(any::<u8>(), 0..512),
        ) {
            let cache_dir = tempfile::tempdir().unwrap();
            let docs_dir = tempfile::tempdir().unwrap();
            let config = StorageConfig::new(cache_dir.path(), docs_dir.path())
                .unwrap()
                .with_write_options(burrow_store::WriteOptions::direct());
            let storage = Storage::from_config(&config);

            for namespace in Namespace::ALL {
                let view = storage.namespace(namespace);
                prop_assert!(view.retrieve(&rel).is_none());
                prop_assert!(view.save(&blob, &rel));
                prop_assert_eq!(view.retrieve(&rel), Some(blob.clone()));
                prop_assert!(view.file_exists(&rel));
            }
        }
    }
}
