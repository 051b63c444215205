//! Path-addressed blob persistence.
//!
//! This crate is the engine under the cache and documents namespaces: it maps
//! exactly one absolute path to one opaque byte blob and knows how to save,
//! read, delete, move and stat it. It is not a database. There is no index,
//! no schema, no versioning and no coordination between processes.
//!
//! # Backends
//!
//! All backends implement the [`BlobPersistence`] trait:
//!
//! - [`FsPersistence`] -- the local filesystem
//! - [`InMemoryPersistence`] -- `BTreeMap`-based store for tests and embedding
//!
//! # Rules
//!
//! 1. Every fallible operation reports failure as `false` or `None`. The
//!    `try_*` twins carry a [`StoreError`] for callers that need the reason.
//! 2. A save replaces the blob at its path; overwriting is always allowed.
//! 3. Saves and moves create the missing parent directory chain first. If that
//!    fails the blob is never touched.
//! 4. Deleting an absent path is a successful no-op.
//! 5. Only the existence check has a non-blocking form; it completes exactly
//!    once, off the calling context.
//! 6. Nothing is cached between calls and nothing is retried.

pub mod error;
pub mod exists;
pub mod fs;
pub mod locator;
pub mod memory;
pub mod options;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsPersistence;
pub use locator::FileUrl;
pub use memory::InMemoryPersistence;
pub use options::{WriteMode, WriteOptions};
pub use traits::BlobPersistence;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::path::PathBuf;

    fn segment() -> impl Strategy<Value = String> {
        "[a-z0-9_-]{1,12}"
    }

    fn relative_path() -> impl Strategy<Value = PathBuf> {
        prop::collection::vec(segment(), 1..4).prop_map(|parts| parts.iter().collect())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn fs_save_then_retrieve_returns_same_bytes(
            rel in relative_path(),
            blob in prop::collection::vec(any::<u8>(), 0..2048),
        ) {
            let dir = tempfile::tempdir().unwrap();
            let store = FsPersistence::new(WriteOptions::default().with_sync(false));
            let path = dir.path().join(&rel);

            prop_assert!(store.save(&blob, &path));
            prop_assert_eq!(store.retrieve(&path), Some(blob));
            prop_assert!(store.delete(&path));
            prop_assert_eq!(store.retrieve(&path), None);
        }

        #[test]
        fn backends_agree_on_existence(
            saved in prop::collection::vec(relative_path(), 1..6),
            other in relative_path(),
        ) {
            let dir = tempfile::tempdir().unwrap();
            let fs = FsPersistence::new(WriteOptions::direct());
            let mem = InMemoryPersistence::new();
            let mut fs_ok = true;
            let mut mem_ok = true;
            for rel in &saved {
                let path = dir.path().join(rel);
                fs_ok &= fs.save(b"x", &path);
                mem_ok &= mem.save(b"x", &path);
            }
            // One saved path may be the parent of another; both backends
            // must refuse the same way.
            prop_assert_eq!(fs_ok, mem_ok);

            let other = dir.path().join(&other);
            prop_assert_eq!(fs.file_exists(&other), mem.file_exists(&other));
        }
    }
}
