use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use crate::error::{non_empty, parent_dir, StoreError, StoreResult};
use crate::options::{WriteMode, WriteOptions};
use crate::traits::BlobPersistence;

/// Prefix for staging files written next to their target in atomic mode.
const STAGING_PREFIX: &str = ".burrow-";

/// Blob persistence on the local filesystem.
///
/// Holds nothing but its write options: every call opens, uses and releases
/// its own handles, so instances are cheap to clone and share across threads.
#[derive(Clone, Debug, Default)]
pub struct FsPersistence {
    options: WriteOptions,
}

impl FsPersistence {
    /// Create a backend that saves with `options`.
    pub fn new(options: WriteOptions) -> Self {
        Self { options }
    }

    /// The write options every save uses.
    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    fn ensure_parent(&self, path: &Path) -> StoreResult<()> {
        match parent_dir(path) {
            Some(parent) => self.try_create_directory(parent),
            None => Ok(()),
        }
    }

    fn write_direct(&self, blob: &[u8], path: &Path) -> StoreResult<()> {
        let mut file = File::create(path).map_err(|e| StoreError::io(path, e))?;
        file.write_all(blob).map_err(|e| StoreError::io(path, e))?;
        if self.options.sync_on_write {
            file.sync_all().map_err(|e| StoreError::io(path, e))?;
        }
        Ok(())
    }

    /// Write into a staging file in the target's directory, then rename it
    /// over the target. The staging file is removed if anything fails before
    /// the rename.
    ///
    /// The staged file gets the permissions a direct write would leave: the
    /// existing target's mode on overwrite, the umask default otherwise.
    fn write_atomic(&self, blob: &[u8], path: &Path) -> StoreResult<()> {
        let dir = parent_dir(path).unwrap_or_else(|| Path::new("."));
        let existing = fs::metadata(path).ok().map(|meta| meta.permissions());

        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGING_PREFIX).suffix(".tmp");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(fs::Permissions::from_mode(0o666));
        }
        let mut staged = builder
            .tempfile_in(dir)
            .map_err(|e| StoreError::io(dir, e))?;

        if let Some(permissions) = existing {
            staged
                .as_file()
                .set_permissions(permissions)
                .map_err(|e| StoreError::io(staged.path(), e))?;
        }
        staged
            .write_all(blob)
            .map_err(|e| StoreError::io(staged.path(), e))?;
        if self.options.sync_on_write {
            staged
                .as_file()
                .sync_all()
                .map_err(|e| StoreError::io(staged.path(), e))?;
        }

        staged
            .persist(path)
            .map_err(|e| StoreError::io(path, e.error))?;
        if self.options.sync_on_write {
            sync_dir(dir)?;
        }
        Ok(())
    }
}

/// Flush a directory entry so a completed rename survives a crash.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> StoreResult<()> {
    File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(|e| StoreError::io(dir, e))
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> StoreResult<()> {
    Ok(())
}

/// Nothing at the path: either it is missing, or an ancestor is a file.
fn is_absent(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

impl BlobPersistence for FsPersistence {
    fn try_file_exists(&self, path: &Path) -> StoreResult<bool> {
        let path = non_empty(path)?;
        match fs::metadata(path) {
            Ok(_) => Ok(true),
            Err(e) if is_absent(&e) => Ok(false),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    fn try_create_directory(&self, path: &Path) -> StoreResult<()> {
        let path = non_empty(path)?;
        fs::create_dir_all(path).map_err(|e| StoreError::create_directory(path, e))
    }

    fn try_save(&self, blob: &[u8], path: &Path) -> StoreResult<()> {
        let path = non_empty(path)?;
        if blob.is_empty() && self.options.reject_empty_blobs {
            return Err(StoreError::EmptyBlob(path.to_path_buf()));
        }

        self.ensure_parent(path)?;

        match self.options.mode {
            WriteMode::Atomic => self.write_atomic(blob, path),
            WriteMode::Direct => self.write_direct(blob, path),
        }
    }

    fn try_retrieve(&self, path: &Path) -> StoreResult<Option<Vec<u8>>> {
        let path = non_empty(path)?;
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if is_absent(&e) => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    fn try_delete(&self, path: &Path) -> StoreResult<bool> {
        let path = non_empty(path)?;
        let meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) if is_absent(&e) => return Ok(false),
            Err(e) => return Err(StoreError::io(path, e)),
        };

        let removed = if meta.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };

        match removed {
            Ok(()) => Ok(true),
            // Lost a race with another remover; the postcondition holds.
            Err(e) if is_absent(&e) => Ok(false),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    fn try_move(&self, source: &Path, destination: &Path) -> StoreResult<()> {
        let source = non_empty(source)?;
        let destination = non_empty(destination)?;

        match fs::symlink_metadata(source) {
            Ok(_) => {}
            Err(e) if is_absent(&e) => {
                return Err(StoreError::NotFound(source.to_path_buf()));
            }
            Err(e) => return Err(StoreError::io(source, e)),
        }
        if fs::symlink_metadata(destination).is_ok() {
            return Err(StoreError::AlreadyExists(destination.to_path_buf()));
        }
        if destination.starts_with(source) {
            return Err(StoreError::IntoOwnSubtree(destination.to_path_buf()));
        }

        self.ensure_parent(destination)?;

        fs::rename(source, destination).map_err(|e| StoreError::io(destination, e))
    }
}
