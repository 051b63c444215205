use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use burrow_store::{BlobPersistence, FsPersistence, WriteOptions};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ConfigError, ConfigResult};
use crate::namespace::Namespace;
use crate::rooted::NamespaceStore;

/// Overrides the discovered cache root.
pub const CACHE_ROOT_VAR: &str = "BURROW_CACHE_ROOT";
/// Overrides the discovered documents root.
pub const DOCUMENTS_ROOT_VAR: &str = "BURROW_DOCUMENTS_ROOT";

/// Namespace roots and write behavior, resolved once at process start.
///
/// Build one with [`StorageConfig::from_env`], [`StorageConfig::load`] or
/// [`StorageConfig::new`] and hand it (or the [`NamespaceStore`]s it builds)
/// to whoever needs storage. Nothing here is global.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root of the purgeable namespace.
    pub cache_root: PathBuf,
    /// Root of the durable namespace.
    pub documents_root: PathBuf,
    /// Reject `..` segments in relative paths.
    #[serde(default)]
    pub confine_to_root: bool,
    #[serde(default)]
    pub write: WriteOptions,
}

impl StorageConfig {
    /// Configuration with explicit roots. Fails if either is relative.
    pub fn new(
        cache_root: impl Into<PathBuf>,
        documents_root: impl Into<PathBuf>,
    ) -> ConfigResult<Self> {
        let config = Self {
            cache_root: cache_root.into(),
            documents_root: documents_root.into(),
            confine_to_root: false,
            write: WriteOptions::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Replace the write options used by filesystem views.
    pub fn with_write_options(mut self, write: WriteOptions) -> Self {
        self.write = write;
        self
    }

    /// Set whether views reject `..` segments.
    pub fn with_confinement(mut self, confine_to_root: bool) -> Self {
        self.confine_to_root = confine_to_root;
        self
    }

    /// Both roots must be absolute.
    pub fn validate(&self) -> ConfigResult<()> {
        for namespace in Namespace::ALL {
            let root = self.root(namespace);
            if !root.is_absolute() {
                return Err(ConfigError::RelativeRoot {
                    namespace,
                    path: root.to_path_buf(),
                });
            }
        }
        Ok(())
    }

    /// Root directory of `namespace`.
    pub fn root(&self, namespace: Namespace) -> &Path {
        match namespace {
            Namespace::Cache => &self.cache_root,
            Namespace::Documents => &self.documents_root,
        }
    }

    // ---- Loading ----

    /// Parse and validate a TOML configuration.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        info!(
            config = %path.display(),
            cache_root = %config.cache_root.display(),
            documents_root = %config.documents_root.display(),
            "storage config loaded"
        );
        Ok(config)
    }

    /// Discover roots for `app_name` from the process environment.
    ///
    /// Resolution order per namespace:
    /// - cache: `BURROW_CACHE_ROOT`, else `$XDG_CACHE_HOME/<app>`, else
    ///   `$HOME/.cache/<app>`
    /// - documents: `BURROW_DOCUMENTS_ROOT`, else
    ///   `$XDG_DATA_HOME/<app>/documents`, else
    ///   `$HOME/.local/share/<app>/documents`
    ///
    /// Empty variables count as unset; relative XDG values are ignored.
    pub fn from_env(app_name: &str) -> ConfigResult<Self> {
        Self::from_lookup(app_name, |key| std::env::var_os(key))
    }

    /// [`from_env`](Self::from_env) against an arbitrary variable source.
    pub fn from_lookup<F>(app_name: &str, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let mut components = Path::new(app_name).components();
        if !matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        ) {
            return Err(ConfigError::InvalidAppName(app_name.to_string()));
        }

        let var = |key: &str| lookup(key).filter(|v| !v.is_empty()).map(PathBuf::from);
        let xdg = |key: &str| var(key).filter(|p| p.is_absolute());
        let home = || var("HOME");

        let cache_root = var(CACHE_ROOT_VAR)
            .or_else(|| xdg("XDG_CACHE_HOME").map(|base| base.join(app_name)))
            .or_else(|| home().map(|h| h.join(".cache").join(app_name)))
            .ok_or(ConfigError::MissingRoot {
                namespace: Namespace::Cache,
                variable: CACHE_ROOT_VAR,
            })?;

        let documents_root = var(DOCUMENTS_ROOT_VAR)
            .or_else(|| xdg("XDG_DATA_HOME").map(|base| base.join(app_name).join("documents")))
            .or_else(|| {
                home().map(|h| {
                    h.join(".local")
                        .join("share")
                        .join(app_name)
                        .join("documents")
                })
            })
            .ok_or(ConfigError::MissingRoot {
                namespace: Namespace::Documents,
                variable: DOCUMENTS_ROOT_VAR,
            })?;

        Self::new(cache_root, documents_root)
    }

    // ---- Views ----

    /// View of `namespace` over the local filesystem with this config's
    /// write options.
    pub fn namespace(&self, namespace: Namespace) -> NamespaceStore<FsPersistence> {
        self.namespace_with(namespace, FsPersistence::new(self.write))
    }

    /// View of `namespace` over an arbitrary backend.
    pub fn namespace_with<P: BlobPersistence>(
        &self,
        namespace: Namespace,
        backend: P,
    ) -> NamespaceStore<P> {
        NamespaceStore::new(namespace, self.root(namespace), backend)
            .with_confinement(self.confine_to_root)
    }

    /// Filesystem view of the cache namespace.
    pub fn cache(&self) -> NamespaceStore<FsPersistence> {
        self.namespace(Namespace::Cache)
    }

    /// Filesystem view of the documents namespace.
    pub fn documents(&self) -> NamespaceStore<FsPersistence> {
        self.namespace(Namespace::Documents)
    }
}
